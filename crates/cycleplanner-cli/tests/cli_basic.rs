//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_cycleplanner"))
        .args(args)
        .env("CYCLEPLANNER_DATA_DIR", dir)
        .env("CYCLEPLANNER_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

fn add_class(dir: &Path, homeroom: &str, period: &str, cycle_day: &str) -> (String, String, i32) {
    run_cli(
        dir,
        &[
            "class", "add", "--grade", "3", "--homeroom", homeroom, "--subject", "Science",
            "--topic", "Plants", "--cycle-day", cycle_day, "--period", period, "--date",
            "2025-08-05",
        ],
    )
}

#[test]
fn test_config_get_and_set() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "planner.anchor_month"]).trim(), "8");

    run_ok(dir.path(), &["config", "set", "validation.strict", "true"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "validation.strict"]).trim(), "true");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "planner.colour", "red"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_config_list_is_json() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["config", "list"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["planner"]["default_school_year"], "2025-2026");
    assert_eq!(parsed["remote"]["enabled"], false);
}

#[test]
fn test_cycle_show_default_window() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["cycle", "show"]);
    assert!(out.contains("Day 1: Fri 2025-08-01"), "{out}");
    assert!(out.contains("Day 2: Mon 2025-08-04"), "{out}");
    assert!(out.contains("Day 6: Fri 2025-08-08"), "{out}");
}

#[test]
fn test_holiday_shifts_window() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["holiday", "add", "2025-08-04", "Staff day"]);

    let out = run_ok(dir.path(), &["cycle", "show"]);
    assert!(out.contains("Day 2: Tue 2025-08-05"), "{out}");
    assert!(out.contains("Day 6: Mon 2025-08-11"), "{out}");

    let out = run_ok(dir.path(), &["holiday", "check", "2025-08-04"]);
    assert!(out.contains("no classes"));
    let out = run_ok(dir.path(), &["cycle", "day", "2025-08-05"]);
    assert_eq!(out.trim(), "2025-08-05: Day 2");

    let out = run_ok(dir.path(), &["holiday", "list"]);
    assert!(out.contains("2025-08-04  Staff day"));

    run_ok(dir.path(), &["holiday", "remove", "2025-08-04"]);
    let out = run_ok(dir.path(), &["cycle", "show"]);
    assert!(out.contains("Day 2: Mon 2025-08-04"), "{out}");
}

#[test]
fn test_duplicate_holiday_fails() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["holiday", "add", "2025-08-04", "Staff day"]);
    let (_, _, code) = run_cli(dir.path(), &["holiday", "add", "2025-08-04", "Again"]);
    assert_eq!(code, 1);
}

#[test]
fn test_cycle_override_and_clear() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["cycle", "override", "2025-08-06", "5"]);
    assert_eq!(
        run_ok(dir.path(), &["cycle", "day", "2025-08-06"]).trim(),
        "2025-08-06: Day 5"
    );
    run_ok(dir.path(), &["cycle", "clear-override", "2025-08-06"]);
    assert_eq!(
        run_ok(dir.path(), &["cycle", "day", "2025-08-06"]).trim(),
        "2025-08-06: Day 4"
    );
}

#[test]
fn test_cycle_month_rejects_bad_month() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["cycle", "month", "13", "1", "--preview"]);
    assert_eq!(code, 1);
}

#[test]
fn test_class_lifecycle() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) = add_class(dir.path(), "B", "P2", "3");
    assert_eq!(code, 0, "{stderr}");
    let id = stdout.trim().to_string();

    let out = run_ok(dir.path(), &["class", "list", "--json"]);
    let listed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());
    assert_eq!(listed[0]["group"], "B");

    run_ok(dir.path(), &["class", "notes", &id, "Bring seeds"]);
    let out = run_ok(dir.path(), &["class", "show", &id]);
    let shown: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(shown["notes"], "Bring seeds");

    let out = run_ok(dir.path(), &["class", "toggle", &id]);
    assert!(out.contains("completed"));
    let out = run_ok(dir.path(), &["class", "list", "--completed", "--json"]);
    let completed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(completed.as_array().unwrap().len(), 1);

    let out = run_ok(dir.path(), &["class", "reactivate"]);
    assert!(out.contains("reactivated 1"));

    run_ok(dir.path(), &["class", "delete", &id]);
    let out = run_ok(dir.path(), &["class", "list"]);
    assert!(out.contains("No classes."));
}

#[test]
fn test_class_slot_conflict() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = add_class(dir.path(), "B", "P2", "3");
    assert_eq!(code, 0);

    let (_, stderr, code) = add_class(dir.path(), "B", "P2", "3");
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));

    let (_, _, code) = add_class(dir.path(), "B", "P3", "3");
    assert_eq!(code, 0);
}

#[test]
fn test_class_schedule_takes_window_date() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(
        dir.path(),
        &[
            "class", "schedule", "--grade", "1", "--homeroom", "A", "--subject", "Reading",
            "--cycle-day", "4", "--period", "P1",
        ],
    );
    let id = out.trim();
    let out = run_ok(dir.path(), &["class", "show", id]);
    let shown: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(shown["date"], "2025-08-06");
}

#[test]
fn test_class_update_requires_a_field() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, _) = add_class(dir.path(), "A", "P1", "1");
    let (_, stderr, code) = run_cli(dir.path(), &["class", "update", stdout.trim()]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nothing to update"));
}

#[test]
fn test_school_years() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["year", "create", "2026-2027"]);
    let (_, _, code) = run_cli(dir.path(), &["year", "create", "2026-2027"]);
    assert_eq!(code, 1);

    run_ok(dir.path(), &["year", "switch", "2026-2027"]);
    assert_eq!(run_ok(dir.path(), &["year", "current"]).trim(), "2026-2027");

    let out = run_ok(dir.path(), &["year", "list"]);
    assert!(out.contains("  2025-2026"));
    assert!(out.contains("* 2026-2027"));
}

#[test]
fn test_sync_without_remote() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["sync", "status"]);
    assert!(out.contains("remote: disabled"));
    assert!(out.contains("pending writes: 0"));

    let (_, stderr, code) = run_cli(dir.path(), &["sync", "push"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_class_export_and_import() {
    let source = TempDir::new().unwrap();
    let (stdout, _, code) = add_class(source.path(), "B", "P2", "3");
    assert_eq!(code, 0);
    let id = stdout.trim().to_string();

    let file = source.path().join("classes.json");
    let out = run_ok(
        source.path(),
        &["class", "export", "--out", file.to_str().unwrap()],
    );
    assert!(out.contains("exported 1 classes"));

    let target = TempDir::new().unwrap();
    let out = run_ok(target.path(), &["class", "import", file.to_str().unwrap()]);
    assert!(out.contains("imported 1"), "{out}");
    let shown: serde_json::Value =
        serde_json::from_str(&run_ok(target.path(), &["class", "show", &id])).unwrap();
    assert_eq!(shown["group"], "B");

    // importing the same file again reports the taken slot
    let out = run_ok(target.path(), &["class", "import", file.to_str().unwrap()]);
    assert!(out.contains("imported 0"), "{out}");
    assert!(out.contains("skipped entry 0"), "{out}");

    let bad = target.path().join("bad.json");
    std::fs::write(&bad, "{\"not\": \"a list\"}").unwrap();
    let (_, stderr, code) = run_cli(target.path(), &["class", "import", bad.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}
