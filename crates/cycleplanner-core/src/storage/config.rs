//! TOML-based application configuration.
//!
//! Stores:
//! - Planner defaults (school year, cycle anchor month, scan bound)
//! - Optional strict validation rules for class entries
//! - Remote store connection
//! - Logging level and format
//!
//! Configuration is stored at `~/.config/cycleplanner/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::calendar::SchoolYear;
use crate::cycle::CycleSettings;
use crate::error::ConfigError;
use crate::planner::PlannerSettings;
use crate::schedule::ValidationPolicy;

/// Planner defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_school_year")]
    pub default_school_year: String,
    /// Calendar month (1-12) the cycle is anchored in.
    #[serde(default = "default_anchor_month")]
    pub anchor_month: u32,
    #[serde(default = "default_scan_window_days")]
    pub scan_window_days: i64,
}

/// Remote store connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub validation: ValidationPolicy,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_school_year() -> String {
    SchoolYear::default().label()
}
fn default_anchor_month() -> u32 {
    CycleSettings::default().anchor_month
}
fn default_scan_window_days() -> i64 {
    CycleSettings::default().scan_window_days
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_school_year: default_school_year(),
            anchor_month: default_anchor_month(),
            scan_window_days: default_scan_window_days(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    let n = value
                        .parse::<i64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                    serde_json::Value::Number(n.into())
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                // optional values start out null; take them as strings
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// `<data_dir>/config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The result must still
    /// produce valid planner settings; nothing changes otherwise.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.planner_settings()?;
        *self = updated;
        Ok(())
    }

    /// Planner settings derived from the `[planner]` and `[validation]`
    /// sections.
    pub fn planner_settings(&self) -> Result<PlannerSettings, ConfigError> {
        let default_school_year: SchoolYear = self
            .planner
            .default_school_year
            .parse()
            .map_err(|e: crate::error::PlannerError| ConfigError::InvalidValue {
                key: "planner.default_school_year".into(),
                message: e.to_string(),
            })?;
        if !(1..=12).contains(&self.planner.anchor_month) {
            return Err(ConfigError::InvalidValue {
                key: "planner.anchor_month".into(),
                message: format!("{} is outside 1..=12", self.planner.anchor_month),
            });
        }
        if self.planner.scan_window_days < 6 {
            return Err(ConfigError::InvalidValue {
                key: "planner.scan_window_days".into(),
                message: "must leave room for six cycle days".into(),
            });
        }
        Ok(PlannerSettings {
            default_school_year,
            cycle: CycleSettings {
                anchor_month: self.planner.anchor_month,
                scan_window_days: self.planner.scan_window_days,
            },
            validation: self.validation.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.planner.anchor_month, 8);
        assert!(!parsed.validation.strict);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[planner]\nanchor_month = 9\n").unwrap();
        assert_eq!(parsed.planner.anchor_month, 9);
        assert_eq!(parsed.planner.scan_window_days, 62);
        assert_eq!(parsed.validation.lower_grade_homerooms, vec!["A", "B", "C"]);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("planner.anchor_month").as_deref(), Some("8"));
        assert_eq!(cfg.get("planner.default_school_year").as_deref(), Some("2025-2026"));
        assert_eq!(cfg.get("validation.strict").as_deref(), Some("false"));
        assert!(cfg.get("planner.missing_key").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("validation.strict", "true").unwrap();
        cfg.set("planner.scan_window_days", "90").unwrap();
        cfg.set("validation.upper_grade_subject", "Technology").unwrap();
        cfg.set("validation.upper_grade_homerooms", r#"["A","B","D"]"#).unwrap();
        assert!(cfg.validation.strict);
        assert_eq!(cfg.planner.scan_window_days, 90);
        assert_eq!(cfg.validation.upper_grade_subject.as_deref(), Some("Technology"));
        assert_eq!(cfg.validation.upper_grade_homerooms.len(), 3);
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("planner.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("validation.strict", "maybe").is_err());
        assert!(cfg.set("planner.anchor_month", "13").is_err());
        assert!(cfg.set("planner.default_school_year", "2025-2030").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("logging.json", "true").unwrap();
        changed.save_to(&path).unwrap();
        assert!(Config::load_from(&path).unwrap().logging.json);
    }

    #[test]
    fn planner_settings_follow_sections() {
        let mut cfg = Config::default();
        cfg.set("planner.anchor_month", "9").unwrap();
        let settings = cfg.planner_settings().unwrap();
        assert_eq!(settings.cycle.anchor_month, 9);
        assert_eq!(settings.default_school_year, SchoolYear::starting(2025));
    }
}
