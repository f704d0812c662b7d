use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use cycleplanner_core::{
    ClassDraft, ClassEntry, ClassPatch, CycleDay, Grade, Group, Period, ScheduleFilter,
};

use crate::session::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum ClassAction {
    /// Add a class on an explicit date
    Add {
        #[command(flatten)]
        fields: DraftArgs,
        /// Date of the class (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
    /// Add a class into the current cycle window; the date follows the
    /// cycle day
    Schedule {
        #[command(flatten)]
        fields: DraftArgs,
    },
    /// List active classes
    List {
        #[arg(long)]
        grade: Option<Grade>,
        /// Group such as "B" or "B-2"
        #[arg(long)]
        group: Option<Group>,
        #[arg(long)]
        period: Option<Period>,
        #[arg(long)]
        cycle_day: Option<CycleDay>,
        /// List completed classes instead
        #[arg(long)]
        completed: bool,
        #[arg(long)]
        json: bool,
    },
    /// Classes dated on a day (defaults to today)
    On { date: Option<NaiveDate> },
    /// Show one class
    Show { id: String },
    /// Change fields of a class
    Update {
        id: String,
        #[arg(long)]
        grade: Option<Grade>,
        #[arg(long)]
        group: Option<Group>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        cycle_day: Option<CycleDay>,
        #[arg(long)]
        period: Option<Period>,
    },
    /// Replace the notes of a class
    Notes { id: String, notes: String },
    /// Mark a class completed, or active again
    Toggle { id: String },
    /// Move every completed class back to active
    Reactivate,
    /// Delete a class
    Delete { id: String },
    /// Totals per grade
    Stats,
    /// Write every class as a JSON array
    Export {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Merge classes from an exported JSON array
    Import { file: PathBuf },
}

#[derive(Args)]
pub struct DraftArgs {
    #[arg(long)]
    grade: Grade,
    #[arg(long)]
    homeroom: String,
    #[arg(long)]
    subgroup: Option<String>,
    #[arg(long)]
    subject: String,
    #[arg(long, default_value = "")]
    topic: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    notes: String,
    #[arg(long)]
    cycle_day: CycleDay,
    #[arg(long)]
    period: Period,
}

impl DraftArgs {
    fn into_draft(self, date: Option<NaiveDate>) -> ClassDraft {
        ClassDraft {
            grade: Some(self.grade),
            homeroom: self.homeroom,
            subgroup: self.subgroup,
            subject: self.subject,
            topic: self.topic,
            description: self.description,
            notes: self.notes,
            date,
            cycle_day: Some(self.cycle_day),
            period: Some(self.period),
        }
    }
}

pub fn run(action: ClassAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        ClassAction::Add { fields, date } => {
            let entry = session.planner.add_class(fields.into_draft(Some(date)))?;
            println!("{}", entry.id);
        }
        ClassAction::Schedule { fields } => {
            let today = Local::now().date_naive();
            let entry = session
                .planner
                .schedule_class(fields.into_draft(None), today)?;
            println!("{}", entry.id);
        }
        ClassAction::List {
            grade,
            group,
            period,
            cycle_day,
            completed,
            json,
        } => {
            let filter = ScheduleFilter {
                grade,
                group,
                period,
                cycle_day,
            };
            let entries: Vec<&ClassEntry> = if completed {
                session
                    .planner
                    .registry()
                    .completed()
                    .iter()
                    .filter(|e| filter.matches(e))
                    .collect()
            } else {
                session.planner.filtered_view(&filter)
            };
            if json {
                return print_json(&entries);
            }
            print_entries(&entries);
            return Ok(());
        }
        ClassAction::On { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            print_entries(&session.planner.classes_on(date));
            return Ok(());
        }
        ClassAction::Show { id } => {
            let entry = session
                .planner
                .get_class(&id)
                .ok_or_else(|| format!("class not found: {id}"))?;
            return print_json(entry);
        }
        ClassAction::Update {
            id,
            grade,
            group,
            subject,
            topic,
            description,
            date,
            cycle_day,
            period,
        } => {
            let patch = ClassPatch {
                grade,
                group,
                subject,
                topic,
                description,
                notes: None,
                date,
                cycle_day,
                period,
            };
            if patch.is_empty() {
                return Err("nothing to update".into());
            }
            let entry = session.planner.update_class(&id, patch)?;
            println!("updated {}", entry.id);
        }
        ClassAction::Notes { id, notes } => {
            session.planner.edit_notes(&id, &notes)?;
            println!("notes saved");
        }
        ClassAction::Toggle { id } => {
            let entry = session.planner.toggle_completion(&id)?;
            let state = if entry.completed { "completed" } else { "active" };
            println!("{} is {state}", entry.id);
        }
        ClassAction::Reactivate => {
            let outcome = session.planner.reactivate_all();
            println!("reactivated {}", outcome.reactivated.len());
            for id in &outcome.skipped {
                println!("skipped {id}: slot taken");
            }
        }
        ClassAction::Delete { id } => {
            session.planner.delete_class(&id)?;
            println!("deleted {id}");
        }
        ClassAction::Stats => {
            return print_json(&session.planner.stats());
        }
        ClassAction::Export { out } => {
            let entries = session.planner.export_classes();
            match out {
                Some(path) => {
                    std::fs::write(&path, serde_json::to_string_pretty(&entries)?)?;
                    println!("exported {} classes to {}", entries.len(), path.display());
                }
                None => return print_json(&entries),
            }
            return Ok(());
        }
        ClassAction::Import { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let items: Vec<serde_json::Value> = serde_json::from_str(&raw)
                .map_err(|e| format!("{}: expected a JSON array of classes ({e})", file.display()))?;
            let report = session.planner.import_classes(items);
            println!("imported {}", report.imported.len());
            for failure in &report.failed {
                println!("skipped entry {}: {}", failure.index, failure.error);
            }
        }
    }
    session.commit()
}

fn print_entries(entries: &[&ClassEntry]) {
    if entries.is_empty() {
        println!("No classes.");
        return;
    }
    for e in entries {
        println!(
            "{}  Day {} {} {}  grade {} {}  {}{}",
            e.id,
            e.cycle_day,
            e.period,
            e.date,
            e.grade,
            e.group,
            e.subject,
            if e.topic.is_empty() {
                String::new()
            } else {
                format!(": {}", e.topic)
            }
        );
    }
}
