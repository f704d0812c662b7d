use chrono::{Local, NaiveDate};
use clap::Subcommand;
use cycleplanner_core::{CycleDates, CycleDay, Period};

use crate::session::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum CycleAction {
    /// Show the current cycle window
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Cycle day of a date (defaults to today)
    Day { date: Option<NaiveDate> },
    /// Recompute the window from the start day and overrides
    Recompute,
    /// Set the day of the anchor month the cycle starts on (1-6)
    StartDay { day: u32 },
    /// Pin one cycle day of the window to a date
    SetDate { day: CycleDay, date: NaiveDate },
    /// Re-anchor a month so its first instructional day is `first_day`
    Month {
        /// Calendar month, 1-12
        month: u32,
        first_day: CycleDay,
        /// Print the first six assignments without saving anything
        #[arg(long)]
        preview: bool,
        /// Remember the anchor for this month
        #[arg(long, conflicts_with = "preview")]
        save: bool,
    },
    /// Force the cycle day of one date
    Override { date: NaiveDate, day: CycleDay },
    /// Remove a forced cycle day
    ClearOverride { date: NaiveDate },
    /// Six periods by six cycle days of the current window
    Grid {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: CycleAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        CycleAction::Show { json } => {
            let dates = session.planner.cycle_dates()?;
            if json {
                return print_json(dates);
            }
            print_window(dates);
            return Ok(());
        }
        CycleAction::Day { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let day = session.planner.cycle_day_for_date(date)?;
            println!("{date}: Day {day}");
            return Ok(());
        }
        CycleAction::Recompute => {
            let dates = session.planner.recompute_cycle_dates()?;
            print_window(&dates);
        }
        CycleAction::StartDay { day } => {
            let dates = session.planner.set_start_day(day)?;
            print_window(&dates);
        }
        CycleAction::SetDate { day, date } => {
            let dates = session.planner.set_cycle_date(day, date)?;
            print_window(&dates);
        }
        CycleAction::Month {
            month,
            first_day,
            preview,
            save,
        } => {
            if !(1..=12).contains(&month) {
                return Err(format!("month must be 1-12, got {month}").into());
            }
            let index = month - 1;
            if preview {
                let dates = session.planner.preview_month_cycle(index, first_day)?;
                print_window(&dates);
                return Ok(());
            }
            let dates = if save {
                session.planner.set_month_first_cycle_day(index, first_day)?
            } else {
                session.planner.compute_month_cycle_dates(index, first_day)?
            };
            print_window(&dates);
        }
        CycleAction::Override { date, day } => {
            session.planner.set_override(date, day)?;
            println!("{date} forced to Day {day}");
        }
        CycleAction::ClearOverride { date } => {
            let day = session.planner.clear_override(date)?;
            println!("{date} no longer forced to Day {day}");
        }
        CycleAction::Grid { json } => {
            let grid = session.planner.cycle_grid()?;
            if json {
                return print_json(&grid);
            }
            for period in Period::ALL {
                println!("{period} ({})", period.time_range());
                for day in CycleDay::all() {
                    let Some(cell) = grid.cell(period, day) else {
                        continue;
                    };
                    let date = cell
                        .date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".into());
                    let classes: Vec<String> = cell
                        .classes
                        .iter()
                        .map(|c| format!("{} {} {}", c.grade, c.group, c.subject))
                        .collect();
                    println!("  Day {day} {date}: {}", classes.join(", "));
                }
            }
            return Ok(());
        }
    }
    session.commit()
}

fn print_window(dates: &CycleDates) {
    if dates.is_empty() {
        println!("No cycle dates.");
    }
    for (day, date) in dates {
        println!("Day {day}: {}", date.format("%a %Y-%m-%d"));
    }
}
