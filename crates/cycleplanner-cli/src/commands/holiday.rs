use chrono::NaiveDate;
use clap::Subcommand;

use crate::session::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum HolidayAction {
    /// Mark a date non-instructional
    Add {
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
        /// Reason shown in listings
        reason: String,
    },
    /// Make a date instructional again
    Remove { date: NaiveDate },
    /// List non-instructional days of the current school year
    List {
        #[arg(long)]
        json: bool,
    },
    /// Report whether classes are held on a date
    Check { date: NaiveDate },
}

pub fn run(action: HolidayAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        HolidayAction::Add { date, reason } => {
            session.planner.add_non_instructional_day(date, &reason)?;
            println!("{date} marked non-instructional: {reason}");
        }
        HolidayAction::Remove { date } => {
            session.planner.remove_non_instructional_day(date)?;
            println!("{date} is instructional again");
        }
        HolidayAction::List { json } => {
            let days = session.planner.non_instructional_days()?;
            if json {
                return print_json(&days);
            }
            if days.is_empty() {
                println!("No non-instructional days.");
            }
            for day in days {
                println!("{}  {}", day.date, day.reason);
            }
            return Ok(());
        }
        HolidayAction::Check { date } => {
            if session.planner.is_instructional_day(date)? {
                println!("{date}: instructional");
            } else {
                println!("{date}: no classes");
            }
            return Ok(());
        }
    }
    session.commit()
}
