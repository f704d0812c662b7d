use clap::Subcommand;
use cycleplanner_core::SchoolYear;

use crate::session::{CliResult, Session};

#[derive(Subcommand)]
pub enum YearAction {
    /// Create a school year (e.g. "2026-2027")
    Create { year: SchoolYear },
    /// Make a school year current
    Switch { year: SchoolYear },
    /// List known school years
    List,
    /// Print the current school year
    Current,
}

pub fn run(action: YearAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        YearAction::Create { year } => {
            session.planner.create_school_year(year)?;
            println!("created {year}");
        }
        YearAction::Switch { year } => {
            let dates = session.planner.switch_school_year(year)?;
            println!("switched to {year}");
            for (day, date) in &dates {
                println!("  Day {day}: {date}");
            }
        }
        YearAction::List => {
            let current = session.planner.current_school_year();
            for year in session.planner.school_years() {
                let marker = if *year == current { "*" } else { " " };
                println!("{marker} {year}");
            }
            return Ok(());
        }
        YearAction::Current => {
            println!("{}", session.planner.current_school_year());
            return Ok(());
        }
    }
    session.commit()
}
