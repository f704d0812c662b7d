use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod session;

#[derive(Parser)]
#[command(name = "cycleplanner", version, about = "Cycle-day class planner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// School years
    Year {
        #[command(subcommand)]
        action: commands::year::YearAction,
    },
    /// Non-instructional days of the current school year
    Holiday {
        #[command(subcommand)]
        action: commands::holiday::HolidayAction,
    },
    /// Cycle-day window, anchors and overrides
    Cycle {
        #[command(subcommand)]
        action: commands::cycle::CycleAction,
    },
    /// Class entries
    Class {
        #[command(subcommand)]
        action: commands::class::ClassAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Remote store synchronization
    Sync {
        #[command(subcommand)]
        action: commands::sync::SyncAction,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init();

    let result = match cli.command {
        Commands::Year { action } => commands::year::run(action),
        Commands::Holiday { action } => commands::holiday::run(action),
        Commands::Cycle { action } => commands::cycle::run(action),
        Commands::Class { action } => commands::class::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Sync { action } => commands::sync::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
