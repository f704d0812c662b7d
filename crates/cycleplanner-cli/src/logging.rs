//! Log output to stderr.
//!
//! `CYCLEPLANNER_LOG` takes an `EnvFilter` directive and wins over the
//! `[logging]` section of the config file.

use cycleplanner_core::storage::LoggingConfig;
use cycleplanner_core::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_ENV: &str = "CYCLEPLANNER_LOG";

pub fn init() {
    // A broken config file is reported by the command itself.
    let logging = Config::load().map(|c| c.logging).unwrap_or_default();
    init_with(&logging);
}

fn init_with(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,cycleplanner_core={}", logging.level)));

    let result = if logging.json {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_filter(filter),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_filter(filter),
            )
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("warning: logging disabled: {e}");
    }
}
