//! Diagnostics for the simulator, filtered through `RUST_LOG` (default `warn`).
//!
//! The terminal UI owns the screen, so in that mode events only go somewhere
//! when a log file is given. Headless runs write them to stderr.

use std::{fs::File, path::Path, sync::Mutex};

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    Off,
}

pub fn init(target: LogTarget<'_>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match target {
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).compact())
            .init(),
        LogTarget::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .compact(),
                )
                .init();
        }
        LogTarget::Off => {}
    }
    Ok(())
}
