//! Diagnostic tracing output.
//!
//! The terminal belongs to the UI, so tracing events only go anywhere when a
//! file is given with `--debug-log`. `RUST_LOG` overrides the default filter.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "weai=debug";

pub fn init_tracing(debug_log: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = debug_log else {
        return Ok(());
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|err| -> Box<dyn std::error::Error> { err })?;

    tracing::info!(path, "debug logging enabled");
    Ok(())
}
