// src/logging.rs

//! Logging setup for `pipedag` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `PIPEDAG_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs go to stderr; stdout carries only the run record.

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "PIPEDAG_LOG";

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Initialise the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let level = resolve_level(cli_level, env_value.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))?;

    tracing::debug!(%level, "logging initialised");
    Ok(())
}

/// Effective level from the CLI flag and the raw `PIPEDAG_LOG` value.
///
/// An unparsable environment value falls back to `info`.
pub fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    cli_level
        .map(Level::from)
        .or_else(|| env_value.and_then(|s| s.trim().parse::<Level>().ok()))
        .unwrap_or(Level::INFO)
}
