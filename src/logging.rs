//! File-based tracing setup. The terminal is owned by the TUI, so log records
//! only ever go to a daily rolling file.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Base name of the rolling log file.
pub const LOG_FILE_NAME: &str = "rp-contacts.log";

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `default_filter`. Keep the returned guard alive until exit or buffered
/// records are lost.
pub fn init(log_dir: &Path, default_filter: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let env_directives = env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_filter(env_directives.as_deref(), default_filter)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("logging was already initialized")?;

    tracing::info!(log_dir = %log_dir.display(), "logging initialized");
    Ok(guard)
}

/// Pick the filter: non-empty, parseable `env_directives` (the value of
/// `RUST_LOG`) win, otherwise `default_filter` is used.
pub fn build_filter(env_directives: Option<&str>, default_filter: &str) -> Result<EnvFilter> {
    if let Some(filter) = env_directives
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
    {
        return Ok(filter);
    }

    EnvFilter::try_new(default_filter)
        .with_context(|| format!("invalid log filter `{default_filter}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn env_directives_override_configured_filter() {
        let filter = build_filter(Some("warn"), "debug").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn configured_filter_applies_without_env() {
        let filter = build_filter(None, "debug").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = build_filter(Some("  "), "error").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn unparseable_env_falls_back_to_configured_filter() {
        let filter = build_filter(Some("=[bogus"), "info").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn invalid_configured_filter_is_an_error() {
        assert!(build_filter(None, "=[bogus").is_err());
    }
}
