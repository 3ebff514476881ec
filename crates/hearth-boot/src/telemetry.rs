//! Structured telemetry initialisation for the host process.

use std::io::{self, IsTerminal};

use hearth_config::{BootEnvironment, DEFAULT_LOG_FILTER, LogFormat, default_log_format};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Log filter and output format for the global subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    filter: String,
    format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_owned(),
            format: default_log_format(),
        }
    }
}

impl TelemetryConfig {
    /// Reads `HEARTH_LOG` and `HEARTH_LOG_FORMAT` from the captured
    /// environment; an unknown format falls back to the default.
    #[must_use]
    pub fn from_environment(environment: &BootEnvironment) -> Self {
        let filter = environment
            .log_filter()
            .unwrap_or(DEFAULT_LOG_FILTER)
            .to_owned();
        let format = environment
            .log_format()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(default_log_format);
        Self { filter, format }
    }

    /// Filter directive.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Output format.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls are idempotent and return a fresh [`TelemetryHandle`]
/// without touching the global state again.
///
/// # Errors
///
/// Fails when the filter does not parse or another subscriber is already
/// installed.
pub fn initialise(config: &TelemetryConfig) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            // Stdout carries the launch summary.
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_overrides_defaults() {
        let environment = BootEnvironment::default().with_log_filter("hearth_boot=debug");
        let config = TelemetryConfig::from_environment(&environment);
        assert_eq!(config.filter(), "hearth_boot=debug");
        assert_eq!(config.format(), LogFormat::Compact);
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let config = TelemetryConfig {
            filter: "hearth_boot=loud".to_owned(),
            format: LogFormat::Compact,
        };
        assert!(matches!(
            install_subscriber(&config),
            Err(TelemetryError::Filter(_))
        ));
    }
}
