//! Snapshot of the environment markers consulted during bootstrap.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};

/// Root directory of a portable installation.
pub const PORTABLE_ENV_VAR: &str = "HEARTH_PORTABLE";
/// Marks a development build running out of sources.
pub const DEV_ENV_VAR: &str = "HEARTH_DEV";
/// Overrides the platform user-data root.
pub const APPDATA_ENV_VAR: &str = "HEARTH_APPDATA";
/// Serialised language configuration published for child processes.
pub const NLS_CONFIG_ENV_VAR: &str = "HEARTH_NLS_CONFIG";
/// Code-cache directory published for child processes.
pub const CODE_CACHE_PATH_ENV_VAR: &str = "HEARTH_CODE_CACHE_PATH";
/// Log filter expression for the bootstrap telemetry.
pub const LOG_FILTER_ENV_VAR: &str = "HEARTH_LOG";
/// Log output format for the bootstrap telemetry.
pub const LOG_FORMAT_ENV_VAR: &str = "HEARTH_LOG_FORMAT";

/// Environment-derived inputs, captured once at process entry.
///
/// Empty variables are treated as unset. Paths that are not valid UTF-8 are
/// ignored so downstream consumers can publish them as environment strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootEnvironment {
    portable_root: Option<Utf8PathBuf>,
    appdata_root: Option<Utf8PathBuf>,
    development: bool,
    home_dir: Option<Utf8PathBuf>,
    config_dir: Option<Utf8PathBuf>,
    log_filter: Option<String>,
    log_format: Option<String>,
}

impl BootEnvironment {
    /// Captures the current process environment.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            portable_root: env_path(PORTABLE_ENV_VAR),
            appdata_root: env_path(APPDATA_ENV_VAR),
            development: env::var_os(DEV_ENV_VAR).is_some_and(|value| !value.is_empty()),
            home_dir: dirs::home_dir().and_then(utf8),
            config_dir: dirs::config_dir().and_then(utf8),
            log_filter: env_text(LOG_FILTER_ENV_VAR),
            log_format: env_text(LOG_FORMAT_ENV_VAR),
        }
    }

    /// Sets the portable installation root.
    #[must_use]
    pub fn with_portable_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.portable_root = Some(root.into());
        self
    }

    /// Sets the user-data root override.
    #[must_use]
    pub fn with_appdata_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.appdata_root = Some(root.into());
        self
    }

    /// Marks the snapshot as a development build.
    #[must_use]
    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Sets the user's home directory.
    #[must_use]
    pub fn with_home_dir(mut self, home: impl Into<Utf8PathBuf>) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    /// Sets the platform configuration root.
    #[must_use]
    pub fn with_config_dir(mut self, config: impl Into<Utf8PathBuf>) -> Self {
        self.config_dir = Some(config.into());
        self
    }

    /// Sets the telemetry log filter.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Portable installation root, when running in portable mode.
    #[must_use]
    pub fn portable_root(&self) -> Option<&Utf8Path> {
        self.portable_root.as_deref()
    }

    /// Whether the process runs in portable mode.
    #[must_use]
    pub fn is_portable(&self) -> bool {
        self.portable_root.is_some()
    }

    /// User-data root override.
    #[must_use]
    pub fn appdata_root(&self) -> Option<&Utf8Path> {
        self.appdata_root.as_deref()
    }

    /// Whether the process is a development build.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.development
    }

    /// The user's home directory.
    #[must_use]
    pub fn home_dir(&self) -> Option<&Utf8Path> {
        self.home_dir.as_deref()
    }

    /// The platform configuration root.
    #[must_use]
    pub fn config_dir(&self) -> Option<&Utf8Path> {
        self.config_dir.as_deref()
    }

    /// Log filter expression requested through the environment.
    #[must_use]
    pub fn log_filter(&self) -> Option<&str> {
        self.log_filter.as_deref()
    }

    /// Log format requested through the environment.
    #[must_use]
    pub fn log_format(&self) -> Option<&str> {
        self.log_format.as_deref()
    }
}

fn env_path(key: &str) -> Option<Utf8PathBuf> {
    env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .and_then(utf8)
}

fn env_text(key: &str) -> Option<String> {
    env::var_os(key)
        .filter(|value| !value.is_empty())
        .and_then(|value: OsString| value.into_string().ok())
}

fn utf8(path: PathBuf) -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).ok()
}
