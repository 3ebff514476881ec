//! Values published to the process environment for child processes.

use std::env;

use camino::Utf8Path;
use hearth_config::{CODE_CACHE_PATH_ENV_VAR, NLS_CONFIG_ENV_VAR};

use crate::locale::NlsConfiguration;

/// Receives environment variables published by the bootstrap.
pub trait EnvironmentSink {
    /// Sets `key` to `value`.
    fn publish(&self, key: &str, value: &str);
}

/// Sink that writes into the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl EnvironmentSink for ProcessEnvironment {
    fn publish(&self, key: &str, value: &str) {
        // SAFETY: the only threads besides the caller are idle blocking-pool
        // workers from finished `tokio::fs` calls, and none of them reads the
        // environment. The application layer has not started yet.
        unsafe {
            env::set_var(key, value);
        }
    }
}

/// Publishes the language configuration and code-cache path.
///
/// The code-cache variable is set to an empty string when caching is off.
///
/// # Errors
///
/// Returns the serialisation error if the language configuration cannot be
/// encoded; nothing is published in that case.
pub(crate) fn publish_launch_environment(
    sink: &dyn EnvironmentSink,
    nls: &NlsConfiguration,
    code_cache_dir: Option<&Utf8Path>,
) -> Result<(), serde_json::Error> {
    let encoded = serde_json::to_string(nls)?;
    sink.publish(NLS_CONFIG_ENV_VAR, &encoded);
    sink.publish(
        CODE_CACHE_PATH_ENV_VAR,
        code_cache_dir.map_or("", Utf8Path::as_str),
    );
    Ok(())
}
