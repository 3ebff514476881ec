//! Persistent command-line preferences stored in `argv.json`.
//!
//! The file is user-editable and written in a relaxed JSON dialect that
//! permits comments. The store is deliberately forgiving: a missing file is
//! replaced by a commented template and every other failure degrades to an
//! empty configuration with a warning.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, warn};

const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::switch_store");

/// Template written when no `argv.json` exists yet.
pub const DEFAULT_ARGV_CONTENT: &str = "\
// This configuration file allows you to pass permanent command line arguments to the application.
// Only a subset of arguments is currently supported to reduce the likelihood of breaking
// the installation.
//
// PLEASE DO NOT CHANGE WITHOUT UNDERSTANDING THE IMPACT
//
// NOTE: Changing this file requires a restart of the application.
{
\t// Use software rendering instead of hardware accelerated rendering.
\t// This can help in cases where you see rendering issues.
\t// \"disable-hardware-acceleration\": true
}";

/// Loose truthiness for stored values.
///
/// `null`, `false`, zero and the empty string are falsy. Everything else is
/// truthy, including the string `"false"`.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Durable switch values keyed by option name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistentConfig {
    values: Map<String, Value>,
}

impl PersistentConfig {
    /// Builds a configuration from already-parsed values.
    #[must_use]
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Returns the raw value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the string stored for `key`.
    #[must_use]
    pub fn string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Whether `key` holds `true` or the string `"true"`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(Value::Bool(true)))
            || self.string(key) == Some("true")
    }

    /// Whether `key` holds a truthy value.
    ///
    /// Unlike [`PersistentConfig::flag`], any non-empty string, non-zero
    /// number, array or object counts.
    #[must_use]
    pub fn truthy(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(is_truthy)
    }

    /// Iterates over every stored entry.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Errors raised internally while reading the store.
#[derive(Debug, Error)]
enum SwitchStoreError {
    #[error("configuration file '{path}' does not exist")]
    Missing { path: Utf8PathBuf },
    #[error("failed to read '{path}': {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: json5::Error,
    },
    #[error("'{path}' must contain a JSON object at the top level")]
    NotAnObject { path: Utf8PathBuf },
}

/// Reader for the persistent switch file.
#[derive(Debug, Clone)]
pub struct SwitchStore {
    path: Utf8PathBuf,
}

impl SwitchStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Reads the persistent configuration, never failing.
    ///
    /// A missing file is materialised from [`DEFAULT_ARGV_CONTENT`]; any other
    /// failure is logged and yields an empty configuration.
    #[must_use]
    pub fn read(&self) -> PersistentConfig {
        match self.load() {
            Ok(config) => config,
            Err(SwitchStoreError::Missing { .. }) => {
                self.materialise_default();
                PersistentConfig::default()
            }
            Err(other) => {
                warn!(
                    target: STORE_TARGET,
                    path = %self.path,
                    error = %other,
                    "unable to read persistent switches, falling back to defaults"
                );
                PersistentConfig::default()
            }
        }
    }

    fn load(&self) -> Result<PersistentConfig, SwitchStoreError> {
        let text = fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                SwitchStoreError::Missing {
                    path: self.path.clone(),
                }
            } else {
                SwitchStoreError::Read {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        if text.trim().is_empty() {
            return Ok(PersistentConfig::default());
        }

        let value: Value = json5::from_str(&text).map_err(|source| SwitchStoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        match value {
            Value::Object(values) => Ok(PersistentConfig::from_map(values)),
            _ => Err(SwitchStoreError::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }

    fn materialise_default(&self) {
        if let Err(source) = self.write_default() {
            error!(
                target: STORE_TARGET,
                path = %self.path,
                error = %source,
                "unable to create persistent switch file, falling back to defaults"
            );
        }
    }

    fn write_default(&self) -> io::Result<()> {
        // Only the data folder itself is expected to be missing.
        if let Some(parent) = self.path.parent()
            && !parent.as_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir(parent)?;
        }
        fs::write(&self.path, DEFAULT_ARGV_CONTENT)
    }
}
