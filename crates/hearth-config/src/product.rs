//! Static description of the shipped product.
//!
//! Release builds ship a `product.json` beside the executable; development
//! checkouts run without one and fall back to [`Product::default`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults::{default_data_folder_name, default_name_short};

/// File name of the product descriptor.
const PRODUCT_FILE_NAME: &str = "product.json";

/// Product metadata consumed by the bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Short product name, used for the user-data folder.
    #[serde(default = "default_name_short")]
    pub name_short: String,
    /// Folder below the home directory holding `argv.json`.
    #[serde(default = "default_data_folder_name")]
    pub data_folder_name: String,
    /// Source commit of the build, when known.
    #[serde(default)]
    pub commit: Option<String>,
    /// Identity reported to the crash capture subsystem.
    #[serde(default)]
    pub crash_reporter: Option<CrashReporterIdentity>,
    /// Remote crash submission endpoints by target.
    #[serde(default)]
    pub crash_endpoints: CrashEndpoints,
    /// Present when macOS ships as a single universal binary.
    #[serde(default)]
    pub darwin_universal_asset_id: Option<String>,
}

impl Default for Product {
    fn default() -> Self {
        Self {
            name_short: default_name_short(),
            data_folder_name: default_data_folder_name(),
            commit: None,
            crash_reporter: None,
            crash_endpoints: CrashEndpoints::default(),
            darwin_universal_asset_id: None,
        }
    }
}

/// Company and product names reported with crash dumps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashReporterIdentity {
    /// Company name override.
    #[serde(default)]
    pub company_name: Option<String>,
    /// Product name override.
    #[serde(default)]
    pub product_name: Option<String>,
}

/// Per-target crash submission endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CrashEndpoints {
    /// Windows on x64.
    #[serde(rename = "win32-x64", default)]
    pub win32_x64: Option<String>,
    /// Windows on arm64.
    #[serde(rename = "win32-arm64", default)]
    pub win32_arm64: Option<String>,
    /// Universal macOS build.
    #[serde(rename = "darwin-universal", default)]
    pub darwin_universal: Option<String>,
    /// macOS on x64.
    #[serde(rename = "darwin", default)]
    pub darwin_x64: Option<String>,
    /// macOS on arm64.
    #[serde(rename = "darwin-arm64", default)]
    pub darwin_arm64: Option<String>,
    /// Linux on x64.
    #[serde(rename = "linux-x64", default)]
    pub linux_x64: Option<String>,
}

/// Errors raised while loading `product.json`.
#[derive(Debug, Error)]
pub enum ProductError {
    /// The descriptor exists but could not be read.
    #[error("failed to read product descriptor '{path}': {source}")]
    Read {
        /// Descriptor path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The descriptor is not valid JSON for [`Product`].
    #[error("failed to parse product descriptor '{path}': {source}")]
    Parse {
        /// Descriptor path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl Product {
    /// Loads the descriptor at `path`, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError`] when the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, ProductError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ProductError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| ProductError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `product.json` from an installation directory.
    ///
    /// # Errors
    ///
    /// Same as [`Product::load`].
    pub fn load_installed(install_root: &Path) -> Result<Self, ProductError> {
        Self::load(&install_root.join(PRODUCT_FILE_NAME))
    }
}
