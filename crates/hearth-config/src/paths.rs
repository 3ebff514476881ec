//! Derives the filesystem locations the bootstrap depends on.
//!
//! Every path honours portable mode first: a portable installation keeps all
//! mutable state beside the executable and never touches the user profile.

use std::env;

use camino::{Utf8Path, Utf8PathBuf};

use crate::ParsedArguments;
use crate::defaults::{ARGV_CONFIG_FILE_NAME, DEVELOPMENT_SUFFIX};
use crate::environment::BootEnvironment;
use crate::product::Product;

/// Folder below the user-data directory holding per-commit code caches.
const CODE_CACHE_FOLDER: &str = "CachedData";
/// Folder below the portable root holding user data.
const PORTABLE_USER_DATA_FOLDER: &str = "user-data";

/// Canonical paths resolved before the host runtime becomes ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootPaths {
    argv_config: Utf8PathBuf,
    user_data_dir: Utf8PathBuf,
    code_cache_dir: Option<Utf8PathBuf>,
}

impl BootPaths {
    /// Derives every bootstrap path from the product, environment and CLI.
    #[must_use]
    pub fn derive(product: &Product, environment: &BootEnvironment, args: &ParsedArguments) -> Self {
        let argv_config = argv_config_path(product, environment);
        let user_data_dir = user_data_path(product, environment, args);
        let code_cache_dir = code_cache_path(product, environment, args, &user_data_dir);
        Self {
            argv_config,
            user_data_dir,
            code_cache_dir,
        }
    }

    /// Location of the persistent switch store.
    #[must_use]
    pub fn argv_config(&self) -> &Utf8Path {
        &self.argv_config
    }

    /// Directory holding all per-user mutable state.
    #[must_use]
    pub fn user_data_dir(&self) -> &Utf8Path {
        &self.user_data_dir
    }

    /// Per-commit code-cache directory, absent when caching is disabled.
    #[must_use]
    pub fn code_cache_dir(&self) -> Option<&Utf8Path> {
        self.code_cache_dir.as_deref()
    }
}

fn argv_config_path(product: &Product, environment: &BootEnvironment) -> Utf8PathBuf {
    if let Some(portable) = environment.portable_root() {
        return portable.join(ARGV_CONFIG_FILE_NAME);
    }

    let folder = if environment.is_development() {
        format!("{}{DEVELOPMENT_SUFFIX}", product.data_folder_name)
    } else {
        product.data_folder_name.clone()
    };
    home_or_temp(environment)
        .join(folder)
        .join(ARGV_CONFIG_FILE_NAME)
}

fn user_data_path(
    product: &Product,
    environment: &BootEnvironment,
    args: &ParsedArguments,
) -> Utf8PathBuf {
    let product_name = if environment.is_development() {
        format!("{}{DEVELOPMENT_SUFFIX}", product.name_short)
    } else {
        product.name_short.clone()
    };

    if let Some(portable) = environment.portable_root() {
        return portable.join(PORTABLE_USER_DATA_FOLDER);
    }
    if let Some(appdata) = environment.appdata_root() {
        return appdata.join(product_name);
    }
    if let Some(explicit) = args.user_data_dir() {
        return absolute(Utf8Path::new(explicit));
    }

    let root = environment
        .config_dir()
        .map(Utf8Path::to_path_buf)
        .or_else(|| environment.home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(temp_root);
    root.join(product_name)
}

fn code_cache_path(
    product: &Product,
    environment: &BootEnvironment,
    args: &ParsedArguments,
    user_data_dir: &Utf8Path,
) -> Option<Utf8PathBuf> {
    if args.no_cached_data() || environment.is_development() {
        return None;
    }
    let commit = product.commit.as_deref().filter(|commit| !commit.is_empty())?;
    Some(user_data_dir.join(CODE_CACHE_FOLDER).join(commit))
}

/// Resolves `path` against the working directory without touching the disk.
fn absolute(path: &Utf8Path) -> Utf8PathBuf {
    std::path::absolute(path)
        .ok()
        .and_then(|resolved| Utf8PathBuf::from_path_buf(resolved).ok())
        .unwrap_or_else(|| path.to_path_buf())
}

fn home_or_temp(environment: &BootEnvironment) -> Utf8PathBuf {
    environment
        .home_dir()
        .map_or_else(temp_root, Utf8Path::to_path_buf)
}

fn temp_root() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
