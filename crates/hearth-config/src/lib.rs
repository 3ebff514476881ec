//! Startup configuration shared by the Hearth host bootstrap.
//!
//! This crate owns the inputs the bootstrap sequence reads before the host
//! runtime becomes ready:
//!
//! - [`parse_arguments`] turns the raw invocation tokens into an immutable
//!   [`ParsedArguments`] record with typed accessors for declared options.
//! - [`SwitchStore`] reads the user-editable `argv.json` file holding durable
//!   command-line preferences, materialising a commented default on first run.
//! - [`Product`] describes the shipped product (names, commit, crash endpoints).
//! - [`BootEnvironment`] snapshots the environment markers for portable and
//!   development builds, and [`BootPaths`] derives every filesystem location
//!   from those inputs.
//!
//! Nothing in this crate talks to the host runtime. The resolution logic that
//! applies these inputs lives in `hearth-boot`.

mod args;
mod defaults;
mod environment;
mod logging;
mod paths;
mod platform;
mod product;
mod switch_store;

pub use args::{ArgValue, ParsedArguments, parse_arguments};
pub use defaults::{
    ARGV_CONFIG_FILE_NAME, DEFAULT_COMPANY_NAME, DEFAULT_DATA_FOLDER_NAME, DEFAULT_LOG_FILTER,
    DEFAULT_NAME_SHORT, default_log_format,
};
pub use environment::{
    APPDATA_ENV_VAR, BootEnvironment, CODE_CACHE_PATH_ENV_VAR, DEV_ENV_VAR, LOG_FILTER_ENV_VAR,
    LOG_FORMAT_ENV_VAR, NLS_CONFIG_ENV_VAR, PORTABLE_ENV_VAR,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use paths::BootPaths;
pub use platform::{Arch, HostTarget, Platform};
pub use product::{CrashEndpoints, CrashReporterIdentity, Product, ProductError};
pub use switch_store::{DEFAULT_ARGV_CONTENT, PersistentConfig, SwitchStore, is_truthy};
