/// Short product name used when `product.json` does not override it.
pub const DEFAULT_NAME_SHORT: &str = "hearth";

/// Folder below the home directory holding `argv.json`.
pub const DEFAULT_DATA_FOLDER_NAME: &str = ".hearth";

/// Company reported to the crash capture subsystem when the product omits one.
pub const DEFAULT_COMPANY_NAME: &str = "Hearth Contributors";

/// File name of the persistent switch store.
pub const ARGV_CONFIG_FILE_NAME: &str = "argv.json";

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Suffix appended to product and folder names in development builds.
pub(crate) const DEVELOPMENT_SUFFIX: &str = "-dev";

/// Default logging format for the binary.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

pub(crate) fn default_name_short() -> String {
    DEFAULT_NAME_SHORT.to_owned()
}

pub(crate) fn default_data_folder_name() -> String {
    DEFAULT_DATA_FOLDER_NAME.to_owned()
}
