//! Crash capture configuration.
//!
//! Crash capture runs only when explicitly requested: either through
//! `--crash-reporter-directory`, which keeps dumps local, or through
//! `enable-crash-reporter` in `argv.json`, which uploads to the product's
//! endpoint when a valid `crash-reporter-id` is also stored there.

use std::fs;
use std::io;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use hearth_config::{
    Arch, DEFAULT_COMPANY_NAME, HostTarget, ParsedArguments, PersistentConfig, Platform, Product,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use strum::Display;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::host::{CrashReporterOptions, HostPath, HostRuntime};
use crate::process_argv::ProcessArgv;

const CRASH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::crash_reporter");

const ENABLE_KEY: &str = "enable-crash-reporter";
const ID_KEY: &str = "crash-reporter-id";
const ID_SWITCH: &str = "--crash-reporter-id";
const DEVELOPMENT_PRODUCT_SUFFIX: &str = " Dev";
const ID_QUERY_PARAMETERS: [&str; 3] = ["uid", "iid", "sid"];

// `None` only if the pattern fails to compile, which rejects every id.
static CRASH_REPORTER_ID: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").ok()
});

/// How crash dumps are handled for this launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CrashReportingMode {
    /// Crash capture was not started.
    Disabled,
    /// Capture started with the runtime's default dump location and no upload.
    DefaultDirectory,
    /// Dumps are written to a caller-chosen directory.
    LocalDirectory,
    /// Dumps are uploaded to the product's endpoint.
    RemoteUpload,
}

/// Outcome of crash-reporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrashReportingDecision {
    /// Selected mode.
    pub mode: CrashReportingMode,
    /// Dump directory or submission URL, depending on `mode`.
    pub target: Option<String>,
}

impl CrashReportingDecision {
    /// Decision for a launch without crash capture.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            mode: CrashReportingMode::Disabled,
            target: None,
        }
    }
}

/// Fatal crash-reporter configuration errors.
#[derive(Debug, Error)]
pub enum CrashReporterError {
    /// `--crash-reporter-directory` is relative.
    #[error("crash reporter directory '{path}' must be absolute")]
    NotAbsolute {
        /// Normalised directory.
        path: Utf8PathBuf,
    },
    /// The directory did not exist and could not be created.
    #[error("failed to create crash reporter directory '{path}': {source}")]
    CreateDirectory {
        /// Normalised directory.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl CrashReporterError {
    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::NotAbsolute { .. } | Self::CreateDirectory { .. } => 1,
        }
    }
}

/// Whether crash capture is requested for this launch.
#[must_use]
pub fn crash_reporting_enabled(args: &ParsedArguments, config: &PersistentConfig) -> bool {
    args.crash_reporter_directory().is_some()
        || (config.truthy(ENABLE_KEY) && !args.disable_crash_reporter())
}

/// Whether `id` is a well-formed crash-reporter identifier.
#[must_use]
pub fn is_valid_crash_reporter_id(id: &str) -> bool {
    CRASH_REPORTER_ID
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(id))
}

/// Submission endpoint for `target`, if the product declares one.
#[must_use]
pub fn select_endpoint(product: &Product, target: HostTarget) -> Option<&str> {
    let endpoints = &product.crash_endpoints;
    let endpoint = match (target.platform, target.arch) {
        (Platform::Windows, Arch::X64) => endpoints.win32_x64.as_deref(),
        (Platform::Windows, Arch::Arm64) => endpoints.win32_arm64.as_deref(),
        (Platform::MacOs, _) if product.darwin_universal_asset_id.is_some() => {
            endpoints.darwin_universal.as_deref()
        }
        (Platform::MacOs, Arch::X64) => endpoints.darwin_x64.as_deref(),
        (Platform::MacOs, Arch::Arm64) => endpoints.darwin_arm64.as_deref(),
        (Platform::Linux, _) => endpoints.linux_x64.as_deref(),
        _ => None,
    };
    endpoint.filter(|endpoint| !endpoint.is_empty())
}

/// Product facts the crash reporter depends on.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CrashReporterContext<'a> {
    pub(crate) product: &'a Product,
    pub(crate) target: HostTarget,
    pub(crate) development: bool,
}

/// Configures and starts crash capture when requested.
///
/// # Errors
///
/// Returns [`CrashReporterError`] when the local dump directory is unusable;
/// crash capture is not started in that case.
pub(crate) fn configure_crash_reporter<H: HostRuntime>(
    args: &ParsedArguments,
    config: &PersistentConfig,
    context: CrashReporterContext<'_>,
    host: &H,
    argv: &mut ProcessArgv,
) -> Result<CrashReportingDecision, CrashReporterError> {
    if !crash_reporting_enabled(args, config) {
        return Ok(CrashReportingDecision::disabled());
    }

    let local_directory = args
        .crash_reporter_directory()
        .map(prepare_local_directory)
        .transpose()?;

    let mut submit_url = String::new();
    if let Some(directory) = &local_directory {
        info!(
            target: CRASH_TARGET,
            path = %directory,
            "writing crash dumps to the requested directory"
        );
        host.set_path(HostPath::CrashDumps, directory);
    } else if let Some((url, id)) = remote_submission(config, context) {
        argv.insert_before_end_of_options([ID_SWITCH.to_owned(), id.to_owned()]);
        submit_url = url;
    }

    let upload_to_server = !context.development && !submit_url.is_empty() && local_directory.is_none();
    let options = CrashReporterOptions {
        company_name: company_name(context.product),
        product_name: product_name(context.product, context.development),
        submit_url,
        upload_to_server,
        compress: true,
    };
    host.start_crash_reporter(&options);

    let decision = match local_directory {
        Some(directory) => CrashReportingDecision {
            mode: CrashReportingMode::LocalDirectory,
            target: Some(directory.into_string()),
        },
        None if upload_to_server => CrashReportingDecision {
            mode: CrashReportingMode::RemoteUpload,
            target: Some(options.submit_url),
        },
        None => CrashReportingDecision {
            mode: CrashReportingMode::DefaultDirectory,
            target: None,
        },
    };
    Ok(decision)
}

fn prepare_local_directory(raw: &str) -> Result<Utf8PathBuf, CrashReporterError> {
    let path = normalize(Utf8Path::new(raw));
    if !path.is_absolute() {
        return Err(CrashReporterError::NotAbsolute { path });
    }
    if !path.exists()
        && let Err(source) = fs::create_dir_all(&path)
    {
        return Err(CrashReporterError::CreateDirectory { path, source });
    }
    Ok(path)
}

/// Endpoint with the stored id attached, plus the id itself.
fn remote_submission<'a>(
    config: &'a PersistentConfig,
    context: CrashReporterContext<'_>,
) -> Option<(String, &'a str)> {
    let id = config.string(ID_KEY)?;
    if !is_valid_crash_reporter_id(id) {
        return None;
    }
    let endpoint = select_endpoint(context.product, context.target)?;
    let mut url = match Url::parse(endpoint) {
        Ok(url) => url,
        Err(error) => {
            warn!(target: CRASH_TARGET, endpoint, %error, "ignoring malformed crash endpoint");
            return None;
        }
    };
    {
        let mut query = url.query_pairs_mut();
        for parameter in ID_QUERY_PARAMETERS {
            query.append_pair(parameter, id);
        }
    }
    Some((url.into(), id))
}

fn company_name(product: &Product) -> String {
    product
        .crash_reporter
        .as_ref()
        .and_then(|identity| identity.company_name.as_deref())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_COMPANY_NAME)
        .to_owned()
}

fn product_name(product: &Product, development: bool) -> String {
    let name = product
        .crash_reporter
        .as_ref()
        .and_then(|identity| identity.product_name.as_deref())
        .filter(|name| !name.is_empty())
        .unwrap_or(&product.name_short);
    if development {
        format!("{name}{DEVELOPMENT_PRODUCT_SUFFIX}")
    } else {
        name.to_owned()
    }
}

/// Lexically resolves `.` and `..` components.
fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Utf8Component::Normal(_))) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use hearth_config::{CrashEndpoints, parse_arguments};
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    const VALID_ID: &str = "0f1e2d3c-4b5a-6978-8a9b-acbdcedff001";

    fn config(value: serde_json::Value) -> PersistentConfig {
        match value {
            serde_json::Value::Object(map) => PersistentConfig::from_map(map),
            _ => PersistentConfig::default(),
        }
    }

    fn product() -> Product {
        Product {
            crash_endpoints: CrashEndpoints {
                win32_x64: Some("https://crash.example/win?key=w".to_owned()),
                darwin_universal: Some("https://crash.example/mac-universal".to_owned()),
                darwin_arm64: Some("https://crash.example/mac-arm".to_owned()),
                linux_x64: Some("https://crash.example/linux?key=l".to_owned()),
                ..CrashEndpoints::default()
            },
            ..Product::default()
        }
    }

    #[rstest]
    #[case(VALID_ID, true)]
    #[case("0F1E2D3C-4B5A-6978-8A9B-ACBDCEDFF001", true)]
    #[case("0f1e2d3c-4b5a-6978-8a9b-acbdcedff00", false)]
    #[case("not-a-uuid", false)]
    #[case("", false)]
    fn validates_identifier_shape(#[case] id: &str, #[case] valid: bool) {
        assert_eq!(is_valid_crash_reporter_id(id), valid);
    }

    #[rstest]
    #[case::windows(Platform::Windows, Arch::X64, Some("https://crash.example/win?key=w"))]
    #[case::windows_arm_missing(Platform::Windows, Arch::Arm64, None)]
    #[case::mac_arm(Platform::MacOs, Arch::Arm64, Some("https://crash.example/mac-arm"))]
    #[case::mac_x64_missing(Platform::MacOs, Arch::X64, None)]
    #[case::linux_any_arch(Platform::Linux, Arch::Arm64, Some("https://crash.example/linux?key=l"))]
    #[case::other(Platform::Other, Arch::X64, None)]
    fn selects_endpoint_per_target(
        #[case] platform: Platform,
        #[case] arch: Arch,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(select_endpoint(&product(), HostTarget::new(platform, arch)), expected);
    }

    #[test]
    fn universal_builds_use_universal_endpoint() {
        let product = Product {
            darwin_universal_asset_id: Some("asset".to_owned()),
            ..product()
        };
        assert_eq!(
            select_endpoint(&product, HostTarget::new(Platform::MacOs, Arch::X64)),
            Some("https://crash.example/mac-universal")
        );
    }

    #[rstest]
    #[case::flag_only(&["hearth"], json!({ "enable-crash-reporter": true }), true)]
    #[case::disabled_by_cli(&["hearth", "--disable-crash-reporter"], json!({ "enable-crash-reporter": true }), false)]
    #[case::directory_wins(&["hearth", "--disable-crash-reporter", "--crash-reporter-directory", "/tmp/d"], json!({}), true)]
    #[case::nothing(&["hearth"], json!({}), false)]
    #[case::truthy_number(&["hearth"], json!({ "enable-crash-reporter": 1 }), true)]
    #[case::truthy_text(&["hearth"], json!({ "enable-crash-reporter": "yes" }), true)]
    #[case::empty_text(&["hearth"], json!({ "enable-crash-reporter": "" }), false)]
    fn policy_gates_crash_capture(
        #[case] argv: &[&str],
        #[case] stored: serde_json::Value,
        #[case] enabled: bool,
    ) {
        let args = parse_arguments(argv.iter().copied());
        assert_eq!(crash_reporting_enabled(&args, &config(stored)), enabled);
    }

    #[test]
    fn submission_url_carries_identifier_three_times() {
        let stored = config(json!({ "crash-reporter-id": VALID_ID }));
        let context = CrashReporterContext {
            product: &product(),
            target: HostTarget::new(Platform::Linux, Arch::X64),
            development: false,
        };
        let (url, id) = remote_submission(&stored, context).expect("endpoint resolved");
        assert_eq!(id, VALID_ID);
        assert_eq!(
            url,
            format!("https://crash.example/linux?key=l&uid={VALID_ID}&iid={VALID_ID}&sid={VALID_ID}")
        );
    }

    #[rstest]
    #[case("/var/crash/./dumps", "/var/crash/dumps")]
    #[case("/var/crash/../dumps", "/var/dumps")]
    #[case("/..", "/")]
    #[case("dumps/../..", "..")]
    fn normalizes_lexically(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize(Utf8Path::new(raw)), expected);
    }

    #[test]
    fn relative_directory_is_fatal() {
        let error = prepare_local_directory("crash/dumps").expect_err("relative path");
        assert!(matches!(error, CrashReporterError::NotAbsolute { .. }));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn missing_directory_is_created() {
        let dir = tempfile::tempdir().expect("temp dir");
        let target = dir.path().join("nested/dumps");
        let raw = target.to_str().expect("utf-8 path");
        let prepared = prepare_local_directory(raw).expect("directory created");
        assert!(prepared.is_dir());
    }

    #[test]
    fn product_names_follow_build_kind() {
        let product = Product::default();
        assert_eq!(company_name(&product), DEFAULT_COMPANY_NAME);
        assert_eq!(product_name(&product, false), "hearth");
        assert_eq!(product_name(&product, true), "hearth Dev");
    }
}
