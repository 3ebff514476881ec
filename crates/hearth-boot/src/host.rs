//! Seam between the bootstrap and the embedded host runtime.

use std::future::Future;

use camino::Utf8Path;
use serde::Serialize;
use strum::Display;
use thiserror::Error;

use crate::open_requests::PendingOpenRequests;
use crate::trace_recording::TraceConfig;

/// Runtime paths the bootstrap overrides before readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum HostPath {
    /// Root of per-user mutable state.
    UserData,
    /// Directory receiving crash dumps.
    CrashDumps,
}

/// Capabilities granted to a custom URL scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[expect(
    clippy::struct_excessive_bools,
    reason = "mirrors the runtime's privilege flags one to one"
)]
pub struct SchemePrivileges {
    /// Parsed like `http`, with origins and relative URLs.
    pub standard: bool,
    /// Treated as a secure context.
    pub secure: bool,
    /// Reachable through `fetch`.
    pub support_fetch_api: bool,
    /// Subject to CORS rather than blocked outright.
    pub cors_enabled: bool,
    /// May register service workers.
    pub allow_service_workers: bool,
    /// Scripts loaded from the scheme participate in code caching.
    pub code_cache: bool,
}

/// A scheme registered as privileged before readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemeRegistration {
    /// Scheme name without the trailing colon.
    pub scheme: &'static str,
    /// Granted capabilities.
    pub privileges: SchemePrivileges,
}

/// Schemes the application layer serves its own content from.
pub(crate) const PRIVILEGED_SCHEMES: [SchemeRegistration; 2] = [
    SchemeRegistration {
        scheme: "hearth-webview",
        privileges: SchemePrivileges {
            standard: true,
            secure: true,
            support_fetch_api: true,
            cors_enabled: true,
            allow_service_workers: true,
            code_cache: true,
        },
    },
    SchemeRegistration {
        scheme: "hearth-file",
        privileges: SchemePrivileges {
            standard: true,
            secure: true,
            support_fetch_api: true,
            cors_enabled: true,
            allow_service_workers: false,
            code_cache: true,
        },
    },
];

/// Settings passed to the runtime's crash capture subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashReporterOptions {
    /// Company reported with each dump.
    pub company_name: String,
    /// Product reported with each dump.
    pub product_name: String,
    /// Remote submission URL, empty when dumps stay local.
    pub submit_url: String,
    /// Whether dumps are uploaded.
    pub upload_to_server: bool,
    /// Whether uploads are compressed.
    pub compress: bool,
}

/// Errors reported by the host runtime.
#[derive(Debug, Error)]
pub enum HostError {
    /// Trace recording could not be started.
    #[error("failed to start trace recording: {message}")]
    TraceRecording {
        /// Runtime-provided reason.
        message: String,
    },
}

/// Operations the bootstrap needs from the host runtime.
///
/// Every mutating call must happen before [`HostRuntime::when_ready`]
/// resolves; the runtime ignores or rejects most of them afterwards.
pub trait HostRuntime {
    /// Appends an engine switch, bare when `value` is `None`.
    fn append_switch(&self, name: &str, value: Option<&str>);

    /// Current value of an engine switch, if set.
    fn switch_value(&self, name: &str) -> Option<String>;

    /// Whether an engine switch is set.
    fn has_switch(&self, name: &str) -> bool;

    /// Disables GPU acceleration through the runtime's dedicated API.
    fn disable_hardware_acceleration(&self);

    /// Enables the sandbox for every renderer process.
    fn enable_sandbox(&self);

    /// Overrides one of the runtime's well-known paths.
    fn set_path(&self, kind: HostPath, path: &Utf8Path);

    /// Grants privileges to custom URL schemes.
    fn register_privileged_schemes(&self, schemes: &[SchemeRegistration]);

    /// Routes OS open requests into `pending` until it is drained.
    fn install_open_listener(&self, pending: PendingOpenRequests);

    /// Resolves once the runtime signals readiness.
    fn when_ready(&self) -> impl Future<Output = ()>;

    /// Locale the runtime reports for its own UI, if known.
    fn locale(&self) -> Option<String>;

    /// Preferred system languages, most preferred first.
    fn preferred_system_languages(&self) -> Vec<String>;

    /// Starts trace recording and resolves once it is running.
    fn start_trace_recording(
        &self,
        config: &TraceConfig,
    ) -> impl Future<Output = Result<(), HostError>>;

    /// Starts the crash capture subsystem.
    fn start_crash_reporter(&self, options: &CrashReporterOptions);
}
