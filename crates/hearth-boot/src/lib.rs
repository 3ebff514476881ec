//! Pre-ready bootstrap sequence for the Hearth desktop host.
//!
//! The host runtime freezes several of its settings once it signals
//! readiness, so the bootstrap splits into two halves. Before readiness it
//! parses the invocation, reads the persistent switch store, applies the
//! allow-listed engine switches, decides the sandbox and crash-reporting
//! policy and starts resolving an explicitly requested locale. After
//! readiness it optionally waits for trace recording and then runs the ready
//! handler. That handler creates the code-cache directory and resolves the
//! final language configuration concurrently. It publishes both for child
//! processes and hands control to the [`Application`].
//!
//! Every collaborator with side effects sits behind a trait so the sequence
//! can be exercised without a real runtime:
//!
//! - [`HostRuntime`] abstracts the runtime's command line, paths, readiness
//!   signal, locale queries, trace recording and crash capture.
//! - [`Application`] is the entry point invoked once bootstrap completes.
//! - [`StartupReporter`] observes lifecycle transitions for telemetry.
//! - [`EnvironmentSink`] receives the values published for child processes.
//!
//! Failures follow three tiers. Recoverable problems are logged and the
//! affected feature is skipped. An unusable crash-dump directory is fatal and
//! surfaces as [`BootstrapError`] with exit status 1. Anything that goes wrong
//! in the ready handler is caught once, reported, and recorded on the
//! [`StartupReport`] without retrying.

mod bootstrap;
mod crash_reporter;
mod headless;
mod health;
mod host;
mod launch;
mod locale;
mod open_requests;
mod perf;
mod process_argv;
mod publish;
mod sandbox;
mod switches;
mod telemetry;
mod trace_recording;

pub use bootstrap::{
    Application, ApplicationError, BootstrapError, BootstrapInputs, BootstrapPlan, LaunchContext,
    StartupPhase, StartupReport, run_bootstrap,
};
pub use crash_reporter::{
    CrashReporterError, CrashReportingDecision, CrashReportingMode, crash_reporting_enabled,
    is_valid_crash_reporter_id, select_endpoint,
};
pub use headless::{HeadlessHost, HeadlessSnapshot};
pub use health::{StartupReporter, StructuredStartupReporter};
pub use host::{
    CrashReporterOptions, HostError, HostPath, HostRuntime, SchemePrivileges, SchemeRegistration,
};
pub use launch::run_host;
pub use locale::{
    LanguagePackFiles, LanguagePackResolver, LocaleDecision, LocaleSource, NlsConfiguration,
    PSEUDO_LOCALE, normalize_os_locale, runtime_lang_value,
};
pub use open_requests::{DrainedOpenRequests, OpenRequest, PendingOpenRequests};
pub use perf::{PerfMark, PerfMarks};
pub use process_argv::ProcessArgv;
pub use publish::{EnvironmentSink, ProcessEnvironment};
pub use sandbox::SandboxDecision;
pub use switches::{
    AppliedSwitch, Migration, ResolvedSwitches, SwitchAction, SwitchCategory, SwitchDiagnostic,
    SwitchPlan, SwitchRule, rule_for,
};
pub use telemetry::{TelemetryConfig, TelemetryError, TelemetryHandle};
pub use trace_recording::{MemoryDumpMode, MemoryDumpTrigger, TraceConfig};

#[cfg(test)]
mod tests;
