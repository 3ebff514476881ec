//! Startup orchestration.
//!
//! The sequence moves through [`StartupPhase`] in order. Every decision the
//! runtime freezes at readiness is taken synchronously before
//! [`StartupPhase::AwaitingRuntimeReady`]; only locale resolution may start
//! early and finish late.

use std::future::Future;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use hearth_config::{
    BootEnvironment, BootPaths, HostTarget, ParsedArguments, Platform, Product, SwitchStore,
    parse_arguments,
};
use serde::Serialize;
use strum::Display;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::crash_reporter::{
    CrashReporterContext, CrashReporterError, CrashReportingDecision, configure_crash_reporter,
};
use crate::health::StartupReporter;
use crate::host::{HostPath, HostRuntime, PRIVILEGED_SCHEMES};
use crate::locale::{
    ChosenLocale, LanguagePackResolver, LocaleDecision, NlsConfiguration, preferred_os_locale,
    resolve_nls_configuration, runtime_lang_value, user_defined_locale,
};
use crate::open_requests::PendingOpenRequests;
use crate::perf::{
    DID_RUN_MAIN_BUNDLE, DID_START_MAIN, MAIN_APP_READY, PerfMarks, WILL_LOAD_MAIN_BUNDLE,
};
use crate::process_argv::ProcessArgv;
use crate::publish::{EnvironmentSink, publish_launch_environment};
use crate::sandbox::{SandboxDecision, configure_sandbox};
use crate::switches::{ResolvedSwitches, resolve_switches};
use crate::trace_recording::TraceConfig;

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");
const LANG_SWITCH: &str = "lang";

/// Lifecycle phases of the bootstrap, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StartupPhase {
    /// Reading the invocation and deriving paths.
    ParsingArgs,
    /// All pre-readiness decisions applied.
    SwitchesConfigured,
    /// Waiting for the runtime's readiness signal.
    AwaitingRuntimeReady,
    /// Waiting for trace recording to start.
    Tracing,
    /// Preparing the application launch.
    ReadyHandlerRunning,
    /// The application entry point returned successfully.
    ApplicationLoaded,
}

/// Error reported by the application entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApplicationError {
    message: String,
}

impl ApplicationError {
    /// Creates an error with a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The crash-dump directory is unusable; the process must exit.
    #[error("failed to configure crash reporting: {source}")]
    CrashReporter {
        /// Underlying configuration error.
        #[source]
        source: CrashReporterError,
    },
    /// The language configuration could not be encoded for child processes.
    #[error("failed to publish the launch environment: {source}")]
    PublishEnvironment {
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
    /// The application entry point failed.
    #[error("application failed to launch: {source}")]
    Application {
        /// Error reported by the application.
        #[source]
        source: ApplicationError,
    },
}

impl BootstrapError {
    /// Whether the error terminates the process.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::CrashReporter { .. })
    }

    /// Process exit status when this error ends the process.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::CrashReporter { source } => source.exit_code(),
            Self::PublishEnvironment { .. } | Self::Application { .. } => 1,
        }
    }
}

/// Everything the bootstrap reads from the outside world.
#[derive(Debug, Clone)]
pub struct BootstrapInputs {
    /// Raw process arguments, executable first.
    pub argv: Vec<String>,
    /// Captured environment variables and well-known directories.
    pub environment: BootEnvironment,
    /// Product descriptor.
    pub product: Product,
    /// Platform and architecture.
    pub target: HostTarget,
    /// Installation directory holding the shipped message bundle.
    pub app_root: Utf8PathBuf,
}

/// State handed to the application entry point.
#[derive(Debug, Clone)]
pub struct LaunchContext {
    /// Final language configuration.
    pub nls: NlsConfiguration,
    /// Code-cache directory, absent when caching is disabled.
    pub code_cache_dir: Option<Utf8PathBuf>,
    /// Per-user state directory.
    pub user_data_dir: Utf8PathBuf,
    /// Process arguments including re-injected switches.
    pub argv: Vec<String>,
    /// Open requests captured before the application existed.
    pub open_requests: PendingOpenRequests,
    /// Timing marks recorded so far.
    pub perf: PerfMarks,
}

/// Application entry point invoked once bootstrap completes.
pub trait Application {
    /// Runs the application with the resolved launch state.
    fn launch(self, context: LaunchContext) -> impl Future<Output = Result<(), ApplicationError>>;
}

/// Collaborators for one bootstrap run.
pub struct BootstrapPlan<'a, H, A> {
    /// Launch inputs.
    pub inputs: BootstrapInputs,
    /// Host runtime receiving switches and paths.
    pub host: &'a H,
    /// Application entry point.
    pub application: A,
    /// Lifecycle observer.
    pub reporter: Arc<dyn StartupReporter>,
    /// Destination for published environment variables.
    pub environment: &'a dyn EnvironmentSink,
}

/// Summary of a bootstrap run that did not abort.
#[derive(Debug)]
pub struct StartupReport {
    /// Last phase entered.
    pub phase: StartupPhase,
    /// Derived filesystem locations.
    pub paths: BootPaths,
    /// Applied switches.
    pub switches: ResolvedSwitches,
    /// Sandbox policy.
    pub sandbox: SandboxDecision,
    /// Crash capture policy.
    pub crash_reporting: CrashReportingDecision,
    /// Final locale choice.
    pub locale: LocaleDecision,
    /// Timing marks.
    pub perf: PerfMarks,
    /// Error caught in the ready handler, if any.
    pub failure: Option<BootstrapError>,
}

/// Runs the full startup sequence using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError::CrashReporter`] when the crash-dump directory is
/// unusable. Failures after readiness are caught, reported and recorded on
/// [`StartupReport::failure`] instead.
pub async fn run_bootstrap<H, A>(plan: BootstrapPlan<'_, H, A>) -> Result<StartupReport, BootstrapError>
where
    H: HostRuntime,
    A: Application,
{
    let BootstrapPlan {
        inputs,
        host,
        application,
        reporter,
        environment,
    } = plan;

    let mut perf = PerfMarks::new();
    perf.mark(DID_START_MAIN);
    let prepared = configure_before_ready(inputs, host, reporter.as_ref())?;
    let PreReady {
        args,
        argv,
        paths,
        open_requests,
        switches,
        sandbox,
        crash_reporting,
        resolver,
        os_locale,
        early,
    } = prepared;
    let early = early.map(|handle| async move { handle.await.ok() });

    reporter.phase_entered(StartupPhase::AwaitingRuntimeReady);
    host.when_ready().await;
    perf.mark(MAIN_APP_READY);

    if let Some(trace) = TraceConfig::from_arguments(&args) {
        reporter.phase_entered(StartupPhase::Tracing);
        if let Err(error) = host.start_trace_recording(&trace).await {
            warn!(target: BOOTSTRAP_TARGET, %error, "continuing without trace recording");
        }
    }

    reporter.phase_entered(StartupPhase::ReadyHandlerRunning);
    let ((), nls) = tokio::join!(
        ensure_code_cache_dir(paths.code_cache_dir()),
        resolve_nls_configuration(early, host, &resolver, &os_locale),
    );
    let locale = nls.decision();
    reporter.locale_resolved(&locale);

    let context = LaunchContext {
        nls,
        code_cache_dir: paths.code_cache_dir().map(Utf8Path::to_path_buf),
        user_data_dir: paths.user_data_dir().to_path_buf(),
        argv: argv.into_vec(),
        open_requests,
        perf: PerfMarks::new(),
    };

    let (phase, failure) = match launch(application, context, environment, &mut perf).await {
        Ok(()) => {
            reporter.phase_entered(StartupPhase::ApplicationLoaded);
            (StartupPhase::ApplicationLoaded, None)
        }
        Err(failure) => {
            reporter.bootstrap_failed(&failure);
            error!(target: BOOTSTRAP_TARGET, error = %failure, "ready handler failed");
            (StartupPhase::ReadyHandlerRunning, Some(failure))
        }
    };

    Ok(StartupReport {
        phase,
        paths,
        switches,
        sandbox,
        crash_reporting,
        locale,
        perf,
        failure,
    })
}

/// Decisions taken before readiness, carried into the ready handler.
struct PreReady {
    args: ParsedArguments,
    argv: ProcessArgv,
    paths: BootPaths,
    open_requests: PendingOpenRequests,
    switches: ResolvedSwitches,
    sandbox: SandboxDecision,
    crash_reporting: CrashReportingDecision,
    resolver: LanguagePackResolver,
    os_locale: String,
    early: Option<JoinHandle<NlsConfiguration>>,
}

fn configure_before_ready<H: HostRuntime>(
    inputs: BootstrapInputs,
    host: &H,
    reporter: &dyn StartupReporter,
) -> Result<PreReady, BootstrapError> {
    let BootstrapInputs {
        argv: raw_argv,
        environment,
        product,
        target,
        app_root,
    } = inputs;
    reporter.phase_entered(StartupPhase::ParsingArgs);

    let args = parse_arguments(raw_argv.iter().cloned());
    let mut argv = ProcessArgv::new(raw_argv);
    let paths = BootPaths::derive(&product, &environment, &args);

    let open_requests = PendingOpenRequests::new();
    host.install_open_listener(open_requests.clone());
    host.register_privileged_schemes(&PRIVILEGED_SCHEMES);
    host.set_path(HostPath::UserData, paths.user_data_dir());

    let config = SwitchStore::new(paths.argv_config()).read();
    let switches = resolve_switches(&args, &config, target.platform, host, &mut argv);
    reporter.switches_configured(&switches);
    let sandbox = configure_sandbox(&args, &config, host);

    let crash_context = CrashReporterContext {
        product: &product,
        target,
        development: environment.is_development(),
    };
    let crash_reporting =
        match configure_crash_reporter(&args, &config, crash_context, host, &mut argv) {
            Ok(decision) => decision,
            Err(source) => {
                let error = BootstrapError::CrashReporter { source };
                reporter.bootstrap_failed(&error);
                return Err(error);
            }
        };
    reporter.crash_reporting_configured(&crash_reporting);

    let user_locale = user_defined_locale(&args, &config);
    if let Some(chosen) = &user_locale
        && matches!(target.platform, Platform::Windows | Platform::Linux)
    {
        host.append_switch(LANG_SWITCH, Some(runtime_lang_value(&chosen.locale)));
    }
    let resolver = LanguagePackResolver::new(
        paths.user_data_dir(),
        app_root,
        product.commit,
        environment.is_development(),
    );
    let os_locale = preferred_os_locale(host);
    let early = user_locale
        .map(|chosen| spawn_early_resolution(resolver.clone(), chosen, os_locale.clone()));
    reporter.phase_entered(StartupPhase::SwitchesConfigured);

    Ok(PreReady {
        os_locale,
        early,
        args,
        argv,
        paths,
        open_requests,
        switches,
        sandbox,
        crash_reporting,
        resolver,
    })
}

fn spawn_early_resolution(
    resolver: LanguagePackResolver,
    chosen: ChosenLocale,
    os_locale: String,
) -> JoinHandle<NlsConfiguration> {
    tokio::spawn(async move {
        resolver
            .resolve(&chosen.locale, &os_locale, chosen.source)
            .await
    })
}

async fn ensure_code_cache_dir(path: Option<&Utf8Path>) {
    let Some(path) = path else {
        return;
    };
    if let Err(error) = tokio::fs::create_dir_all(path).await {
        debug!(
            target: BOOTSTRAP_TARGET,
            path = %path,
            %error,
            "code cache directory unavailable"
        );
    }
}

async fn launch<A: Application>(
    application: A,
    mut context: LaunchContext,
    environment: &dyn EnvironmentSink,
    perf: &mut PerfMarks,
) -> Result<(), BootstrapError> {
    publish_launch_environment(environment, &context.nls, context.code_cache_dir.as_deref())
        .map_err(|source| BootstrapError::PublishEnvironment { source })?;

    perf.mark(WILL_LOAD_MAIN_BUNDLE);
    context.perf = perf.clone();
    application
        .launch(context)
        .await
        .map_err(|source| BootstrapError::Application { source })?;
    perf.mark(DID_RUN_MAIN_BUNDLE);
    Ok(())
}
