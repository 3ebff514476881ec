//! Process entry point wiring the bootstrap to the headless host.

use std::env;
use std::ffi::OsString;
use std::future::{self, Future};
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use hearth_config::{BootEnvironment, HostTarget, Product};
use serde::Serialize;
use tracing::{debug, warn};

use crate::bootstrap::{
    Application, ApplicationError, BootstrapInputs, BootstrapPlan, LaunchContext, run_bootstrap,
};
use crate::headless::{HeadlessHost, HeadlessSnapshot};
use crate::health::StructuredStartupReporter;
use crate::locale::NlsConfiguration;
use crate::open_requests::DrainedOpenRequests;
use crate::publish::ProcessEnvironment;
use crate::telemetry::{self, TelemetryConfig};

const LAUNCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::launch");

/// Runs the bootstrap for the current process and prints the launch summary.
///
/// The summary is written to `stdout` as a single JSON document; errors go
/// to `stderr`. Returns exit status 1 when crash reporting cannot be
/// configured.
pub fn run_host<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let environment = BootEnvironment::capture();
    if let Err(error) = telemetry::initialise(&TelemetryConfig::from_environment(&environment)) {
        let _ = writeln!(stderr, "{error}");
    }

    let argv: Vec<String> = args
        .into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let app_root = installation_root();
    let product = load_product(&app_root);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            let _ = writeln!(stderr, "failed to start the async runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    let host = HeadlessHost::from_process(&argv);
    let plan = BootstrapPlan {
        inputs: BootstrapInputs {
            argv,
            environment,
            product,
            target: HostTarget::current(),
            app_root,
        },
        host: &host,
        application: SummaryApplication {
            host: &host,
            out: stdout,
        },
        reporter: Arc::new(StructuredStartupReporter::new()),
        environment: &ProcessEnvironment,
    };

    match runtime.block_on(run_bootstrap(plan)) {
        Ok(report) => {
            debug!(
                target: LAUNCH_TARGET,
                phase = %report.phase,
                failed = report.failure.is_some(),
                "bootstrap finished"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::from(error.exit_code())
        }
    }
}

/// Directory containing the executable, or the working directory.
fn installation_root() -> Utf8PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(std::path::Path::to_path_buf))
        .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

fn load_product(app_root: &Utf8Path) -> Product {
    match Product::load_installed(app_root.as_std_path()) {
        Ok(product) => product,
        Err(error) => {
            warn!(target: LAUNCH_TARGET, %error, "using built-in product defaults");
            Product::default()
        }
    }
}

/// Application stand-in that prints what it was launched with.
struct SummaryApplication<'a, W> {
    host: &'a HeadlessHost,
    out: &'a mut W,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LaunchSummary<'a> {
    nls: &'a NlsConfiguration,
    code_cache_dir: Option<&'a Utf8Path>,
    user_data_dir: &'a Utf8Path,
    argv: &'a [String],
    open_requests: DrainedOpenRequests,
    perf: Vec<PerfEntry>,
    host: HeadlessSnapshot,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PerfEntry {
    name: &'static str,
    offset_ms: f64,
}

impl<W: Write> SummaryApplication<'_, W> {
    fn write_summary(self, context: &LaunchContext) -> Result<(), ApplicationError> {
        let summary = LaunchSummary {
            nls: &context.nls,
            code_cache_dir: context.code_cache_dir.as_deref(),
            user_data_dir: &context.user_data_dir,
            argv: &context.argv,
            open_requests: context.open_requests.drain_and_detach(),
            perf: context
                .perf
                .marks()
                .iter()
                .map(|mark| PerfEntry {
                    name: mark.name,
                    offset_ms: mark.offset.as_secs_f64() * 1000.0,
                })
                .collect(),
            host: self.host.snapshot(),
        };
        serde_json::to_writer_pretty(&mut *self.out, &summary)
            .map_err(|error| ApplicationError::new(error.to_string()))?;
        writeln!(self.out).map_err(|error| ApplicationError::new(error.to_string()))
    }
}

impl<W: Write> Application for SummaryApplication<'_, W> {
    fn launch(self, context: LaunchContext) -> impl Future<Output = Result<(), ApplicationError>> {
        future::ready(self.write_summary(&context))
    }
}
