//! In-process host runtime used by the `hearth` binary.
//!
//! `HeadlessHost` keeps an in-memory command line seeded from the process
//! arguments, is ready as soon as it is polled, and records every request
//! so the launch summary can show what a real runtime would have received.

use std::collections::BTreeMap;
use std::env;
use std::future::{self, Future};
use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, info};

use crate::host::{
    CrashReporterOptions, HostError, HostPath, HostRuntime, SchemeRegistration,
};
use crate::open_requests::{OpenRequest, PendingOpenRequests};
use crate::trace_recording::TraceConfig;

const HEADLESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::headless");
const LOCALE_ENV_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// Everything the headless host has been asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlessSnapshot {
    /// Command-line switches, `None` for bare switches.
    pub switches: BTreeMap<String, Option<String>>,
    /// Whether GPU acceleration was disabled.
    pub hardware_acceleration_disabled: bool,
    /// Whether the renderer sandbox was enabled.
    pub sandbox_enabled: bool,
    /// Overridden runtime paths.
    pub paths: BTreeMap<HostPath, Utf8PathBuf>,
    /// Schemes registered as privileged.
    pub privileged_schemes: Vec<&'static str>,
    /// Crash capture settings, once started.
    pub crash_reporter: Option<CrashReporterOptions>,
    /// Trace recording settings, once started.
    pub trace: Option<TraceConfig>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    snapshot: HeadlessSnapshot,
    open_listener: Option<PendingOpenRequests>,
}

/// Host runtime without a GUI.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    state: Mutex<HeadlessState>,
    locale: Option<String>,
}

impl HeadlessHost {
    /// Creates a host whose command line holds the switches in `argv`.
    #[must_use]
    pub fn new(argv: &[String], locale: Option<String>) -> Self {
        let snapshot = HeadlessSnapshot {
            switches: seed_switches(argv),
            ..HeadlessSnapshot::default()
        };
        Self {
            state: Mutex::new(HeadlessState {
                snapshot,
                open_listener: None,
            }),
            locale,
        }
    }

    /// Creates a host for `argv` using the POSIX locale variables.
    #[must_use]
    pub fn from_process(argv: &[String]) -> Self {
        Self::new(argv, system_locale())
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn snapshot(&self) -> HeadlessSnapshot {
        self.lock().snapshot.clone()
    }

    /// Delivers an OS open request to the installed listener.
    ///
    /// # Errors
    ///
    /// Returns the request when no listener is installed or it has been
    /// detached.
    pub fn deliver(&self, request: OpenRequest) -> Result<(), OpenRequest> {
        let listener = self.lock().open_listener.clone();
        match listener {
            Some(listener) => listener.capture(request),
            None => Err(request),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostRuntime for HeadlessHost {
    fn append_switch(&self, name: &str, value: Option<&str>) {
        self.lock()
            .snapshot
            .switches
            .insert(name.to_owned(), value.map(str::to_owned));
    }

    fn switch_value(&self, name: &str) -> Option<String> {
        self.lock().snapshot.switches.get(name).cloned().flatten()
    }

    fn has_switch(&self, name: &str) -> bool {
        self.lock().snapshot.switches.contains_key(name)
    }

    fn disable_hardware_acceleration(&self) {
        self.lock().snapshot.hardware_acceleration_disabled = true;
    }

    fn enable_sandbox(&self) {
        self.lock().snapshot.sandbox_enabled = true;
    }

    fn set_path(&self, kind: HostPath, path: &Utf8Path) {
        debug!(target: HEADLESS_TARGET, %kind, %path, "path overridden");
        self.lock().snapshot.paths.insert(kind, path.to_path_buf());
    }

    fn register_privileged_schemes(&self, schemes: &[SchemeRegistration]) {
        self.lock()
            .snapshot
            .privileged_schemes
            .extend(schemes.iter().map(|registration| registration.scheme));
    }

    fn install_open_listener(&self, pending: PendingOpenRequests) {
        self.lock().open_listener = Some(pending);
    }

    fn when_ready(&self) -> impl Future<Output = ()> {
        tokio::task::yield_now()
    }

    fn locale(&self) -> Option<String> {
        self.locale.clone()
    }

    fn preferred_system_languages(&self) -> Vec<String> {
        self.locale.iter().cloned().collect()
    }

    fn start_trace_recording(
        &self,
        config: &TraceConfig,
    ) -> impl Future<Output = Result<(), HostError>> {
        info!(target: HEADLESS_TARGET, "trace recording requested");
        self.lock().snapshot.trace = Some(config.clone());
        future::ready(Ok(()))
    }

    fn start_crash_reporter(&self, options: &CrashReporterOptions) {
        info!(
            target: HEADLESS_TARGET,
            upload = options.upload_to_server,
            "crash capture started"
        );
        self.lock().snapshot.crash_reporter = Some(options.clone());
    }
}

/// Reads `--name` and `--name=value` tokens ahead of any `--` marker.
fn seed_switches(argv: &[String]) -> BTreeMap<String, Option<String>> {
    argv.iter()
        .skip(1)
        .take_while(|token| token.as_str() != "--")
        .filter_map(|token| token.strip_prefix("--"))
        .filter(|body| !body.is_empty())
        .map(|body| match body.split_once('=') {
            Some((name, value)) => (name.to_owned(), Some(value.to_owned())),
            None => (body.to_owned(), None),
        })
        .collect()
}

fn system_locale() -> Option<String> {
    LOCALE_ENV_VARS
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.is_empty())
        .and_then(|value| posix_to_language_tag(&value))
}

/// Converts `de_DE.UTF-8@euro` style values to `de-DE`.
fn posix_to_language_tag(raw: &str) -> Option<String> {
    let base = raw.split(['.', '@']).next()?;
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|token| (*token).to_owned()).collect()
    }

    #[test]
    fn seeds_switches_before_marker() {
        let host = HeadlessHost::new(
            &argv(&["hearth", "--no-sandbox", "--enable-features=Foo", "a.txt", "--", "--late"]),
            None,
        );
        assert!(host.has_switch("no-sandbox"));
        assert_eq!(host.switch_value("enable-features").as_deref(), Some("Foo"));
        assert!(!host.has_switch("late"));
    }

    #[rstest]
    #[case("de_DE.UTF-8", Some("de-DE"))]
    #[case("sr_RS@latin", Some("sr-RS"))]
    #[case("en", Some("en"))]
    #[case("C", None)]
    #[case("POSIX", None)]
    #[case("C.UTF-8", None)]
    fn converts_posix_locales(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(posix_to_language_tag(raw).as_deref(), expected);
    }

    #[test]
    fn delivers_to_installed_listener() {
        let host = HeadlessHost::new(&argv(&["hearth"]), None);
        let early = OpenRequest::File("/tmp/a".to_owned());
        assert_eq!(host.deliver(early.clone()), Err(early));

        let pending = PendingOpenRequests::new();
        host.install_open_listener(pending.clone());
        host.deliver(OpenRequest::File("/tmp/b".to_owned()))
            .expect("listener attached");
        assert_eq!(pending.drain_and_detach().files, vec!["/tmp/b".to_owned()]);
    }
}
