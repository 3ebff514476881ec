//! Host runtime double recording every request in call order.

use std::collections::BTreeMap;
use std::future::{self, Future};
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};

use crate::host::{CrashReporterOptions, HostError, HostPath, HostRuntime, SchemeRegistration};
use crate::open_requests::PendingOpenRequests;
use crate::trace_recording::TraceConfig;

/// Requests observed by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    SwitchAppended {
        name: String,
        value: Option<String>,
    },
    HardwareAccelerationDisabled,
    SandboxEnabled,
    PathSet(HostPath, Utf8PathBuf),
    SchemesRegistered(Vec<&'static str>),
    OpenListenerInstalled,
    Ready,
    TraceStarted(TraceConfig),
    CrashReporterStarted(CrashReporterOptions),
}

impl HostEvent {
    /// Whether the runtime only honours this request before readiness.
    #[must_use]
    pub fn is_pre_ready_only(&self) -> bool {
        !matches!(self, Self::Ready | Self::TraceStarted(_))
    }
}

#[derive(Debug, Default)]
struct HostState {
    switches: BTreeMap<String, Option<String>>,
    events: Vec<HostEvent>,
    open_listener: Option<PendingOpenRequests>,
}

/// Configurable [`HostRuntime`] that records what the bootstrap asks of it.
#[derive(Debug, Default)]
pub struct RecordingHost {
    state: Mutex<HostState>,
    locale: Option<String>,
    preferred_languages: Vec<String>,
    trace_failure: Option<String>,
}

impl RecordingHost {
    /// Sets the locale the runtime reports after readiness.
    #[must_use]
    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_owned());
        self
    }

    /// Sets the preferred system languages, most preferred first.
    #[must_use]
    pub fn with_preferred_languages(mut self, languages: &[&str]) -> Self {
        self.preferred_languages = languages.iter().map(|lang| (*lang).to_owned()).collect();
        self
    }

    /// Seeds a switch as if it were passed on the command line.
    #[must_use]
    pub fn with_switch(self, name: &str, value: Option<&str>) -> Self {
        self.lock()
            .switches
            .insert(name.to_owned(), value.map(str::to_owned));
        self
    }

    /// Makes trace recording fail with `message`.
    #[must_use]
    pub fn with_failing_trace(mut self, message: &str) -> Self {
        self.trace_failure = Some(message.to_owned());
        self
    }

    /// Copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HostEvent> {
        self.lock().events.clone()
    }

    /// Values appended for `name`, in order.
    #[must_use]
    pub fn appended(&self, name: &str) -> Vec<Option<String>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HostEvent::SwitchAppended { name: appended, value } if appended == name => {
                    Some(value)
                }
                _ => None,
            })
            .collect()
    }

    /// Crash reporter settings, if crash capture was started.
    #[must_use]
    pub fn crash_reporter(&self) -> Option<CrashReporterOptions> {
        self.events().into_iter().find_map(|event| match event {
            HostEvent::CrashReporterStarted(options) => Some(options),
            _ => None,
        })
    }

    /// The listener installed for OS open requests.
    #[must_use]
    pub fn open_listener(&self) -> Option<PendingOpenRequests> {
        self.lock().open_listener.clone()
    }

    fn record(&self, event: HostEvent) {
        self.lock().events.push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().expect("host mutex poisoned")
    }
}

impl HostRuntime for RecordingHost {
    fn append_switch(&self, name: &str, value: Option<&str>) {
        let mut state = self.lock();
        state
            .switches
            .insert(name.to_owned(), value.map(str::to_owned));
        state.events.push(HostEvent::SwitchAppended {
            name: name.to_owned(),
            value: value.map(str::to_owned),
        });
    }

    fn switch_value(&self, name: &str) -> Option<String> {
        self.lock().switches.get(name).cloned().flatten()
    }

    fn has_switch(&self, name: &str) -> bool {
        self.lock().switches.contains_key(name)
    }

    fn disable_hardware_acceleration(&self) {
        self.record(HostEvent::HardwareAccelerationDisabled);
    }

    fn enable_sandbox(&self) {
        self.record(HostEvent::SandboxEnabled);
    }

    fn set_path(&self, kind: HostPath, path: &Utf8Path) {
        self.record(HostEvent::PathSet(kind, path.to_path_buf()));
    }

    fn register_privileged_schemes(&self, schemes: &[SchemeRegistration]) {
        self.record(HostEvent::SchemesRegistered(
            schemes.iter().map(|registration| registration.scheme).collect(),
        ));
    }

    fn install_open_listener(&self, pending: PendingOpenRequests) {
        let mut state = self.lock();
        state.open_listener = Some(pending);
        state.events.push(HostEvent::OpenListenerInstalled);
    }

    fn when_ready(&self) -> impl Future<Output = ()> {
        self.record(HostEvent::Ready);
        future::ready(())
    }

    fn locale(&self) -> Option<String> {
        self.locale.clone()
    }

    fn preferred_system_languages(&self) -> Vec<String> {
        self.preferred_languages.clone()
    }

    fn start_trace_recording(
        &self,
        config: &TraceConfig,
    ) -> impl Future<Output = Result<(), HostError>> {
        self.record(HostEvent::TraceStarted(config.clone()));
        future::ready(match &self.trace_failure {
            Some(message) => Err(HostError::TraceRecording {
                message: message.clone(),
            }),
            None => Ok(()),
        })
    }

    fn start_crash_reporter(&self, options: &CrashReporterOptions) {
        self.record(HostEvent::CrashReporterStarted(options.clone()));
    }
}
