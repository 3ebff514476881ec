//! Test double for [`StartupReporter`] that records lifecycle events.

use std::sync::Mutex;

use crate::bootstrap::{BootstrapError, StartupPhase};
use crate::crash_reporter::{CrashReportingDecision, CrashReportingMode};
use crate::health::StartupReporter;
use crate::locale::LocaleDecision;
use crate::switches::ResolvedSwitches;

/// Structured startup events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupEvent {
    /// The bootstrap entered a phase.
    PhaseEntered(StartupPhase),
    /// Persistent switches were applied.
    SwitchesConfigured {
        runtime: Vec<String>,
        application: Vec<String>,
        ignored: Vec<String>,
    },
    /// Crash capture was configured.
    CrashReportingConfigured(CrashReportingMode),
    /// The final locale was chosen.
    LocaleResolved(LocaleDecision),
    /// Bootstrap aborted or the ready handler failed.
    BootstrapFailed { fatal: bool, message: String },
}

/// Records startup events for assertions.
#[derive(Debug, Default)]
pub struct RecordingStartupReporter {
    events: Mutex<Vec<StartupEvent>>,
}

impl RecordingStartupReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<StartupEvent> {
        self.events
            .lock()
            .expect("startup reporter mutex poisoned")
            .clone()
    }

    /// Phases entered, in order.
    #[must_use]
    pub fn phases(&self) -> Vec<StartupPhase> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                StartupEvent::PhaseEntered(phase) => Some(phase),
                _ => None,
            })
            .collect()
    }

    pub fn record(&self, event: StartupEvent) {
        self.events
            .lock()
            .expect("startup reporter mutex poisoned")
            .push(event);
    }
}

impl StartupReporter for RecordingStartupReporter {
    fn phase_entered(&self, phase: StartupPhase) {
        self.record(StartupEvent::PhaseEntered(phase));
    }

    fn switches_configured(&self, switches: &ResolvedSwitches) {
        self.record(StartupEvent::SwitchesConfigured {
            runtime: switches.runtime_keys().to_vec(),
            application: switches.application_keys().to_vec(),
            ignored: switches.ignored_keys().to_vec(),
        });
    }

    fn crash_reporting_configured(&self, decision: &CrashReportingDecision) {
        self.record(StartupEvent::CrashReportingConfigured(decision.mode));
    }

    fn locale_resolved(&self, decision: &LocaleDecision) {
        self.record(StartupEvent::LocaleResolved(decision.clone()));
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(StartupEvent::BootstrapFailed {
            fatal: error.is_fatal(),
            message: error.to_string(),
        });
    }
}
