//! Structured reporting of startup lifecycle events.

use std::sync::Arc;

use crate::bootstrap::{BootstrapError, StartupPhase};
use crate::crash_reporter::CrashReportingDecision;
use crate::locale::LocaleDecision;
use crate::switches::ResolvedSwitches;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface startup events to telemetry sinks.
pub trait StartupReporter: Send + Sync {
    /// Invoked when the bootstrap enters `phase`.
    fn phase_entered(&self, phase: StartupPhase);

    /// Invoked once persistent and compatibility switches are applied.
    fn switches_configured(&self, switches: &ResolvedSwitches);

    /// Invoked after crash capture has been configured.
    fn crash_reporting_configured(&self, decision: &CrashReportingDecision);

    /// Invoked once the final locale is known.
    fn locale_resolved(&self, decision: &LocaleDecision);

    /// Invoked when the bootstrap aborts or the ready handler fails.
    fn bootstrap_failed(&self, error: &BootstrapError);
}

impl<T> StartupReporter for Arc<T>
where
    T: StartupReporter,
{
    fn phase_entered(&self, phase: StartupPhase) {
        (**self).phase_entered(phase);
    }

    fn switches_configured(&self, switches: &ResolvedSwitches) {
        (**self).switches_configured(switches);
    }

    fn crash_reporting_configured(&self, decision: &CrashReportingDecision) {
        (**self).crash_reporting_configured(decision);
    }

    fn locale_resolved(&self, decision: &LocaleDecision) {
        (**self).locale_resolved(decision);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }
}

/// Default reporter that records startup events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredStartupReporter;

impl StructuredStartupReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl StartupReporter for StructuredStartupReporter {
    fn phase_entered(&self, phase: StartupPhase) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "phase_entered",
            %phase,
            "startup phase entered"
        );
    }

    fn switches_configured(&self, switches: &ResolvedSwitches) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "switches_configured",
            runtime = ?switches.runtime_keys(),
            application = ?switches.application_keys(),
            ignored = ?switches.ignored_keys(),
            hardware_acceleration_disabled = switches.hardware_acceleration_disabled(),
            "engine switches configured"
        );
    }

    fn crash_reporting_configured(&self, decision: &CrashReportingDecision) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "crash_reporting_configured",
            mode = %decision.mode,
            "crash reporting configured"
        );
    }

    fn locale_resolved(&self, decision: &LocaleDecision) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "locale_resolved",
            source = %decision.source,
            os_locale = %decision.os_locale,
            resolved_language = %decision.resolved_language,
            "locale resolved"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            fatal = error.is_fatal(),
            "startup failed"
        );
    }
}
