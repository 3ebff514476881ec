//! Applies persistent switches and the compatibility battery.

mod compat;
mod rules;

use hearth_config::{ParsedArguments, PersistentConfig, Platform};
use serde::Serialize;
use tracing::{debug, warn};

use crate::host::HostRuntime;
use crate::process_argv::ProcessArgv;

use self::compat::{
    ENGINE_FLAGS_SWITCH, MANDATORY_FEATURE_SWITCHES, PORTAL_VERSION_SWITCH, engine_flags,
    merge_feature_list,
};
pub use self::rules::{
    Migration, SwitchAction, SwitchCategory, SwitchDiagnostic, SwitchPlan, SwitchRule, rule_for,
};

const SWITCHES_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::switches");

/// Stored keys read by other bootstrap steps rather than applied here.
const CONSUMED_ELSEWHERE: [&str; 4] = [
    "locale",
    "enable-crash-reporter",
    "crash-reporter-id",
    "disable-chromium-sandbox",
];

/// A switch appended to the runtime's command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedSwitch {
    /// Switch name.
    pub name: String,
    /// Switch value, `None` for bare switches.
    pub value: Option<String>,
}

/// What the resolver applied, partitioned by consuming layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedSwitches {
    runtime_keys: Vec<String>,
    application_keys: Vec<String>,
    ignored_keys: Vec<String>,
    appended: Vec<AppliedSwitch>,
    reinjected: Vec<String>,
    hardware_acceleration_disabled: bool,
}

impl ResolvedSwitches {
    /// Allow-listed keys applied to the runtime.
    #[must_use]
    pub fn runtime_keys(&self) -> &[String] {
        &self.runtime_keys
    }

    /// Allow-listed keys forwarded to the application layer.
    #[must_use]
    pub fn application_keys(&self) -> &[String] {
        &self.application_keys
    }

    /// Stored keys that are not allow-listed on this platform.
    #[must_use]
    pub fn ignored_keys(&self) -> &[String] {
        &self.ignored_keys
    }

    /// Every runtime switch appended, compatibility switches included.
    #[must_use]
    pub fn appended(&self) -> &[AppliedSwitch] {
        &self.appended
    }

    /// Tokens added to the process arguments.
    #[must_use]
    pub fn reinjected(&self) -> &[String] {
        &self.reinjected
    }

    /// Whether the dedicated hardware-acceleration kill switch was used.
    #[must_use]
    pub fn hardware_acceleration_disabled(&self) -> bool {
        self.hardware_acceleration_disabled
    }

    fn record_append<H: HostRuntime>(&mut self, host: &H, name: &str, value: Option<&str>) {
        host.append_switch(name, value);
        self.appended.push(AppliedSwitch {
            name: name.to_owned(),
            value: value.map(str::to_owned),
        });
    }
}

/// Applies allow-listed persistent switches, then the compatibility battery.
///
/// Keys outside the allow-list are never applied. Malformed values are logged
/// and skipped without affecting the remaining keys.
pub(crate) fn resolve_switches<H: HostRuntime>(
    args: &ParsedArguments,
    config: &PersistentConfig,
    platform: Platform,
    host: &H,
    argv: &mut ProcessArgv,
) -> ResolvedSwitches {
    let mut resolved = ResolvedSwitches::default();

    for (key, value) in config.iter() {
        let Some(rule) = rule_for(key, platform) else {
            if !CONSUMED_ELSEWHERE.contains(&key) {
                debug!(target: SWITCHES_TARGET, key, "ignoring switch outside the allow-list");
                resolved.ignored_keys.push(key.to_owned());
            }
            continue;
        };

        let plan = rule.plan(key, value);
        for diagnostic in &plan.diagnostics {
            warn!(target: SWITCHES_TARGET, key, %diagnostic, "skipping malformed switch value");
        }
        if plan.actions.is_empty() {
            continue;
        }

        for action in plan.actions {
            match action {
                SwitchAction::Append { name, value } => {
                    resolved.record_append(host, &name, value.as_deref());
                }
                SwitchAction::DisableHardwareAcceleration => {
                    host.disable_hardware_acceleration();
                    resolved.hardware_acceleration_disabled = true;
                }
                SwitchAction::Reinject(tokens) => {
                    resolved.reinjected.extend(tokens.iter().cloned());
                    argv.insert_before_end_of_options(tokens);
                }
            }
        }
        match rule.category() {
            SwitchCategory::Runtime => resolved.runtime_keys.push(key.to_owned()),
            SwitchCategory::Application => resolved.application_keys.push(key.to_owned()),
        }
    }

    apply_compatibility(args, platform, host, &mut resolved);

    debug!(
        target: SWITCHES_TARGET,
        runtime = resolved.runtime_keys.len(),
        application = resolved.application_keys.len(),
        ignored = resolved.ignored_keys.len(),
        "persistent switches applied"
    );
    resolved
}

fn apply_compatibility<H: HostRuntime>(
    args: &ParsedArguments,
    platform: Platform,
    host: &H,
    resolved: &mut ResolvedSwitches,
) {
    for (name, mandatory) in MANDATORY_FEATURE_SWITCHES {
        let merged = merge_feature_list(mandatory, host.switch_value(name).as_deref());
        resolved.record_append(host, name, Some(&merged));
    }

    if platform == Platform::Linux {
        let (name, version) = PORTAL_VERSION_SWITCH;
        resolved.record_append(host, name, Some(version));
    }

    if let Some(flags) = engine_flags(args, platform) {
        resolved.record_append(host, ENGINE_FLAGS_SWITCH, Some(&flags));
    }
}
