//! Allow-list of persistent switches and how each one is applied.
//!
//! Only keys listed here ever reach the runtime or the application layer.
//! Each key maps to one [`SwitchRule`], and each rule turns a JSON value into
//! a [`SwitchPlan`]: the concrete actions to perform plus diagnostics for the
//! parts of the value that were skipped.

use hearth_config::{Platform, is_truthy};
use serde_json::Value;
use strum::Display;
use thiserror::Error;

/// Layer that consumes a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SwitchCategory {
    /// Applied to the runtime's own command line.
    Runtime,
    /// Re-injected into the process arguments for the application layer.
    Application,
}

/// Rewrites applied to a valued switch before it reaches the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
    /// Maps retired credential-store backends to their replacement.
    PasswordStore,
}

impl Migration {
    fn apply(self, value: &str) -> &str {
        match self {
            Self::PasswordStore => match value {
                "gnome" | "gnome-keyring" => "gnome-libsecret",
                other => other,
            },
        }
    }
}

/// How an allow-listed key is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchRule {
    /// `true` appends a bare switch; a non-empty string appends `key=value`.
    Valued,
    /// Like [`SwitchRule::Valued`], but `true` calls a dedicated runtime API.
    DedicatedDisable,
    /// Like [`SwitchRule::Valued`], with string values rewritten first.
    MigratedValued(Migration),
    /// Each array entry becomes `--key entry` in the process arguments.
    RepeatedReinjection,
    /// A string or array of strings, each forwarded as `--log value`.
    LogLevel,
    /// A truthy value forwards a bare `--key` to the process arguments.
    BareReinjection,
}

impl SwitchRule {
    /// Layer that consumes switches following this rule.
    #[must_use]
    pub const fn category(self) -> SwitchCategory {
        match self {
            Self::Valued | Self::DedicatedDisable | Self::MigratedValued(_) => {
                SwitchCategory::Runtime
            }
            Self::RepeatedReinjection | Self::LogLevel | Self::BareReinjection => {
                SwitchCategory::Application
            }
        }
    }

    /// Plans how `value`, stored under `key`, is applied.
    #[must_use]
    pub fn plan(self, key: &str, value: &Value) -> SwitchPlan {
        match self {
            Self::Valued => plan_valued(key, value, None, false),
            Self::DedicatedDisable => plan_valued(key, value, None, true),
            Self::MigratedValued(migration) => plan_valued(key, value, Some(migration), false),
            Self::RepeatedReinjection => plan_repeated(key, value),
            Self::LogLevel => plan_log_level(key, value),
            Self::BareReinjection => {
                if is_truthy(value) {
                    SwitchPlan::action(SwitchAction::Reinject(vec![format!("--{key}")]))
                } else {
                    SwitchPlan::default()
                }
            }
        }
    }
}

/// One side effect produced by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchAction {
    /// Append a runtime switch, bare when `value` is `None`.
    Append {
        /// Switch name.
        name: String,
        /// Switch value.
        value: Option<String>,
    },
    /// Call the runtime's dedicated hardware-acceleration kill switch.
    DisableHardwareAcceleration,
    /// Add tokens to the process arguments for the application layer.
    Reinject(Vec<String>),
}

/// Part of a stored value that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchDiagnostic {
    /// The key requires an array.
    #[error("`{key}` expects an array of strings")]
    ExpectedArray {
        /// Offending key.
        key: String,
    },
    /// One array entry was not a non-empty string.
    #[error("`{key}` entry {index} is not a non-empty string")]
    InvalidEntry {
        /// Offending key.
        key: String,
        /// Zero-based entry position.
        index: usize,
    },
    /// The value type is not supported for the key.
    #[error("`{key}` has an unsupported value")]
    UnsupportedValue {
        /// Offending key.
        key: String,
    },
}

/// Outcome of planning one stored switch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchPlan {
    /// Actions to perform, in order.
    pub actions: Vec<SwitchAction>,
    /// Skipped parts of the value.
    pub diagnostics: Vec<SwitchDiagnostic>,
}

impl SwitchPlan {
    fn action(action: SwitchAction) -> Self {
        Self {
            actions: vec![action],
            diagnostics: Vec::new(),
        }
    }

    fn diagnostic(diagnostic: SwitchDiagnostic) -> Self {
        Self {
            actions: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }
}

const RUNTIME_RULES: &[(&str, SwitchRule)] = &[
    ("disable-hardware-acceleration", SwitchRule::DedicatedDisable),
    ("force-color-profile", SwitchRule::Valued),
    ("disable-lcd-text", SwitchRule::Valued),
    ("proxy-bypass-list", SwitchRule::Valued),
    ("remote-debugging-port", SwitchRule::Valued),
];

const LINUX_RUNTIME_RULES: &[(&str, SwitchRule)] = &[
    ("force-renderer-accessibility", SwitchRule::Valued),
    (
        "password-store",
        SwitchRule::MigratedValued(Migration::PasswordStore),
    ),
];

const APPLICATION_RULES: &[(&str, SwitchRule)] = &[
    ("enable-proposed-api", SwitchRule::RepeatedReinjection),
    ("log-level", SwitchRule::LogLevel),
    ("use-inmemory-secretstorage", SwitchRule::BareReinjection),
    ("enable-rdp-display-tracking", SwitchRule::BareReinjection),
];

/// Looks up the rule for `key` on `platform`, or `None` when not allow-listed.
#[must_use]
pub fn rule_for(key: &str, platform: Platform) -> Option<SwitchRule> {
    let linux_rules: &[(&str, SwitchRule)] = if platform == Platform::Linux {
        LINUX_RUNTIME_RULES
    } else {
        &[]
    };
    RUNTIME_RULES
        .iter()
        .chain(linux_rules)
        .chain(APPLICATION_RULES)
        .find(|(name, _)| *name == key)
        .map(|(_, rule)| *rule)
}

fn plan_valued(
    key: &str,
    value: &Value,
    migration: Option<Migration>,
    dedicated: bool,
) -> SwitchPlan {
    match value {
        Value::Bool(true) => bare_or_dedicated(key, dedicated),
        Value::String(text) if text == "true" => bare_or_dedicated(key, dedicated),
        Value::String(text) if !text.is_empty() => {
            let text = migration.map_or(text.as_str(), |migration| migration.apply(text));
            SwitchPlan::action(SwitchAction::Append {
                name: key.to_owned(),
                value: Some(text.to_owned()),
            })
        }
        Value::Bool(false) | Value::String(_) | Value::Null => SwitchPlan::default(),
        Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            SwitchPlan::diagnostic(SwitchDiagnostic::UnsupportedValue {
                key: key.to_owned(),
            })
        }
    }
}

fn bare_or_dedicated(key: &str, dedicated: bool) -> SwitchPlan {
    if dedicated {
        SwitchPlan::action(SwitchAction::DisableHardwareAcceleration)
    } else {
        SwitchPlan::action(SwitchAction::Append {
            name: key.to_owned(),
            value: None,
        })
    }
}

fn plan_repeated(key: &str, value: &Value) -> SwitchPlan {
    let Value::Array(entries) = value else {
        return SwitchPlan::diagnostic(SwitchDiagnostic::ExpectedArray {
            key: key.to_owned(),
        });
    };

    let mut plan = SwitchPlan::default();
    for (index, entry) in entries.iter().enumerate() {
        match entry.as_str().filter(|text| !text.is_empty()) {
            Some(text) => plan
                .actions
                .push(SwitchAction::Reinject(vec![format!("--{key}"), text.to_owned()])),
            None => plan.diagnostics.push(SwitchDiagnostic::InvalidEntry {
                key: key.to_owned(),
                index,
            }),
        }
    }
    plan
}

fn plan_log_level(key: &str, value: &Value) -> SwitchPlan {
    let log = |level: &str| SwitchAction::Reinject(vec!["--log".to_owned(), level.to_owned()]);
    match value {
        Value::String(level) if !level.is_empty() => SwitchPlan::action(log(level)),
        Value::Array(levels) => {
            let mut plan = SwitchPlan::default();
            for (index, entry) in levels.iter().enumerate() {
                match entry.as_str().filter(|text| !text.is_empty()) {
                    Some(level) => plan.actions.push(log(level)),
                    None => plan.diagnostics.push(SwitchDiagnostic::InvalidEntry {
                        key: key.to_owned(),
                        index,
                    }),
                }
            }
            plan
        }
        _ => SwitchPlan::diagnostic(SwitchDiagnostic::UnsupportedValue {
            key: key.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn append(name: &str, value: Option<&str>) -> SwitchAction {
        SwitchAction::Append {
            name: name.to_owned(),
            value: value.map(str::to_owned),
        }
    }

    #[rstest]
    #[case::bool_true(json!(true), vec![SwitchAction::DisableHardwareAcceleration])]
    #[case::string_true(json!("true"), vec![SwitchAction::DisableHardwareAcceleration])]
    #[case::bool_false(json!(false), vec![])]
    fn hardware_acceleration_uses_dedicated_path(
        #[case] value: Value,
        #[case] expected: Vec<SwitchAction>,
    ) {
        let rule = rule_for("disable-hardware-acceleration", Platform::Windows)
            .expect("allow-listed everywhere");
        assert_eq!(rule.plan("disable-hardware-acceleration", &value).actions, expected);
    }

    #[rstest]
    #[case::gnome("gnome", "gnome-libsecret")]
    #[case::gnome_keyring("gnome-keyring", "gnome-libsecret")]
    #[case::kwallet("kwallet5", "kwallet5")]
    fn password_store_values_are_migrated(#[case] stored: &str, #[case] applied: &str) {
        let rule = rule_for("password-store", Platform::Linux).expect("linux rule");
        let plan = rule.plan("password-store", &json!(stored));
        assert_eq!(plan.actions, vec![append("password-store", Some(applied))]);
    }

    #[test]
    fn linux_rules_are_platform_conditional() {
        assert_eq!(rule_for("password-store", Platform::MacOs), None);
        assert_eq!(rule_for("force-renderer-accessibility", Platform::Windows), None);
        assert!(rule_for("force-renderer-accessibility", Platform::Linux).is_some());
    }

    #[test]
    fn unknown_keys_are_not_allow_listed() {
        assert_eq!(rule_for("no-sandbox", Platform::Linux), None);
        assert_eq!(rule_for("locale", Platform::Linux), None);
    }

    #[test]
    fn valued_switch_appends_value() {
        let plan = SwitchRule::Valued.plan("force-color-profile", &json!("srgb"));
        assert_eq!(plan.actions, vec![append("force-color-profile", Some("srgb"))]);
        let bare = SwitchRule::Valued.plan("disable-lcd-text", &json!(true));
        assert_eq!(bare.actions, vec![append("disable-lcd-text", None)]);
    }

    #[test]
    fn valued_switch_rejects_numbers() {
        let plan = SwitchRule::Valued.plan("remote-debugging-port", &json!(9222));
        assert!(plan.actions.is_empty());
        assert_eq!(plan.diagnostics.len(), 1);
    }

    #[test]
    fn proposed_api_skips_invalid_entries() {
        let plan = SwitchRule::RepeatedReinjection.plan(
            "enable-proposed-api",
            &json!(["pub.one", 7, "", "pub.two"]),
        );
        assert_eq!(
            plan.actions,
            vec![
                SwitchAction::Reinject(vec!["--enable-proposed-api".to_owned(), "pub.one".to_owned()]),
                SwitchAction::Reinject(vec!["--enable-proposed-api".to_owned(), "pub.two".to_owned()]),
            ]
        );
        assert_eq!(
            plan.diagnostics,
            vec![
                SwitchDiagnostic::InvalidEntry { key: "enable-proposed-api".to_owned(), index: 1 },
                SwitchDiagnostic::InvalidEntry { key: "enable-proposed-api".to_owned(), index: 2 },
            ]
        );
    }

    #[test]
    fn proposed_api_requires_array() {
        let plan = SwitchRule::RepeatedReinjection.plan("enable-proposed-api", &json!("pub.one"));
        assert!(plan.actions.is_empty());
        assert!(matches!(
            plan.diagnostics.as_slice(),
            [SwitchDiagnostic::ExpectedArray { .. }]
        ));
    }

    #[rstest]
    #[case::single(json!("trace"), 1)]
    #[case::per_extension(json!(["debug", "pub.ext:trace"]), 2)]
    fn log_level_forwards_each_value(#[case] value: Value, #[case] expected: usize) {
        let plan = SwitchRule::LogLevel.plan("log-level", &value);
        assert_eq!(plan.actions.len(), expected);
        assert!(plan.diagnostics.is_empty());
    }

    #[rstest]
    #[case::truthy(json!(true), true)]
    #[case::non_empty(json!("yes"), true)]
    #[case::falsy(json!(false), false)]
    #[case::zero(json!(0), false)]
    fn bare_reinjection_follows_truthiness(#[case] value: Value, #[case] applied: bool) {
        let plan = SwitchRule::BareReinjection.plan("use-inmemory-secretstorage", &value);
        assert_eq!(!plan.actions.is_empty(), applied);
    }
}
