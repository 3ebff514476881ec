//! Compatibility switches applied on every launch.
//!
//! These work around engine regressions and are merged with, never replace,
//! whatever the invocation already set for the same switch.

use hearth_config::{ParsedArguments, Platform};

/// Feature lists that must always carry the given entries.
pub(crate) const MANDATORY_FEATURE_SWITCHES: [(&str, &[&str]); 3] = [
    (
        "enable-features",
        &[
            "NetAdapterMaxBufSizeFeature",
            "DocumentPolicyIncludeJSCallStacksInCrashReports",
        ],
    ),
    ("disable-features", &["CalculateNativeWinOcclusion"]),
    (
        "disable-blink-features",
        &["FontMatchingCTMigration", "StandardizedBrowserZoom"],
    ),
];

/// Desktop portal version required for file dialogs on Linux.
pub(crate) const PORTAL_VERSION_SWITCH: (&str, &str) = ("xdg-portal-required-version", "4");

/// Switch receiving script-engine flags.
pub(crate) const ENGINE_FLAGS_SWITCH: &str = "js-flags";

const LINUX_ENGINE_FLAGS: &str = "--nodecommit_pooled_pages";

/// Joins `mandatory` with the existing comma-separated value.
///
/// Mandatory entries come first and the existing value is kept verbatim.
pub(crate) fn merge_feature_list(mandatory: &[&str], existing: Option<&str>) -> String {
    let mut merged = mandatory.join(",");
    if let Some(existing) = existing.filter(|value| !value.is_empty()) {
        merged.push(',');
        merged.push_str(existing);
    }
    merged
}

/// Script-engine flags to apply, combining user flags with platform defaults.
pub(crate) fn engine_flags(args: &ParsedArguments, platform: Platform) -> Option<String> {
    let mut flags: Vec<&str> = Vec::new();
    if let Some(user) = args.js_flags() {
        flags.push(user);
    }
    // The mitigation goes last so a contradicting user flag cannot undo it.
    if platform == Platform::Linux {
        flags.push(LINUX_ENGINE_FLAGS);
    }
    if flags.is_empty() {
        None
    } else {
        Some(flags.join(" "))
    }
}
