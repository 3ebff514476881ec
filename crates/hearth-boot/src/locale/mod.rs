//! Locale selection in two phases.
//!
//! An explicit locale from the command line or `argv.json` is resolved as
//! early as possible, before readiness. Without one, the runtime's own locale
//! is consulted once it is ready, falling back to English.

mod language_packs;
mod normalize;

use std::future::Future;

use hearth_config::{ParsedArguments, PersistentConfig};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::warn;

use crate::host::HostRuntime;

pub use self::language_packs::{LanguagePackFiles, LanguagePackResolver, NlsConfiguration};
pub use self::normalize::normalize_os_locale;

const LOCALE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::locale");

/// Locale used when nothing else is known.
pub(crate) const DEFAULT_LOCALE: &str = "en";
/// Pseudo-localisation sentinel, served to the runtime as English.
pub const PSEUDO_LOCALE: &str = "qps-ploc";
const CONFIG_LOCALE_KEY: &str = "locale";

/// Origin of the locale that drove resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LocaleSource {
    /// `--locale` on the command line.
    ExplicitCli,
    /// `locale` in `argv.json`.
    PersistentConfig,
    /// Locale reported by the host runtime.
    OsFallback,
    /// Nothing was known; English was used.
    DefaultEn,
}

/// Summary of the locale choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleDecision {
    /// Locale that drove resolution, absent for the English default.
    pub user_locale: Option<String>,
    /// Normalised OS-preferred locale.
    pub os_locale: String,
    /// Language actually served.
    pub resolved_language: String,
    /// Where the locale came from.
    pub source: LocaleSource,
}

/// A locale and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChosenLocale {
    pub(crate) locale: String,
    pub(crate) source: LocaleSource,
}

/// Picks the highest-precedence non-empty locale, lower-cased.
///
/// Order: command line, persistent configuration, host runtime, English.
pub(crate) fn locale_precedence(
    cli: Option<&str>,
    config: Option<&str>,
    host: Option<&str>,
) -> ChosenLocale {
    let candidates = [
        (cli, LocaleSource::ExplicitCli),
        (config, LocaleSource::PersistentConfig),
        (host, LocaleSource::OsFallback),
    ];
    candidates
        .into_iter()
        .find_map(|(locale, source)| {
            locale
                .filter(|locale| !locale.is_empty())
                .map(|locale| ChosenLocale {
                    locale: locale.to_lowercase(),
                    source,
                })
        })
        .unwrap_or_else(|| ChosenLocale {
            locale: DEFAULT_LOCALE.to_owned(),
            source: LocaleSource::DefaultEn,
        })
}

/// Locale explicitly requested by the user, if any.
pub(crate) fn user_defined_locale(
    args: &ParsedArguments,
    config: &PersistentConfig,
) -> Option<ChosenLocale> {
    let chosen = locale_precedence(args.locale(), config.string(CONFIG_LOCALE_KEY), None);
    (chosen.source != LocaleSource::DefaultEn).then_some(chosen)
}

/// Normalised locale of the user's most preferred system language.
pub(crate) fn preferred_os_locale<H: HostRuntime>(host: &H) -> String {
    let preferred = host.preferred_system_languages();
    normalize_os_locale(preferred.first().map_or(DEFAULT_LOCALE, String::as_str))
}

/// Value for the runtime's `lang` switch.
#[must_use]
pub fn runtime_lang_value(user_locale: &str) -> &str {
    if user_locale.is_empty() || user_locale == PSEUDO_LOCALE {
        DEFAULT_LOCALE
    } else {
        user_locale
    }
}

/// Produces the final language configuration.
///
/// A result from `early` always wins. When `early` is absent or yields
/// nothing, the host's locale is resolved instead, or English when the host
/// reports none.
pub(crate) async fn resolve_nls_configuration<H, F>(
    early: Option<F>,
    host: &H,
    resolver: &LanguagePackResolver,
    os_locale: &str,
) -> NlsConfiguration
where
    H: HostRuntime,
    F: Future<Output = Option<NlsConfiguration>>,
{
    if let Some(early) = early {
        if let Some(configuration) = early.await {
            return configuration;
        }
        warn!(
            target: LOCALE_TARGET,
            "early locale resolution did not complete, using the runtime locale"
        );
    }

    let chosen = locale_precedence(None, None, host.locale().as_deref());
    if chosen.source == LocaleSource::DefaultEn {
        resolver.default_configuration(&chosen.locale, os_locale, chosen.source)
    } else {
        resolver.resolve(&chosen.locale, os_locale, chosen.source).await
    }
}
