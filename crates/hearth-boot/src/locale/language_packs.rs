//! Resolution of installed language packs.
//!
//! Language packs are installed by the application layer and indexed in
//! `languagepacks.json` below the user-data directory. Resolution only locates
//! the pack and its per-commit cache; building the message bundle is left to
//! the application layer.

use std::collections::BTreeMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::{DEFAULT_LOCALE, LocaleDecision, LocaleSource};

const LOCALE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::locale");

const CATALOGUE_FILE: &str = "languagepacks.json";
const CACHE_FOLDER: &str = "clp";
const MESSAGES_FILE: &str = "nls.messages.json";
const TRANSLATIONS_CONFIG_FILE: &str = "tcf.json";
const CORRUPT_MARKER_FILE: &str = "corrupted.info";
/// Translation component carrying the host's own strings.
const MAIN_COMPONENT: &str = "hearth";
/// Legacy pseudo-localisation marker that always resolves to English.
const LEGACY_PSEUDO_LOCALE: &str = "pseudo";

/// Files belonging to a resolved language pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguagePackFiles {
    /// Pack identifier, `<hash>.<language>`.
    pub id: String,
    /// Commit-independent cache root for the pack.
    pub cache_root: Utf8PathBuf,
    /// Translations configuration written by the application layer.
    pub translations_config_file: Utf8PathBuf,
    /// Per-commit message bundle.
    pub messages_file: Utf8PathBuf,
    /// Marker written when the cached bundle is found to be corrupt.
    pub corrupt_marker_file: Utf8PathBuf,
}

/// Language configuration published to child processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NlsConfiguration {
    /// Locale the user asked for, or the runtime's locale.
    pub user_locale: String,
    /// Normalised OS-preferred locale.
    pub os_locale: String,
    /// Language actually served.
    pub resolved_language: String,
    /// English message bundle shipped with the product.
    pub default_messages_file: Utf8PathBuf,
    /// Installed pack serving `resolved_language`, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_pack: Option<LanguagePackFiles>,
    /// Where `user_locale` came from.
    pub source: LocaleSource,
}

impl NlsConfiguration {
    /// Summary of how the locale was chosen.
    #[must_use]
    pub fn decision(&self) -> LocaleDecision {
        LocaleDecision {
            user_locale: (self.source != LocaleSource::DefaultEn)
                .then(|| self.user_locale.clone()),
            os_locale: self.os_locale.clone(),
            resolved_language: self.resolved_language.clone(),
            source: self.source,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LanguagePackEntry {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    translations: BTreeMap<String, String>,
}

type Catalogue = BTreeMap<String, LanguagePackEntry>;

#[derive(Debug, Error)]
enum CatalogueError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Looks up installed language packs for a product build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePackResolver {
    user_data_dir: Utf8PathBuf,
    app_root: Utf8PathBuf,
    commit: Option<String>,
    development: bool,
}

impl LanguagePackResolver {
    /// Creates a resolver.
    ///
    /// `app_root` holds the shipped English bundle; `commit` selects the
    /// per-commit cache and disables packs entirely when absent.
    #[must_use]
    pub fn new(
        user_data_dir: impl Into<Utf8PathBuf>,
        app_root: impl Into<Utf8PathBuf>,
        commit: Option<String>,
        development: bool,
    ) -> Self {
        Self {
            user_data_dir: user_data_dir.into(),
            app_root: app_root.into(),
            commit: commit.filter(|commit| !commit.is_empty()),
            development,
        }
    }

    /// English configuration used whenever no pack applies.
    #[must_use]
    pub fn default_configuration(
        &self,
        user_locale: &str,
        os_locale: &str,
        source: LocaleSource,
    ) -> NlsConfiguration {
        NlsConfiguration {
            user_locale: user_locale.to_owned(),
            os_locale: os_locale.to_owned(),
            resolved_language: DEFAULT_LOCALE.to_owned(),
            default_messages_file: self.app_root.join(MESSAGES_FILE),
            language_pack: None,
            source,
        }
    }

    /// Resolves `user_locale` against the installed packs.
    ///
    /// Never fails: every problem resolves to the English configuration.
    pub async fn resolve(
        &self,
        user_locale: &str,
        os_locale: &str,
        source: LocaleSource,
    ) -> NlsConfiguration {
        let english = || self.default_configuration(user_locale, os_locale, source);

        if self.development
            || user_locale == LEGACY_PSEUDO_LOCALE
            || user_locale.starts_with(DEFAULT_LOCALE)
        {
            return english();
        }
        let Some(commit) = self.commit.as_deref() else {
            return english();
        };

        let catalogue = match self.load_catalogue().await {
            Ok(Some(catalogue)) => catalogue,
            Ok(None) => return english(),
            Err(error) => {
                warn!(target: LOCALE_TARGET, %error, "language pack catalogue unusable");
                return english();
            }
        };

        let Some((language, entry)) = lookup(&catalogue, user_locale) else {
            debug!(target: LOCALE_TARGET, user_locale, "no language pack installed");
            return english();
        };
        let Some(hash) = entry.hash.as_deref().filter(|hash| !hash.is_empty()) else {
            return english();
        };
        let Some(main_translations) = entry.translations.get(MAIN_COMPONENT) else {
            return english();
        };
        if !exists(Utf8Path::new(main_translations)).await {
            debug!(
                target: LOCALE_TARGET,
                language,
                path = %main_translations,
                "language pack translations missing"
            );
            return english();
        }

        let id = format!("{hash}.{language}");
        let cache_root = self.user_data_dir.join(CACHE_FOLDER).join(&id);
        let files = LanguagePackFiles {
            translations_config_file: cache_root.join(TRANSLATIONS_CONFIG_FILE),
            messages_file: cache_root.join(commit).join(MESSAGES_FILE),
            corrupt_marker_file: cache_root.join(CORRUPT_MARKER_FILE),
            cache_root,
            id,
        };

        if exists(&files.corrupt_marker_file).await {
            warn!(
                target: LOCALE_TARGET,
                pack = %files.id,
                "language pack cache is corrupt, clearing it"
            );
            if let Err(error) = tokio::fs::remove_dir_all(&files.cache_root).await {
                warn!(target: LOCALE_TARGET, %error, "failed to clear language pack cache");
            }
            return english();
        }

        NlsConfiguration {
            user_locale: user_locale.to_owned(),
            os_locale: os_locale.to_owned(),
            resolved_language: language.to_owned(),
            default_messages_file: self.app_root.join(MESSAGES_FILE),
            language_pack: Some(files),
            source,
        }
    }

    async fn load_catalogue(&self) -> Result<Option<Catalogue>, CatalogueError> {
        let path = self.user_data_dir.join(CATALOGUE_FILE);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CatalogueError::Read { path, source }),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| CatalogueError::Parse { path, source })
    }
}

/// Finds the longest `-`-separated prefix of `locale` with an installed pack.
fn lookup<'a>(catalogue: &'a Catalogue, locale: &'a str) -> Option<(&'a str, &'a LanguagePackEntry)> {
    let mut language = locale;
    loop {
        if let Some(entry) = catalogue.get(language) {
            return Some((language, entry));
        }
        match language.rsplit_once('-') {
            Some((prefix, _)) if !prefix.is_empty() => language = prefix,
            _ => return None,
        }
    }
}

async fn exists(path: &Utf8Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    struct Installation {
        _dir: TempDir,
        user_data: Utf8PathBuf,
    }

    impl Installation {
        fn resolver(&self) -> LanguagePackResolver {
            LanguagePackResolver::new(
                self.user_data.clone(),
                "/opt/hearth",
                Some("c0ffee".to_owned()),
                false,
            )
        }

        fn install(&self, language: &str) -> Utf8PathBuf {
            let translations = self.user_data.join(format!("{language}.i18n.json"));
            fs::write(&translations, "{}").expect("write translations");
            let catalogue = serde_json::json!({
                (language): { "hash": "h4sh", "translations": { "hearth": translations } }
            });
            fs::write(self.user_data.join(CATALOGUE_FILE), catalogue.to_string())
                .expect("write catalogue");
            translations
        }
    }

    #[fixture]
    fn installation() -> Installation {
        let dir = tempfile::tempdir().expect("temp dir");
        let user_data = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
        Installation {
            _dir: dir,
            user_data,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn english_short_circuits(installation: Installation) {
        installation.install("en");
        let config = installation
            .resolver()
            .resolve("en-gb", "en-gb", LocaleSource::ExplicitCli)
            .await;
        assert_eq!(config.resolved_language, "en");
        assert_eq!(config.language_pack, None);
        assert_eq!(config.default_messages_file, "/opt/hearth/nls.messages.json");
    }

    #[rstest]
    #[tokio::test]
    async fn falls_back_to_shorter_prefix(installation: Installation) {
        installation.install("de");
        let config = installation
            .resolver()
            .resolve("de-ch", "en-us", LocaleSource::PersistentConfig)
            .await;
        assert_eq!(config.user_locale, "de-ch");
        assert_eq!(config.resolved_language, "de");
        let pack = config.language_pack.expect("pack resolved");
        assert_eq!(pack.id, "h4sh.de");
        assert_eq!(pack.cache_root, installation.user_data.join("clp/h4sh.de"));
        assert_eq!(
            pack.messages_file,
            installation.user_data.join("clp/h4sh.de/c0ffee/nls.messages.json")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn corrupt_cache_is_cleared_and_missed(installation: Installation) {
        installation.install("fr");
        let cache_root = installation.user_data.join("clp/h4sh.fr");
        fs::create_dir_all(&cache_root).expect("create cache");
        fs::write(cache_root.join(CORRUPT_MARKER_FILE), "").expect("write marker");

        let config = installation
            .resolver()
            .resolve("fr", "fr", LocaleSource::OsFallback)
            .await;
        assert_eq!(config.resolved_language, "en");
        assert!(!cache_root.exists());
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_catalogue_resolves_to_english(installation: Installation) {
        fs::write(installation.user_data.join(CATALOGUE_FILE), "{ broken").expect("write");
        let config = installation
            .resolver()
            .resolve("ja", "ja", LocaleSource::ExplicitCli)
            .await;
        assert_eq!(config.resolved_language, "en");
        assert_eq!(config.decision().user_locale.as_deref(), Some("ja"));
    }

    #[rstest]
    #[tokio::test]
    async fn uncommitted_builds_skip_packs(installation: Installation) {
        installation.install("de");
        let resolver =
            LanguagePackResolver::new(installation.user_data.clone(), "/opt/hearth", None, false);
        let config = resolver.resolve("de", "de", LocaleSource::ExplicitCli).await;
        assert_eq!(config.resolved_language, "en");
    }
}
