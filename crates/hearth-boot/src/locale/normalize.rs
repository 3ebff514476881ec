/// Canonical Simplified Chinese locale.
const SIMPLIFIED_CHINESE: &str = "zh-cn";
/// Canonical Traditional Chinese locale.
const TRADITIONAL_CHINESE: &str = "zh-tw";
/// Region subtags written in Simplified Chinese.
const SIMPLIFIED_REGIONS: [&str; 4] = ["hans", "cn", "sg", "my"];

/// Lower-cases an OS locale and folds Chinese variants onto two canonical
/// locales.
///
/// The region is the second `-`-separated subtag. Simplified regions map to
/// `zh-cn`; every other region, including none, maps to `zh-tw`.
#[must_use]
pub fn normalize_os_locale(raw: &str) -> String {
    let locale = raw.to_lowercase();
    if !locale.starts_with("zh") {
        return locale;
    }
    let region = locale.split('-').nth(1);
    if region.is_some_and(|region| SIMPLIFIED_REGIONS.contains(&region)) {
        SIMPLIFIED_CHINESE.to_owned()
    } else {
        TRADITIONAL_CHINESE.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("zh-Hans", "zh-cn")]
    #[case("zh-CN", "zh-cn")]
    #[case("zh-SG", "zh-cn")]
    #[case("zh-MY", "zh-cn")]
    #[case("zh-Hans-HK", "zh-cn")]
    #[case("zh-Hant", "zh-tw")]
    #[case("zh-TW", "zh-tw")]
    #[case("zh-HK", "zh-tw")]
    #[case("zh-MO", "zh-tw")]
    #[case("zh", "zh-tw")]
    #[case("zh-Hant-CN", "zh-tw")]
    fn folds_chinese_regions(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_os_locale(raw), expected);
    }

    #[rstest]
    #[case("en-US", "en-us")]
    #[case("de", "de")]
    #[case("pt-BR", "pt-br")]
    fn lower_cases_other_locales(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_os_locale(raw), expected);
    }
}
