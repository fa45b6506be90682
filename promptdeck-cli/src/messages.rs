use promptdeck_core::defaults::DefaultBucket;
use promptdeck_core::locale::{CatalogError, FixedLocale, LocaleProvider, MessageCatalog};

const EN_MESSAGES: &str = include_str!("../_locales/en/messages.json");
const KO_MESSAGES: &str = include_str!("../_locales/ko/messages.json");

/// Locale provider for `tag`, with the bundled messages of its bucket.
pub fn locale_for(tag: String) -> Result<FixedLocale, CatalogError> {
    let messages = match DefaultBucket::for_locale(&tag) {
        DefaultBucket::Korean => KO_MESSAGES,
        DefaultBucket::Other => EN_MESSAGES,
    };
    Ok(FixedLocale::new(tag).with_catalog(MessageCatalog::from_json(messages)?))
}

/// Localized message, or the key itself when the catalog has no entry.
pub fn text(locale: &dyn LocaleProvider, key: &str, substitutions: &[&str]) -> String {
    locale
        .message(key, substitutions)
        .unwrap_or_else(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[&str] = &[
        "emptyList",
        "promptAdded",
        "promptUpdated",
        "promptDeleted",
        "promptMoved",
        "copiedToClipboard",
        "defaultsRestored",
        "loadFailed",
    ];

    #[test]
    fn test_bundled_catalogs_cover_every_key() {
        for tag in ["en-US", "ko-KR"] {
            let locale = locale_for(tag.to_string()).expect("Bundled messages should parse");
            for key in KEYS {
                assert!(locale.message(key, &["1", "2"]).is_some(), "{} is missing {}", tag, key);
            }
        }
    }

    #[test]
    fn test_text_substitutes_positions() {
        let locale = locale_for("en-US".to_string()).unwrap();

        assert_eq!("Added prompt #4.", text(&locale, "promptAdded", &["4"]));
        assert_eq!("Moved prompt #1 to #3.", text(&locale, "promptMoved", &["1", "3"]));
        assert_eq!("unknownKey", text(&locale, "unknownKey", &[]));
    }
}
