//! # Locale
//!
//! The locale collaborator: a language tag for picking default content, plus localized
//! messages read from the extension `messages.json` format.
//!
//! ```json
//! {
//!   "promptAdded": {
//!     "message": "Added prompt #$position$.",
//!     "placeholders": { "position": { "content": "$1" } }
//!   }
//! }
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Locale used when the environment does not name one.
pub const FALLBACK_LOCALE: &str = "ko-KR";

pub trait LocaleProvider: Send + Sync {
    /// BCP-47-like language tag, e.g. `ko-KR` or `en-US`.
    fn locale(&self) -> String;

    /// Localized text for `key`, with `$1`..`$9` replaced from `substitutions`.
    fn message(&self, key: &str, substitutions: &[&str]) -> Option<String> {
        let _ = (key, substitutions);
        None
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid messages file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct MessageEntry {
    message: String,
    #[serde(default)]
    placeholders: HashMap<String, PlaceholderEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlaceholderEntry {
    content: String,
}

/// Messages of one locale. Message and placeholder names are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    messages: HashMap<String, MessageEntry>,
}

impl MessageCatalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: HashMap<String, MessageEntry> = serde_json::from_str(json)?;
        let messages = raw
            .into_iter()
            .map(|(name, mut entry)| {
                entry.placeholders = entry
                    .placeholders
                    .into_iter()
                    .map(|(name, placeholder)| (name.to_ascii_lowercase(), placeholder))
                    .collect();
                (name.to_ascii_lowercase(), entry)
            })
            .collect();
        Ok(Self { messages })
    }

    pub fn format(&self, key: &str, substitutions: &[&str]) -> Option<String> {
        let entry = self.messages.get(&key.to_ascii_lowercase())?;
        Some(expand(&entry.message, Some(&entry.placeholders), substitutions))
    }
}

fn expand(
    message: &str,
    placeholders: Option<&HashMap<String, PlaceholderEntry>>,
    substitutions: &[&str],
) -> String {
    let mut out = String::with_capacity(message.len());
    let mut rest = message;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(stripped) = after.strip_prefix('$') {
            out.push('$');
            rest = stripped;
            continue;
        }

        if let Some(digit) = after.chars().next().and_then(|c| c.to_digit(10)).filter(|d| *d > 0) {
            let index = digit as usize - 1;
            out.push_str(substitutions.get(index).copied().unwrap_or(""));
            rest = &after[1..];
            continue;
        }

        let named = after.find('$').and_then(|end| {
            let name = &after[..end];
            placeholders?
                .get(&name.to_ascii_lowercase())
                .map(|placeholder| (end, placeholder))
        });
        match named {
            Some((end, placeholder)) => {
                out.push_str(&expand(&placeholder.content, None, substitutions));
                rest = &after[end + 1..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// A locale provider with a fixed tag.
#[derive(Debug, Clone)]
pub struct FixedLocale {
    tag: String,
    catalog: MessageCatalog,
}

impl FixedLocale {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            catalog: MessageCatalog::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: MessageCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}

impl LocaleProvider for FixedLocale {
    fn locale(&self) -> String {
        self.tag.clone()
    }

    fn message(&self, key: &str, substitutions: &[&str]) -> Option<String> {
        self.catalog.format(key, substitutions)
    }
}

/// Locale of the running process, from `LC_ALL`, `LC_MESSAGES` or `LANG`.
pub fn system_locale() -> String {
    locale_from_env(|name| std::env::var(name).ok())
}

pub fn locale_from_env(lookup: impl Fn(&str) -> Option<String>) -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .into_iter()
        .filter_map(|name| lookup(name))
        .find_map(|raw| normalize_tag(&raw))
        .unwrap_or_else(|| FALLBACK_LOCALE.to_string())
}

/// Turns a POSIX locale (`ko_KR.UTF-8@euro`) into a language tag (`ko-KR`).
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim()
        .replace('_', "-");
    match tag.as_str() {
        "" | "C" | "POSIX" => None,
        _ => Some(tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGES: &str = r#"{
        "promptAdded": {
            "message": "Added prompt #$Position$.",
            "description": "Shown after a prompt is added",
            "placeholders": { "position": { "content": "$1", "example": "3" } }
        },
        "price": { "message": "Costs $$5, paid by $1 and $2" },
        "plain": { "message": "No prompts yet." }
    }"#;

    #[test]
    fn test_named_placeholder_resolves_to_substitution() {
        let catalog = MessageCatalog::from_json(MESSAGES).unwrap();

        assert_eq!(
            Some("Added prompt #4.".to_string()),
            catalog.format("promptAdded", &["4"])
        );
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let catalog = MessageCatalog::from_json(MESSAGES).unwrap();

        assert_eq!(Some("No prompts yet.".to_string()), catalog.format("PLAIN", &[]));
        assert_eq!(None, catalog.format("missing", &[]));
    }

    #[test]
    fn test_positional_and_escaped_dollars() {
        let catalog = MessageCatalog::from_json(MESSAGES).unwrap();

        assert_eq!(
            Some("Costs $5, paid by Ann and ".to_string()),
            catalog.format("price", &["Ann"])
        );
    }

    #[test]
    fn test_invalid_catalog() {
        let result = MessageCatalog::from_json("{\"a\": {\"description\": \"no message\"}}");
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_fixed_locale() {
        let catalog = MessageCatalog::from_json(MESSAGES).unwrap();
        let locale = FixedLocale::new("en-US").with_catalog(catalog);

        assert_eq!("en-US", locale.locale());
        assert_eq!(Some("No prompts yet.".to_string()), locale.message("plain", &[]));
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(Some("ko-KR".to_string()), normalize_tag("ko_KR.UTF-8"));
        assert_eq!(Some("de-DE".to_string()), normalize_tag("de_DE@euro"));
        assert_eq!(Some("en".to_string()), normalize_tag("en"));
        assert_eq!(None, normalize_tag("C"));
        assert_eq!(None, normalize_tag("POSIX.UTF-8"));
        assert_eq!(None, normalize_tag(""));
    }

    #[test]
    fn test_locale_from_env_order_and_fallback() {
        let env = |name: &str| match name {
            "LC_ALL" => Some("C".to_string()),
            "LANG" => Some("en_US.UTF-8".to_string()),
            _ => None,
        };
        assert_eq!("en-US", locale_from_env(env));

        assert_eq!(FALLBACK_LOCALE, locale_from_env(|_| None));
    }
}
