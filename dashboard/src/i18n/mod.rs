//! @ai:module:intent Localized labels, task names and prompt templates
//! @ai:module:layer domain
//! @ai:module:public_api Locale, LocalizationStore, Catalog, CatalogError

pub mod catalog;

pub use catalog::{Catalog, CatalogError};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// @ai:intent Supported report languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
    Ar,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Fr, Locale::Ar];

    /// @ai:intent Parse a language code, falling back to English for unknown codes
    /// @ai:effects pure
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "fr" | "fr-fr" | "fr_fr" => Locale::Fr,
            "ar" | "ar-ma" | "ar_ma" => Locale::Ar,
            "en" | "en-us" | "en_us" | "en-gb" => Locale::En,
            other => {
                tracing::debug!("Unsupported locale '{}', using en", other);
                Locale::En
            }
        }
    }

    /// @ai:intent Get the language code
    /// @ai:effects pure
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
            Locale::Ar => "ar",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// @ai:intent Read-only access to translated strings
pub trait LocalizationStore: Send + Sync {
    /// @ai:intent Look up a label, falling back to English and then to `default`
    fn get(&self, locale: Locale, key: &str, default: &str) -> String;

    /// @ai:intent Look up a composite entry such as task display names
    fn get_mapping(&self, locale: Locale, key: &str) -> HashMap<String, String>;

    /// @ai:intent Narrative prompt template with a `{{TABLE}}` placeholder
    fn prompt_template(&self, locale: Locale) -> String;

    /// @ai:intent strftime pattern for report timestamps
    fn date_format(&self, locale: Locale) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_fallback() {
        assert_eq!(Locale::from_code("fr"), Locale::Fr);
        assert_eq!(Locale::from_code("AR"), Locale::Ar);
        assert_eq!(Locale::from_code("es"), Locale::En);
        assert_eq!(Locale::from_code(""), Locale::En);
    }

    #[test]
    fn test_locale_code_round_trip() {
        for locale in Locale::ALL {
            assert_eq!(Locale::from_code(locale.code()), locale);
        }
    }
}
