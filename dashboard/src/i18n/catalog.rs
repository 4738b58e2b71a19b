//! @ai:module:intent Built-in translation catalogs parsed from embedded TOML
//! @ai:module:layer infrastructure
//! @ai:module:public_api Catalog, CatalogError
//! @ai:module:stateless true

use crate::i18n::{Locale, LocalizationStore};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

const EN: &str = include_str!("../../locales/en.toml");
const FR: &str = include_str!("../../locales/fr.toml");
const AR: &str = include_str!("../../locales/ar.toml");

pub const TASK_NAMES: &str = "task_names";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid catalog for locale {locale}: {source}")]
    Parse {
        locale: Locale,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct LocaleFile {
    date_format: String,
    prompt: String,
    #[serde(default)]
    labels: HashMap<String, String>,
    #[serde(default)]
    task_names: HashMap<String, String>,
}

/// @ai:intent In-memory translation tables for every supported locale
#[derive(Debug, Clone)]
pub struct Catalog {
    locales: HashMap<Locale, LocaleFile>,
    prompt_override: Option<String>,
}

impl Catalog {
    /// @ai:intent Parse the catalogs compiled into the binary
    /// @ai:effects pure
    pub fn builtin() -> Result<Self, CatalogError> {
        let mut locales = HashMap::new();
        for (locale, source) in [(Locale::En, EN), (Locale::Fr, FR), (Locale::Ar, AR)] {
            let file: LocaleFile =
                toml::from_str(source).map_err(|source| CatalogError::Parse { locale, source })?;
            locales.insert(locale, file);
        }
        Ok(Self {
            locales,
            prompt_override: None,
        })
    }

    /// @ai:intent Replace the built-in prompt template for every locale
    /// @ai:pre template contains the {{TABLE}} placeholder
    /// @ai:effects pure
    pub fn with_prompt_override(mut self, template: String) -> Self {
        self.prompt_override = Some(template);
        self
    }

    fn file(&self, locale: Locale) -> Option<&LocaleFile> {
        self.locales.get(&locale)
    }

    fn english(&self) -> Option<&LocaleFile> {
        self.locales.get(&Locale::En)
    }
}

impl LocalizationStore for Catalog {
    fn get(&self, locale: Locale, key: &str, default: &str) -> String {
        self.file(locale)
            .and_then(|f| f.labels.get(key))
            .or_else(|| self.english().and_then(|f| f.labels.get(key)))
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn get_mapping(&self, locale: Locale, key: &str) -> HashMap<String, String> {
        if key != TASK_NAMES {
            return HashMap::new();
        }

        let mut mapping = self
            .english()
            .map(|f| f.task_names.clone())
            .unwrap_or_default();
        if let Some(file) = self.file(locale) {
            mapping.extend(file.task_names.clone());
        }
        mapping
    }

    fn prompt_template(&self, locale: Locale) -> String {
        if let Some(ref template) = self.prompt_override {
            return template.clone();
        }
        self.file(locale)
            .or_else(|| self.english())
            .map(|f| f.prompt.trim().to_string())
            .unwrap_or_default()
    }

    fn date_format(&self, locale: Locale) -> String {
        self.file(locale)
            .map(|f| f.date_format.clone())
            .unwrap_or_else(|| "%Y-%m-%d %H:%M".to_string())
    }
}
