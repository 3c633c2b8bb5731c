//! Locale management and utilities

use crate::error::{I18nError, I18nResult};
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

/// Supported locales
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Locale {
    /// English, also the fallback for missing keys.
    #[default]
    English,
    /// Spanish.
    Spanish,
}

impl Locale {
    /// Get the language code for this locale
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::Spanish => "es-ES",
        }
    }

    /// Get the short language code for this locale
    pub const fn short_code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Spanish => "es",
        }
    }

    /// Parse a locale from a language code, ignoring case and region
    pub fn from_code(code: &str) -> Option<Self> {
        let language = code.split(['-', '_']).next()?.to_ascii_lowercase();
        match language.as_str() {
            "en" => Some(Self::English),
            "es" => Some(Self::Spanish),
            _ => None,
        }
    }

    /// Like [`Locale::from_code`] but reporting unknown codes as an error
    pub fn parse(code: &str) -> I18nResult<Self> {
        Self::from_code(code).ok_or_else(|| I18nError::UnsupportedLocale(code.to_string()))
    }

    /// Convert to Fluent LanguageIdentifier
    pub fn to_language_identifier(self) -> I18nResult<LanguageIdentifier> {
        self.code()
            .parse()
            .map_err(|_| I18nError::InvalidLanguageId(self.code().to_string()))
    }

    /// Get all supported locales
    pub const fn all() -> [Self; 2] {
        [Self::English, Self::Spanish]
    }
}
