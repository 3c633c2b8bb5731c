//! Localized string table

use crate::bundle::BundleManager;
use crate::error::{I18nError, I18nResult};
use crate::Locale;
use fluent_bundle::FluentArgs;
use tracing::{info, warn};

/// Domain-scoped message lookup with English fallback.
#[derive(Debug)]
pub struct I18n {
    default_locale: Locale,
    bundles: BundleManager,
}

impl I18n {
    /// Loads every embedded locale and answers in `default_locale`.
    pub fn new(default_locale: Locale) -> I18nResult<Self> {
        let bundles = BundleManager::load_embedded()?;
        info!(locale = default_locale.code(), "Localization initialized");
        Ok(Self {
            default_locale,
            bundles,
        })
    }

    /// Locale used by [`I18n::lookup`].
    pub const fn default_locale(&self) -> Locale {
        self.default_locale
    }

    /// Formats `{domain}-{key}` in `locale`, falling back to English.
    pub fn try_lookup_in(
        &self,
        locale: Locale,
        domain: &str,
        key: &str,
        args: Option<&FluentArgs>,
    ) -> I18nResult<String> {
        let message_id = format!("{domain}-{key}");

        if self.bundles.has_message(locale, &message_id) {
            return self.bundles.format_message(locale, &message_id, args);
        }

        if locale != Locale::English && self.bundles.has_message(Locale::English, &message_id) {
            warn!(
                message_id,
                locale = locale.code(),
                "Message missing from locale, falling back to English"
            );
            return self.bundles.format_message(Locale::English, &message_id, args);
        }

        Err(I18nError::MessageNotFound { key: message_id })
    }

    /// Formats a message in the default locale; never fails.
    ///
    /// A missing or broken message renders as its id so the reply still goes out.
    pub fn lookup(&self, domain: &str, key: &str, args: Option<&FluentArgs>) -> String {
        self.lookup_in(self.default_locale, domain, key, args)
    }

    /// Formats a message in `locale`; never fails.
    pub fn lookup_in(
        &self,
        locale: Locale,
        domain: &str,
        key: &str,
        args: Option<&FluentArgs>,
    ) -> String {
        self.try_lookup_in(locale, domain, key, args)
            .unwrap_or_else(|e| {
                warn!(error = %e, domain, key, "Localized lookup failed");
                format!("{domain}-{key}")
            })
    }
}
