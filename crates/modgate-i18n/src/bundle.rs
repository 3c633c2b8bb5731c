//! FluentBundle management and message formatting

use crate::error::{I18nError, I18nResult};
use crate::resource::resources_for;
use crate::Locale;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Owns one thread-safe bundle per locale.
pub struct BundleManager {
    bundles: HashMap<Locale, FluentBundle<FluentResource>>,
}

impl fmt::Debug for BundleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleManager")
            .field("locales", &self.bundles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BundleManager {
    /// Builds bundles for every supported locale from the embedded resources.
    pub fn load_embedded() -> I18nResult<Self> {
        let mut bundles = HashMap::new();

        for locale in Locale::all() {
            let mut bundle = FluentBundle::new_concurrent(vec![locale.to_language_identifier()?]);
            // isolation marks would end up verbatim in chat messages
            bundle.set_use_isolating(false);

            for resource in resources_for(locale) {
                bundle.add_resource(resource.parse()?).map_err(|errors| I18nError::BundleError {
                    resource: resource.name(),
                    errors: errors.iter().map(|e| format!("{e:?}")).collect(),
                })?;
                debug!(resource = %resource.name(), "Added resource to bundle");
            }

            bundles.insert(locale, bundle);
        }

        Ok(Self { bundles })
    }

    /// Check if a message exists in the locale's bundle
    pub fn has_message(&self, locale: Locale, message_id: &str) -> bool {
        self.bundles
            .get(&locale)
            .is_some_and(|bundle| bundle.has_message(message_id))
    }

    /// Format a message with the given arguments
    pub fn format_message(
        &self,
        locale: Locale,
        message_id: &str,
        args: Option<&FluentArgs>,
    ) -> I18nResult<String> {
        let not_found = || I18nError::MessageNotFound {
            key: message_id.to_string(),
        };

        let bundle = self.bundles.get(&locale).ok_or_else(not_found)?;
        let message = bundle.get_message(message_id).ok_or_else(not_found)?;
        let pattern = message.value().ok_or_else(not_found)?;

        let mut errors = Vec::new();
        let formatted = bundle.format_pattern(pattern, args, &mut errors);

        if !errors.is_empty() {
            let errors: Vec<String> = errors.iter().map(|e| format!("{e:?}")).collect();
            warn!(message_id, ?errors, "Formatting errors for message");
            return Err(I18nError::MessageFormatError {
                key: message_id.to_string(),
                errors,
            });
        }

        Ok(formatted.into_owned())
    }
}
