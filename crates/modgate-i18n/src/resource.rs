//! Fluent resources compiled into the binary.

use crate::error::{I18nError, I18nResult};
use crate::Locale;
use fluent_bundle::FluentResource;
use tracing::error;

/// One `.ftl` file: a domain of messages for one locale.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedResource {
    /// Locale the file is written in.
    pub locale: Locale,
    /// Message domain; every message id in the file starts with `{domain}-`.
    pub domain: &'static str,
    /// Raw Fluent source.
    pub source: &'static str,
}

/// All shipped resources.
pub const EMBEDDED: &[EmbeddedResource] = &[
    EmbeddedResource {
        locale: Locale::English,
        domain: "common",
        source: include_str!("../locales/en/common.ftl"),
    },
    EmbeddedResource {
        locale: Locale::English,
        domain: "disable",
        source: include_str!("../locales/en/disable.ftl"),
    },
    EmbeddedResource {
        locale: Locale::English,
        domain: "restrictions",
        source: include_str!("../locales/en/restrictions.ftl"),
    },
    EmbeddedResource {
        locale: Locale::Spanish,
        domain: "common",
        source: include_str!("../locales/es/common.ftl"),
    },
    EmbeddedResource {
        locale: Locale::Spanish,
        domain: "disable",
        source: include_str!("../locales/es/disable.ftl"),
    },
    EmbeddedResource {
        locale: Locale::Spanish,
        domain: "restrictions",
        source: include_str!("../locales/es/restrictions.ftl"),
    },
];

impl EmbeddedResource {
    /// Name used in diagnostics, e.g. `en/restrictions.ftl`.
    pub fn name(&self) -> String {
        format!("{}/{}.ftl", self.locale.short_code(), self.domain)
    }

    /// Parses the source into a Fluent resource.
    pub fn parse(&self) -> I18nResult<FluentResource> {
        FluentResource::try_new(self.source.to_string()).map_err(|(_, errors)| {
            let errors: Vec<String> = errors.iter().map(|e| format!("{e:?}")).collect();
            error!(resource = %self.name(), ?errors, "Failed to parse Fluent resource");
            I18nError::FluentParseError {
                resource: self.name(),
                errors,
            }
        })
    }
}

/// Resources for a single locale.
pub fn resources_for(locale: Locale) -> impl Iterator<Item = &'static EmbeddedResource> {
    EMBEDDED.iter().filter(move |resource| resource.locale == locale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_embedded_resource_parses() {
        for resource in EMBEDDED {
            resource
                .parse()
                .unwrap_or_else(|e| panic!("{} failed to parse: {e}", resource.name()));
        }
    }

    #[test]
    fn test_message_ids_are_namespaced_by_domain() {
        for resource in EMBEDDED {
            let prefix = format!("{}-", resource.domain);
            for line in resource.source.lines() {
                let starts_message = line
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_lowercase());
                if starts_message {
                    assert!(
                        line.starts_with(&prefix),
                        "{}: '{line}' is outside its domain",
                        resource.name()
                    );
                }
            }
        }
    }

    #[test]
    fn test_every_locale_ships_every_domain() {
        for locale in Locale::all() {
            assert_eq!(resources_for(locale).count(), 3);
        }
    }
}
