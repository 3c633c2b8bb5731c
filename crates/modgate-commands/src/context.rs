//! Building the moderation services from configuration

use crate::handlers::ModerationHandlers;
use crate::registry::CommandRegistry;
use crate::resolver::TargetResolver;
use crate::silent::{MokaMarkerStore, SilentCoordinator};
use crate::store::{DisabledCommandStore, MemoryDisabledStore, SledDisabledStore};
use crate::toggle::CommandToggle;
use modgate_common::{ChatBackend, ModgateError, Result};
use modgate_config::{Config, StorageBackend, StorageConfig};
use modgate_i18n::{I18n, Locale};
use std::sync::Arc;
use tracing::info;

/// Opens the disabled-command store the configuration asks for.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn DisabledCommandStore>> {
    match config.backend {
        StorageBackend::Sled => Ok(Arc::new(SledDisabledStore::open(&config.path)?)),
        StorageBackend::Memory => {
            info!("Using in-memory disabled command store; toggles are lost on restart");
            Ok(Arc::new(MemoryDisabledStore::new()))
        }
    }
}

/// Loads the string table for the configured locale.
pub fn load_i18n(locale_code: &str) -> Result<I18n> {
    let locale = Locale::parse(locale_code)
        .map_err(|e| ModgateError::localization_with_locale(e.to_string(), locale_code))?;
    I18n::new(locale).map_err(|e| ModgateError::localization_with_locale(e.to_string(), locale.code()))
}

/// Wires every moderation service from configuration around a platform backend.
pub fn create_handlers(
    config: &Config,
    backend: Arc<dyn ChatBackend>,
    resolver: Arc<dyn TargetResolver>,
) -> Result<ModerationHandlers> {
    let store = open_store(&config.storage)?;
    create_handlers_with_store(config, backend, resolver, store)
}

/// Like [`create_handlers`] with an already opened store.
pub fn create_handlers_with_store(
    config: &Config,
    backend: Arc<dyn ChatBackend>,
    resolver: Arc<dyn TargetResolver>,
    store: Arc<dyn DisabledCommandStore>,
) -> Result<ModerationHandlers> {
    let i18n = Arc::new(load_i18n(&config.i18n.default_locale)?);
    let registry = Arc::new(CommandRegistry::from_config(&config.moderation));
    let toggle = CommandToggle::new(registry, store);

    let markers = Arc::new(MokaMarkerStore::new(config.moderation.silent_marker_ttl()));
    let coordinator = Arc::new(SilentCoordinator::new(
        Arc::clone(&backend),
        markers,
        config.moderation.cleanup_delay(),
    ));

    info!(
        locale = i18n.default_locale().code(),
        disablable = toggle.list_disablable().len(),
        marker_ttl_secs = config.moderation.silent_marker_ttl_secs,
        "Moderation services ready"
    );

    Ok(ModerationHandlers::new(
        backend,
        i18n,
        toggle,
        coordinator,
        resolver,
        config.moderation.max_reason_length,
    ))
}
