//! Main entry point for modgate.

use anyhow::{Context, Result};
use modgate_bot::ModgateBot;
use modgate_common::init_logging;
use modgate_config::ConfigLoader;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    let _logging = init_logging(&config.logging).context("failed to initialize logging")?;

    info!(
        locale = %config.i18n.default_locale,
        storage = ?config.storage.backend,
        "Starting modgate"
    );

    let bot = ModgateBot::new(config);
    if let Err(e) = bot.start().await {
        error!("Bot stopped with an error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
