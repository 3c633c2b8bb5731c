//! Core bot logic using the Poise framework.

use crate::commands::{self, command_check};
use crate::discord::{DiscordBackend, DiscordResolver};
use crate::error::{BotError, BotResult};
use modgate_commands::{create_handlers, Invocation, ModerationHandlers};
use modgate_common::{ChatId, MessageId, UserId};
use modgate_config::Config;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Shared application state accessible across commands and event handlers.
pub struct Data {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Moderation command handlers.
    pub handlers: Arc<ModerationHandlers>,
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("config", &"<Config>")
            .field("handlers", &self.handlers)
            .finish()
    }
}

/// Gateway intents the bot needs: guild messages with their content.
pub fn intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT
}

/// Builds the framework options around the configured prefix.
pub fn framework_options(config: &Config) -> poise::FrameworkOptions<Data, BotError> {
    poise::FrameworkOptions {
        commands: commands::all(),
        command_check: Some(|ctx| Box::pin(command_check(ctx))),
        on_error: |error| Box::pin(on_error(error)),
        event_handler: |ctx, event, framework, data| {
            Box::pin(event_handler(ctx, event, framework, data))
        },
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(config.discord.prefix.clone()),
            mention_as_prefix: true,
            case_insensitive_commands: true,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Initializes shared data once the gateway reports ready.
async fn setup(
    ctx: &serenity::Context,
    ready: &serenity::Ready,
    config: Arc<Config>,
) -> BotResult<Data> {
    info!(user = %ready.user.name, id = %ready.user.id, guilds = ready.guilds.len(), "Bot connected");

    let backend = Arc::new(DiscordBackend::new(
        Arc::clone(&ctx.http),
        ready.user.id,
        &config.discord,
    ));
    let resolver = Arc::new(DiscordResolver::new(Arc::clone(&backend)));
    let handlers = create_handlers(&config, backend, resolver)?;

    Ok(Data {
        config,
        handlers: Arc::new(handlers),
    })
}

/// Global error handler for the framework.
async fn on_error(error: poise::FrameworkError<'_, Data, BotError>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::CommandCheckFailed { ctx, error, .. } => match error {
            Some(error) => error!(command = %ctx.command().name, "Command check failed: {}", error),
            None => debug!(command = %ctx.command().name, "Disabled command refused"),
        },
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command '{}': {:?}", ctx.command().name, error);
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!("Error in event handler for {:?}: {:?}", event.snake_case_name(), error);
        }
        error => {
            debug!("Framework error: {}", error);
        }
    }
}

/// Central event handler for Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, BotError>,
    data: &Data,
) -> BotResult<()> {
    match event {
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let Some(component) = interaction.as_message_component() {
                on_component(ctx, component, data).await?;
            }
        }
        serenity::FullEvent::GuildCreate { guild, .. } => {
            info!(guild = %guild.name, id = %guild.id, "Guild available");
        }
        _ => {}
    }
    Ok(())
}

/// Invocation for a pressed button: the message is the one carrying the button.
pub fn invocation_from_component(component: &serenity::ComponentInteraction) -> Invocation {
    Invocation::new(
        ChatId(component.channel_id.get()),
        UserId(component.user.id.get()),
        MessageId(component.message.id.get()),
        "",
    )
}

async fn on_component(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
) -> BotResult<()> {
    component
        .create_response(ctx, serenity::CreateInteractionResponse::Acknowledge)
        .await?;

    let invocation = invocation_from_component(component);
    if let Err(error) = data
        .handlers
        .on_button(&component.data.custom_id, &invocation)
        .await
    {
        debug!(custom_id = %component.data.custom_id, error = %error, "Button press rejected");
        let text = data.handlers.render_error(invocation.chat_id, &error).await;
        component
            .create_followup(
                ctx,
                serenity::CreateInteractionResponseFollowup::new()
                    .content(text)
                    .ephemeral(true),
            )
            .await?;
    }
    Ok(())
}

/// Main bot structure.
pub struct ModgateBot {
    config: Arc<Config>,
}

impl ModgateBot {
    /// Creates a new bot instance.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Connects to Discord and runs until shutdown.
    pub async fn start(&self) -> BotResult<()> {
        let config = Arc::clone(&self.config);
        let framework = poise::Framework::builder()
            .options(framework_options(&self.config))
            .setup(move |ctx, ready, _framework| Box::pin(setup(ctx, ready, config)))
            .build();

        let mut client = serenity::ClientBuilder::new(&self.config.discord.token, intents())
            .framework(framework)
            .await?;

        let shard_manager = client.shard_manager.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {:?}", e);
                return;
            }
            info!("Received shutdown signal, starting graceful shutdown");
            shard_manager.shutdown_all().await;
        });

        info!(prefix = %self.config.discord.prefix, "modgate is starting up");
        client.start().await?;
        info!("modgate has shut down");
        Ok(())
    }
}
