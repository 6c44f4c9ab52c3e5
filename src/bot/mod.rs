//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for Ticket Desk: slash commands,
//! button/select/modal handlers, embeds, the background panel refreshers and
//! the ticket sweep.

/// Discord command implementations (tickets, statistics, notes, profiles, admin)
pub mod commands;
/// Embed builders using the guild's presentation settings
pub mod embeds;
/// Discord interaction and gateway event handlers
pub mod handlers;
/// Auto-refreshing statistics panels
pub mod panels;
/// Live leaderboard sessions
pub mod sessions;
/// Inactivity warnings, auto-close and expired locks
pub mod sweep;
/// Registry of background tasks
pub mod tasks;
/// Ticket actions shared by commands and components
pub mod tickets;

use crate::{
    config::settings::AppConfig,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use sessions::SessionRegistry;
use std::sync::Arc;
use tasks::TaskRegistry;
use tracing::{info, instrument};

/// Shared data available to all bot commands.
///
/// Cheap to clone: the refresh tasks keep their own copy.
#[derive(Debug, Clone)]
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Settings loaded at startup
    pub config: Arc<AppConfig>,
    /// Running background tasks
    pub tasks: Arc<TaskRegistry>,
    /// Leaderboards still waiting for input
    pub sessions: Arc<SessionRegistry>,
}

impl BotData {
    /// Creates a new `BotData` with empty task and session registries.
    #[must_use]
    pub fn new(database: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        Self {
            database,
            config,
            tasks: Arc::new(TaskRegistry::new()),
            sessions: Arc::new(SessionRegistry::default()),
        }
    }
}

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            tracing::error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_user_facing() {
                tracing::debug!("Command `{}` rejected: {error}", ctx.command().name);
            } else {
                tracing::error!("Error in command `{}`: {error:?}", ctx.command().name);
            }
            let settings = embeds::settings_for(&ctx.data().database, ctx.guild_id()).await;
            let reply = poise::CreateReply::default()
                .embed(embeds::for_error(&settings, &error))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                tracing::error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!("Error while handling error: {e}");
            }
        }
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::InteractionCreate { interaction } => {
            handlers::components::handle_interaction(ctx, data, interaction).await;
        }
        serenity::FullEvent::Message { new_message } => {
            handlers::events::track_message(ctx, data, new_message).await?;
        }
        _ => {}
    }
    Ok(())
}

/// Builds the framework and runs the client until it stops.
#[instrument(skip(token, config, database))]
pub async fn run_bot(token: String, config: Arc<AppConfig>, database: DatabaseConnection) -> Result<()> {
    let data = BotData::new(database, config);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                let dev_guild = std::env::var("DEV_GUILD_ID")
                    .ok()
                    .and_then(|id| id.parse::<u64>().ok())
                    .filter(|id| *id > 0);
                if let Some(guild_id) = dev_guild {
                    let guild_id = serenity::GuildId::new(guild_id);
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                        .await?;
                    info!("Registered commands in guild {guild_id}");
                } else {
                    info!("Registering commands globally...");
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                }

                sweep::start(ctx, &data);

                let resume_ctx = ctx.clone();
                let resume_data = data.clone();
                tokio::spawn(async move {
                    if let Err(e) = panels::resume_panels(&resume_ctx, &resume_data).await {
                        tracing::error!("Could not resume panels: {e}");
                    }
                });
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| tracing::error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| tracing::error!("Client error: {e:?}"))?;
    Ok(())
}
