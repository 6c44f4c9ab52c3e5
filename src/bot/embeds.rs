//! Embed builders themed with the guild's colours and footer.

use crate::{
    core::guild::{self, GuildSettings},
    errors::Error,
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;

/// Text shown for internal errors.
pub const GENERIC_ERROR: &str = "Something went wrong while handling that. Please try again later.";

/// Settings for `guild_id`, defaults outside a guild or when the lookup fails.
pub async fn settings_for(db: &DatabaseConnection, guild_id: Option<serenity::GuildId>) -> GuildSettings {
    let Some(guild_id) = guild_id else {
        return GuildSettings::default();
    };
    guild::get_settings(db, &guild_id.to_string())
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(%guild_id, "Falling back to default guild settings: {e}");
            GuildSettings::default()
        })
}

fn themed(settings: &GuildSettings, colour: u32) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .colour(colour)
        .footer(serenity::CreateEmbedFooter::new(&settings.footer))
}

/// Neutral embed.
#[must_use]
pub fn primary(settings: &GuildSettings) -> serenity::CreateEmbed {
    themed(settings, settings.primary_colour)
}

/// Success embed with a title and description.
#[must_use]
pub fn success(settings: &GuildSettings, title: &str, description: impl Into<String>) -> serenity::CreateEmbed {
    themed(settings, settings.success_colour)
        .title(title)
        .description(description)
}

/// Error embed.
#[must_use]
pub fn error(settings: &GuildSettings, message: impl Into<String>) -> serenity::CreateEmbed {
    themed(settings, settings.error_colour)
        .title("❌ Error")
        .description(message)
}

/// Error embed for `err`: its own text when user-facing, a generic message otherwise.
#[must_use]
pub fn for_error(settings: &GuildSettings, err: &Error) -> serenity::CreateEmbed {
    if err.is_user_facing() {
        error(settings, err.to_string())
    } else {
        error(settings, GENERIC_ERROR)
    }
}
