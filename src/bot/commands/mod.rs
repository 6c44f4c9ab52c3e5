//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Category and presentation settings commands
pub mod admin;

/// General utility commands
pub mod general;

/// Staff leaderboard
pub mod leaderboard;

/// Staff notes about members and ticket staff threads
pub mod notes;

/// Auto-refreshing panels
pub mod panel;

/// Staff profiles
pub mod profile;

/// Guild statistics
pub mod stats;

/// Ticket lifecycle commands
pub mod ticket;

use crate::{
    bot::{BotData, tickets},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;

// Export commands
pub use admin::*;
pub use general::*;
pub use leaderboard::*;
pub use notes::*;
pub use panel::*;
pub use profile::*;
pub use stats::*;
pub use ticket::*;

/// Every command registered with Discord.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        ping(),
        help(),
        new(),
        claim(),
        unclaim(),
        transfer(),
        lock(),
        unlock(),
        close(),
        leaderboard(),
        stats(),
        panel(),
        note(),
        stickynote(),
        viewnotes(),
        setprofile(),
        viewprofile(),
        profiles(),
        category(),
        settings(),
    ]
}

/// Guild of the invocation, failing outside guilds.
pub fn guild_of(ctx: poise::Context<'_, BotData, Error>) -> Result<serenity::GuildId> {
    ctx.guild_id().ok_or(Error::NotInGuild)
}

/// Guild of the invocation, failing unless the author is staff.
pub async fn staff_guild(
    ctx: poise::Context<'_, BotData, Error>,
    action: &str,
) -> Result<serenity::GuildId> {
    let guild_id = guild_of(ctx)?;
    tickets::require_staff(ctx.serenity_context(), ctx.data(), guild_id, ctx.author().id, action)
        .await?;
    Ok(guild_id)
}
