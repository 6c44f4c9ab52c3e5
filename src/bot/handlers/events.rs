//! Gateway events other than interactions.

use crate::{
    bot::{BotData, tickets},
    core::ticket,
    errors::Result,
};
use chrono::Utc;
use poise::serenity_prelude as serenity;

/// Records activity in ticket channels.
///
/// Bot messages and messages outside guilds are ignored. The staff check only
/// runs while the ticket still waits for its first response.
pub async fn track_message(
    ctx: &serenity::Context,
    data: &BotData,
    message: &serenity::Message,
) -> Result<()> {
    if message.author.bot {
        return Ok(());
    }
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };
    let channel = message.channel_id.to_string();
    let Some(current) = ticket::get_ticket(&data.database, &channel).await? else {
        return Ok(());
    };

    let author = message.author.id.to_string();
    let author_is_staff = if ticket::awaits_first_response(&current, &author) {
        tickets::is_staff(ctx, data, guild_id, message.author.id).await?
    } else {
        false
    };

    if ticket::record_message(&data.database, &channel, &author, author_is_staff, Utc::now()).await? {
        tracing::info!(ticket = %channel, staff = %author, "First response recorded");
    }
    Ok(())
}
