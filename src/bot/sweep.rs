//! Periodic ticket sweep.
//!
//! One task per process, registered under [`TaskKey::Sweep`]. Each pass closes
//! locked tickets whose deletion is due, closes tickets that stayed quiet after
//! their inactivity warning, then warns the tickets that just went quiet.
//! A failure on one ticket is logged and the pass moves on.

use crate::{
    bot::{BotData, embeds, tasks::TaskKey, tickets},
    core::{
        sweep::{self, SweepPolicy},
        ticket::{self, CloseReason},
    },
    entities::ticket as ticket_entity,
    errors::Result,
};
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use tokio::time::MissedTickBehavior;

/// Starts the sweep task, replacing a running one.
pub fn start(ctx: &serenity::Context, data: &BotData) -> bool {
    let replaced = data.tasks.start(TaskKey::Sweep, sweep_loop(ctx.clone(), data.clone()));
    tracing::info!(
        period = ?data.config.tickets.sweep_period(),
        replaced,
        "Ticket sweep started"
    );
    replaced
}

async fn sweep_loop(ctx: serenity::Context, data: BotData) {
    let mut interval = tokio::time::interval(data.config.tickets.sweep_period());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if let Err(e) = sweep_once(&ctx, &data, Utc::now()).await {
            tracing::warn!("Ticket sweep failed: {e}");
        }
    }
}

/// Runs one pass over all open tickets.
pub async fn sweep_once(ctx: &serenity::Context, data: &BotData, now: DateTime<Utc>) -> Result<()> {
    let policy = data.config.tickets.sweep_policy();

    for expired in sweep::due_deletion(&data.database, now).await? {
        if let Err(e) = tickets::close_unattended(ctx, data, &expired, CloseReason::LockExpired).await {
            tracing::warn!(ticket = %expired.id, "Could not close expired locked ticket: {e}");
        }
    }

    if let Some(after) = policy.auto_close_after {
        for quiet in sweep::due_auto_close(&data.database, now, after).await? {
            if let Err(e) = tickets::close_unattended(ctx, data, &quiet, CloseReason::Inactivity).await {
                tracing::warn!(ticket = %quiet.id, "Could not close inactive ticket: {e}");
            }
        }
    }

    if let Some(after) = policy.stale_after {
        for stale in sweep::newly_stale(&data.database, now, after).await? {
            if let Err(e) = warn_inactive(ctx, data, &stale, &policy, now).await {
                tracing::warn!(ticket = %stale.id, "Could not post inactivity warning: {e}");
            }
        }
    }
    Ok(())
}

/// Body of the inactivity warning.
pub fn warning_text(last_message_at: Option<DateTime<Utc>>, closes_at: Option<DateTime<Utc>>) -> String {
    let since = match last_message_at {
        Some(at) => format!("Nobody has written here since <t:{}:R>.", at.timestamp()),
        None => "Nobody has written here for a while.".to_string(),
    };
    let next = match closes_at {
        Some(at) => format!(
            "This ticket will be closed <t:{}:R> unless someone replies.",
            at.timestamp()
        ),
        None => "Staff can close it with the button below if it is resolved.".to_string(),
    };
    format!("{since}\n{next}")
}

async fn warn_inactive(
    ctx: &serenity::Context,
    data: &BotData,
    stale: &ticket_entity::Model,
    policy: &SweepPolicy,
    now: DateTime<Utc>,
) -> Result<()> {
    let channel_id = tickets::channel_of(stale)?;
    let marked = sweep::mark_stale(&data.database, &stale.id, now).await?;

    let guild_id = marked
        .guild_id
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .map(serenity::GuildId::new);
    let settings = embeds::settings_for(&data.database, guild_id).await;
    let embed = embeds::primary(&settings)
        .title("⏰ Ticket inactive")
        .description(warning_text(marked.last_message_at, policy.closes_at(now)));

    let mut message = serenity::CreateMessage::new()
        .embed(embed)
        .components(tickets::ticket_buttons(false, false)?);
    if let Ok(creator) = ticket::creator_id(&marked) {
        message = message.content(format!("<@{creator}>"));
    }
    channel_id.send_message(ctx, message).await?;
    tracing::info!(ticket = %marked.id, "Inactivity warning posted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_warning_text_names_close_time() {
        let last = Utc::now() - Duration::hours(25);
        let closes = Utc::now() + Duration::hours(24);

        let text = warning_text(Some(last), Some(closes));
        assert!(text.contains(&format!("<t:{}:R>", last.timestamp())));
        assert!(text.contains(&format!("closed <t:{}:R>", closes.timestamp())));

        let text = warning_text(Some(last), None);
        assert!(!text.contains("will be closed"));
        assert!(text.contains("button below"));
    }
}
