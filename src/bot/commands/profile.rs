//! Staff profile commands.

use crate::core::{
    ranking::{self, Metric, RankedEntry},
    stats::TicketRecord,
};
use chrono::{DateTime, Utc};

/// One staff member's numbers over a window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaffSnapshot {
    /// Tickets claimed
    pub claimed: u32,
    /// Tickets closed
    pub closed: u32,
    /// Average rating and rating count
    pub rating: Option<(f64, u32)>,
    /// Average first response in milliseconds
    pub response_ms: Option<f64>,
}

/// Computes a [`StaffSnapshot`] from the same rankings the leaderboard uses.
#[must_use]
pub fn snapshot(records: &[TicketRecord], staff_id: &str, since: Option<DateTime<Utc>>) -> StaffSnapshot {
    let entry = |metric: Metric| -> Option<RankedEntry> {
        ranking::leaderboard(records, metric, since, usize::MAX)
            .into_iter()
            .find(|e| e.staff_id == staff_id)
    };
    StaffSnapshot {
        claimed: entry(Metric::Claimed).map_or(0, |e| e.count),
        closed: entry(Metric::Resolved).map_or(0, |e| e.count),
        rating: entry(Metric::Rating).map(|e| (e.average, e.count)),
        response_ms: entry(Metric::ResponseTime).map(|e| e.average),
    }
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::snapshot;
    use crate::{
        bot::{BotData, commands::guild_of, embeds, panels, tickets},
        core::{
            profile::{self, ProfileInput},
            ranking::{format_duration, star_rating},
            stats, ticket,
            window::TimeRange,
        },
        errors::{Error, Result},
    };
    use chrono::Utc;
    use poise::serenity_prelude as serenity;

    /// Sets your staff profile.
    #[poise::command(slash_command, guild_only)]
    pub async fn setprofile(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "A short bio"] bio: String,
        #[description = "Your timezone, e.g. UTC+2"] timezone: String,
        #[description = "When you are usually around"] active_hours: String,
        #[description = "Link to your portfolio"] portfolio: Option<String>,
    ) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let db = &ctx.data().database;
        profile::set_profile(
            db,
            &ctx.author().id.to_string(),
            ProfileInput {
                bio,
                timezone,
                active_hours,
                portfolio,
            },
            Utc::now(),
        )
        .await?;

        let settings = embeds::settings_for(db, Some(guild_id)).await;
        let embed = embeds::success(&settings, "Profile saved", "Your staff profile has been updated.");
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Shows a staff member's profile and their last 30 days.
    #[poise::command(slash_command, guild_only)]
    pub async fn viewprofile(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Staff member"] member: serenity::User,
    ) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let data = ctx.data();
        if !tickets::is_staff(ctx.serenity_context(), data, guild_id, member.id).await? {
            return Err(Error::TargetNotStaff {
                user_id: member.id.to_string(),
            });
        }
        ctx.defer().await?;

        let staff_id = member.id.to_string();
        let since = TimeRange::Month.since(Utc::now());
        let records = ticket::load_records(&data.database, &guild_id.to_string(), since).await?;
        let numbers = snapshot(&records, &staff_id, since);
        let settings = embeds::settings_for(&data.database, Some(guild_id)).await;

        let mut embed = embeds::primary(&settings)
            .title(format!("👤 {}", member.name))
            .thumbnail(member.face());
        match profile::get_profile(&data.database, &staff_id).await? {
            Some(p) => {
                embed = embed.description(&p.bio).field("Timezone", &p.timezone, true);
                if let Some(hours) = p.active_hours.as_deref().and_then(profile::active_hours_lines) {
                    embed = embed.field("Active Hours", hours, true);
                }
                if let Some(portfolio) = p.portfolio {
                    embed = embed.field("Portfolio", portfolio, false);
                }
            }
            None => {
                embed = embed.description("No profile set.");
            }
        }

        let rating = numbers.rating.map_or_else(
            || "No ratings".to_string(),
            |(avg, count)| format!("{} ({avg:.1} from {count})", star_rating(avg)),
        );
        let response = numbers
            .response_ms
            .map_or_else(|| "No data".to_string(), format_duration);
        embed = embed
            .field("Claimed (30d)", numbers.claimed.to_string(), true)
            .field("Closed (30d)", numbers.closed.to_string(), true)
            .field("Rating (30d)", rating, false)
            .field("Avg. Response (30d)", response, false);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Lists the profiles of staff in this server.
    #[poise::command(slash_command, guild_only)]
    pub async fn profiles(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        ctx.defer().await?;
        let data = ctx.data();

        let records = ticket::load_records(&data.database, &guild_id.to_string(), None).await?;
        let aggregates = stats::staff_aggregates(&records);
        let fields = panels::guild_profiles(ctx.serenity_context(), data, guild_id, &aggregates).await?;
        let settings = embeds::settings_for(&data.database, Some(guild_id)).await;

        let mut embed = embeds::primary(&settings).title("👥 Staff Profiles");
        if fields.is_empty() {
            embed = embed.description("No staff profiles yet. Use `/setprofile` to add yours.");
        }
        for (name, value) in fields {
            embed = embed.field(name, value, false);
        }
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
