//! Auto-refreshing statistics panels.
//!
//! A panel is an ordinary message whose embed is rebuilt on a timer. Its
//! location is stored in the `panels` table so refreshing survives restarts.

use crate::{
    bot::{BotData, embeds, tasks::TaskKey, tickets},
    core::{
        panel::{self, PanelKind, PanelPointer},
        profile,
        ranking::{NO_DATA, format_duration, format_minutes, star_rating},
        stats::{self, GuildSummary, StaffAggregate},
        ticket,
    },
    entities::staff_profile,
    errors::Result,
};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use std::fmt::Write;
use tokio::time::MissedTickBehavior;

/// Embed field values are capped at this many characters.
const FIELD_LIMIT: usize = 1024;
/// Profiles shown per embed (Discord allows 25 fields).
const MAX_PROFILES: usize = 24;

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

fn or_no_data(ms: Option<f64>, format: fn(f64) -> String) -> String {
    ms.map_or_else(|| "No data".to_string(), format)
}

/// Summary fields shared by `/stats` and the live panel.
#[must_use]
pub fn summary_fields(summary: &GuildSummary) -> Vec<(String, String, bool)> {
    let rating = summary.avg_rating.map_or_else(
        || "No ratings".to_string(),
        |avg| format!("{} ({avg:.1} from {} ratings)", star_rating(avg), summary.rating_count),
    );
    vec![
        ("Total Tickets".to_string(), summary.total.to_string(), true),
        ("Open".to_string(), summary.open.to_string(), true),
        ("Closed".to_string(), summary.closed.to_string(), true),
        (
            "Avg. Response".to_string(),
            or_no_data(summary.avg_response_ms, format_duration),
            true,
        ),
        (
            "Avg. Resolution".to_string(),
            or_no_data(summary.avg_resolution_ms, format_duration),
            true,
        ),
        (
            "Avg. Daily Tickets (30d)".to_string(),
            format!("{:.2}", summary.avg_daily_last_30_days),
            true,
        ),
        ("Rating".to_string(), rating, false),
    ]
}

/// One line per staff member for the live panel.
#[must_use]
pub fn staff_line(rank: usize, name: &str, aggregate: &StaffAggregate) -> String {
    format!(
        "{rank}. **{name}**: {} handled, {} closed, avg. response {}",
        aggregate.tickets_handled,
        aggregate.tickets_closed,
        or_no_data(aggregate.response.average(), format_duration),
    )
}

/// Field body describing a staff profile and its averages.
pub fn profile_field(
    profile: &staff_profile::Model,
    aggregate: Option<&StaffAggregate>,
) -> Result<String> {
    let mut body = String::new();
    writeln!(body, "{}", profile.bio)?;
    writeln!(body, "**Timezone:** {}", profile.timezone)?;
    if let Some(hours) = profile
        .active_hours
        .as_deref()
        .and_then(profile::active_hours_lines)
    {
        writeln!(body, "**Active hours:** {}", hours.replace('\n', ", "))?;
    }
    if let Some(portfolio) = profile.portfolio.as_deref() {
        writeln!(body, "**Portfolio:** {portfolio}")?;
    }

    let response = aggregate.and_then(|a| a.response.average());
    let resolution = aggregate.and_then(|a| a.resolution.average());
    let rating = aggregate.and_then(|a| a.rating.average());
    writeln!(
        body,
        "**Avg. response:** {} | **Avg. resolution:** {}",
        response.map_or_else(|| "No data".to_string(), |ms| format!("{} min", format_minutes(ms))),
        resolution.map_or_else(|| "No data".to_string(), |ms| format!("{} min", format_minutes(ms))),
    )?;
    write!(
        body,
        "**Rating:** {}",
        rating.map_or_else(|| "No ratings".to_string(), |r| format!("{} ({r:.1})", star_rating(r)))
    )?;
    Ok(clip(&body, FIELD_LIMIT))
}

/// Builds the live statistics embed.
pub async fn render_live(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
) -> Result<serenity::CreateEmbed> {
    let records = ticket::load_records(&data.database, &guild_id.to_string(), None).await?;
    let summary = stats::guild_summary(&records, Utc::now());
    let settings = embeds::settings_for(&data.database, Some(guild_id)).await;

    let mut embed = embeds::primary(&settings)
        .title("📊 Live Ticket Statistics")
        .timestamp(serenity::Timestamp::now());
    for (name, value, inline) in summary_fields(&summary) {
        embed = embed.field(name, value, inline);
    }
    let popular = summary.most_popular_category.as_ref().map_or_else(
        || "No data".to_string(),
        |(name, count)| format!("{name} ({count} tickets)"),
    );
    embed = embed.field("Most Popular Category", popular, false);

    let mut lines = Vec::new();
    let claimants = stats::staff_aggregates(&records)
        .into_iter()
        .filter(|a| a.tickets_handled > 0)
        .take(5);
    for (i, aggregate) in claimants.enumerate() {
        let name = tickets::display_name(ctx, guild_id, &aggregate.staff_id).await;
        lines.push(staff_line(i + 1, &name, &aggregate));
    }
    let staff = if lines.is_empty() {
        NO_DATA.to_string()
    } else {
        clip(&lines.join("\n"), FIELD_LIMIT)
    };
    Ok(embed.field("Top Staff", staff, false))
}

/// Profiles of members still in the guild, each with its aggregate.
pub async fn guild_profiles(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    aggregates: &[StaffAggregate],
) -> Result<Vec<(String, String)>> {
    let mut fields = Vec::new();
    for profile in profile::list_profiles(&data.database).await? {
        let Some(user_id) = profile.user_id.parse::<u64>().ok().filter(|id| *id > 0) else {
            continue;
        };
        let Some(member) = tickets::fetch_member(ctx, guild_id, serenity::UserId::new(user_id)).await
        else {
            continue;
        };
        let aggregate = aggregates.iter().find(|a| a.staff_id == profile.user_id);
        fields.push((member.display_name().to_string(), profile_field(&profile, aggregate)?));
        if fields.len() == MAX_PROFILES {
            break;
        }
    }
    Ok(fields)
}

/// Builds the staff profiles embed.
pub async fn render_profiles(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
) -> Result<serenity::CreateEmbed> {
    let records = ticket::load_records(&data.database, &guild_id.to_string(), None).await?;
    let summary = stats::guild_summary(&records, Utc::now());
    let aggregates = stats::staff_aggregates(&records);
    let settings = embeds::settings_for(&data.database, Some(guild_id)).await;

    let description = format!(
        "**Guild avg. response:** {}\n**Guild avg. resolution:** {}",
        summary
            .avg_response_ms
            .map_or_else(|| "No data".to_string(), |ms| format!("{} min", format_minutes(ms))),
        summary
            .avg_resolution_ms
            .map_or_else(|| "No data".to_string(), |ms| format!("{} min", format_minutes(ms))),
    );
    let mut embed = embeds::primary(&settings)
        .title("👥 Staff Profiles")
        .description(description)
        .timestamp(serenity::Timestamp::now());

    let fields = guild_profiles(ctx, data, guild_id, &aggregates).await?;
    if fields.is_empty() {
        embed = embed.field("Profiles", "No profiles yet. Staff can add one with `/setprofile`.", false);
    }
    for (name, value) in fields {
        embed = embed.field(name, value, false);
    }
    Ok(embed)
}

/// Renders a panel of any kind.
pub async fn render(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    kind: PanelKind,
) -> Result<serenity::CreateEmbed> {
    match kind {
        PanelKind::Live => render_live(ctx, data, guild_id).await,
        PanelKind::Profiles => render_profiles(ctx, data, guild_id).await,
    }
}

async fn refresh_loop(
    ctx: serenity::Context,
    data: BotData,
    guild_id: serenity::GuildId,
    kind: PanelKind,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
) {
    let mut interval = tokio::time::interval(data.config.panels.refresh_period());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately and the panel was just drawn.
    interval.tick().await;

    loop {
        interval.tick().await;
        let embed = match render(&ctx, &data, guild_id, kind).await {
            Ok(embed) => embed,
            Err(e) => {
                tracing::warn!(%guild_id, %kind, "Skipping panel refresh: {e}");
                continue;
            }
        };

        if let Err(e) = channel_id
            .edit_message(&ctx, message_id, serenity::EditMessage::new().embed(embed))
            .await
        {
            tracing::error!(%guild_id, %kind, %message_id, "Panel edit failed, stopping refresh: {e}");
            if let Err(e) = panel::delete_pointer(&data.database, &guild_id.to_string(), kind).await {
                tracing::error!(%guild_id, %kind, "Could not delete panel pointer: {e}");
            }
            break;
        }
        tracing::debug!(%guild_id, %kind, "Panel refreshed");
    }
}

/// Starts (or replaces) the refresh task of a panel.
pub fn start_refresh(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    kind: PanelKind,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
) -> bool {
    let replaced = data.tasks.start(
        TaskKey::Panel(guild_id.get(), kind),
        refresh_loop(ctx.clone(), data.clone(), guild_id, kind, channel_id, message_id),
    );
    tracing::info!(%guild_id, %kind, replaced, "Panel refresh started");
    replaced
}

/// Posts a panel in `channel_id`, stores its pointer and starts refreshing it.
pub async fn publish(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
    kind: PanelKind,
) -> Result<serenity::Message> {
    let embed = render(ctx, data, guild_id, kind).await?;
    let message = channel_id
        .send_message(ctx, serenity::CreateMessage::new().embed(embed))
        .await?;

    panel::upsert_pointer(
        &data.database,
        &PanelPointer {
            guild_id: guild_id.to_string(),
            kind,
            channel_id: channel_id.to_string(),
            message_id: message.id.to_string(),
        },
        Utc::now(),
    )
    .await?;
    start_refresh(ctx, data, guild_id, kind, channel_id, message.id);
    Ok(message)
}

/// Stops the refresh of a panel and forgets its pointer. Returns whether
/// anything was running or stored.
pub async fn stop(data: &BotData, guild_id: serenity::GuildId, kind: PanelKind) -> Result<bool> {
    let stopped = data.tasks.stop(TaskKey::Panel(guild_id.get(), kind));
    let deleted = panel::delete_pointer(&data.database, &guild_id.to_string(), kind).await?;
    Ok(stopped || deleted)
}

fn snowflakes(pointer: &PanelPointer) -> Option<(serenity::GuildId, serenity::ChannelId, serenity::MessageId)> {
    let parse = |raw: &str| raw.parse::<u64>().ok().filter(|id| *id > 0);
    Some((
        serenity::GuildId::new(parse(&pointer.guild_id)?),
        serenity::ChannelId::new(parse(&pointer.channel_id)?),
        serenity::MessageId::new(parse(&pointer.message_id)?),
    ))
}

/// Resumes every stored panel. Pointers whose guild, channel or message is
/// gone are deleted.
pub async fn resume_panels(ctx: &serenity::Context, data: &BotData) -> Result<usize> {
    let mut resumed = 0;
    for pointer in panel::list_pointers(&data.database).await? {
        let found = match snowflakes(&pointer) {
            Some((guild_id, channel_id, message_id)) => {
                let guild_ok = guild_id.to_partial_guild(ctx).await.is_ok();
                let message_ok = guild_ok && channel_id.message(ctx, message_id).await.is_ok();
                message_ok.then_some((guild_id, channel_id, message_id))
            }
            None => None,
        };

        match found {
            Some((guild_id, channel_id, message_id)) => {
                start_refresh(ctx, data, guild_id, pointer.kind, channel_id, message_id);
                resumed += 1;
            }
            None => {
                tracing::warn!(
                    guild_id = %pointer.guild_id,
                    kind = %pointer.kind,
                    "Panel message is gone, deleting its pointer"
                );
                panel::delete_pointer(&data.database, &pointer.guild_id, pointer.kind).await?;
            }
        }
    }
    tracing::info!(resumed, "Panels resumed");
    Ok(resumed)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::stats::Totals;

    fn profile() -> staff_profile::Model {
        staff_profile::Model {
            user_id: "1".to_string(),
            bio: "Friendly".to_string(),
            timezone: "UTC".to_string(),
            active_hours: Some(r#"["Mon 9-5","Tue 9-5"]"#.to_string()),
            portfolio: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_field_without_data() {
        let body = profile_field(&profile(), None).unwrap();
        assert!(body.contains("Friendly"));
        assert!(body.contains("**Active hours:** Mon 9-5, Tue 9-5"));
        assert!(body.contains("**Avg. response:** No data | **Avg. resolution:** No data"));
        assert!(body.ends_with("**Rating:** No ratings"));
    }

    #[test]
    fn test_profile_field_with_averages() {
        let aggregate = StaffAggregate {
            staff_id: "1".to_string(),
            tickets_handled: 2,
            tickets_closed: 2,
            response: Totals { total: 300_000, count: 2 },
            resolution: Totals { total: 600_000, count: 1 },
            rating: Totals { total: 9, count: 2 },
        };
        let body = profile_field(&profile(), Some(&aggregate)).unwrap();
        assert!(body.contains("**Avg. response:** 2.50 min"));
        assert!(body.contains("**Avg. resolution:** 10.00 min"));
        assert!(body.contains("(4.5)"));
    }

    #[test]
    fn test_summary_fields_no_ratings() {
        let summary = stats::guild_summary(&[], Utc::now());
        let fields = summary_fields(&summary);
        assert_eq!(fields[0], ("Total Tickets".to_string(), "0".to_string(), true));
        assert_eq!(fields[3].1, "No data");
        assert_eq!(fields.last().unwrap().1, "No ratings");
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("abcdef", 4), "abc…");
    }
}
