//! Guild statistics command.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::guild_of, embeds, panels, tickets},
        core::{
            ranking::{self, Metric},
            stats as guild_stats, ticket,
        },
        errors::{Error, Result},
    };
    use chrono::Utc;

    /// Shows ticket statistics for this server.
    ///
    /// Totals, average response and resolution, average daily tickets and the
    /// average rating, plus the five fastest responders.
    #[poise::command(slash_command, guild_only)]
    pub async fn stats(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        ctx.defer().await?;

        let db = &ctx.data().database;
        let records = ticket::load_records(db, &guild_id.to_string(), None).await?;
        let summary = guild_stats::guild_summary(&records, Utc::now());
        let fastest = ranking::leaderboard(&records, Metric::ResponseTime, None, 5);

        let mut names = Vec::with_capacity(fastest.len());
        for entry in &fastest {
            names.push(tickets::display_name(ctx.serenity_context(), guild_id, &entry.staff_id).await);
        }

        let settings = embeds::settings_for(db, Some(guild_id)).await;
        let mut embed = embeds::primary(&settings).title("📈 Ticket Statistics");
        for (name, value, inline) in panels::summary_fields(&summary) {
            embed = embed.field(name, value, inline);
        }
        embed = embed.field(
            "⚡ Fastest Responders",
            ranking::render_lines(Metric::ResponseTime, &fastest, &names, 0),
            false,
        );

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
