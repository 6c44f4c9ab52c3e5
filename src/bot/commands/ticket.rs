//! Ticket lifecycle commands.
//!
//! Each command is a thin wrapper over [`crate::bot::tickets`]; the buttons on
//! the opening message call the same functions.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::guild_of,
            embeds,
            handlers::autocomplete,
            tickets::{self, TicketRequest},
        },
        core::ticket::CloseReason,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Close reason option.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum ReasonChoice {
        #[name = "Ticket answered"]
        TicketAnswered,
        #[name = "Action taken"]
        ActionTaken,
        #[name = "Issue resolved"]
        IssueResolved,
        #[name = "Report reviewed, steps taken"]
        ReportReviewedSteps,
        #[name = "Report reviewed, safety concern"]
        ReportReviewedSafety,
        #[name = "Bug report reviewed"]
        BugReportReviewed,
        #[name = "Appeal accepted"]
        AppealAccepted,
        #[name = "Appeal denied"]
        AppealDenied,
    }

    impl From<ReasonChoice> for CloseReason {
        fn from(value: ReasonChoice) -> Self {
            match value {
                ReasonChoice::TicketAnswered => Self::TicketAnswered,
                ReasonChoice::ActionTaken => Self::ActionTaken,
                ReasonChoice::IssueResolved => Self::IssueResolved,
                ReasonChoice::ReportReviewedSteps => Self::ReportReviewedSteps,
                ReasonChoice::ReportReviewedSafety => Self::ReportReviewedSafety,
                ReasonChoice::BugReportReviewed => Self::BugReportReviewed,
                ReasonChoice::AppealAccepted => Self::AppealAccepted,
                ReasonChoice::AppealDenied => Self::AppealDenied,
            }
        }
    }

    fn request(ctx: poise::Context<'_, BotData, Error>) -> Result<TicketRequest> {
        Ok(TicketRequest {
            guild_id: guild_of(ctx)?,
            channel_id: ctx.channel_id(),
            actor: ctx.author().id,
        })
    }

    async fn announce(ctx: poise::Context<'_, BotData, Error>, embed: serenity::CreateEmbed) -> Result<()> {
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Opens a new support ticket.
    #[poise::command(slash_command, guild_only)]
    pub async fn new(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Ticket category (default: the first one)"]
        #[autocomplete = "autocomplete::autocomplete_category_name"]
        category: Option<String>,
        #[description = "What do you need help with?"] topic: Option<String>,
    ) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        ctx.defer_ephemeral().await?;

        let channel_id = tickets::create(
            ctx.serenity_context(),
            ctx.data(),
            guild_id,
            ctx.author(),
            category.as_deref(),
            topic,
        )
        .await?;

        let settings = embeds::settings_for(&ctx.data().database, Some(guild_id)).await;
        let embed = embeds::success(
            &settings,
            "🎫 Ticket opened",
            format!("Your ticket has been opened: <#{channel_id}>"),
        );
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Claims this ticket.
    #[poise::command(slash_command, guild_only)]
    pub async fn claim(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let embed = tickets::claim(ctx.serenity_context(), ctx.data(), request(ctx)?).await?;
        announce(ctx, embed).await
    }

    /// Releases your claim on this ticket.
    #[poise::command(slash_command, guild_only)]
    pub async fn unclaim(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let embed = tickets::unclaim(ctx.serenity_context(), ctx.data(), request(ctx)?).await?;
        announce(ctx, embed).await
    }

    /// Transfers this ticket to another staff member.
    #[poise::command(slash_command, guild_only)]
    pub async fn transfer(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Staff member: id, mention or name"] member: String,
    ) -> Result<()> {
        ctx.defer().await?;
        let embed =
            tickets::transfer(ctx.serenity_context(), ctx.data(), request(ctx)?, &member).await?;
        announce(ctx, embed).await
    }

    /// Stops the ticket creator from sending messages.
    #[poise::command(slash_command, guild_only)]
    pub async fn lock(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let embed = tickets::lock(ctx.serenity_context(), ctx.data(), request(ctx)?).await?;
        announce(ctx, embed).await
    }

    /// Lets the ticket creator send messages again.
    #[poise::command(slash_command, guild_only)]
    pub async fn unlock(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let embed = tickets::unlock(ctx.serenity_context(), ctx.data(), request(ctx)?).await?;
        announce(ctx, embed).await
    }

    /// Closes this ticket and deletes its channel.
    #[poise::command(slash_command, guild_only)]
    pub async fn close(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Why the ticket is being closed"] reason: Option<ReasonChoice>,
    ) -> Result<()> {
        let reason = reason.map_or(CloseReason::TicketAnswered, CloseReason::from);
        let (embed, ticket) =
            tickets::close(ctx.serenity_context(), ctx.data(), request(ctx)?, reason).await?;
        announce(ctx, embed).await?;

        if let Err(e) = tickets::finish_close(ctx.serenity_context(), ctx.data(), &ticket).await {
            tracing::error!(ticket = %ticket.id, "Could not finish closing ticket: {e}");
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
