//! Staff leaderboard with metric switching and paging.
//!
//! The reply stays interactive while its invoker keeps using it. Each of their
//! presses restarts the idle timer; once it runs out, or an update fails, the
//! controls are removed.

use crate::{
    bot::{BotData, embeds, tickets},
    config::settings::LeaderboardConfig,
    core::{
        guild::GuildSettings,
        pagination::{Direction, Paginator},
        payload::ComponentPayload,
        ranking::{self, Metric, RankedEntry},
        stats::TicketRecord,
        ticket,
        window::TimeRange,
    },
    errors::Result,
};
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use std::time::{Duration, Instant};

/// Options of one `/leaderboard` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardRequest {
    /// Ranking metric, default [`Metric::Rating`]
    pub metric: Metric,
    /// Window, default `leaderboard.default_range` (30 days)
    pub range: TimeRange,
    /// Entries ranked, default 10
    pub limit: usize,
    /// Entries per page, default 5
    pub page_size: usize,
}

impl LeaderboardRequest {
    /// Fills missing options from the configuration.
    #[must_use]
    pub fn new(config: &LeaderboardConfig, metric: Option<Metric>, range: Option<TimeRange>) -> Self {
        Self {
            metric: metric.unwrap_or_default(),
            range: range.unwrap_or(config.default_range),
            limit: config.limit,
            page_size: config.page_size,
        }
    }
}

/// Ranked, named and paged state of one leaderboard message.
struct LeaderboardView {
    request: LeaderboardRequest,
    since: Option<DateTime<Utc>>,
    records: Vec<TicketRecord>,
    entries: Vec<RankedEntry>,
    names: Vec<String>,
    paginator: Paginator,
}

impl LeaderboardView {
    async fn load(
        ctx: &serenity::Context,
        data: &BotData,
        guild_id: serenity::GuildId,
        request: LeaderboardRequest,
    ) -> Result<Self> {
        let since = request.range.since(Utc::now());
        let records = ticket::load_records(&data.database, &guild_id.to_string(), since).await?;
        let mut view = Self {
            request,
            since,
            records,
            entries: Vec::new(),
            names: Vec::new(),
            paginator: Paginator::new(0, request.page_size),
        };
        view.rank(ctx, guild_id).await?;
        Ok(view)
    }

    async fn rank(&mut self, ctx: &serenity::Context, guild_id: serenity::GuildId) -> Result<()> {
        self.entries = ranking::leaderboard(
            &self.records,
            self.request.metric,
            self.since,
            self.request.limit,
        );
        let mut names = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            names.push(tickets::display_name(ctx, guild_id, &entry.staff_id).await);
        }
        self.names = names;
        self.paginator.reset(self.entries.len())
    }

    async fn switch(
        &mut self,
        ctx: &serenity::Context,
        guild_id: serenity::GuildId,
        metric: Metric,
    ) -> Result<()> {
        self.request.metric = metric;
        self.rank(ctx, guild_id).await
    }

    fn embed(&self, settings: &GuildSettings) -> serenity::CreateEmbed {
        let range = self.paginator.page_range();
        let lines = ranking::render_lines(
            self.request.metric,
            self.entries.get(range.clone()).unwrap_or_default(),
            self.names.get(range.clone()).unwrap_or_default(),
            range.start,
        );
        embeds::primary(settings)
            .title(self.request.metric.title())
            .description(format!(
                "Top staff by {} over the {}.\n\n{lines}",
                self.request.metric.ranked_by(),
                self.request.range.label()
            ))
            .footer(serenity::CreateEmbedFooter::new(format!(
                "{} • {}",
                settings.footer,
                self.paginator.label()
            )))
    }

    fn components(&self, session: &str) -> Result<Vec<serenity::CreateActionRow>> {
        let options = Metric::ALL
            .into_iter()
            .map(|metric| {
                serenity::CreateSelectMenuOption::new(metric.label(), metric.code())
                    .emoji(metric.emoji())
                    .default_selection(metric == self.request.metric)
            })
            .collect();
        let select = serenity::CreateSelectMenu::new(
            ComponentPayload::Leaderboard {
                session: session.to_string(),
            }
            .encode()?,
            serenity::CreateSelectMenuKind::String { options },
        )
        .placeholder("Leaderboard type");

        let page_button = |direction: Direction, emoji: char, enabled: bool| -> Result<serenity::CreateButton> {
            let payload = ComponentPayload::Page {
                session: session.to_string(),
                direction,
            };
            Ok(serenity::CreateButton::new(payload.encode()?)
                .emoji(emoji)
                .style(serenity::ButtonStyle::Secondary)
                .disabled(!enabled))
        };

        Ok(vec![
            serenity::CreateActionRow::SelectMenu(select),
            serenity::CreateActionRow::Buttons(vec![
                page_button(Direction::Prev, '◀', self.paginator.has_prev())?,
                page_button(Direction::Next, '▶', self.paginator.has_next())?,
            ]),
        ])
    }
}

/// What a press asks for.
enum Step {
    Switch(Metric),
    Page(Direction),
}

fn step_for(press: &serenity::ComponentInteraction) -> Option<Step> {
    match ComponentPayload::parse(&press.data.custom_id).ok()? {
        ComponentPayload::Leaderboard { .. } => match &press.data.kind {
            serenity::ComponentInteractionDataKind::StringSelect { values, .. } => values
                .first()
                .and_then(|v| v.parse::<Metric>().ok())
                .map(Step::Switch),
            _ => None,
        },
        ComponentPayload::Page { direction, .. } => Some(Step::Page(direction)),
        _ => None,
    }
}

/// Idle deadline of a leaderboard. Only the owner's navigation resets it.
#[derive(Debug, Clone, Copy)]
struct IdleTimer {
    idle: Duration,
    deadline: Instant,
}

impl IdleTimer {
    fn new(idle: Duration, now: Instant) -> Self {
        Self {
            idle,
            deadline: now + idle,
        }
    }

    /// Time left before expiry, `None` once it has passed.
    fn remaining(&self, now: Instant) -> Option<Duration> {
        let left = self.deadline.saturating_duration_since(now);
        (!left.is_zero()).then_some(left)
    }

    fn touch(&mut self, now: Instant) {
        self.deadline = now + self.idle;
    }
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{IdleTimer, LeaderboardRequest, LeaderboardView, Step, step_for};
    use crate::{
        bot::{BotData, commands::staff_guild, embeds, handlers::components::INVALID_INTERACTION},
        core::{guild::GuildSettings, ranking::Metric, window::TimeRange},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::time::{Duration, Instant};

    /// Leaderboard type option.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum LeaderboardType {
        #[name = "Staff Ratings"]
        Rating,
        #[name = "Tickets Claimed"]
        Claimed,
        #[name = "Tickets Resolved"]
        Resolved,
        #[name = "Average Response Time"]
        ResponseTime,
        #[name = "Average Resolution Time"]
        ResolutionTime,
    }

    impl From<LeaderboardType> for Metric {
        fn from(value: LeaderboardType) -> Self {
            match value {
                LeaderboardType::Rating => Self::Rating,
                LeaderboardType::Claimed => Self::Claimed,
                LeaderboardType::Resolved => Self::Resolved,
                LeaderboardType::ResponseTime => Self::ResponseTime,
                LeaderboardType::ResolutionTime => Self::ResolutionTime,
            }
        }
    }

    /// Time range option.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum RangeChoice {
        #[name = "Last 24 hours"]
        Day,
        #[name = "Last 7 days"]
        Week,
        #[name = "Last 30 days"]
        Month,
        #[name = "Last 90 days"]
        Quarter,
        #[name = "All time"]
        All,
    }

    impl From<RangeChoice> for TimeRange {
        fn from(value: RangeChoice) -> Self {
            match value {
                RangeChoice::Day => Self::Day,
                RangeChoice::Week => Self::Week,
                RangeChoice::Month => Self::Month,
                RangeChoice::Quarter => Self::Quarter,
                RangeChoice::All => Self::All,
            }
        }
    }

    async fn ephemeral(
        ctx: poise::Context<'_, BotData, Error>,
        press: &serenity::ComponentInteraction,
        embed: serenity::CreateEmbed,
    ) -> Result<()> {
        press
            .create_response(
                ctx.serenity_context(),
                serenity::CreateInteractionResponse::Message(
                    serenity::CreateInteractionResponseMessage::new()
                        .embed(embed)
                        .ephemeral(true),
                ),
            )
            .await?;
        Ok(())
    }

    /// Applies one press by the owner and re-renders the message.
    async fn navigate(
        ctx: poise::Context<'_, BotData, Error>,
        view: &mut LeaderboardView,
        settings: &GuildSettings,
        guild_id: serenity::GuildId,
        session: &str,
        press: &serenity::ComponentInteraction,
    ) -> Result<()> {
        match step_for(press) {
            Some(Step::Switch(metric)) => {
                view.switch(ctx.serenity_context(), guild_id, metric).await?;
            }
            Some(Step::Page(direction)) => {
                view.paginator.navigate(direction)?;
            }
            None => {
                return ephemeral(ctx, press, embeds::error(settings, INVALID_INTERACTION)).await;
            }
        }

        press
            .create_response(
                ctx.serenity_context(),
                serenity::CreateInteractionResponse::UpdateMessage(
                    serenity::CreateInteractionResponseMessage::new()
                        .embed(view.embed(settings))
                        .components(view.components(session)?),
                ),
            )
            .await?;
        Ok(())
    }

    /// Shows the staff leaderboard.
    ///
    /// Ranks the top staff by the chosen metric (staff rating by default) over
    /// the chosen window (last 30 days by default), five per page.
    #[poise::command(slash_command, guild_only)]
    pub async fn leaderboard(
        ctx: poise::Context<'_, BotData, Error>,
        #[rename = "type"]
        #[description = "What to rank staff by"]
        kind: Option<LeaderboardType>,
        #[description = "Time range"] range: Option<RangeChoice>,
    ) -> Result<()> {
        let guild_id = staff_guild(ctx, "view the leaderboard").await?;
        ctx.defer().await?;

        let data = ctx.data();
        let request = LeaderboardRequest::new(
            &data.config.leaderboard,
            kind.map(Metric::from),
            range.map(TimeRange::from),
        );
        let settings = embeds::settings_for(&data.database, Some(guild_id)).await;
        let mut view = LeaderboardView::load(ctx.serenity_context(), data, guild_id, request).await?;

        let session = data.sessions.open(ctx.id().to_string());
        let reply = ctx
            .send(
                poise::CreateReply::default()
                    .embed(view.embed(&settings))
                    .components(view.components(session.id())?),
            )
            .await?;
        let message = reply.message().await?;
        let idle = Duration::from_secs(data.config.leaderboard.idle_timeout_secs);

        let mut timer = IdleTimer::new(idle, Instant::now());

        while let Some(remaining) = timer.remaining(Instant::now()) {
            let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
                .message_id(message.id)
                .timeout(remaining)
                .await
            else {
                break;
            };

            if press.user.id != ctx.author().id {
                let embed = embeds::error(
                    &settings,
                    "This leaderboard belongs to someone else. Run `/leaderboard` to get your own.",
                );
                if let Err(e) = ephemeral(ctx, &press, embed).await {
                    tracing::debug!("Could not reject leaderboard press: {e}");
                }
                continue;
            }
            timer.touch(Instant::now());

            if let Err(e) = navigate(ctx, &mut view, &settings, guild_id, session.id(), &press).await {
                tracing::warn!(%guild_id, "Leaderboard update failed, closing it: {e}");
                break;
            }
        }

        view.paginator.expire();
        drop(session);
        if let Err(e) = reply
            .edit(
                ctx,
                poise::CreateReply::default()
                    .embed(view.embed(&settings))
                    .components(Vec::new()),
            )
            .await
        {
            tracing::debug!("Could not remove expired leaderboard controls: {e}");
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
