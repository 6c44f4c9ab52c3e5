//! Ticket lifecycle business logic.
//!
//! Tickets are keyed by their channel id. Every state transition checks its
//! precondition here and returns a user-facing error when it does not hold, so
//! the Discord side only has to mirror a successful change into permissions and
//! messages.

use crate::{
    core::stats::TicketRecord,
    entities::{Category, Feedback, Ticket, feedback, ticket},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    Condition, PaginatorTrait, QueryOrder, Set, prelude::*, sea_query::Expr,
};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Why a ticket was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloseReason {
    /// Question answered
    #[default]
    TicketAnswered,
    /// Moderation action taken
    ActionTaken,
    /// Problem fixed
    IssueResolved,
    /// Report reviewed, next steps given
    ReportReviewedSteps,
    /// Report reviewed, safety measures taken
    ReportReviewedSafety,
    /// Bug report acknowledged
    BugReportReviewed,
    /// Appeal accepted
    AppealAccepted,
    /// Appeal denied
    AppealDenied,
    /// Closed by the sweep after going stale
    Inactivity,
    /// Locked ticket reached its scheduled deletion
    LockExpired,
}

impl CloseReason {
    /// All reasons, staff choices first.
    pub const ALL: [Self; 10] = [
        Self::TicketAnswered,
        Self::ActionTaken,
        Self::IssueResolved,
        Self::ReportReviewedSteps,
        Self::ReportReviewedSafety,
        Self::BugReportReviewed,
        Self::AppealAccepted,
        Self::AppealDenied,
        Self::Inactivity,
        Self::LockExpired,
    ];

    /// Stored code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::TicketAnswered => "ticket_answered",
            Self::ActionTaken => "action_taken",
            Self::IssueResolved => "issue_resolved",
            Self::ReportReviewedSteps => "report_reviewed_steps",
            Self::ReportReviewedSafety => "report_reviewed_safety",
            Self::BugReportReviewed => "bug_report_reviewed",
            Self::AppealAccepted => "appeal_accepted",
            Self::AppealDenied => "appeal_denied",
            Self::Inactivity => "inactivity",
            Self::LockExpired => "lock_expired",
        }
    }

    /// Sentence shown in the close message.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::TicketAnswered => "Your ticket has been answered.",
            Self::ActionTaken => "Action has been taken on your report.",
            Self::IssueResolved => "Your issue has been resolved.",
            Self::ReportReviewedSteps => {
                "Your report has been reviewed and next steps have been provided."
            }
            Self::ReportReviewedSafety => {
                "Your report has been reviewed and safety measures have been taken."
            }
            Self::BugReportReviewed => "Your bug report has been reviewed. Thank you!",
            Self::AppealAccepted => "Your appeal has been accepted.",
            Self::AppealDenied => "Your appeal has been denied.",
            Self::Inactivity => "This ticket was closed after a period of inactivity.",
            Self::LockExpired => "This locked ticket reached its scheduled deletion.",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CloseReason {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.code() == s)
            .ok_or_else(|| format!("unknown close reason `{s}`"))
    }
}

/// Looks up a ticket by channel id.
pub async fn get_ticket(db: &DatabaseConnection, channel_id: &str) -> Result<Option<ticket::Model>> {
    Ticket::find_by_id(channel_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_ticket`], but a missing ticket is [`Error::NotATicket`].
pub async fn require_ticket(db: &DatabaseConnection, channel_id: &str) -> Result<ticket::Model> {
    get_ticket(db, channel_id).await?.ok_or(Error::NotATicket)
}

/// Next per-guild ticket number.
pub async fn next_number(db: &DatabaseConnection, guild_id: &str) -> Result<i32> {
    let count = Ticket::find()
        .filter(ticket::Column::GuildId.eq(guild_id))
        .count(db)
        .await?;
    Ok(i32::try_from(count).unwrap_or(i32::MAX - 1) + 1)
}

/// Data for a freshly created ticket channel.
#[derive(Debug, Clone)]
pub struct NewTicket {
    /// The ticket channel id
    pub channel_id: String,
    /// Guild id
    pub guild_id: String,
    /// Category the ticket was opened in
    pub category_id: Option<i64>,
    /// Ticket number, from [`next_number`]
    pub number: i32,
    /// Opening member
    pub created_by_id: String,
    /// Optional topic
    pub topic: Option<String>,
}

/// Inserts a new open ticket.
pub async fn create_ticket(
    db: &DatabaseConnection,
    new: NewTicket,
    now: DateTime<Utc>,
) -> Result<ticket::Model> {
    let model = ticket::ActiveModel {
        id: Set(new.channel_id),
        guild_id: Set(new.guild_id),
        category_id: Set(new.category_id),
        number: Set(new.number),
        created_by_id: Set(new.created_by_id),
        topic: Set(new.topic.filter(|t| !t.trim().is_empty())),
        created_at: Set(now),
        first_response_at: Set(None),
        last_message_at: Set(None),
        stale_since: Set(None),
        claimed_by_id: Set(None),
        closed_at: Set(None),
        closed_by_id: Set(None),
        closed_reason: Set(None),
        open: Set(true),
        locked: Set(false),
        locked_at: Set(None),
        scheduled_deletion_at: Set(None),
        opening_message_id: Set(None),
    };
    let ticket = model.insert(db).await?;
    tracing::info!(ticket = %ticket.id, number = ticket.number, "Ticket created");
    Ok(ticket)
}

/// Remembers which message carries the ticket buttons.
pub async fn set_opening_message(
    db: &DatabaseConnection,
    channel_id: &str,
    message_id: &str,
) -> Result<ticket::Model> {
    let ticket = require_ticket(db, channel_id).await?;
    let mut active: ticket::ActiveModel = ticket.into();
    active.opening_message_id = Set(Some(message_id.to_string()));
    Ok(active.update(db).await?)
}

fn ensure_open(ticket: &ticket::Model) -> Result<()> {
    if ticket.open {
        Ok(())
    } else {
        Err(Error::TicketClosed)
    }
}

/// Sets the claimant only while the ticket is still open and unclaimed.
/// Returns whether the row changed.
async fn claim_if_free(db: &DatabaseConnection, channel_id: &str, staff_id: &str) -> Result<bool> {
    let result = Ticket::update_many()
        .col_expr(ticket::Column::ClaimedById, Expr::value(staff_id.to_string()))
        .filter(ticket::Column::Id.eq(channel_id))
        .filter(ticket::Column::Open.eq(true))
        .filter(ticket::Column::ClaimedById.is_null())
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Claims an open, unclaimed ticket for `staff_id`.
///
/// The update is conditional on the ticket still being open and unclaimed, so
/// two staff pressing Claim at once cannot both win and a ticket closed in the
/// meantime stays unclaimed.
pub async fn claim(db: &DatabaseConnection, channel_id: &str, staff_id: &str) -> Result<ticket::Model> {
    let ticket = require_ticket(db, channel_id).await?;
    ensure_open(&ticket)?;
    if let Some(current) = ticket.claimed_by_id {
        return Err(Error::AlreadyClaimed { staff_id: current });
    }

    let claimed = claim_if_free(db, channel_id, staff_id).await?;
    let updated = require_ticket(db, channel_id).await?;
    if !claimed {
        ensure_open(&updated)?;
        return Err(Error::AlreadyClaimed {
            staff_id: updated.claimed_by_id.unwrap_or_default(),
        });
    }
    tracing::info!(ticket = channel_id, staff_id, "Ticket claimed");
    Ok(updated)
}

/// Releases the claim. Returns the ticket and the previous claimant.
pub async fn unclaim(db: &DatabaseConnection, channel_id: &str) -> Result<(ticket::Model, String)> {
    let ticket = require_ticket(db, channel_id).await?;
    ensure_open(&ticket)?;
    let previous = ticket.claimed_by_id.clone().ok_or(Error::NotClaimed)?;

    let mut active: ticket::ActiveModel = ticket.into();
    active.claimed_by_id = Set(None);
    let updated = active.update(db).await?;
    tracing::info!(ticket = channel_id, previous = %previous, "Ticket unclaimed");
    Ok((updated, previous))
}

/// Moves the claim to `new_staff_id`. Returns the ticket and the previous claimant.
pub async fn transfer(
    db: &DatabaseConnection,
    channel_id: &str,
    new_staff_id: &str,
) -> Result<(ticket::Model, String)> {
    let ticket = require_ticket(db, channel_id).await?;
    ensure_open(&ticket)?;
    let previous = ticket.claimed_by_id.clone().ok_or(Error::NotClaimed)?;
    if previous == new_staff_id {
        return Err(Error::AlreadyClaimed {
            staff_id: previous,
        });
    }

    let mut active: ticket::ActiveModel = ticket.into();
    active.claimed_by_id = Set(Some(new_staff_id.to_string()));
    let updated = active.update(db).await?;
    tracing::info!(ticket = channel_id, from = %previous, to = new_staff_id, "Ticket transferred");
    Ok((updated, previous))
}

/// Validates the stored creator id as a Discord snowflake.
pub fn creator_id(ticket: &ticket::Model) -> Result<u64> {
    ticket
        .created_by_id
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(Error::InvalidCreator)
}

/// Locks the ticket and schedules it for deletion `hours` from `now`.
pub async fn lock(
    db: &DatabaseConnection,
    channel_id: &str,
    now: DateTime<Utc>,
    hours: i64,
) -> Result<ticket::Model> {
    let ticket = require_ticket(db, channel_id).await?;
    ensure_open(&ticket)?;
    if ticket.locked {
        return Err(Error::AlreadyLocked);
    }

    let mut active: ticket::ActiveModel = ticket.into();
    active.locked = Set(true);
    active.locked_at = Set(Some(now));
    active.scheduled_deletion_at = Set(Some(now + Duration::hours(hours)));
    let updated = active.update(db).await?;
    tracing::info!(ticket = channel_id, "Ticket locked");
    Ok(updated)
}

/// Reverses [`lock`].
pub async fn unlock(db: &DatabaseConnection, channel_id: &str) -> Result<ticket::Model> {
    let ticket = require_ticket(db, channel_id).await?;
    ensure_open(&ticket)?;
    if !ticket.locked {
        return Err(Error::NotLocked);
    }

    let mut active: ticket::ActiveModel = ticket.into();
    active.locked = Set(false);
    active.locked_at = Set(None);
    active.scheduled_deletion_at = Set(None);
    let updated = active.update(db).await?;
    tracing::info!(ticket = channel_id, "Ticket unlocked");
    Ok(updated)
}

/// Closes an open ticket.
pub async fn close(
    db: &DatabaseConnection,
    channel_id: &str,
    closed_by_id: &str,
    reason: CloseReason,
    now: DateTime<Utc>,
) -> Result<ticket::Model> {
    close_as(db, channel_id, Some(closed_by_id), reason, now).await
}

/// Closes an open ticket. Without a closer nobody is credited with the close
/// or its rating.
pub(crate) async fn close_as(
    db: &DatabaseConnection,
    channel_id: &str,
    closed_by_id: Option<&str>,
    reason: CloseReason,
    now: DateTime<Utc>,
) -> Result<ticket::Model> {
    let ticket = require_ticket(db, channel_id).await?;
    ensure_open(&ticket)?;

    let mut active: ticket::ActiveModel = ticket.into();
    active.open = Set(false);
    active.closed_at = Set(Some(now));
    active.closed_by_id = Set(closed_by_id.map(ToString::to_string));
    active.closed_reason = Set(Some(reason.code().to_string()));
    let updated = active.update(db).await?;
    tracing::info!(ticket = channel_id, closed_by_id, reason = %reason, "Ticket closed");
    Ok(updated)
}

/// Tracks a message posted in a channel.
///
/// Non-ticket channels are ignored. Every message bumps `last_message_at` and
/// clears an inactivity warning; the first message of a staff member other than the creator in an open ticket
/// sets `first_response_at`. Returns whether the first response was recorded.
pub async fn record_message(
    db: &DatabaseConnection,
    channel_id: &str,
    author_id: &str,
    author_is_staff: bool,
    at: DateTime<Utc>,
) -> Result<bool> {
    let Some(ticket) = get_ticket(db, channel_id).await? else {
        return Ok(false);
    };

    let first_response = ticket.open
        && ticket.first_response_at.is_none()
        && author_is_staff
        && ticket.created_by_id != author_id;

    let mut active: ticket::ActiveModel = ticket.into();
    active.last_message_at = Set(Some(at));
    active.stale_since = Set(None);
    if first_response {
        active.first_response_at = Set(Some(at));
    }
    active.update(db).await?;

    if first_response {
        tracing::debug!(ticket = channel_id, author_id, "First staff response recorded");
    }
    Ok(first_response)
}

/// Whether a message author needs a staff check at all.
///
/// Saves a member fetch for messages that cannot be a first response.
#[must_use]
pub fn awaits_first_response(ticket: &ticket::Model, author_id: &str) -> bool {
    ticket.open && ticket.first_response_at.is_none() && ticket.created_by_id != author_id
}

/// Stores the creator's rating for a closed ticket. One rating per ticket.
pub async fn record_feedback(
    db: &DatabaseConnection,
    ticket_id: &str,
    user_id: &str,
    rating: i32,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<feedback::Model> {
    if !(1..=5).contains(&rating) {
        return Err(Error::InvalidRating { rating });
    }
    let ticket = require_ticket(db, ticket_id).await?;

    let existing = Feedback::find()
        .filter(feedback::Column::TicketId.eq(ticket_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::FeedbackExists);
    }

    let model = feedback::ActiveModel {
        ticket_id: Set(ticket.id),
        guild_id: Set(ticket.guild_id),
        user_id: Set(Some(user_id.to_string())),
        rating: Set(rating),
        comment: Set(comment),
        created_at: Set(now),
        ..Default::default()
    };
    let saved = model.insert(db).await?;
    tracing::info!(ticket = ticket_id, rating, "Feedback recorded");
    Ok(saved)
}

/// Loads the statistics view of a guild's tickets.
///
/// With `since`, only tickets opened or closed at or after it are returned; the
/// per-metric window is applied afterwards by [`TicketRecord::in_window`].
pub async fn load_records(
    db: &DatabaseConnection,
    guild_id: &str,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<TicketRecord>> {
    let mut query = Ticket::find()
        .filter(ticket::Column::GuildId.eq(guild_id))
        .order_by_asc(ticket::Column::CreatedAt);
    if let Some(since) = since {
        query = query.filter(
            Condition::any()
                .add(ticket::Column::CreatedAt.gte(since))
                .add(ticket::Column::ClosedAt.gte(since)),
        );
    }
    let rows = query.find_also_related(Feedback).all(db).await?;

    let categories: HashMap<i64, String> = Category::find()
        .filter(crate::entities::category::Column::GuildId.eq(guild_id))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    tracing::debug!(guild_id, count = rows.len(), "Loaded ticket records");
    Ok(rows
        .into_iter()
        .map(|(ticket, feedback)| {
            let category = ticket
                .category_id
                .and_then(|id| categories.get(&id).cloned());
            TicketRecord::from_models(ticket, feedback, category)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::ranking::Metric;
    use crate::core::stats::aggregate;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_numbers_tickets_per_guild() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(next_number(&db, "g1").await?, 1);
        create_test_ticket(&db, "c1", "g1", "user").await?;
        create_test_ticket(&db, "c2", "g1", "user").await?;
        create_test_ticket(&db, "c3", "g2", "user").await?;
        assert_eq!(next_number(&db, "g1").await?, 3);
        assert_eq!(next_number(&db, "g2").await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_ticket_channel() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(get_ticket(&db, "nope").await?.is_none());
        assert!(matches!(
            claim(&db, "nope", "staff").await,
            Err(Error::NotATicket)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_claim_once() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_ticket(&db, "c1", "g1", "user").await?;

        let ticket = claim(&db, "c1", "staffA").await?;
        assert_eq!(ticket.claimed_by_id.as_deref(), Some("staffA"));

        let again = claim(&db, "c1", "staffB").await;
        assert!(matches!(again, Err(Error::AlreadyClaimed { staff_id }) if staff_id == "staffA"));
        Ok(())
    }

    #[tokio::test]
    async fn test_claim_skips_ticket_closed_after_check() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_ticket(&db, "c1", "g1", "user").await?;
        // The close lands between claim's precondition read and its update
        close(&db, "c1", "staffB", CloseReason::TicketAnswered, Utc::now()).await?;

        assert!(!claim_if_free(&db, "c1", "staffA").await?);
        let ticket = require_ticket(&db, "c1").await?;
        assert!(ticket.claimed_by_id.is_none());

        create_test_ticket(&db, "c2", "g1", "user").await?;
        assert!(claim_if_free(&db, "c2", "staffA").await?);
        assert!(!claim_if_free(&db, "c2", "staffB").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_unclaim_requires_claim() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_ticket(&db, "c1", "g1", "user").await?;
        assert!(matches!(unclaim(&db, "c1").await, Err(Error::NotClaimed)));

        claim(&db, "c1", "staffA").await?;
        let (ticket, previous) = unclaim(&db, "c1").await?;
        assert_eq!(previous, "staffA");
        assert!(ticket.claimed_by_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_transfer() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_ticket(&db, "c1", "g1", "user").await?;
        assert!(matches!(
            transfer(&db, "c1", "staffB").await,
            Err(Error::NotClaimed)
        ));

        claim(&db, "c1", "staffA").await?;
        let (ticket, previous) = transfer(&db, "c1", "staffB").await?;
        assert_eq!(previous, "staffA");
        assert_eq!(ticket.claimed_by_id.as_deref(), Some("staffB"));
        Ok(())
    }

    #[tokio::test]
    async fn test_lock_and_unlock() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_ticket(&db, "c1", "g1", "user").await?;
        let now = Utc::now();

        assert!(matches!(unlock(&db, "c1").await, Err(Error::NotLocked)));

        let locked = lock(&db, "c1", now, 48).await?;
        assert!(locked.locked);
        assert_eq!(locked.locked_at, Some(now));
        assert_eq!(locked.scheduled_deletion_at, Some(now + Duration::hours(48)));
        assert!(matches!(
            lock(&db, "c1", now, 48).await,
            Err(Error::AlreadyLocked)
        ));

        let unlocked = unlock(&db, "c1").await?;
        assert!(!unlocked.locked);
        assert!(unlocked.locked_at.is_none());
        assert!(unlocked.scheduled_deletion_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_close_is_terminal() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_ticket(&db, "c1", "g1", "user").await?;
        let now = Utc::now();

        let closed = close(&db, "c1", "staffA", CloseReason::IssueResolved, now).await?;
        assert!(!closed.open);
        assert_eq!(closed.closed_at, Some(now));
        assert_eq!(closed.closed_by_id.as_deref(), Some("staffA"));
        assert_eq!(closed.closed_reason.as_deref(), Some("issue_resolved"));

        assert!(matches!(
            close(&db, "c1", "staffA", CloseReason::IssueResolved, now).await,
            Err(Error::TicketClosed)
        ));
        assert!(matches!(
            claim(&db, "c1", "staffA").await,
            Err(Error::TicketClosed)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_first_response_only_from_other_staff() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_ticket(&db, "c1", "g1", "user").await?;
        let t0 = Utc::now();

        // Creator talking, even if staff, is not a response
        assert!(!record_message(&db, "c1", "user", true, t0).await?);
        // Non-staff helper
        assert!(!record_message(&db, "c1", "helper", false, t0).await?);
        let ticket = require_ticket(&db, "c1").await?;
        assert!(ticket.first_response_at.is_none());
        assert_eq!(ticket.last_message_at, Some(t0));

        let t1 = t0 + Duration::minutes(2);
        assert!(record_message(&db, "c1", "staffA", true, t1).await?);
        let t2 = t1 + Duration::minutes(2);
        assert!(!record_message(&db, "c1", "staffB", true, t2).await?);

        let ticket = require_ticket(&db, "c1").await?;
        assert_eq!(ticket.first_response_at, Some(t1));
        assert_eq!(ticket.last_message_at, Some(t2));

        // Unknown channel is ignored
        assert!(!record_message(&db, "other", "staffA", true, t2).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_feedback_once_and_in_range() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_ticket(&db, "c1", "g1", "user").await?;
        let now = Utc::now();

        assert!(matches!(
            record_feedback(&db, "c1", "user", 6, None, now).await,
            Err(Error::InvalidRating { rating: 6 })
        ));
        let saved = record_feedback(&db, "c1", "user", 4, None, now).await?;
        assert_eq!(saved.rating, 4);
        assert!(matches!(
            record_feedback(&db, "c1", "user", 5, None, now).await,
            Err(Error::FeedbackExists)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_creator_id_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let good = create_test_ticket(&db, "c1", "g1", "123").await?;
        assert_eq!(creator_id(&good)?, 123);
        let bad = create_test_ticket(&db, "c2", "g1", "someone").await?;
        assert!(matches!(creator_id(&bad), Err(Error::InvalidCreator)));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_records_joins_feedback_and_category() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "g1", "Support").await?;
        let now = Utc::now();

        create_ticket(
            &db,
            NewTicket {
                channel_id: "c1".to_string(),
                guild_id: "g1".to_string(),
                category_id: Some(category.id),
                number: 1,
                created_by_id: "user".to_string(),
                topic: None,
            },
            now - Duration::days(60),
        )
        .await?;
        claim(&db, "c1", "staffA").await?;
        close(&db, "c1", "staffA", CloseReason::TicketAnswered, now).await?;
        record_feedback(&db, "c1", "user", 5, None, now).await?;

        let old = create_ticket(
            &db,
            NewTicket {
                channel_id: "c2".to_string(),
                guild_id: "g1".to_string(),
                category_id: None,
                number: 2,
                created_by_id: "user".to_string(),
                topic: None,
            },
            now - Duration::days(90),
        )
        .await?;
        assert!(old.open);

        let all = load_records(&db, "g1", None).await?;
        assert_eq!(all.len(), 2);

        // Opened 60 days ago but closed now: kept for a 30 day window
        let recent = load_records(&db, "g1", Some(now - Duration::days(30))).await?;
        assert_eq!(recent.len(), 1);
        let record = &recent[0];
        assert_eq!(record.rating, Some(5));
        assert_eq!(record.category.as_deref(), Some("Support"));

        let ratings = aggregate(&recent, Metric::Rating);
        assert_eq!(ratings["staffA"].average(), Some(5.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_removed_category_detaches_tickets() -> Result<()> {
        let (db, category, ticket) = setup_with_ticket().await?;
        assert_eq!(ticket.category_id, Some(category.id));
        assert_eq!(ticket.topic.as_deref(), Some("Help"));

        crate::core::category::remove_category(&db, "guild", "Support").await?;
        let ticket = require_ticket(&db, "channel").await?;
        assert_eq!(ticket.category_id, None);
        Ok(())
    }

    #[test]
    fn test_close_reason_codes() {
        for reason in CloseReason::ALL {
            assert_eq!(reason.code().parse::<CloseReason>(), Ok(reason));
        }
        assert!("whatever".parse::<CloseReason>().is_err());
    }
}
