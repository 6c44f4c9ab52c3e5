//! Periodic housekeeping of open tickets.
//!
//! A ticket goes stale once nobody has written in it for `stale_after`: it gets
//! an inactivity warning and `stale_since` is set. A stale ticket that stays
//! quiet for `auto_close_after` is closed without a closer. Locked tickets are
//! never warned; they are closed once their scheduled deletion passes.

use crate::{
    core::ticket::{self, CloseReason},
    entities::{Ticket, ticket as ticket_entity},
    errors::Result,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Inactivity thresholds. `None` turns a step off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepPolicy {
    /// Silence before the inactivity warning
    pub stale_after: Option<Duration>,
    /// Time after the warning before the ticket is closed
    pub auto_close_after: Option<Duration>,
}

impl SweepPolicy {
    /// When a ticket warned at `stale_since` will be closed, if ever.
    #[must_use]
    pub fn closes_at(&self, stale_since: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.auto_close_after.map(|after| stale_since + after)
    }
}

/// Open, unlocked tickets that have been silent for `stale_after` and were
/// not warned yet.
///
/// Tickets nobody has written in are left alone, as they have no last message.
pub async fn newly_stale(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> Result<Vec<ticket_entity::Model>> {
    let tickets = Ticket::find()
        .filter(ticket_entity::Column::Open.eq(true))
        .filter(ticket_entity::Column::Locked.eq(false))
        .filter(ticket_entity::Column::StaleSince.is_null())
        .filter(ticket_entity::Column::LastMessageAt.lte(now - stale_after))
        .order_by_asc(ticket_entity::Column::LastMessageAt)
        .all(db)
        .await?;
    tracing::debug!(count = tickets.len(), "Found newly stale tickets");
    Ok(tickets)
}

/// Records that the inactivity warning was posted.
pub async fn mark_stale(
    db: &DatabaseConnection,
    channel_id: &str,
    now: DateTime<Utc>,
) -> Result<ticket_entity::Model> {
    let ticket = ticket::require_ticket(db, channel_id).await?;
    let mut active: ticket_entity::ActiveModel = ticket.into();
    active.stale_since = Set(Some(now));
    Ok(active.update(db).await?)
}

/// Stale tickets whose warning is at least `auto_close_after` old.
pub async fn due_auto_close(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    auto_close_after: Duration,
) -> Result<Vec<ticket_entity::Model>> {
    Ok(Ticket::find()
        .filter(ticket_entity::Column::Open.eq(true))
        .filter(ticket_entity::Column::StaleSince.lte(now - auto_close_after))
        .order_by_asc(ticket_entity::Column::StaleSince)
        .all(db)
        .await?)
}

/// Locked tickets whose scheduled deletion has passed.
pub async fn due_deletion(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<Vec<ticket_entity::Model>> {
    Ok(Ticket::find()
        .filter(ticket_entity::Column::Open.eq(true))
        .filter(ticket_entity::Column::Locked.eq(true))
        .filter(ticket_entity::Column::ScheduledDeletionAt.lte(now))
        .order_by_asc(ticket_entity::Column::ScheduledDeletionAt)
        .all(db)
        .await?)
}

/// Closes a ticket on the sweep's behalf. Nobody is credited with the close.
pub async fn close_unattended(
    db: &DatabaseConnection,
    channel_id: &str,
    reason: CloseReason,
    now: DateTime<Utc>,
) -> Result<ticket_entity::Model> {
    ticket::close_as(db, channel_id, None, reason, now).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{
            stats::{TicketRecord, staff_aggregates},
            ticket::{lock, record_message},
        },
        errors::Error,
        test_utils::*,
    };

    fn ids(tickets: &[ticket_entity::Model]) -> Vec<&str> {
        tickets.iter().map(|t| t.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_quiet_tickets_go_stale_once() -> Result<()> {
        let db = setup_test_db().await?;
        let t0 = Utc::now();
        let after = Duration::hours(24);

        create_test_ticket(&db, "quiet", "g1", "user").await?;
        create_test_ticket(&db, "busy", "g1", "user").await?;
        create_test_ticket(&db, "silent", "g1", "user").await?;
        record_message(&db, "quiet", "user", false, t0).await?;
        record_message(&db, "busy", "user", false, t0 + Duration::hours(20)).await?;

        let now = t0 + Duration::hours(25);
        let stale = newly_stale(&db, now, after).await?;
        // Never written in -> no last message -> never stale
        assert_eq!(ids(&stale), vec!["quiet"]);

        mark_stale(&db, "quiet", now).await?;
        assert!(newly_stale(&db, now, after).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_new_message_clears_warning() -> Result<()> {
        let db = setup_test_db().await?;
        let t0 = Utc::now();
        create_test_ticket(&db, "c1", "g1", "user").await?;
        record_message(&db, "c1", "user", false, t0).await?;
        mark_stale(&db, "c1", t0 + Duration::hours(25)).await?;

        record_message(&db, "c1", "user", false, t0 + Duration::hours(26)).await?;
        let ticket = ticket::require_ticket(&db, "c1").await?;
        assert!(ticket.stale_since.is_none());

        let later = t0 + Duration::hours(60);
        assert!(due_auto_close(&db, later, Duration::hours(24)).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_auto_close_after_warning() -> Result<()> {
        let db = setup_test_db().await?;
        let warned = Utc::now();
        let after = Duration::hours(24);
        create_test_ticket(&db, "c1", "g1", "user").await?;
        ticket::claim(&db, "c1", "staffA").await?;
        mark_stale(&db, "c1", warned).await?;

        assert!(due_auto_close(&db, warned + Duration::hours(23), after).await?.is_empty());
        let due = due_auto_close(&db, warned + after, after).await?;
        assert_eq!(ids(&due), vec!["c1"]);

        let closed = close_unattended(&db, "c1", CloseReason::Inactivity, warned + after).await?;
        assert!(!closed.open);
        assert!(closed.closed_by_id.is_none());
        assert_eq!(closed.closed_reason.as_deref(), Some("inactivity"));
        assert!(due_auto_close(&db, warned + after, after).await?.is_empty());

        // An unattended close earns nobody a closed ticket or a rating
        ticket::record_feedback(&db, "c1", "user", 5, None, warned + after).await?;
        let records = ticket::load_records(&db, "g1", None).await?;
        let aggregates = staff_aggregates(&records);
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].staff_id, "staffA");
        assert_eq!(aggregates[0].rating.count, 0);
        assert!(records.iter().all(|r: &TicketRecord| r.closed_by_id.is_none()));
        Ok(())
    }

    #[tokio::test]
    async fn test_locked_tickets_expire_instead_of_going_stale() -> Result<()> {
        let db = setup_test_db().await?;
        let t0 = Utc::now();
        create_test_ticket(&db, "c1", "g1", "user").await?;
        record_message(&db, "c1", "user", false, t0).await?;
        lock(&db, "c1", t0, 48).await?;

        let now = t0 + Duration::hours(30);
        assert!(newly_stale(&db, now, Duration::hours(24)).await?.is_empty());
        assert!(due_deletion(&db, now).await?.is_empty());

        let now = t0 + Duration::hours(48);
        assert_eq!(ids(&due_deletion(&db, now).await?), vec!["c1"]);
        close_unattended(&db, "c1", CloseReason::LockExpired, now).await?;
        assert!(due_deletion(&db, now).await?.is_empty());
        assert!(matches!(
            close_unattended(&db, "c1", CloseReason::LockExpired, now).await,
            Err(Error::TicketClosed)
        ));
        Ok(())
    }

    #[test]
    fn test_closes_at() {
        let warned = Utc::now();
        let policy = SweepPolicy {
            stale_after: Some(Duration::hours(24)),
            auto_close_after: Some(Duration::hours(12)),
        };
        assert_eq!(policy.closes_at(warned), Some(warned + Duration::hours(12)));
        assert_eq!(SweepPolicy::default().closes_at(warned), None);
    }
}
