//! Staff performance aggregation over ticket records.
//!
//! Everything in this module is a pure transformation: a slice of
//! [`TicketRecord`]s goes in, per-staff totals or a guild summary come out. The
//! records are rebuilt from the database on every request and nothing here is
//! cached.

use crate::core::ranking::{Anchor, Metric, StaffKey};
use crate::entities::{feedback, ticket};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// Read-only view of a ticket used by the statistics code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRecord {
    /// Ticket channel id
    pub id: String,
    /// When the ticket was opened
    pub created_at: DateTime<Utc>,
    /// First staff reply
    pub first_response_at: Option<DateTime<Utc>>,
    /// When the ticket was closed
    pub closed_at: Option<DateTime<Utc>>,
    /// Current claimant
    pub claimed_by_id: Option<String>,
    /// Staff member who closed the ticket
    pub closed_by_id: Option<String>,
    /// Feedback rating (1-5)
    pub rating: Option<i32>,
    /// Whether the ticket is still open
    pub open: bool,
    /// Category name, if the ticket has one
    pub category: Option<String>,
}

impl TicketRecord {
    /// Builds a record from the stored ticket, its feedback and its category name.
    #[must_use]
    pub fn from_models(
        ticket: ticket::Model,
        feedback: Option<feedback::Model>,
        category: Option<String>,
    ) -> Self {
        Self {
            id: ticket.id,
            created_at: ticket.created_at,
            first_response_at: ticket.first_response_at,
            closed_at: ticket.closed_at,
            claimed_by_id: ticket.claimed_by_id,
            closed_by_id: ticket.closed_by_id,
            rating: feedback.map(|f| f.rating),
            open: ticket.open,
            category,
        }
    }

    /// Milliseconds from opening to the first staff reply.
    ///
    /// Negative spans (bad clocks in stored data) clamp to zero.
    #[must_use]
    pub fn response_time_ms(&self) -> Option<i64> {
        self.first_response_at
            .map(|at| (at - self.created_at).num_milliseconds().max(0))
    }

    /// Milliseconds from opening to closing.
    #[must_use]
    pub fn resolution_time_ms(&self) -> Option<i64> {
        self.closed_at
            .map(|at| (at - self.created_at).num_milliseconds().max(0))
    }

    /// Staff member this record is attributed to under `key`.
    #[must_use]
    pub fn staff(&self, key: StaffKey) -> Option<&str> {
        match key {
            StaffKey::ClaimedBy => self.claimed_by_id.as_deref(),
            StaffKey::ClosedBy => self.closed_by_id.as_deref(),
        }
    }

    /// Timestamp a time window is compared against.
    #[must_use]
    pub const fn anchored_at(&self, anchor: Anchor) -> Option<DateTime<Utc>> {
        match anchor {
            Anchor::Created => Some(self.created_at),
            Anchor::Closed => self.closed_at,
        }
    }

    /// Whether the record falls inside the window for `metric`.
    ///
    /// `None` means no lower bound.
    #[must_use]
    pub fn in_window(&self, metric: Metric, since: Option<DateTime<Utc>>) -> bool {
        since.is_none_or(|since| {
            self.anchored_at(metric.anchor())
                .is_some_and(|at| at >= since)
        })
    }

    /// The value this record contributes to `metric`, if it contributes at all.
    #[must_use]
    pub fn sample(&self, metric: Metric) -> Option<i64> {
        match metric {
            Metric::ResponseTime => self.response_time_ms(),
            Metric::ResolutionTime => self.resolution_time_ms(),
            Metric::Rating => self.rating.map(i64::from),
            Metric::Claimed => Some(1),
            Metric::Resolved => self.closed_at.map(|_| 1),
        }
    }
}

/// Running sum and sample count for one staff member and one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    /// Sum of samples (milliseconds, rating points, or ticket count)
    pub total: i64,
    /// Number of samples
    pub count: u32,
}

impl Totals {
    /// Adds one sample.
    pub const fn add(&mut self, value: i64) {
        self.total += value;
        self.count += 1;
    }

    /// `total / count`, or `None` when there are no samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total as f64 / f64::from(self.count))
    }
}

/// Per-staff totals keyed by staff id.
///
/// A `BTreeMap` keeps iteration ordered by staff id, which is what makes ranking
/// ties deterministic.
pub type StaffTotals = BTreeMap<String, Totals>;

/// Reduces `records` to per-staff totals for one metric.
///
/// Records without the metric's staff key or without the metric's field are
/// skipped.
#[must_use]
pub fn aggregate(records: &[TicketRecord], metric: Metric) -> StaffTotals {
    let mut totals = StaffTotals::new();
    for record in records {
        let Some(staff_id) = record.staff(metric.staff_key()) else {
            continue;
        };
        let Some(value) = record.sample(metric) else {
            continue;
        };
        totals.entry(staff_id.to_string()).or_default().add(value);
    }
    totals
}

/// The three independent per-staff mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// First response time per claimant
    pub response_time: StaffTotals,
    /// Resolution time per claimant
    pub resolution_time: StaffTotals,
    /// Feedback rating per closer
    pub rating: StaffTotals,
}

/// Builds response, resolution and rating mappings in one call.
#[must_use]
pub fn aggregate_all(records: &[TicketRecord]) -> Aggregation {
    Aggregation {
        response_time: aggregate(records, Metric::ResponseTime),
        resolution_time: aggregate(records, Metric::ResolutionTime),
        rating: aggregate(records, Metric::Rating),
    }
}

/// Everything known about one staff member, used by the panels and `/profiles`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffAggregate {
    /// Staff user id
    pub staff_id: String,
    /// Tickets claimed
    pub tickets_handled: u32,
    /// Claimed tickets that are closed
    pub tickets_closed: u32,
    /// Response time totals over claimed tickets
    pub response: Totals,
    /// Resolution time totals over claimed tickets
    pub resolution: Totals,
    /// Rating totals over tickets this member closed
    pub rating: Totals,
}

/// Builds one aggregate per staff member who claimed a ticket or closed a
/// rated one, busiest first.
///
/// Times follow the claimant and ratings follow the closer, the same keys the
/// leaderboard uses. Ties keep ascending staff id order.
#[must_use]
pub fn staff_aggregates(records: &[TicketRecord]) -> Vec<StaffAggregate> {
    fn slot<'a>(
        by_staff: &'a mut BTreeMap<String, StaffAggregate>,
        staff_id: &str,
    ) -> &'a mut StaffAggregate {
        by_staff
            .entry(staff_id.to_string())
            .or_insert_with(|| StaffAggregate {
                staff_id: staff_id.to_string(),
                ..StaffAggregate::default()
            })
    }

    let mut by_staff = BTreeMap::new();
    for record in records {
        let Some(staff_id) = record.claimed_by_id.as_deref() else {
            continue;
        };
        let entry = slot(&mut by_staff, staff_id);
        entry.tickets_handled += 1;
        if !record.open {
            entry.tickets_closed += 1;
        }
        if let Some(ms) = record.response_time_ms() {
            entry.response.add(ms);
        }
        if let Some(ms) = record.resolution_time_ms() {
            entry.resolution.add(ms);
        }
    }
    for (staff_id, rating) in aggregate(records, Metric::Rating) {
        slot(&mut by_staff, &staff_id).rating = rating;
    }

    let mut aggregates: Vec<StaffAggregate> = by_staff.into_values().collect();
    aggregates.sort_by(|a, b| b.tickets_handled.cmp(&a.tickets_handled));
    aggregates
}

/// Guild-wide numbers shown by `/stats` and the live panel.
#[derive(Debug, Clone, PartialEq)]
pub struct GuildSummary {
    /// All tickets
    pub total: usize,
    /// Tickets still open
    pub open: usize,
    /// Tickets closed
    pub closed: usize,
    /// Average first response over tickets that have one
    pub avg_response_ms: Option<f64>,
    /// Average resolution over closed tickets
    pub avg_resolution_ms: Option<f64>,
    /// Tickets per day since the oldest ticket (at least one day)
    pub avg_daily_all_time: f64,
    /// Tickets per day over the last 30 days
    pub avg_daily_last_30_days: f64,
    /// Average feedback rating
    pub avg_rating: Option<f64>,
    /// Number of ratings
    pub rating_count: u32,
    /// Category with the most tickets and its count
    pub most_popular_category: Option<(String, usize)>,
}

/// Summarises every record of a guild.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn guild_summary(records: &[TicketRecord], now: DateTime<Utc>) -> GuildSummary {
    let open = records.iter().filter(|r| r.open).count();

    let mut response = Totals::default();
    let mut resolution = Totals::default();
    let mut rating = Totals::default();
    let mut categories: BTreeMap<&str, usize> = BTreeMap::new();

    for record in records {
        if let Some(ms) = record.response_time_ms() {
            response.add(ms);
        }
        if let Some(ms) = record.resolution_time_ms() {
            resolution.add(ms);
        }
        if let Some(r) = record.rating {
            rating.add(i64::from(r));
        }
        if let Some(name) = record.category.as_deref() {
            *categories.entry(name).or_default() += 1;
        }
    }

    let most_popular_category = categories
        .into_iter()
        .fold(None::<(&str, usize)>, |best, (name, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((name, count)),
        })
        .map(|(name, count)| (name.to_string(), count));

    let oldest = records.iter().map(|r| r.created_at).min();
    let days = oldest.map_or(1, |oldest| {
        let span = now - oldest;
        // Partial days count as a whole day
        let whole = span.num_days();
        let days = if span > Duration::days(whole) { whole + 1 } else { whole };
        days.max(1)
    });

    let month_ago = now - Duration::days(30);
    let last_30 = records.iter().filter(|r| r.created_at >= month_ago).count();

    GuildSummary {
        total: records.len(),
        open,
        closed: records.len() - open,
        avg_response_ms: response.average(),
        avg_resolution_ms: resolution.average(),
        avg_daily_all_time: records.len() as f64 / days as f64,
        avg_daily_last_30_days: last_30 as f64 / 30.0,
        avg_rating: rating.average(),
        rating_count: rating.count,
        most_popular_category,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn record(id: &str) -> TicketRecord {
        TicketRecord {
            id: id.to_string(),
            created_at: at(0),
            first_response_at: None,
            closed_at: None,
            claimed_by_id: None,
            closed_by_id: None,
            rating: None,
            open: true,
            category: None,
        }
    }

    fn responded(id: &str, staff: &str, response_ms: i64) -> TicketRecord {
        TicketRecord {
            claimed_by_id: Some(staff.to_string()),
            first_response_at: Some(at(response_ms)),
            ..record(id)
        }
    }

    fn rated(id: &str, staff: &str, rating: i32) -> TicketRecord {
        TicketRecord {
            closed_by_id: Some(staff.to_string()),
            closed_at: Some(at(1_000)),
            rating: Some(rating),
            open: false,
            ..record(id)
        }
    }

    #[test]
    fn test_response_time_totals_per_claimant() {
        let records = vec![
            responded("1", "A", 120_000),
            responded("2", "B", 60_000),
            responded("3", "A", 60_000),
        ];

        let totals = aggregate(&records, Metric::ResponseTime);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["A"], Totals { total: 180_000, count: 2 });
        assert_eq!(totals["B"], Totals { total: 60_000, count: 1 });
    }

    #[test]
    fn test_records_missing_fields_are_skipped() {
        let unclaimed = TicketRecord {
            first_response_at: Some(at(5_000)),
            ..record("1")
        };
        let no_response = TicketRecord {
            claimed_by_id: Some("A".to_string()),
            closed_at: Some(at(9_000)),
            ..record("2")
        };

        let records = vec![unclaimed, no_response];
        let agg = aggregate_all(&records);

        // No claimant with a first response -> nobody in the response mapping
        assert!(agg.response_time.is_empty());
        // The claimed ticket without a response still counts for resolution
        assert_eq!(agg.resolution_time["A"], Totals { total: 9_000, count: 1 });
        assert!(agg.rating.is_empty());
    }

    #[test]
    fn test_rating_average() {
        let records = vec![rated("1", "A", 5), rated("2", "A", 3)];
        let totals = aggregate(&records, Metric::Rating);
        let a = totals["A"];
        assert_eq!(a.count, 2);
        assert_eq!(a.average(), Some(4.0));
    }

    #[test]
    fn test_empty_input_yields_empty_mappings() {
        let agg = aggregate_all(&[]);
        assert_eq!(agg, Aggregation::default());
        assert!(aggregate(&[], Metric::Claimed).is_empty());
    }

    #[test]
    fn test_average_without_samples_is_none() {
        assert_eq!(Totals::default().average(), None);
    }

    #[test]
    fn test_negative_durations_clamp_to_zero() {
        let skewed = TicketRecord {
            created_at: at(10_000),
            first_response_at: Some(at(5_000)),
            ..record("1")
        };
        assert_eq!(skewed.response_time_ms(), Some(0));
    }

    #[test]
    fn test_count_metrics() {
        let claimed_open = TicketRecord {
            claimed_by_id: Some("A".to_string()),
            ..record("1")
        };
        let closed = TicketRecord {
            claimed_by_id: Some("A".to_string()),
            closed_by_id: Some("B".to_string()),
            closed_at: Some(at(1)),
            open: false,
            ..record("2")
        };
        let records = vec![claimed_open, closed];

        let claimed = aggregate(&records, Metric::Claimed);
        assert_eq!(claimed["A"].count, 2);

        let resolved = aggregate(&records, Metric::Resolved);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved["B"].count, 1);
    }

    #[test]
    fn test_window_uses_metric_anchor() {
        let since = Some(at(500));
        let opened_early_closed_late = TicketRecord {
            closed_by_id: Some("A".to_string()),
            closed_at: Some(at(1_000)),
            ..record("1")
        };
        // Rating/resolved look at the close time, response at the open time
        assert!(opened_early_closed_late.in_window(Metric::Rating, since));
        assert!(opened_early_closed_late.in_window(Metric::Resolved, since));
        assert!(!opened_early_closed_late.in_window(Metric::ResponseTime, since));
        assert!(opened_early_closed_late.in_window(Metric::ResponseTime, None));
        assert!(!record("2").in_window(Metric::Rating, since));
    }

    #[test]
    fn test_staff_aggregates_busiest_first() {
        let records = vec![
            responded("1", "B", 60_000),
            responded("2", "A", 30_000),
            TicketRecord {
                open: false,
                closed_by_id: Some("A".to_string()),
                rating: Some(4),
                ..responded("3", "A", 90_000)
            },
            record("4"),
        ];

        let aggregates = staff_aggregates(&records);
        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].staff_id, "A");
        assert_eq!(aggregates[0].tickets_handled, 2);
        assert_eq!(aggregates[0].tickets_closed, 1);
        assert_eq!(aggregates[0].response.average(), Some(60_000.0));
        assert_eq!(aggregates[0].rating.average(), Some(4.0));
        assert_eq!(aggregates[1].staff_id, "B");
        assert_eq!(aggregates[1].rating.average(), None);
    }

    #[test]
    fn test_staff_aggregates_credit_rating_to_closer() {
        let handed_over = TicketRecord {
            claimed_by_id: Some("A".to_string()),
            ..rated("1", "B", 5)
        };
        let records = vec![handed_over];

        let aggregates = staff_aggregates(&records);
        assert_eq!(aggregates.len(), 2);
        let a = aggregates.iter().find(|x| x.staff_id == "A").unwrap();
        let b = aggregates.iter().find(|x| x.staff_id == "B").unwrap();
        assert_eq!(a.tickets_handled, 1);
        assert_eq!(a.rating, Totals::default());
        assert_eq!(b.tickets_handled, 0);
        assert_eq!(b.rating, Totals { total: 5, count: 1 });
        // Same owner as the leaderboard's rating metric
        assert_eq!(aggregate(&records, Metric::Rating)["B"], b.rating);
    }

    #[test]
    fn test_staff_aggregates_ties_ordered_by_id() {
        let records = vec![responded("1", "C", 1), responded("2", "A", 1)];
        let ids: Vec<_> = staff_aggregates(&records)
            .into_iter()
            .map(|a| a.staff_id)
            .collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn test_guild_summary() {
        let now = at(0) + Duration::days(3) + Duration::hours(1);
        let records = vec![
            TicketRecord {
                category: Some("Support".to_string()),
                ..responded("1", "A", 120_000)
            },
            TicketRecord {
                category: Some("Support".to_string()),
                ..rated("2", "B", 5)
            },
            TicketRecord {
                category: Some("Appeals".to_string()),
                ..rated("3", "B", 2)
            },
        ];

        let summary = guild_summary(&records, now);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.closed, 2);
        assert_eq!(summary.avg_response_ms, Some(120_000.0));
        assert_eq!(summary.avg_resolution_ms, Some(1_000.0));
        assert_eq!(summary.avg_rating, Some(3.5));
        assert_eq!(summary.rating_count, 2);
        assert_eq!(
            summary.most_popular_category,
            Some(("Support".to_string(), 2))
        );
        // 3 days and an hour rounds up to 4 days
        assert_eq!(summary.avg_daily_all_time, 0.75);
        assert_eq!(summary.avg_daily_last_30_days, 0.1);
    }

    #[test]
    fn test_guild_summary_empty() {
        let summary = guild_summary(&[], at(0));
        assert_eq!(summary.total, 0);
        assert_eq!(summary.avg_response_ms, None);
        assert_eq!(summary.avg_rating, None);
        assert_eq!(summary.most_popular_category, None);
        assert_eq!(summary.avg_daily_all_time, 0.0);
    }
}
