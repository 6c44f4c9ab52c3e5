//! Ranking and formatting of per-staff statistics.
//!
//! [`Metric`] is the single description of a leaderboard type: which staff
//! column it aggregates on, which timestamp its window is anchored on, which way
//! it sorts, and how a value is rendered. Commands never switch on the metric
//! themselves.

use crate::core::stats::{StaffTotals, TicketRecord, aggregate};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Placeholder shown for an empty ranking.
pub const NO_DATA: &str = "No data available";

/// Which staff reference a ticket is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffKey {
    /// The claimant
    ClaimedBy,
    /// The staff member who closed the ticket
    ClosedBy,
}

/// Which timestamp a time window is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Ticket open time
    Created,
    /// Ticket close time
    Closed,
}

/// Sort direction of a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Lower is better
    Ascending,
    /// Higher is better
    Descending,
}

/// A leaderboard type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Average feedback rating of tickets a staff member closed
    #[default]
    Rating,
    /// Number of tickets claimed
    Claimed,
    /// Number of tickets closed
    Resolved,
    /// Average time to first response on claimed tickets
    ResponseTime,
    /// Average time to close on claimed tickets
    ResolutionTime,
}

impl Metric {
    /// Every metric, in menu order.
    pub const ALL: [Self; 5] = [
        Self::Rating,
        Self::Claimed,
        Self::Resolved,
        Self::ResponseTime,
        Self::ResolutionTime,
    ];

    /// Short code used in select menu values.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::Claimed => "claimed",
            Self::Resolved => "resolved",
            Self::ResponseTime => "response",
            Self::ResolutionTime => "resolution",
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rating => "Staff Ratings",
            Self::Claimed => "Tickets Claimed",
            Self::Resolved => "Tickets Resolved",
            Self::ResponseTime => "Average Response Time",
            Self::ResolutionTime => "Average Resolution Time",
        }
    }

    /// Menu emoji.
    #[must_use]
    pub const fn emoji(self) -> char {
        match self {
            Self::Rating => '⭐',
            Self::Claimed => '🎫',
            Self::Resolved => '✅',
            Self::ResponseTime => '⚡',
            Self::ResolutionTime => '⏱',
        }
    }

    /// Embed title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Rating => "⭐ Staff Rating Leaderboard",
            Self::Claimed => "🎫 Tickets Claimed Leaderboard",
            Self::Resolved => "✅ Tickets Resolved Leaderboard",
            Self::ResponseTime => "⚡ Response Time Leaderboard",
            Self::ResolutionTime => "⏱ Resolution Time Leaderboard",
        }
    }

    /// What the ranking is ordered by, as used in the embed description.
    #[must_use]
    pub const fn ranked_by(self) -> &'static str {
        match self {
            Self::Rating => "average rating",
            Self::Claimed => "tickets claimed",
            Self::Resolved => "tickets resolved",
            Self::ResponseTime => "average response time",
            Self::ResolutionTime => "average resolution time",
        }
    }

    /// Staff column the metric is aggregated on.
    #[must_use]
    pub const fn staff_key(self) -> StaffKey {
        match self {
            Self::Rating | Self::Resolved => StaffKey::ClosedBy,
            Self::Claimed | Self::ResponseTime | Self::ResolutionTime => StaffKey::ClaimedBy,
        }
    }

    /// Timestamp the reporting window applies to.
    #[must_use]
    pub const fn anchor(self) -> Anchor {
        match self {
            Self::Rating | Self::Resolved => Anchor::Closed,
            Self::Claimed | Self::ResponseTime | Self::ResolutionTime => Anchor::Created,
        }
    }

    /// Fixed sort policy: times ascend, everything else descends.
    #[must_use]
    pub const fn order(self) -> SortOrder {
        match self {
            Self::ResponseTime | Self::ResolutionTime => SortOrder::Ascending,
            Self::Rating | Self::Claimed | Self::Resolved => SortOrder::Descending,
        }
    }

    /// Whether the ranking is by sample count rather than by average.
    #[must_use]
    pub const fn is_count(self) -> bool {
        matches!(self, Self::Claimed | Self::Resolved)
    }

    /// Renders the value part of a leaderboard line.
    #[must_use]
    pub fn format_value(self, entry: &RankedEntry) -> String {
        match self {
            Self::Rating => format!("{:.1} ⭐ ({} ratings)", entry.average, entry.count),
            Self::Claimed | Self::Resolved => format!("{} tickets", entry.count),
            Self::ResponseTime | Self::ResolutionTime => {
                format!("{} minutes avg.", round_minutes(entry.average))
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.code() == s)
            .ok_or_else(|| format!("unknown leaderboard type `{s}`"))
    }
}

/// One ranked staff member.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    /// Staff user id
    pub staff_id: String,
    /// `total / count`
    pub average: f64,
    /// Number of samples
    pub count: u32,
}

impl RankedEntry {
    /// The value the ranking sorts on.
    #[must_use]
    pub fn score(&self, metric: Metric) -> f64 {
        if metric.is_count() {
            f64::from(self.count)
        } else {
            self.average
        }
    }
}

/// Sorts `totals` by `metric`'s policy and keeps the first `limit` entries.
///
/// The sort is stable over staff-id order, so equal scores list in ascending
/// staff id. Sorting happens before truncation.
#[must_use]
pub fn rank(metric: Metric, totals: &StaffTotals, limit: usize) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = totals
        .iter()
        .filter_map(|(staff_id, t)| {
            t.average().map(|average| RankedEntry {
                staff_id: staff_id.clone(),
                average,
                count: t.count,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        let ordering = a
            .score(metric)
            .partial_cmp(&b.score(metric))
            .unwrap_or(Ordering::Equal);
        match metric.order() {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
    entries.truncate(limit);
    entries
}

/// Window filter, aggregation and ranking in one step.
///
/// `since` is applied to each record through the metric's anchor.
#[must_use]
pub fn leaderboard(
    records: &[TicketRecord],
    metric: Metric,
    since: Option<DateTime<Utc>>,
    limit: usize,
) -> Vec<RankedEntry> {
    let in_window: Vec<TicketRecord> = records
        .iter()
        .filter(|r| r.in_window(metric, since))
        .cloned()
        .collect();
    rank(metric, &aggregate(&in_window, metric), limit)
}

/// Renders `N. name: value` lines, numbering from `offset + 1`.
///
/// `names` must be parallel to `entries`. Returns [`NO_DATA`] when empty.
#[must_use]
pub fn render_lines(
    metric: Metric,
    entries: &[RankedEntry],
    names: &[String],
    offset: usize,
) -> String {
    if entries.is_empty() {
        return NO_DATA.to_string();
    }
    entries
        .iter()
        .zip(names)
        .enumerate()
        .map(|(i, (entry, name))| {
            format!("{}. {name}: {}", offset + i + 1, metric.format_value(entry))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[allow(clippy::cast_possible_truncation)]
fn round_minutes(ms: f64) -> i64 {
    (ms / 1000.0 / 60.0).round() as i64
}

/// Minutes with two decimals, e.g. `"2.50"`.
#[must_use]
pub fn format_minutes(ms: f64) -> String {
    format!("{:.2}", ms / 60_000.0)
}

/// Five-glyph star bar: `★` full, `⭐` half, `☆` empty.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn star_rating(rating: f64) -> String {
    let rating = rating.clamp(0.0, 5.0);
    let full = rating.floor() as usize;
    let half = rating - rating.floor() >= 0.5;
    let empty = 5 - full - usize::from(half);

    format!(
        "{}{}{}",
        "★".repeat(full),
        if half { "⭐" } else { "" },
        "☆".repeat(empty)
    )
}

/// Long human duration in the style of `2 minutes` / `1 hour` / `3 days`.
///
/// Picks the largest unit the value reaches and rounds to it; the unit is
/// plural once the value is at least one and a half units.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_duration(ms: f64) -> String {
    const SECOND: f64 = 1000.0;
    const MINUTE: f64 = SECOND * 60.0;
    const HOUR: f64 = MINUTE * 60.0;
    const DAY: f64 = HOUR * 24.0;

    let abs = ms.abs();
    for (unit, name) in [(DAY, "day"), (HOUR, "hour"), (MINUTE, "minute"), (SECOND, "second")] {
        if abs >= unit {
            let plural = if abs >= unit * 1.5 { "s" } else { "" };
            return format!("{} {name}{plural}", (ms / unit).round() as i64);
        }
    }
    format!("{} ms", ms.round() as i64)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::stats::Totals;

    fn totals(entries: &[(&str, i64, u32)]) -> StaffTotals {
        entries
            .iter()
            .map(|(id, total, count)| {
                (
                    (*id).to_string(),
                    Totals {
                        total: *total,
                        count: *count,
                    },
                )
            })
            .collect()
    }

    fn ids(entries: &[RankedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.staff_id.as_str()).collect()
    }

    #[test]
    fn test_response_time_ranks_fastest_first() {
        let t = totals(&[("A", 120_000, 1), ("B", 60_000, 1)]);
        let ranked = rank(Metric::ResponseTime, &t, 10);
        assert_eq!(ids(&ranked), vec!["B", "A"]);
        assert_eq!(ranked[0].average, 60_000.0);
        assert_eq!(ranked[1].average, 120_000.0);
    }

    #[test]
    fn test_rating_ranks_highest_first() {
        let t = totals(&[("A", 8, 2), ("B", 10, 2), ("C", 3, 1)]);
        let ranked = rank(Metric::Rating, &t, 10);
        assert_eq!(ids(&ranked), vec!["B", "A", "C"]);
        assert!(ranked.windows(2).all(|w| w[0].average >= w[1].average));
    }

    #[test]
    fn test_count_metrics_rank_by_count() {
        let t = totals(&[("A", 2, 2), ("B", 5, 5), ("C", 3, 3)]);
        let ranked = rank(Metric::Claimed, &t, 10);
        assert_eq!(ids(&ranked), vec!["B", "C", "A"]);
        assert!(ranked.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_truncation_happens_after_sort() {
        let t = totals(&[("A", 50, 1), ("B", 10, 1), ("C", 30, 1), ("D", 20, 1)]);
        let full = rank(Metric::ResolutionTime, &t, 10);
        let top = rank(Metric::ResolutionTime, &t, 2);
        assert_eq!(ids(&top), vec!["B", "D"]);
        assert_eq!(&full[..2], &top[..]);
        assert!(full.windows(2).all(|w| w[0].average <= w[1].average));
    }

    #[test]
    fn test_ties_are_deterministic() {
        let t = totals(&[("C", 4, 1), ("A", 4, 1), ("B", 4, 1)]);
        assert_eq!(ids(&rank(Metric::Rating, &t, 10)), vec!["A", "B", "C"]);
        assert_eq!(
            ids(&rank(Metric::ResponseTime, &t, 10)),
            vec!["A", "B", "C"]
        );
    }

    #[test]
    fn test_empty_totals_render_no_data() {
        let ranked = rank(Metric::Rating, &StaffTotals::new(), 10);
        assert!(ranked.is_empty());
        assert_eq!(render_lines(Metric::Rating, &ranked, &[], 0), NO_DATA);
    }

    #[test]
    fn test_format_values() {
        let entry = RankedEntry {
            staff_id: "A".to_string(),
            average: 4.0,
            count: 2,
        };
        assert_eq!(Metric::Rating.format_value(&entry), "4.0 ⭐ (2 ratings)");
        assert_eq!(Metric::Claimed.format_value(&entry), "2 tickets");

        let slow = RankedEntry {
            average: 150_000.0,
            ..entry
        };
        assert_eq!(Metric::ResponseTime.format_value(&slow), "3 minutes avg.");
    }

    #[test]
    fn test_render_lines_numbers_from_offset() {
        let entries = vec![
            RankedEntry {
                staff_id: "A".to_string(),
                average: 1.0,
                count: 3,
            },
            RankedEntry {
                staff_id: "B".to_string(),
                average: 1.0,
                count: 1,
            },
        ];
        let names = vec!["Alice".to_string(), "Bob".to_string()];
        assert_eq!(
            render_lines(Metric::Claimed, &entries, &names, 5),
            "6. Alice: 3 tickets\n7. Bob: 1 tickets"
        );
    }

    #[test]
    fn test_metric_codes_parse_back() {
        for metric in Metric::ALL {
            assert_eq!(metric.code().parse::<Metric>(), Ok(metric));
        }
        assert!("speed".parse::<Metric>().is_err());
    }

    #[test]
    fn test_leaderboard_applies_window() {
        use chrono::{Duration, TimeZone};

        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let record = |id: &str, staff: &str, age_days: i64, response_mins: i64| TicketRecord {
            id: id.to_string(),
            created_at: now - Duration::days(age_days),
            first_response_at: Some(
                now - Duration::days(age_days) + Duration::minutes(response_mins),
            ),
            closed_at: None,
            claimed_by_id: Some(staff.to_string()),
            closed_by_id: None,
            rating: None,
            open: true,
            category: None,
        };
        let records = vec![
            record("1", "A", 1, 2),
            record("2", "B", 1, 1),
            record("3", "C", 60, 1),
        ];

        let month = leaderboard(&records, Metric::ResponseTime, Some(now - Duration::days(30)), 10);
        assert_eq!(ids(&month), vec!["B", "A"]);

        let all = leaderboard(&records, Metric::ResponseTime, None, 10);
        assert_eq!(ids(&all), vec!["B", "C", "A"]);

        let top = leaderboard(&records, Metric::ResponseTime, None, 1);
        assert_eq!(ids(&top), vec!["B"]);
    }

    #[test]
    fn test_star_rating() {
        assert_eq!(star_rating(5.0), "★★★★★");
        assert_eq!(star_rating(3.5), "★★★⭐☆");
        assert_eq!(star_rating(4.2), "★★★★☆");
        assert_eq!(star_rating(0.0), "☆☆☆☆☆");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(500.0), "500 ms");
        assert_eq!(format_duration(1_000.0), "1 second");
        assert_eq!(format_duration(60_000.0), "1 minute");
        assert_eq!(format_duration(120_000.0), "2 minutes");
        assert_eq!(format_duration(3_600_000.0 * 5.0), "5 hours");
        assert_eq!(format_duration(86_400_000.0 * 2.0), "2 days");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(150_000.0), "2.50");
        assert_eq!(format_minutes(0.0), "0.00");
    }
}
