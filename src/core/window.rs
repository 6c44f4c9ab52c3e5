//! Time windows for statistics queries.
//!
//! A window is a lower bound on a ticket timestamp. Which timestamp is compared
//! depends on the metric (see [`crate::core::ranking::Metric::anchor`]).

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Reporting window offered by the statistics commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum TimeRange {
    /// Last 24 hours
    #[serde(rename = "24h")]
    Day,
    /// Last 7 days
    #[serde(rename = "7d")]
    Week,
    /// Last 30 days
    #[default]
    #[serde(rename = "30d")]
    Month,
    /// Last 90 days
    #[serde(rename = "90d")]
    Quarter,
    /// No lower bound
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    /// Short code used in config files and option values.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
            Self::All => "all",
        }
    }

    /// Human wording, e.g. `"last 30 days"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Day => "last 24 hours",
            Self::Week => "last 7 days",
            Self::Month => "last 30 days",
            Self::Quarter => "last 90 days",
            Self::All => "all time",
        }
    }

    /// Length of the window, `None` for [`TimeRange::All`].
    #[must_use]
    pub fn duration(self) -> Option<Duration> {
        match self {
            Self::Day => Some(Duration::hours(24)),
            Self::Week => Some(Duration::days(7)),
            Self::Month => Some(Duration::days(30)),
            Self::Quarter => Some(Duration::days(90)),
            Self::All => None,
        }
    }

    /// Lower bound relative to `now`.
    #[must_use]
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.duration().map(|d| now - d)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(Self::Day),
            "7d" => Ok(Self::Week),
            "30d" => Ok(Self::Month),
            "90d" => Ok(Self::Quarter),
            "all" => Ok(Self::All),
            other => Err(format!("unknown time range `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_since_subtracts_window() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            TimeRange::Month.since(now),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            TimeRange::Day.since(now),
            Some(Utc.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap())
        );
        assert_eq!(TimeRange::All.since(now), None);
    }

    #[test]
    fn test_codes_parse_back() {
        for range in [
            TimeRange::Day,
            TimeRange::Week,
            TimeRange::Month,
            TimeRange::Quarter,
            TimeRange::All,
        ] {
            assert_eq!(range.code().parse::<TimeRange>().unwrap(), range);
        }
        assert!("1y".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_default_is_thirty_days() {
        assert_eq!(TimeRange::default(), TimeRange::Month);
    }
}
