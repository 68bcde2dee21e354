use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rating::RatingSource;

/// Aggregate review counts and scores for one observation interval.
///
/// Rows are written hourly or daily by the rating monitor; both cadences
/// coexist in the same table, so spacing between rows is never uniform.
/// Every numeric field is already coerced to a finite number (0 when the
/// source column was missing or malformed).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewSnapshot {
    pub movie_id: i64,
    pub source: Option<RatingSource>,
    pub snapshot_time: Option<DateTime<Utc>>,
    pub snapshot_date: NaiveDate,
    pub total_reviews: i64,
    pub critic_score: f64,
    pub audience_score: f64,
    pub new_reviews_today: i64,
    pub review_velocity: f64, // Reviews per day since release
    pub score_change: f64,    // Critic score change vs previous day
}

impl ReviewSnapshot {
    /// Create a zeroed daily observation
    pub fn new(movie_id: i64, snapshot_date: NaiveDate) -> Self {
        Self {
            movie_id,
            source: None,
            snapshot_time: None,
            snapshot_date,
            total_reviews: 0,
            critic_score: 0.0,
            audience_score: 0.0,
            new_reviews_today: 0,
            review_velocity: 0.0,
            score_change: 0.0,
        }
    }

    /// Create a zeroed observation at an exact time; the calendar date follows the time
    pub fn at(movie_id: i64, snapshot_time: DateTime<Utc>) -> Self {
        Self {
            snapshot_time: Some(snapshot_time),
            ..Self::new(movie_id, snapshot_time.date_naive())
        }
    }

    /// Point in time of the observation: snapshot_time, else midnight UTC of snapshot_date
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.snapshot_time
            .unwrap_or_else(|| self.snapshot_date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Key used to match this row against spike dates
    pub fn key(&self) -> SnapshotKey {
        match self.snapshot_time {
            Some(time) => SnapshotKey::At(time),
            None => SnapshotKey::On(self.snapshot_date),
        }
    }
}

/// Identity of a snapshot row for anomaly lookups.
///
/// Hourly rows are identified by their timestamp, daily rows without one by
/// their date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SnapshotKey {
    At(DateTime<Utc>),
    On(NaiveDate),
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotKey::At(time) => write!(f, "{}", time.format("%Y-%m-%d %H:%M UTC")),
            SnapshotKey::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_observed_at_falls_back_to_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let daily = ReviewSnapshot::new(7, date);
        assert_eq!(daily.observed_at(), Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(daily.key(), SnapshotKey::On(date));

        let time = Utc.with_ymd_and_hms(2026, 1, 2, 13, 0, 0).unwrap();
        let hourly = ReviewSnapshot::at(7, time);
        assert_eq!(hourly.observed_at(), time);
        assert_eq!(hourly.snapshot_date, date);
        assert_eq!(hourly.key(), SnapshotKey::At(time));
    }

    #[test]
    fn test_key_display() {
        let time = Utc.with_ymd_and_hms(2026, 1, 2, 13, 5, 0).unwrap();
        assert_eq!(SnapshotKey::At(time).to_string(), "2026-01-02 13:05 UTC");
        assert_eq!(
            SnapshotKey::On(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()).to_string(),
            "2026-01-02"
        );
    }
}
