use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::snapshot::SnapshotKey;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TrendStatus {
    TrendingUp,
    TrendingDown,
    SleeperHit,
    Stable,
}

impl TrendStatus {
    pub const ALL: [TrendStatus; 4] = [
        TrendStatus::TrendingUp,
        TrendStatus::TrendingDown,
        TrendStatus::SleeperHit,
        TrendStatus::Stable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendStatus::TrendingUp => "trending_up",
            TrendStatus::TrendingDown => "trending_down",
            TrendStatus::SleeperHit => "sleeper_hit",
            TrendStatus::Stable => "stable",
        }
    }

    /// Human label used on badges
    pub fn label(&self) -> &'static str {
        match self {
            TrendStatus::TrendingUp => "Trending Up",
            TrendStatus::TrendingDown => "Trending Down",
            TrendStatus::SleeperHit => "Sleeper Hit",
            TrendStatus::Stable => "Stable",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            TrendStatus::TrendingUp => "🔥",
            TrendStatus::TrendingDown => "📉",
            TrendStatus::SleeperHit => "💎",
            TrendStatus::Stable => "➡️",
        }
    }
}

impl fmt::Display for TrendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trend classification for one movie, derived from its snapshot history.
///
/// Plain data: the classifier produces it, the store persists it and the
/// presentation layer reads it. No serde attributes that skip fields, since
/// the trend table is stored with bincode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieTrend {
    pub movie_id: i64,
    pub trend_status: TrendStatus,
    pub trend_confidence: f64,    // 0..=1
    pub review_growth_rate: f64,  // Fraction, 0.25 = +25%
    pub avg_daily_reviews: f64,
    pub consistency_score: f64,   // Fraction of sub-intervals with positive movement
    pub score_momentum: f64,      // Mean score_change over the window
    pub velocity_slope: f64,      // Least-squares slope of review_velocity
    pub rating_change_24h: f64,
    pub spike_date: Option<SnapshotKey>,
    pub spike_magnitude: Option<f64>, // z-score of the spike observation
}

impl MovieTrend {
    /// Classification for a movie with no snapshot history
    pub fn empty(movie_id: i64) -> Self {
        Self {
            movie_id,
            trend_status: TrendStatus::Stable,
            trend_confidence: 0.0,
            review_growth_rate: 0.0,
            avg_daily_reviews: 0.0,
            consistency_score: 0.0,
            score_momentum: 0.0,
            velocity_slope: 0.0,
            rating_change_24h: 0.0,
            spike_date: None,
            spike_magnitude: None,
        }
    }

    /// Consistently positive across every sub-interval of the window
    pub fn is_rising_star(&self) -> bool {
        self.consistency_score >= 1.0
    }

    pub fn has_suspicious_activity(&self) -> bool {
        self.spike_date.is_some()
    }
}

/// A persisted row of the trend table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredTrend {
    pub trend: MovieTrend,
    pub last_calculated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_matches_table_values() {
        for status in TrendStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_empty_trend_is_stable_without_signal() {
        let trend = MovieTrend::empty(3);
        assert_eq!(trend.trend_status, TrendStatus::Stable);
        assert_eq!(trend.trend_confidence, 0.0);
        assert!(!trend.is_rising_star());
        assert!(!trend.has_suspicious_activity());
    }
}
