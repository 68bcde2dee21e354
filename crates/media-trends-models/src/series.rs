use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::SnapshotKey;

/// Observation spacing of a series, detected from the data
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Hourly,
    Daily,
}

impl Cadence {
    /// chrono format string for time-axis labels
    pub fn label_format(&self) -> &'static str {
        match self {
            Cadence::Hourly => "%b %-d %H:%M",
            Cadence::Daily => "%b %-d",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub key: SnapshotKey,
    pub time: DateTime<Utc>,
    pub total_reviews: i64,
    pub new_reviews: i64,
    pub critic_score: f64,
    pub audience_score: f64,
    pub review_velocity: f64,
    pub score_change: f64,
    pub anomalous: bool,
}

impl ChartPoint {
    pub fn label(&self, cadence: Cadence) -> String {
        self.time.format(cadence.label_format()).to_string()
    }
}

/// Time-ordered, chart-ready series for one movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    pub cadence: Cadence,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn anomalies(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter().filter(|p| p.anomalous)
    }
}

/// Outcome of building a series: an explicit "no data" state instead of an empty chart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SeriesResult {
    NoTrendData,
    Ready(ChartSeries),
}

impl SeriesResult {
    pub fn series(&self) -> Option<&ChartSeries> {
        match self {
            SeriesResult::Ready(series) => Some(series),
            SeriesResult::NoTrendData => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_label_formats() {
        let time = Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap();
        let point = ChartPoint {
            key: SnapshotKey::At(time),
            time,
            total_reviews: 0,
            new_reviews: 0,
            critic_score: 0.0,
            audience_score: 0.0,
            review_velocity: 0.0,
            score_change: 0.0,
            anomalous: false,
        };
        assert_eq!(point.label(Cadence::Hourly), "Jan 5 09:30");
        assert_eq!(point.label(Cadence::Daily), "Jan 5");
    }

    #[test]
    fn test_no_data_serializes_with_state_tag() {
        let json = serde_json::to_string(&SeriesResult::NoTrendData).unwrap();
        assert_eq!(json, r#"{"state":"no_trend_data"}"#);
        assert!(SeriesResult::NoTrendData.series().is_none());
    }
}
