use media_trends_models::{Cadence, ChartPoint, ChartSeries, ReviewSnapshot, SeriesResult, SnapshotKey};
use std::collections::HashSet;

/// Hourly when some calendar date holds more than one row
pub fn detect_cadence(rows: &[ReviewSnapshot]) -> Cadence {
    let dates: HashSet<_> = rows.iter().map(|r| r.snapshot_date).collect();
    if rows.len() > dates.len() {
        Cadence::Hourly
    } else {
        Cadence::Daily
    }
}

/// Normalize snapshot rows into a time-ordered chart series.
///
/// A point is anomalous exactly when its key is in `anomaly_keys`.
pub fn build_series(rows: &[ReviewSnapshot], anomaly_keys: &HashSet<SnapshotKey>) -> SeriesResult {
    if rows.is_empty() {
        return SeriesResult::NoTrendData;
    }

    let mut ordered: Vec<&ReviewSnapshot> = rows.iter().collect();
    ordered.sort_by_key(|r| r.observed_at());

    let points = ordered
        .into_iter()
        .map(|row| {
            let key = row.key();
            ChartPoint {
                key,
                time: row.observed_at(),
                total_reviews: row.total_reviews,
                new_reviews: row.new_reviews_today,
                critic_score: finite(row.critic_score),
                audience_score: finite(row.audience_score),
                review_velocity: finite(row.review_velocity),
                score_change: finite(row.score_change),
                anomalous: anomaly_keys.contains(&key),
            }
        })
        .collect();

    SeriesResult::Ready(ChartSeries {
        cadence: detect_cadence(rows),
        points,
    })
}

/// Non-finite values read as 0
pub(crate) fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
