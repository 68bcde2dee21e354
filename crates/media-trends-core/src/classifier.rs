//! Trend classification over a movie's review snapshot history.
//!
//! Everything here is a pure function of the rows passed in: the trailing
//! window is measured back from the latest observation, never from the wall
//! clock, so classifying the same history twice yields identical output.

use chrono::{DateTime, Duration, Utc};
use media_trends_config::TrendThresholds;
use media_trends_models::{MovieTrend, RatingDelta, ReviewSnapshot, SnapshotKey, TrendStatus};
use media_trends_store::StoreAccessor;
use std::collections::HashSet;
use tracing::debug;

use crate::delta::window_start;
use crate::series::finite;


#[derive(Debug, Clone, Default)]
pub struct TrendClassifier {
    thresholds: TrendThresholds,
}

/// Window metrics before the status policy is applied
#[derive(Debug, Clone, PartialEq)]
struct WindowMetrics {
    samples: usize,
    growth_rate: f64,
    avg_daily_reviews: f64,
    consistency: f64,
    score_momentum: f64,
    velocity_slope: f64,
    rating_change_24h: f64,
    acceleration: f64,
    latest_score_change: f64,
}

impl TrendClassifier {
    pub fn new(thresholds: TrendThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &TrendThresholds {
        &self.thresholds
    }

    /// Classify a movie from its review snapshots
    pub fn classify(&self, movie_id: i64, snapshots: &[ReviewSnapshot]) -> MovieTrend {
        self.classify_with_rating_delta(movie_id, snapshots, None)
    }

    /// Classify, taking the 24h change from a rating-snapshot delta when it
    /// has a baseline instead of deriving it from the review snapshots.
    pub fn classify_with_rating_delta(
        &self,
        movie_id: i64,
        snapshots: &[ReviewSnapshot],
        rating_delta: Option<&RatingDelta>,
    ) -> MovieTrend {
        let window = self.window(snapshots);
        if window.is_empty() {
            return MovieTrend::empty(movie_id);
        }

        let mut metrics = window_metrics(&window);
        if let Some(delta) = rating_delta.filter(|d| d.has_baseline()) {
            metrics.rating_change_24h = finite(delta.change);
        }

        let trend_status = self.status(&metrics);
        let trend_confidence = self.confidence(trend_status, &metrics);
        let spike = self.spike(&window);

        debug!(
            movie_id = movie_id,
            samples = metrics.samples,
            status = %trend_status,
            confidence = trend_confidence,
            "Classified trend"
        );

        MovieTrend {
            movie_id,
            trend_status,
            trend_confidence,
            review_growth_rate: metrics.growth_rate,
            avg_daily_reviews: metrics.avg_daily_reviews,
            consistency_score: metrics.consistency,
            score_momentum: metrics.score_momentum,
            velocity_slope: metrics.velocity_slope,
            rating_change_24h: metrics.rating_change_24h,
            spike_date: spike.map(|(key, _)| key),
            spike_magnitude: spike.map(|(_, z)| z),
        }
    }

    /// Fetch the movie's snapshots and classify them.
    ///
    /// Returns `None` when the snapshot relation is unavailable, which is not
    /// the same as a computed stable trend.
    pub async fn classify_stored(&self, accessor: &StoreAccessor, movie_id: i64) -> Option<MovieTrend> {
        let snapshots = accessor.snapshots(movie_id).await?;
        Some(self.classify(movie_id, &snapshots))
    }

    /// Rows within `window_days` of the latest observation, ascending
    fn window<'a>(&self, snapshots: &'a [ReviewSnapshot]) -> Vec<&'a ReviewSnapshot> {
        let mut rows: Vec<&ReviewSnapshot> = snapshots.iter().collect();
        rows.sort_by_key(|s| s.observed_at());
        let Some(latest) = rows.last().map(|s| s.observed_at()) else {
            return rows;
        };
        if let Some(start) = window_start(latest, self.thresholds.window_days) {
            rows.retain(|s| s.observed_at() >= start);
        }
        rows
    }

    fn status(&self, m: &WindowMetrics) -> TrendStatus {
        let t = &self.thresholds;
        if m.rating_change_24h > 0.0 && m.consistency >= t.trending_up_min_consistency {
            TrendStatus::TrendingUp
        } else if m.rating_change_24h < 0.0 && m.rating_change_24h.abs() >= t.trending_down_min_drop {
            TrendStatus::TrendingDown
        } else if m.samples >= t.sleeper_min_snapshots
            && m.avg_daily_reviews <= t.sleeper_max_avg_daily_reviews
            && m.latest_score_change > 0.0
            && m.acceleration > 0.0
        {
            TrendStatus::SleeperHit
        } else {
            TrendStatus::Stable
        }
    }

    fn confidence(&self, status: TrendStatus, m: &WindowMetrics) -> f64 {
        let t = &self.thresholds;
        let sample_factor = (m.samples as f64 / t.full_confidence_snapshots as f64).min(1.0);
        let change_strength = (m.rating_change_24h.abs() / t.rating_change_scale).min(1.0);

        let signal = match status {
            TrendStatus::TrendingUp => 0.5 * change_strength + 0.5 * m.consistency,
            TrendStatus::TrendingDown => change_strength,
            TrendStatus::SleeperHit => (m.acceleration / t.rating_change_scale).min(1.0),
            TrendStatus::Stable => 1.0 - change_strength,
        };

        finite(sample_factor * signal).clamp(0.0, 1.0)
    }

    /// Observation deviating most from the window mean, if it clears the threshold
    fn spike(&self, window: &[&ReviewSnapshot]) -> Option<(SnapshotKey, f64)> {
        let t = &self.thresholds;
        if window.len() < t.anomaly_min_snapshots.max(3) {
            return None;
        }

        let new_reviews: Vec<f64> = window.iter().map(|s| s.new_reviews_today as f64).collect();
        let score_changes: Vec<f64> = window.iter().map(|s| finite(s.score_change)).collect();
        let z_new = z_scores(&new_reviews);
        let z_score = z_scores(&score_changes);

        let mut best: Option<(usize, f64)> = None;
        for i in 0..window.len() {
            let z = z_new[i].abs().max(z_score[i].abs());
            if best.map_or(true, |(_, b)| z > b) {
                best = Some((i, z));
            }
        }

        best.filter(|&(_, z)| z >= t.anomaly_z_threshold)
            .map(|(i, z)| (window[i].key(), z))
    }
}

fn window_metrics(window: &[&ReviewSnapshot]) -> WindowMetrics {
    let n = window.len();
    let first = window[0];
    let last = window[n - 1];

    let growth_rate = if first.total_reviews > 0 {
        (last.total_reviews - first.total_reviews) as f64 / first.total_reviews as f64
    } else {
        0.0
    };

    let days: HashSet<_> = window.iter().map(|s| s.snapshot_date).collect();
    let new_reviews: i64 = window.iter().map(|s| s.new_reviews_today).sum();
    let avg_daily_reviews = new_reviews as f64 / days.len() as f64;

    let consistency = if n < 2 {
        0.0
    } else {
        let positive = window
            .windows(2)
            .filter(|pair| finite(pair[1].score_change) > 0.0 || pair[1].new_reviews_today > 0)
            .count();
        positive as f64 / (n - 1) as f64
    };

    let score_changes: Vec<f64> = window.iter().map(|s| finite(s.score_change)).collect();
    let velocities: Vec<f64> = window.iter().map(|s| finite(s.review_velocity)).collect();

    let half = n / 2;
    let acceleration = if half == 0 {
        0.0
    } else {
        mean(&score_changes[n - half..]) - mean(&score_changes[..half])
    };

    WindowMetrics {
        samples: n,
        growth_rate: finite(growth_rate),
        avg_daily_reviews: finite(avg_daily_reviews),
        consistency,
        score_momentum: mean(&score_changes),
        velocity_slope: slope(&velocities),
        rating_change_24h: change_24h(window),
        acceleration,
        latest_score_change: finite(last.score_change),
    }
}

/// Latest critic score minus the most recent one observed more than 24h earlier
fn change_24h(window: &[&ReviewSnapshot]) -> f64 {
    let Some(latest) = window.last() else {
        return 0.0;
    };
    let cutoff: DateTime<Utc> = latest.observed_at() - Duration::hours(24);
    window
        .iter()
        .filter(|s| s.observed_at() < cutoff)
        .max_by_key(|s| s.observed_at())
        .map(|baseline| finite(latest.critic_score - baseline.critic_score))
        .unwrap_or(0.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Least-squares slope against the observation index
fn slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);
    let (mut num, mut den) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    finite(num / den)
}

/// z-score of each value against the sample mean and sample standard deviation.
/// A constant series has no deviation and scores 0 everywhere.
fn z_scores(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    let sd = variance.sqrt();
    if sd == 0.0 || !sd.is_finite() {
        return vec![0.0; n];
    }
    values.iter().map(|v| (v - m) / sd).collect()
}
