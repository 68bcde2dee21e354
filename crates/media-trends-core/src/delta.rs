use chrono::{DateTime, Duration, Utc};
use media_trends_models::{RatingDelta, RatingSnapshot, RatingSource, RatingType};
use media_trends_store::{query, StoreAccessor};
use tracing::debug;

/// Age a baseline snapshot must exceed
pub fn baseline_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(24)
}

/// Start of a trailing window of `days` ending at `end`.
///
/// `None` when the window reaches past the representable range, which callers
/// treat as unbounded.
pub(crate) fn window_start(end: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|span| end.checked_sub_signed(span))
}

/// Delta of `current` against the series value from more than 24 hours ago.
///
/// `history` may hold any rows; only the (movie, source, rating_type) series
/// is considered. Without a snapshot older than the cutoff the delta has no
/// baseline and a change of 0.
pub fn rating_delta(
    current: f64,
    history: &[RatingSnapshot],
    movie_id: i64,
    source: RatingSource,
    rating_type: RatingType,
    now: DateTime<Utc>,
) -> RatingDelta {
    let baseline = query::latest_before(history, movie_id, source, rating_type, baseline_cutoff(now))
        .map(|s| s.rating_value);
    RatingDelta::new(current, baseline)
}

/// Store-backed delta lookups
#[derive(Clone)]
pub struct DeltaCalculator {
    accessor: StoreAccessor,
}

impl DeltaCalculator {
    pub fn new(accessor: StoreAccessor) -> Self {
        Self { accessor }
    }

    /// Delta of the headline (tomatometer) rating
    pub async fn headline_delta(
        &self,
        movie_id: i64,
        source: RatingSource,
        current: f64,
        now: DateTime<Utc>,
    ) -> RatingDelta {
        self.delta(movie_id, source, RatingType::HEADLINE, current, now)
            .await
    }

    /// An unavailable store yields the same "no baseline" delta as a missing row
    pub async fn delta(
        &self,
        movie_id: i64,
        source: RatingSource,
        rating_type: RatingType,
        current: f64,
        now: DateTime<Utc>,
    ) -> RatingDelta {
        let baseline = self
            .accessor
            .rating_baseline(movie_id, source, rating_type, baseline_cutoff(now))
            .await
            .flatten()
            .map(|s| s.rating_value);

        let delta = RatingDelta::new(current, baseline);
        debug!(
            movie_id = movie_id,
            source = %source,
            rating_type = %rating_type,
            change = delta.change,
            has_baseline = delta.has_baseline(),
            "Computed rating delta"
        );
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use media_trends_models::Direction;
    use media_trends_store::{MemoryStore, Relation};
    use std::sync::Arc;

    fn snapshot(value: f64, time: DateTime<Utc>) -> RatingSnapshot {
        RatingSnapshot {
            movie_id: 1,
            source: RatingSource::RottenTomatoes,
            rating_type: RatingType::Tomatometer,
            rating_value: value,
            review_count: 10,
            snapshot_time: time,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_baseline_is_latest_snapshot_older_than_24h() {
        let history = vec![
            snapshot(70.0, now() - Duration::hours(30)),
            snapshot(72.0, now() - Duration::hours(10)),
        ];
        let delta = rating_delta(
            75.0,
            &history,
            1,
            RatingSource::RottenTomatoes,
            RatingType::Tomatometer,
            now(),
        );
        assert_eq!(delta.baseline, Some(70.0));
        assert_eq!(delta.change, 5.0);
        assert_eq!(delta.direction(), Direction::Up);
    }

    #[test]
    fn test_no_old_snapshot_means_no_baseline() {
        let history = vec![snapshot(72.0, now() - Duration::hours(10))];
        let delta = rating_delta(
            75.0,
            &history,
            1,
            RatingSource::RottenTomatoes,
            RatingType::Tomatometer,
            now(),
        );
        assert_eq!(delta, RatingDelta::new(75.0, None));

        let flat = rating_delta(
            75.0,
            &[snapshot(75.0, now() - Duration::hours(48))],
            1,
            RatingSource::RottenTomatoes,
            RatingType::Tomatometer,
            now(),
        );
        assert_eq!(flat.change, 0.0);
        assert!(flat.has_baseline());
        assert_ne!(flat, delta);
    }

    #[test]
    fn test_snapshot_exactly_at_cutoff_is_not_a_baseline() {
        let history = vec![snapshot(70.0, baseline_cutoff(now()))];
        let delta = rating_delta(
            75.0,
            &history,
            1,
            RatingSource::RottenTomatoes,
            RatingType::Tomatometer,
            now(),
        );
        assert!(!delta.has_baseline());
    }

    #[tokio::test]
    async fn test_calculator_reads_store() {
        let store = Arc::new(MemoryStore::new().with_rating_snapshots([
            snapshot(70.0, now() - Duration::hours(30)),
            snapshot(72.0, now() - Duration::hours(10)),
        ]));
        let calculator = DeltaCalculator::new(StoreAccessor::new(store.clone()));

        let delta = calculator
            .headline_delta(1, RatingSource::RottenTomatoes, 75.0, now())
            .await;
        assert_eq!(delta.change, 5.0);

        let other_source = calculator
            .headline_delta(1, RatingSource::Metacritic, 75.0, now())
            .await;
        assert!(!other_source.has_baseline());

        store.set_unavailable(Relation::RatingSnapshots, true).await;
        let offline = calculator
            .headline_delta(1, RatingSource::RottenTomatoes, 75.0, now())
            .await;
        assert_eq!(offline, RatingDelta::new(75.0, None));
    }
}
