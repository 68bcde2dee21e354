//! Row selection shared by the store implementations.

use chrono::{DateTime, Utc};
use media_trends_models::{RatingSnapshot, RatingSource, RatingType, ReviewSnapshot};

/// Most recent snapshot of a series strictly older than `before`.
///
/// Equal timestamps resolve to the last matching row in iteration order.
pub fn latest_before<'a, I>(
    rows: I,
    movie_id: i64,
    source: RatingSource,
    rating_type: RatingType,
    before: DateTime<Utc>,
) -> Option<&'a RatingSnapshot>
where
    I: IntoIterator<Item = &'a RatingSnapshot>,
{
    rows.into_iter()
        .filter(|s| s.is_series(movie_id, source, rating_type) && s.snapshot_time < before)
        .max_by_key(|s| s.snapshot_time)
}

/// Sort review snapshots ascending by observation time; equal times keep input order
pub fn sort_snapshots(rows: &mut [ReviewSnapshot]) {
    rows.sort_by_key(|s| s.observed_at());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn snapshot(source: RatingSource, value: f64, time: DateTime<Utc>) -> RatingSnapshot {
        RatingSnapshot {
            movie_id: 1,
            source,
            rating_type: RatingType::Tomatometer,
            rating_value: value,
            review_count: 0,
            snapshot_time: time,
        }
    }

    #[test]
    fn test_latest_before_is_strict_and_series_scoped() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        let cutoff = now - Duration::hours(24);
        let rows = vec![
            snapshot(RatingSource::RottenTomatoes, 60.0, now - Duration::hours(48)),
            snapshot(RatingSource::RottenTomatoes, 70.0, now - Duration::hours(30)),
            snapshot(RatingSource::RottenTomatoes, 71.0, cutoff),
            snapshot(RatingSource::Imdb, 80.0, now - Duration::hours(25)),
        ];

        let found = latest_before(&rows, 1, RatingSource::RottenTomatoes, RatingType::Tomatometer, cutoff).unwrap();
        assert_eq!(found.rating_value, 70.0);

        assert!(latest_before(&rows, 2, RatingSource::RottenTomatoes, RatingType::Tomatometer, cutoff).is_none());
        assert!(latest_before(&rows, 1, RatingSource::RottenTomatoes, RatingType::Audience, cutoff).is_none());
    }

    #[test]
    fn test_latest_before_tie_takes_last_row() {
        let time = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let rows = vec![
            snapshot(RatingSource::RottenTomatoes, 70.0, time),
            snapshot(RatingSource::RottenTomatoes, 72.0, time),
        ];
        let found = latest_before(
            &rows,
            1,
            RatingSource::RottenTomatoes,
            RatingType::Tomatometer,
            time + Duration::seconds(1),
        )
        .unwrap();
        assert_eq!(found.rating_value, 72.0);
    }
}
