use media_trends_models::{Movie, ReviewEntry, SeriesResult, SnapshotKey, StoredTrend};
use media_trends_store::StoreAccessor;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

use crate::series::build_series;
use crate::stats::ReviewSummary;

#[derive(Debug, Error, PartialEq)]
pub enum DetailError {
    #[error("Movie not found")]
    NotFound { tmdb_id: u32 },
    #[error("Movie data is unavailable")]
    Unavailable { tmdb_id: u32 },
}

/// Everything the movie detail page shows
#[derive(Debug, Clone, Serialize)]
pub struct MovieDetail {
    pub movie: Movie,
    /// Absent when never computed or when the trend relation is unavailable
    pub trend: Option<StoredTrend>,
    pub series: SeriesResult,
    pub reviews: Vec<ReviewEntry>,
    pub review_summary: ReviewSummary,
}

impl MovieDetail {
    pub fn has_trend(&self) -> bool {
        self.trend.is_some()
    }
}

#[derive(Clone)]
pub struct MovieDetailLoader {
    accessor: StoreAccessor,
}

impl MovieDetailLoader {
    pub fn new(accessor: StoreAccessor) -> Self {
        Self { accessor }
    }

    /// Assemble the detail page for a movie.
    ///
    /// A missing movie or an unreadable movies relation is an error.
    /// Unavailable reviews, trends or snapshots degrade to empty sections.
    pub async fn load(&self, tmdb_id: u32) -> Result<MovieDetail, DetailError> {
        let movie = self
            .accessor
            .movie(tmdb_id)
            .await
            .ok_or(DetailError::Unavailable { tmdb_id })?
            .ok_or(DetailError::NotFound { tmdb_id })?;

        let (reviews, trend, snapshots) = tokio::join!(
            self.accessor.reviews(&movie.title),
            self.accessor.trend(movie.id),
            self.accessor.snapshots(movie.id),
        );
        let reviews = reviews.unwrap_or_default();
        let snapshots = snapshots.unwrap_or_default();

        let anomaly_keys: HashSet<SnapshotKey> = trend
            .as_ref()
            .and_then(|t| t.trend.spike_date)
            .into_iter()
            .collect();
        let series = build_series(&snapshots, &anomaly_keys);
        let review_summary = ReviewSummary::from_reviews(&reviews);

        debug!(
            movie_id = movie.id,
            reviews = reviews.len(),
            snapshots = snapshots.len(),
            has_trend = trend.is_some(),
            "Loaded detail sections"
        );
        info!(operation = "movie_detail", tmdb_id = tmdb_id, "Built movie detail");

        Ok(MovieDetail {
            movie,
            trend,
            series,
            reviews,
            review_summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use media_trends_models::{
        MovieTrend, Review, ReviewSnapshot, ReviewVerdict, Reviewer, TrendStatus,
    };
    use media_trends_store::{MemoryStore, Relation};
    use std::sync::Arc;

    fn movie() -> Movie {
        serde_json::from_str(r#"{"id": 7, "tmdb_id": 700, "title": "Night Train"}"#).unwrap()
    }

    fn review(id: i64, rating: &str) -> Review {
        Review {
            id,
            reviewer_id: 1,
            movie_title: "Night Train".to_string(),
            rating: ReviewVerdict::from(rating.to_string()),
            content: "...".to_string(),
            review_date: None,
            source_url: None,
        }
    }

    fn store() -> MemoryStore {
        let spike_date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let mut trend = MovieTrend::empty(7);
        trend.trend_status = TrendStatus::TrendingUp;
        trend.spike_date = Some(SnapshotKey::On(spike_date));

        MemoryStore::new()
            .with_movies([movie()])
            .with_reviewers([Reviewer {
                id: 1,
                name: "A. Critic".to_string(),
                source: "RottenTomatoes".to_string(),
                region: None,
                language: None,
                external_url: None,
            }])
            .with_reviews([review(1, "Fresh"), review(2, "Rotten"), review(3, "Fresh")])
            .with_review_snapshots([
                ReviewSnapshot::new(7, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
                ReviewSnapshot::new(7, spike_date),
            ])
            .with_trend(StoredTrend {
                trend,
                last_calculated_at: Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap(),
            })
    }

    #[tokio::test]
    async fn test_detail_assembles_sections() {
        let loader = MovieDetailLoader::new(StoreAccessor::new(Arc::new(store())));
        let detail = loader.load(700).await.unwrap();

        assert_eq!(detail.movie.title, "Night Train");
        assert!(detail.has_trend());
        assert_eq!(detail.reviews.len(), 3);
        assert_eq!(detail.reviews[0].reviewer_name.as_deref(), Some("A. Critic"));
        assert_eq!(detail.review_summary.count, 3);

        let series = detail.series.series().unwrap();
        let flags: Vec<bool> = series.points.iter().map(|p| p.anomalous).collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[tokio::test]
    async fn test_unknown_movie_is_not_found() {
        let loader = MovieDetailLoader::new(StoreAccessor::new(Arc::new(store())));
        let err = loader.load(1).await.unwrap_err();
        assert_eq!(err, DetailError::NotFound { tmdb_id: 1 });
        assert_eq!(err.to_string(), "Movie not found");
    }

    #[tokio::test]
    async fn test_unreadable_movies_is_not_reported_as_missing() {
        let store = Arc::new(store());
        store.set_unavailable(Relation::Movies, true).await;
        let loader = MovieDetailLoader::new(StoreAccessor::new(store.clone()));

        let err = loader.load(700).await.unwrap_err();
        assert_eq!(err, DetailError::Unavailable { tmdb_id: 700 });

        store.set_unavailable(Relation::Movies, false).await;
        assert!(loader.load(700).await.is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_sections_degrade() {
        let store = Arc::new(store());
        store.set_unavailable(Relation::MovieTrends, true).await;
        store.set_unavailable(Relation::Reviews, true).await;
        store.set_unavailable(Relation::ReviewSnapshots, true).await;
        let loader = MovieDetailLoader::new(StoreAccessor::new(store.clone()));

        let detail = loader.load(700).await.unwrap();
        assert!(!detail.has_trend());
        assert!(detail.reviews.is_empty());
        assert_eq!(detail.review_summary.fresh_score, 0.0);
        assert_eq!(detail.series, SeriesResult::NoTrendData);
    }
}
