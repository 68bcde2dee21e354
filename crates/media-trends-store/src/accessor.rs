//! Failure-recovering front of a [`SnapshotStore`].
//!
//! Dashboard pages must render even when the database is down or a relation
//! has not been created yet. Every lookup here turns a store error into
//! `None` and logs it, so callers can tell "no rows" (`Some(vec![])`) apart
//! from "could not ask" (`None`).

use chrono::{DateTime, Utc};
use media_trends_models::{
    Movie, RatingSnapshot, RatingSource, RatingType, ReviewEntry, ReviewSnapshot, StoredTrend,
};
use std::sync::Arc;
use tracing::warn;

use crate::error::StoreResult;
use crate::traits::SnapshotStore;

#[derive(Clone)]
pub struct StoreAccessor {
    store: Arc<dyn SnapshotStore>,
}

impl StoreAccessor {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    pub fn store_name(&self) -> &str {
        self.store.store_name()
    }

    fn recover<T>(&self, operation: &'static str, result: StoreResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    operation = operation,
                    store = self.store.store_name(),
                    error = %e,
                    "Store lookup failed, treating as unavailable"
                );
                None
            }
        }
    }

    pub async fn snapshots(&self, movie_id: i64) -> Option<Vec<ReviewSnapshot>> {
        let result = self.store.fetch_snapshots(movie_id).await;
        self.recover("fetch_snapshots", result)
    }

    /// Persisted trend; `None` both when absent and when the relation is unavailable
    pub async fn trend(&self, movie_id: i64) -> Option<StoredTrend> {
        let result = self.store.fetch_trend(movie_id).await;
        self.recover("fetch_trend", result).flatten()
    }

    /// Baseline lookup for the delta calculator.
    ///
    /// The outer `Option` is availability, the inner one whether a snapshot
    /// old enough exists.
    pub async fn rating_baseline(
        &self,
        movie_id: i64,
        source: RatingSource,
        rating_type: RatingType,
        before: DateTime<Utc>,
    ) -> Option<Option<RatingSnapshot>> {
        let result = self
            .store
            .fetch_rating_snapshot(movie_id, source, rating_type, before)
            .await;
        self.recover("fetch_rating_snapshot", result)
    }

    pub async fn rating_snapshots(
        &self,
        rating_type: RatingType,
        since: DateTime<Utc>,
    ) -> Option<Vec<RatingSnapshot>> {
        let result = self.store.fetch_rating_snapshots(rating_type, since).await;
        self.recover("fetch_rating_snapshots", result)
    }

    pub async fn movie(&self, tmdb_id: u32) -> Option<Option<Movie>> {
        let result = self.store.fetch_movie(tmdb_id).await;
        self.recover("fetch_movie", result)
    }

    pub async fn movies(&self) -> Option<Vec<Movie>> {
        let result = self.store.fetch_movies().await;
        self.recover("fetch_movies", result)
    }

    pub async fn reviews(&self, movie_title: &str) -> Option<Vec<ReviewEntry>> {
        let result = self.store.fetch_reviews(movie_title).await;
        self.recover("fetch_reviews", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::traits::Relation;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_unavailable_is_none_and_empty_is_some() {
        let store = Arc::new(MemoryStore::new());
        let accessor = StoreAccessor::new(store.clone());

        assert_eq!(accessor.snapshots(1).await, Some(Vec::new()));

        store.set_unavailable(Relation::ReviewSnapshots, true).await;
        assert_eq!(accessor.snapshots(1).await, None);
    }

    #[tokio::test]
    async fn test_rating_baseline_distinguishes_missing_row() {
        let store = Arc::new(MemoryStore::new());
        let accessor = StoreAccessor::new(store.clone());
        let before = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();

        let found = accessor
            .rating_baseline(1, RatingSource::Imdb, RatingType::ImdbScore, before)
            .await;
        assert_eq!(found, Some(None));

        store.set_unavailable(Relation::RatingSnapshots, true).await;
        let found = accessor
            .rating_baseline(1, RatingSource::Imdb, RatingType::ImdbScore, before)
            .await;
        assert_eq!(found, None);
    }
}
