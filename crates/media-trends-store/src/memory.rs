use async_trait::async_trait;
use chrono::{DateTime, Utc};
use media_trends_models::{
    Movie, RatingSnapshot, RatingSource, RatingType, Review, ReviewEntry, ReviewSnapshot, Reviewer,
    StoredTrend,
};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::query;
use crate::traits::{Relation, SnapshotStore, TrendWriter};

#[derive(Default)]
struct Tables {
    movies: Vec<Movie>,
    reviewers: Vec<Reviewer>,
    reviews: Vec<Review>,
    rating_snapshots: Vec<RatingSnapshot>,
    review_snapshots: Vec<ReviewSnapshot>,
    trends: BTreeMap<i64, StoredTrend>,
    unavailable: HashSet<Relation>,
}

impl Tables {
    fn check(&self, relation: Relation) -> StoreResult<()> {
        if self.unavailable.contains(&relation) {
            Err(StoreError::Unavailable(format!("{} is offline", relation.as_str())))
        } else {
            Ok(())
        }
    }
}

/// In-process store, used by tests and for seeding demo data.
///
/// A relation can be taken offline with [`MemoryStore::set_unavailable`],
/// after which every lookup touching it fails like an unreachable database.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movies(mut self, movies: impl IntoIterator<Item = Movie>) -> Self {
        self.tables.get_mut().movies.extend(movies);
        self
    }

    pub fn with_reviewers(mut self, reviewers: impl IntoIterator<Item = Reviewer>) -> Self {
        self.tables.get_mut().reviewers.extend(reviewers);
        self
    }

    pub fn with_reviews(mut self, reviews: impl IntoIterator<Item = Review>) -> Self {
        self.tables.get_mut().reviews.extend(reviews);
        self
    }

    pub fn with_rating_snapshots(mut self, rows: impl IntoIterator<Item = RatingSnapshot>) -> Self {
        self.tables.get_mut().rating_snapshots.extend(rows);
        self
    }

    pub fn with_review_snapshots(mut self, rows: impl IntoIterator<Item = ReviewSnapshot>) -> Self {
        self.tables.get_mut().review_snapshots.extend(rows);
        self
    }

    pub fn with_trend(mut self, trend: StoredTrend) -> Self {
        self.tables.get_mut().trends.insert(trend.trend.movie_id, trend);
        self
    }

    pub async fn insert_review_snapshot(&self, row: ReviewSnapshot) {
        self.tables.write().await.review_snapshots.push(row);
    }

    pub async fn insert_rating_snapshot(&self, row: RatingSnapshot) {
        self.tables.write().await.rating_snapshots.push(row);
    }

    pub async fn set_unavailable(&self, relation: Relation, unavailable: bool) {
        let mut tables = self.tables.write().await;
        if unavailable {
            tables.unavailable.insert(relation);
        } else {
            tables.unavailable.remove(&relation);
        }
    }

    /// Persisted trend rows, ordered by movie id
    pub async fn trends(&self) -> Vec<StoredTrend> {
        self.tables.read().await.trends.values().cloned().collect()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    fn store_name(&self) -> &str {
        "memory"
    }

    async fn fetch_movie(&self, tmdb_id: u32) -> StoreResult<Option<Movie>> {
        let tables = self.tables.read().await;
        tables.check(Relation::Movies)?;
        Ok(tables.movies.iter().find(|m| m.tmdb_id == tmdb_id).cloned())
    }

    async fn fetch_movies(&self) -> StoreResult<Vec<Movie>> {
        let tables = self.tables.read().await;
        tables.check(Relation::Movies)?;
        Ok(tables.movies.clone())
    }

    async fn fetch_reviews(&self, movie_title: &str) -> StoreResult<Vec<ReviewEntry>> {
        let tables = self.tables.read().await;
        tables.check(Relation::Reviews)?;
        tables.check(Relation::Reviewers)?;
        Ok(tables
            .reviews
            .iter()
            .filter(|r| r.movie_title == movie_title)
            .map(|review| {
                let reviewer = tables.reviewers.iter().find(|r| r.id == review.reviewer_id);
                ReviewEntry {
                    review: review.clone(),
                    reviewer_name: reviewer.map(|r| r.name.clone()),
                    reviewer_source: reviewer.map(|r| r.source.clone()),
                }
            })
            .collect())
    }

    async fn fetch_snapshots(&self, movie_id: i64) -> StoreResult<Vec<ReviewSnapshot>> {
        let tables = self.tables.read().await;
        tables.check(Relation::ReviewSnapshots)?;
        let mut rows: Vec<ReviewSnapshot> = tables
            .review_snapshots
            .iter()
            .filter(|s| s.movie_id == movie_id)
            .cloned()
            .collect();
        query::sort_snapshots(&mut rows);
        Ok(rows)
    }

    async fn fetch_trend(&self, movie_id: i64) -> StoreResult<Option<StoredTrend>> {
        let tables = self.tables.read().await;
        tables.check(Relation::MovieTrends)?;
        Ok(tables.trends.get(&movie_id).cloned())
    }

    async fn fetch_rating_snapshot(
        &self,
        movie_id: i64,
        source: RatingSource,
        rating_type: RatingType,
        before: DateTime<Utc>,
    ) -> StoreResult<Option<RatingSnapshot>> {
        let tables = self.tables.read().await;
        tables.check(Relation::RatingSnapshots)?;
        Ok(query::latest_before(&tables.rating_snapshots, movie_id, source, rating_type, before).cloned())
    }

    async fn fetch_rating_snapshots(
        &self,
        rating_type: RatingType,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<RatingSnapshot>> {
        let tables = self.tables.read().await;
        tables.check(Relation::RatingSnapshots)?;
        let mut rows: Vec<RatingSnapshot> = tables
            .rating_snapshots
            .iter()
            .filter(|s| s.rating_type == rating_type && s.snapshot_time >= since)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.snapshot_time);
        Ok(rows)
    }
}

#[async_trait]
impl TrendWriter for MemoryStore {
    async fn store_trend(&self, trend: StoredTrend) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.check(Relation::MovieTrends)?;
        tables.trends.insert(trend.trend.movie_id, trend);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use media_trends_models::MovieTrend;

    #[tokio::test]
    async fn test_offline_relation_fails_lookups() {
        let time = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let store = MemoryStore::new().with_review_snapshots([ReviewSnapshot::at(1, time)]);

        assert_eq!(store.fetch_snapshots(1).await.unwrap().len(), 1);

        store.set_unavailable(Relation::ReviewSnapshots, true).await;
        assert!(matches!(
            store.fetch_snapshots(1).await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_unavailable(Relation::ReviewSnapshots, false).await;
        assert!(store.fetch_snapshots(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_snapshots_come_back_sorted() {
        let early = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 1, 1, 6, 0, 0).unwrap();
        let store = MemoryStore::new();
        store.insert_review_snapshot(ReviewSnapshot::at(1, late)).await;
        store.insert_review_snapshot(ReviewSnapshot::at(1, early)).await;
        store.insert_review_snapshot(ReviewSnapshot::at(2, early)).await;

        let rows = store.fetch_snapshots(1).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].snapshot_time, Some(early));
    }

    #[tokio::test]
    async fn test_store_trend_replaces_row() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        for confidence in [0.2, 0.9] {
            let mut trend = MovieTrend::empty(4);
            trend.trend_confidence = confidence;
            store
                .store_trend(StoredTrend { trend, last_calculated_at: at })
                .await
                .unwrap();
        }

        let rows = store.trends().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trend.trend_confidence, 0.9);
    }
}
