use async_trait::async_trait;
use chrono::{DateTime, Utc};
use media_trends_models::{
    Movie, RatingSnapshot, RatingSource, RatingType, Review, ReviewEntry, ReviewSnapshot, Reviewer,
    StoredTrend,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::parse;
use crate::query;
use crate::traits::{Relation, SnapshotStore, TrendWriter};
use crate::trend_storage::TrendStorage;

/// Store over a data directory of relation exports.
///
/// Relations are re-read on every lookup so a refreshed export is picked up
/// without restarting. The trend table lives under `trends/`.
pub struct DirectoryStore {
    data_dir: PathBuf,
    trends: TrendStorage,
}

impl DirectoryStore {
    pub fn new(data_dir: &Path, trends_dir: &Path) -> Self {
        info!(
            operation = "open_store",
            data_dir = %data_dir.display(),
            "Opening directory store"
        );
        Self {
            data_dir: data_dir.to_path_buf(),
            trends: TrendStorage::new(trends_dir),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn relation_path(&self, relation: Relation) -> PathBuf {
        self.data_dir.join(relation.file_name())
    }

    async fn read_relation(&self, relation: Relation) -> StoreResult<Vec<u8>> {
        let path = self.relation_path(relation);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(relation = relation.as_str(), path = %path.display(), "Relation file missing");
                Err(StoreError::MissingRelation(relation.as_str()))
            }
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    async fn load_json<T: DeserializeOwned>(&self, relation: Relation) -> StoreResult<Vec<T>> {
        let bytes = self.read_relation(relation).await?;
        let rows: Vec<T> = serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            relation: relation.as_str(),
            source,
        })?;
        debug!(relation = relation.as_str(), rows = rows.len(), "Loaded relation");
        Ok(rows)
    }

    async fn load_review_snapshots(&self) -> StoreResult<Vec<ReviewSnapshot>> {
        let bytes = self.read_relation(Relation::ReviewSnapshots).await?;
        parse::read_review_snapshots(bytes.as_slice())
    }

    async fn load_rating_snapshots(&self) -> StoreResult<Vec<RatingSnapshot>> {
        let bytes = self.read_relation(Relation::RatingSnapshots).await?;
        parse::read_rating_snapshots(bytes.as_slice())
    }

    /// Run a trend-table operation on the blocking pool.
    async fn with_trends<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&TrendStorage) -> StoreResult<T> + Send + 'static,
    {
        let storage = self.trends.clone();
        tokio::task::spawn_blocking(move || f(&storage))
            .await
            .map_err(|e| StoreError::Unavailable(format!("trend table task failed: {}", e)))?
    }

    /// Remove the persisted trend table. Returns whether a table existed.
    pub fn clear_trends(&self) -> StoreResult<bool> {
        self.trends.clear()
    }

    pub fn trends_size(&self) -> StoreResult<u64> {
        self.trends.size()
    }
}

#[async_trait]
impl SnapshotStore for DirectoryStore {
    fn store_name(&self) -> &str {
        "directory"
    }

    async fn fetch_movie(&self, tmdb_id: u32) -> StoreResult<Option<Movie>> {
        let movies: Vec<Movie> = self.load_json(Relation::Movies).await?;
        Ok(movies.into_iter().find(|m| m.tmdb_id == tmdb_id))
    }

    async fn fetch_movies(&self) -> StoreResult<Vec<Movie>> {
        self.load_json(Relation::Movies).await
    }

    async fn fetch_reviews(&self, movie_title: &str) -> StoreResult<Vec<ReviewEntry>> {
        let reviews: Vec<Review> = self.load_json(Relation::Reviews).await?;
        let reviewers: Vec<Reviewer> = self.load_json(Relation::Reviewers).await?;
        let by_id: HashMap<i64, &Reviewer> = reviewers.iter().map(|r| (r.id, r)).collect();

        Ok(reviews
            .into_iter()
            .filter(|r| r.movie_title == movie_title)
            .map(|review| {
                let reviewer = by_id.get(&review.reviewer_id);
                ReviewEntry {
                    reviewer_name: reviewer.map(|r| r.name.clone()),
                    reviewer_source: reviewer.map(|r| r.source.clone()),
                    review,
                }
            })
            .collect())
    }

    async fn fetch_snapshots(&self, movie_id: i64) -> StoreResult<Vec<ReviewSnapshot>> {
        let mut rows: Vec<ReviewSnapshot> = self
            .load_review_snapshots()
            .await?
            .into_iter()
            .filter(|s| s.movie_id == movie_id)
            .collect();
        query::sort_snapshots(&mut rows);
        Ok(rows)
    }

    async fn fetch_trend(&self, movie_id: i64) -> StoreResult<Option<StoredTrend>> {
        let rows = self.with_trends(|storage| storage.load()).await?;
        Ok(rows.into_iter().find(|r| r.trend.movie_id == movie_id))
    }

    async fn fetch_rating_snapshot(
        &self,
        movie_id: i64,
        source: RatingSource,
        rating_type: RatingType,
        before: DateTime<Utc>,
    ) -> StoreResult<Option<RatingSnapshot>> {
        let rows = self.load_rating_snapshots().await?;
        Ok(query::latest_before(&rows, movie_id, source, rating_type, before).cloned())
    }

    async fn fetch_rating_snapshots(
        &self,
        rating_type: RatingType,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<RatingSnapshot>> {
        let mut rows: Vec<RatingSnapshot> = self
            .load_rating_snapshots()
            .await?
            .into_iter()
            .filter(|s| s.rating_type == rating_type && s.snapshot_time >= since)
            .collect();
        rows.sort_by_key(|s| s.snapshot_time);
        Ok(rows)
    }
}

#[async_trait]
impl TrendWriter for DirectoryStore {
    async fn store_trend(&self, trend: StoredTrend) -> StoreResult<()> {
        let movie_id = trend.trend.movie_id;
        self.with_trends(move |storage| storage.upsert(trend)).await?;
        debug!(operation = "store_trend", movie_id = movie_id, "Persisted trend row");
        Ok(())
    }
}
