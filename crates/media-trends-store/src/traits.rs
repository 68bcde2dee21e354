use async_trait::async_trait;
use chrono::{DateTime, Utc};
use media_trends_models::{
    Movie, RatingSnapshot, RatingSource, RatingType, ReviewEntry, ReviewSnapshot, StoredTrend,
};

use crate::error::StoreResult;

/// Tables the dashboard reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Movies,
    Reviewers,
    Reviews,
    RatingSnapshots,
    ReviewSnapshots,
    MovieTrends,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Movies => "movies",
            Relation::Reviewers => "reviewers",
            Relation::Reviews => "reviews",
            Relation::RatingSnapshots => "rating_snapshots",
            Relation::ReviewSnapshots => "daily_review_snapshots",
            Relation::MovieTrends => "movie_trends",
        }
    }

    /// File holding the relation inside a data directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Relation::Movies => "movies.json",
            Relation::Reviewers => "reviewers.json",
            Relation::Reviews => "reviews.json",
            Relation::RatingSnapshots => "rating_snapshots.csv",
            Relation::ReviewSnapshots => "review_snapshots.csv",
            Relation::MovieTrends => "movie_trends.bin",
        }
    }
}

/// Read side of the relational store.
///
/// Implementations return typed rows; numeric coercion happens while the
/// rows are materialized, never in the consumers. Errors are surfaced as-is
/// and recovered by [`crate::StoreAccessor`].
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    fn store_name(&self) -> &str;

    async fn fetch_movie(&self, tmdb_id: u32) -> StoreResult<Option<Movie>>;

    async fn fetch_movies(&self) -> StoreResult<Vec<Movie>>;

    /// Reviews for a title joined with their reviewers
    async fn fetch_reviews(&self, movie_title: &str) -> StoreResult<Vec<ReviewEntry>>;

    /// Review snapshots for a movie, ascending by observation time
    async fn fetch_snapshots(&self, movie_id: i64) -> StoreResult<Vec<ReviewSnapshot>>;

    async fn fetch_trend(&self, movie_id: i64) -> StoreResult<Option<StoredTrend>>;

    /// Most recent snapshot of the series taken strictly before `before`
    async fn fetch_rating_snapshot(
        &self,
        movie_id: i64,
        source: RatingSource,
        rating_type: RatingType,
        before: DateTime<Utc>,
    ) -> StoreResult<Option<RatingSnapshot>>;

    /// All snapshots of a rating type taken at or after `since`
    async fn fetch_rating_snapshots(
        &self,
        rating_type: RatingType,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<RatingSnapshot>>;
}

/// Write side used by the trend recompute job
#[async_trait]
pub trait TrendWriter: Send + Sync {
    /// Insert or replace the trend row for `trend.trend.movie_id`
    async fn store_trend(&self, trend: StoredTrend) -> StoreResult<()>;
}
