//! Background recomputation of persisted trends.
//!
//! The job walks the movies released within the active window, classifies
//! each one and writes the result back through a [`TrendWriter`]. Within one
//! process a movie is never recomputed twice at the same time: overlapping
//! runs skip movies another run has already claimed. Separate processes (the
//! daemon and a manual `analyze`) may classify the same movie, but their
//! writes are serialized by the trend table lock and no row is lost.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use media_trends_config::AnalysisConfig;
use media_trends_models::{RatingSource, StoredTrend, TrendStatus};
use media_trends_store::{StoreAccessor, TrendWriter};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::classifier::TrendClassifier;
use crate::delta::DeltaCalculator;

/// Result of recomputing one movie
#[derive(Debug, Clone, PartialEq)]
pub enum MovieOutcome {
    Analyzed { movie_id: i64, status: TrendStatus },
    InFlight { movie_id: i64 },
    Unavailable { movie_id: i64 },
    Failed { movie_id: i64, error: String },
}

impl MovieOutcome {
    pub fn movie_id(&self) -> i64 {
        match self {
            MovieOutcome::Analyzed { movie_id, .. }
            | MovieOutcome::InFlight { movie_id }
            | MovieOutcome::Unavailable { movie_id }
            | MovieOutcome::Failed { movie_id, .. } => *movie_id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecomputeReport {
    pub active_movies: usize,
    pub analyzed: usize,
    pub skipped_in_flight: usize,
    pub unavailable: usize,
    pub failed: usize,
    pub by_status: BTreeMap<TrendStatus, usize>,
    pub errors: Vec<String>,
    pub duration: Duration,
}

impl RecomputeReport {
    fn record(&mut self, outcome: &MovieOutcome) {
        match outcome {
            MovieOutcome::Analyzed { status, .. } => {
                self.analyzed += 1;
                *self.by_status.entry(*status).or_insert(0) += 1;
            }
            MovieOutcome::InFlight { .. } => self.skipped_in_flight += 1,
            MovieOutcome::Unavailable { .. } => self.unavailable += 1,
            MovieOutcome::Failed { movie_id, error } => {
                self.failed += 1;
                self.errors.push(format!("movie {}: {}", movie_id, error));
            }
        }
    }
}

/// Set of movie ids currently being recomputed
type InFlight = Arc<Mutex<HashSet<i64>>>;

/// Releases a claimed movie id when dropped
struct Claim {
    in_flight: InFlight,
    movie_id: i64,
}

impl Claim {
    fn acquire(in_flight: &InFlight, movie_id: i64) -> Option<Self> {
        let mut claimed = in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !claimed.insert(movie_id) {
            return None;
        }
        Some(Self {
            in_flight: in_flight.clone(),
            movie_id,
        })
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        let mut claimed = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        claimed.remove(&self.movie_id);
    }
}

#[derive(Clone)]
pub struct TrendRecomputer {
    accessor: StoreAccessor,
    writer: Arc<dyn TrendWriter>,
    classifier: TrendClassifier,
    deltas: DeltaCalculator,
    config: AnalysisConfig,
    in_flight: InFlight,
}

impl TrendRecomputer {
    pub fn new(
        accessor: StoreAccessor,
        writer: Arc<dyn TrendWriter>,
        classifier: TrendClassifier,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            deltas: DeltaCalculator::new(accessor.clone()),
            accessor,
            writer,
            classifier,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<RecomputeReport> {
        self.run_with_progress(now, |_| {}, |_| {}).await
    }

    /// Recompute every active movie.
    ///
    /// `on_start` receives the number of active movies, `on_movie` each
    /// outcome as it completes. Fails only when the movie list itself is
    /// unavailable.
    pub async fn run_with_progress<S, F>(
        &self,
        now: DateTime<Utc>,
        on_start: S,
        mut on_movie: F,
    ) -> Result<RecomputeReport>
    where
        S: FnOnce(usize),
        F: FnMut(&MovieOutcome),
    {
        let start = Instant::now();
        let movies = self
            .accessor
            .movies()
            .await
            .ok_or_else(|| anyhow!("movies relation is unavailable"))?;

        let today = now.date_naive();
        let active: Vec<i64> = movies
            .iter()
            .filter(|m| m.released_within(today, self.config.active_days))
            .map(|m| m.id)
            .collect();

        info!(
            operation = "recompute_start",
            movies = movies.len(),
            active = active.len(),
            active_days = self.config.active_days,
            "Starting trend recompute"
        );
        on_start(active.len());

        let mut report = RecomputeReport {
            active_movies: active.len(),
            ..RecomputeReport::default()
        };

        let mut outcomes = stream::iter(active)
            .map(|movie_id| {
                let job = self.clone();
                async move { job.recompute_movie(movie_id, now).await }
            })
            .buffer_unordered(self.config.concurrency.max(1));
        while let Some(outcome) = outcomes.next().await {
            on_movie(&outcome);
            report.record(&outcome);
        }

        report.duration = start.elapsed();
        info!(
            operation = "recompute_complete",
            analyzed = report.analyzed,
            skipped_in_flight = report.skipped_in_flight,
            unavailable = report.unavailable,
            failed = report.failed,
            duration_ms = report.duration.as_millis() as u64,
            "Trend recompute completed"
        );
        Ok(report)
    }

    /// Recompute and persist one movie's trend
    pub async fn recompute_movie(&self, movie_id: i64, now: DateTime<Utc>) -> MovieOutcome {
        let Some(_claim) = Claim::acquire(&self.in_flight, movie_id) else {
            debug!(movie_id = movie_id, "Recompute already in flight, skipping");
            return MovieOutcome::InFlight { movie_id };
        };

        let Some(snapshots) = self.accessor.snapshots(movie_id).await else {
            warn!(movie_id = movie_id, "Snapshots unavailable, keeping previous trend");
            return MovieOutcome::Unavailable { movie_id };
        };

        let delta = match snapshots.last() {
            Some(latest) => {
                let source = latest.source.unwrap_or(RatingSource::RottenTomatoes);
                Some(
                    self.deltas
                        .headline_delta(movie_id, source, latest.critic_score, now)
                        .await,
                )
            }
            None => None,
        };

        let trend = self
            .classifier
            .classify_with_rating_delta(movie_id, &snapshots, delta.as_ref());
        let status = trend.trend_status;

        let row = StoredTrend {
            trend,
            last_calculated_at: now,
        };
        match self.writer.store_trend(row).await {
            Ok(()) => {
                debug!(movie_id = movie_id, status = %status, "Stored trend");
                MovieOutcome::Analyzed { movie_id, status }
            }
            Err(e) => {
                warn!(movie_id = movie_id, error = %e, "Failed to store trend");
                MovieOutcome::Failed {
                    movie_id,
                    error: e.to_string(),
                }
            }
        }
    }

    #[cfg(test)]
    fn claim(&self, movie_id: i64) -> Option<Claim> {
        Claim::acquire(&self.in_flight, movie_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone};
    use media_trends_models::{Movie, RatingSnapshot, RatingType, ReviewSnapshot};
    use media_trends_store::{MemoryStore, Relation, SnapshotStore};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 12, 0, 0).unwrap()
    }

    fn movie(id: i64, days_ago: i64) -> Movie {
        let mut movie: Movie = serde_json::from_str(&format!(
            r#"{{"id": {id}, "tmdb_id": {}, "title": "Movie {id}"}}"#,
            900 + id
        ))
        .unwrap();
        movie.release_date = Some(now().date_naive() - ChronoDuration::days(days_ago));
        movie
    }

    fn rising(movie_id: i64) -> Vec<ReviewSnapshot> {
        (0..7)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2026, 5, 14 + i).unwrap();
                let mut row = ReviewSnapshot::new(movie_id, date);
                row.critic_score = 70.0 + i as f64;
                row.new_reviews_today = 10;
                row
            })
            .collect()
    }

    fn recomputer(store: Arc<MemoryStore>) -> TrendRecomputer {
        TrendRecomputer::new(
            StoreAccessor::new(store.clone()),
            store,
            TrendClassifier::default(),
            AnalysisConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_run_recomputes_active_movies() {
        let store = Arc::new(
            MemoryStore::new()
                .with_movies([movie(1, 3), movie(2, 10), movie(3, 90)])
                .with_review_snapshots(rising(1)),
        );
        let report = recomputer(store.clone()).run(now()).await.unwrap();

        assert_eq!(report.active_movies, 2);
        assert_eq!(report.analyzed, 2);
        assert_eq!(report.by_status.get(&TrendStatus::TrendingUp), Some(&1));
        assert_eq!(report.by_status.get(&TrendStatus::Stable), Some(&1));

        let trends = store.trends().await;
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].trend.trend_status, TrendStatus::TrendingUp);
        assert_eq!(trends[0].last_calculated_at, now());
        assert_eq!(trends[1].trend, media_trends_models::MovieTrend::empty(2));
        assert!(store.fetch_trend(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rating_snapshot_delta_feeds_classification() {
        let store = Arc::new(
            MemoryStore::new()
                .with_movies([movie(1, 3)])
                .with_review_snapshots(rising(1))
                .with_rating_snapshots([RatingSnapshot {
                    movie_id: 1,
                    source: RatingSource::RottenTomatoes,
                    rating_type: RatingType::Tomatometer,
                    rating_value: 80.0,
                    review_count: 10,
                    snapshot_time: now() - ChronoDuration::hours(30),
                }]),
        );
        recomputer(store.clone()).run(now()).await.unwrap();

        // Latest critic score 76 against an 80 baseline
        let trend = store.trends().await.remove(0).trend;
        assert_eq!(trend.rating_change_24h, -4.0);
        assert_eq!(trend.trend_status, TrendStatus::TrendingDown);
    }

    #[tokio::test]
    async fn test_unavailable_snapshots_never_write() {
        let store = Arc::new(MemoryStore::new().with_movies([movie(1, 3)]));
        store.set_unavailable(Relation::ReviewSnapshots, true).await;

        let report = recomputer(store.clone()).run(now()).await.unwrap();
        assert_eq!(report.unavailable, 1);
        assert_eq!(report.analyzed, 0);
        assert!(store.trends().await.is_empty());
    }

    #[tokio::test]
    async fn test_in_flight_movie_is_skipped() {
        let store = Arc::new(MemoryStore::new().with_movies([movie(1, 3), movie(2, 3)]));
        let job = recomputer(store.clone());

        let claim = job.claim(1).unwrap();
        assert!(job.claim(1).is_none());

        let report = job.run(now()).await.unwrap();
        assert_eq!(report.skipped_in_flight, 1);
        assert_eq!(report.analyzed, 1);
        assert!(store.fetch_trend(1).await.unwrap().is_none());

        drop(claim);
        assert_eq!(
            job.recompute_movie(1, now()).await,
            MovieOutcome::Analyzed {
                movie_id: 1,
                status: TrendStatus::Stable
            }
        );
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let store = Arc::new(MemoryStore::new().with_movies([movie(1, 3)]));
        store.set_unavailable(Relation::MovieTrends, true).await;

        let mut seen = Vec::new();
        let report = recomputer(store.clone())
            .run_with_progress(now(), |total| assert_eq!(total, 1), |o| seen.push(o.movie_id()))
            .await
            .unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(seen, vec![1]);
    }

    #[tokio::test]
    async fn test_missing_movie_list_fails_run() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(Relation::Movies, true).await;
        assert!(recomputer(store).run(now()).await.is_err());
    }
}
