use chrono::{DateTime, NaiveDate, Utc};
use media_trends_config::MoversConfig;
use media_trends_models::{Movie, RatingDelta, RatingSnapshot, RatingSource, RatingType};
use media_trends_store::StoreAccessor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

use crate::delta::{rating_delta, window_start};

/// One row of the "Biggest Movers (24h)" board
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoverCard {
    pub movie_id: i64,
    pub tmdb_id: u32,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub poster_url: Option<String>,
    pub source: RatingSource,
    pub rating_type: RatingType,
    pub review_count: u32,
    pub snapshot_time: DateTime<Utc>,
    pub delta: RatingDelta,
}

/// Rank movies by how far their headline rating moved in the last 24 hours.
///
/// Only movies with a headline snapshot inside the last `window_days` are
/// considered; the latest such snapshot is the card's current value and
/// source. `snapshots` must also hold the older rows used as baselines.
pub fn rank_movers(
    movies: &[Movie],
    snapshots: &[RatingSnapshot],
    now: DateTime<Utc>,
    window_days: i64,
    limit: usize,
) -> Vec<MoverCard> {
    let recent_start = window_start(now, window_days).unwrap_or(DateTime::<Utc>::MIN_UTC);
    let by_id: HashMap<i64, &Movie> = movies.iter().map(|m| (m.id, m)).collect();

    let mut latest: BTreeMap<i64, &RatingSnapshot> = BTreeMap::new();
    for snapshot in snapshots
        .iter()
        .filter(|s| s.rating_type == RatingType::HEADLINE && s.snapshot_time >= recent_start)
    {
        match latest.get(&snapshot.movie_id) {
            Some(current) if current.snapshot_time > snapshot.snapshot_time => {}
            _ => {
                latest.insert(snapshot.movie_id, snapshot);
            }
        }
    }

    let mut cards: Vec<MoverCard> = latest
        .into_values()
        .filter_map(|current| {
            let movie = by_id.get(&current.movie_id)?;
            let delta = rating_delta(
                current.rating_value,
                snapshots,
                current.movie_id,
                current.source,
                current.rating_type,
                now,
            );
            Some(MoverCard {
                movie_id: movie.id,
                tmdb_id: movie.tmdb_id,
                title: movie.title.clone(),
                release_date: movie.release_date,
                poster_url: movie.poster_url.clone(),
                source: current.source,
                rating_type: current.rating_type,
                review_count: current.review_count,
                snapshot_time: current.snapshot_time,
                delta,
            })
        })
        .collect();

    cards.sort_by(|a, b| {
        b.delta
            .change
            .abs()
            .total_cmp(&a.delta.change.abs())
            .then(a.movie_id.cmp(&b.movie_id))
    });
    cards.truncate(limit);
    cards
}

/// Newest releases first; undated movies go last
pub fn latest_releases(movies: &[Movie], limit: usize) -> Vec<Movie> {
    let mut sorted = movies.to_vec();
    sorted.sort_by(|a, b| b.release_date.cmp(&a.release_date));
    sorted.truncate(limit);
    sorted
}

/// Home page lists, read through the store accessor
#[derive(Clone)]
pub struct MoversBoard {
    accessor: StoreAccessor,
    config: MoversConfig,
}

impl MoversBoard {
    pub fn new(accessor: StoreAccessor, config: MoversConfig) -> Self {
        Self { accessor, config }
    }

    /// `None` when the movies or rating snapshots are unavailable
    pub async fn biggest_movers(&self, now: DateTime<Utc>) -> Option<Vec<MoverCard>> {
        let movies = self.accessor.movies().await?;
        let snapshots = self
            .accessor
            .rating_snapshots(RatingType::HEADLINE, DateTime::<Utc>::MIN_UTC)
            .await?;

        let cards = rank_movers(&movies, &snapshots, now, self.config.window_days, self.config.limit);
        info!(
            operation = "biggest_movers",
            movies = movies.len(),
            snapshots = snapshots.len(),
            cards = cards.len(),
            "Built movers board"
        );
        Some(cards)
    }

    pub async fn latest_releases(&self) -> Option<Vec<Movie>> {
        let movies = self.accessor.movies().await?;
        Some(latest_releases(&movies, self.config.recent_limit))
    }
}
