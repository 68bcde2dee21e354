pub mod classifier;
pub mod delta;
pub mod derive;
pub mod detail;
pub mod movers;
pub mod recompute;
pub mod series;
pub mod stats;

pub use classifier::TrendClassifier;
pub use delta::{rating_delta, DeltaCalculator};
pub use derive::derive_review_snapshots;
pub use detail::{DetailError, MovieDetail, MovieDetailLoader};
pub use movers::{latest_releases, rank_movers, MoverCard, MoversBoard};
pub use recompute::{MovieOutcome, RecomputeReport, TrendRecomputer};
pub use series::{build_series, detect_cadence};
pub use stats::ReviewSummary;
