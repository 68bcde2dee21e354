pub mod delta;
pub mod movie;
pub mod rating;
pub mod review;
pub mod series;
pub mod snapshot;
pub mod trend;

pub use delta::{Direction, RatingDelta};
pub use movie::Movie;
pub use rating::{RatingSnapshot, RatingSource, RatingType};
pub use review::{Review, ReviewEntry, ReviewVerdict, Reviewer};
pub use series::{Cadence, ChartPoint, ChartSeries, SeriesResult};
pub use snapshot::{ReviewSnapshot, SnapshotKey};
pub use trend::{MovieTrend, StoredTrend, TrendStatus};
