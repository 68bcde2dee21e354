//! Typed parsing of exported snapshot tables.
//!
//! This is the one place where untyped column values become numbers:
//! missing or malformed numeric columns are coerced to 0, rows without a
//! usable identity (movie id, time) are skipped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{Reader, ReaderBuilder, StringRecord};
use media_trends_models::{RatingSnapshot, RatingSource, RatingType, ReviewSnapshot};
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::Relation;


/// Parse a numeric column into a finite f64, defaulting to 0.
///
/// Accepts a trailing '%' as scraped scores carry one.
pub fn coerce_f64(raw: Option<&str>) -> f64 {
    raw.map(|v| v.trim().trim_end_matches('%').trim())
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse a count column, defaulting to 0. Fractional values are truncated.
pub fn coerce_count(raw: Option<&str>) -> i64 {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return 0;
    };
    if let Ok(count) = value.parse::<i64>() {
        return count;
    }
    let float = coerce_f64(Some(value));
    if float.abs() < i64::MAX as f64 {
        float.trunc() as i64
    } else {
        0
    }
}

/// Parse a timestamp as exported by Postgres or written as RFC 3339.
///
/// Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Rows may be shorter than the header; missing trailing columns read as absent
fn csv_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new().flexible(true).from_reader(reader)
}

struct Columns {
    relation: &'static str,
    index: HashMap<String, usize>,
}

impl Columns {
    fn from_headers(relation: Relation, headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        Self {
            relation: relation.as_str(),
            index,
        }
    }

    fn require(&self, column: &'static str) -> StoreResult<()> {
        if self.index.contains_key(column) {
            Ok(())
        } else {
            Err(StoreError::MissingColumn {
                relation: self.relation,
                column,
            })
        }
    }

    fn get<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.index.get(column).and_then(|&i| record.get(i))
    }
}

/// Parse the review snapshot export (`daily_review_snapshots`).
///
/// `snapshot_date` is derived from `snapshot_time` when the column is empty
/// or absent; a row needs at least one of the two.
pub fn read_review_snapshots<R: Read>(reader: R) -> StoreResult<Vec<ReviewSnapshot>> {
    let relation = Relation::ReviewSnapshots;
    let csv_err = |source| StoreError::Csv {
        relation: relation.as_str(),
        source,
    };

    let mut reader = csv_reader(reader);
    let columns = Columns::from_headers(relation, reader.headers().map_err(csv_err)?);
    columns.require("movie_id")?;
    if columns.require("snapshot_time").is_err() {
        columns.require("snapshot_date")?;
    }

    let mut snapshots = Vec::new();
    let mut row_count = 0;
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        row_count += 1;

        let Some(movie_id) = columns
            .get(&record, "movie_id")
            .and_then(|v| v.trim().parse::<i64>().ok())
        else {
            warn!(relation = relation.as_str(), row = row_count, "Skipping snapshot row without a valid movie_id");
            continue;
        };

        let snapshot_time = columns.get(&record, "snapshot_time").and_then(parse_timestamp);
        let snapshot_date = columns
            .get(&record, "snapshot_date")
            .and_then(parse_date)
            .or_else(|| snapshot_time.map(|t| t.date_naive()));
        let Some(snapshot_date) = snapshot_date else {
            warn!(
                relation = relation.as_str(),
                row = row_count,
                movie_id = movie_id,
                "Skipping snapshot row without snapshot_time or snapshot_date"
            );
            continue;
        };

        let source = columns
            .get(&record, "source")
            .filter(|v| !v.trim().is_empty())
            .and_then(|v| match v.parse::<RatingSource>() {
                Ok(source) => Some(source),
                Err(e) => {
                    debug!(row = row_count, error = %e, "Ignoring unknown snapshot source");
                    None
                }
            });

        snapshots.push(ReviewSnapshot {
            movie_id,
            source,
            snapshot_time,
            snapshot_date,
            total_reviews: coerce_count(columns.get(&record, "total_reviews")),
            critic_score: coerce_f64(columns.get(&record, "critic_score")),
            audience_score: coerce_f64(columns.get(&record, "audience_score")),
            new_reviews_today: coerce_count(columns.get(&record, "new_reviews_today")),
            review_velocity: coerce_f64(columns.get(&record, "review_velocity")),
            score_change: coerce_f64(columns.get(&record, "score_change")),
        });
    }

    debug!(
        relation = relation.as_str(),
        rows = row_count,
        parsed = snapshots.len(),
        "Parsed review snapshots"
    );
    Ok(snapshots)
}

/// Parse the rating snapshot export (`rating_snapshots`).
///
/// Rows with an unknown source or rating type, or without a parseable
/// snapshot_time, are skipped.
pub fn read_rating_snapshots<R: Read>(reader: R) -> StoreResult<Vec<RatingSnapshot>> {
    let relation = Relation::RatingSnapshots;
    let csv_err = |source| StoreError::Csv {
        relation: relation.as_str(),
        source,
    };

    let mut reader = csv_reader(reader);
    let columns = Columns::from_headers(relation, reader.headers().map_err(csv_err)?);
    for column in ["movie_id", "source", "rating_type", "rating_value", "snapshot_time"] {
        columns.require(column)?;
    }

    let mut snapshots = Vec::new();
    let mut row_count = 0;
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        row_count += 1;

        let movie_id = columns
            .get(&record, "movie_id")
            .and_then(|v| v.trim().parse::<i64>().ok());
        let source = columns
            .get(&record, "source")
            .and_then(|v| v.parse::<RatingSource>().ok());
        let rating_type = columns
            .get(&record, "rating_type")
            .and_then(|v| v.parse::<RatingType>().ok());
        let snapshot_time = columns.get(&record, "snapshot_time").and_then(parse_timestamp);

        match (movie_id, source, rating_type, snapshot_time) {
            (Some(movie_id), Some(source), Some(rating_type), Some(snapshot_time)) => {
                snapshots.push(RatingSnapshot {
                    movie_id,
                    source,
                    rating_type,
                    rating_value: coerce_f64(columns.get(&record, "rating_value")),
                    review_count: coerce_count(columns.get(&record, "review_count")).clamp(0, u32::MAX as i64) as u32,
                    snapshot_time,
                });
            }
            _ => {
                warn!(
                    relation = relation.as_str(),
                    row = row_count,
                    "Skipping rating snapshot row with unknown movie, source, rating type or time"
                );
            }
        }
    }

    debug!(
        relation = relation.as_str(),
        rows = row_count,
        parsed = snapshots.len(),
        "Parsed rating snapshots"
    );
    Ok(snapshots)
}
