use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single observation of one rating metric, as scraped by the rating monitor.
///
/// Append-only and time-ordered per (movie_id, source, rating_type).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingSnapshot {
    pub movie_id: i64,
    pub source: RatingSource,
    pub rating_type: RatingType,
    pub rating_value: f64, // Percentage scale (IMDb and Metacritic user scores are scaled x10)
    pub review_count: u32,
    pub snapshot_time: DateTime<Utc>,
}

impl RatingSnapshot {
    /// Whether this snapshot belongs to the given (movie, source, rating_type) series
    pub fn is_series(&self, movie_id: i64, source: RatingSource, rating_type: RatingType) -> bool {
        self.movie_id == movie_id && self.source == source && self.rating_type == rating_type
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RatingSource {
    #[serde(rename = "RottenTomatoes")]
    RottenTomatoes,
    #[serde(rename = "IMDb")]
    Imdb,
    #[serde(rename = "Metacritic")]
    Metacritic,
}

impl RatingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingSource::RottenTomatoes => "RottenTomatoes",
            RatingSource::Imdb => "IMDb",
            RatingSource::Metacritic => "Metacritic",
        }
    }
}

impl fmt::Display for RatingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rottentomatoes" | "rotten_tomatoes" | "rt" => Ok(RatingSource::RottenTomatoes),
            "imdb" => Ok(RatingSource::Imdb),
            "metacritic" | "mc" => Ok(RatingSource::Metacritic),
            other => Err(format!("Unknown rating source: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RatingType {
    /// Critic score; the headline metric shown on mover cards
    Tomatometer,
    Audience,
    ImdbScore,
    Metascore,
    UserScore,
}

impl RatingType {
    pub const HEADLINE: RatingType = RatingType::Tomatometer;

    pub fn as_str(&self) -> &'static str {
        match self {
            RatingType::Tomatometer => "tomatometer",
            RatingType::Audience => "audience",
            RatingType::ImdbScore => "imdb_score",
            RatingType::Metascore => "metascore",
            RatingType::UserScore => "user_score",
        }
    }
}

impl fmt::Display for RatingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tomatometer" => Ok(RatingType::Tomatometer),
            "audience" => Ok(RatingType::Audience),
            "imdb_score" => Ok(RatingType::ImdbScore),
            "metascore" => Ok(RatingType::Metascore),
            "user_score" => Ok(RatingType::UserScore),
            other => Err(format!("Unknown rating type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse_and_display() {
        assert_eq!("IMDb".parse::<RatingSource>().unwrap(), RatingSource::Imdb);
        assert_eq!(" rottentomatoes ".parse::<RatingSource>().unwrap(), RatingSource::RottenTomatoes);
        assert!("letterboxd".parse::<RatingSource>().is_err());
        assert_eq!(RatingSource::RottenTomatoes.to_string(), "RottenTomatoes");
    }

    #[test]
    fn test_rating_type_serde_names() {
        let json = serde_json::to_string(&RatingType::ImdbScore).unwrap();
        assert_eq!(json, "\"imdb_score\"");
        assert_eq!("Tomatometer".parse::<RatingType>().unwrap(), RatingType::HEADLINE);
    }
}
