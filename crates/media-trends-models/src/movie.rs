use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A catalogued movie.
///
/// Immutable once ingested, except for the AI summary fields which are
/// filled in asynchronously by the summarization job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub tmdb_id: u32,
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u32>,
    #[serde(default)]
    pub ai_summary_positive: Option<String>,
    #[serde(default)]
    pub ai_summary_negative: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub backdrop_url: Option<String>,
    #[serde(default)]
    pub regions: Vec<String>,
}

impl Movie {
    /// First region tag, shown as the card's region chip
    pub fn primary_region(&self) -> Option<&str> {
        self.regions.first().map(String::as_str)
    }

    /// Whether the summarization job has produced insights yet
    pub fn has_ai_summary(&self) -> bool {
        self.ai_summary_positive.is_some() || self.ai_summary_negative.is_some()
    }

    /// Whether the movie was released within `days` of `today`.
    ///
    /// Undated movies are never active.
    pub fn released_within(&self, today: NaiveDate, days: i64) -> bool {
        match self.release_date {
            Some(date) => {
                let age = today.signed_duration_since(date).num_days();
                age <= days && age >= 0
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(release: Option<NaiveDate>) -> Movie {
        Movie {
            id: 1,
            tmdb_id: 550,
            title: "Fight Club".to_string(),
            original_title: None,
            release_date: release,
            language: Some("en".to_string()),
            overview: None,
            popularity: None,
            vote_average: None,
            vote_count: None,
            ai_summary_positive: None,
            ai_summary_negative: None,
            poster_url: None,
            backdrop_url: None,
            regions: vec!["US".to_string(), "GB".to_string()],
        }
    }

    #[test]
    fn test_released_within() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert!(movie(NaiveDate::from_ymd_opt(2026, 3, 15)).released_within(today, 30));
        assert!(!movie(NaiveDate::from_ymd_opt(2026, 1, 1)).released_within(today, 30));
        assert!(!movie(NaiveDate::from_ymd_opt(2026, 4, 10)).released_within(today, 30));
        assert!(!movie(None).released_within(today, 30));
    }

    #[test]
    fn test_primary_region_and_summary() {
        let mut m = movie(None);
        assert_eq!(m.primary_region(), Some("US"));
        assert!(!m.has_ai_summary());
        m.ai_summary_negative = Some("Too long".to_string());
        assert!(m.has_ai_summary());
    }
}
