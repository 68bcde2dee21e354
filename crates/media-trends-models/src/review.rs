use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A critic review, keyed by movie title the way the scraper stores it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: i64,
    pub reviewer_id: i64,
    pub movie_title: String,
    pub rating: ReviewVerdict,
    pub content: String,
    #[serde(default)]
    pub review_date: Option<NaiveDate>,
    #[serde(default)]
    pub source_url: Option<String>,
}

/// Static reference data for a critic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reviewer {
    pub id: i64,
    pub name: String,
    pub source: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
}

/// Review label as scraped. Anything other than Fresh/Rotten is kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ReviewVerdict {
    Fresh,
    Rotten,
    Other(String),
}

impl ReviewVerdict {
    pub fn is_fresh(&self) -> bool {
        matches!(self, ReviewVerdict::Fresh)
    }

    pub fn label(&self) -> &str {
        match self {
            ReviewVerdict::Fresh => "Fresh",
            ReviewVerdict::Rotten => "Rotten",
            ReviewVerdict::Other(label) => label,
        }
    }
}

impl From<String> for ReviewVerdict {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Fresh" => ReviewVerdict::Fresh,
            "Rotten" => ReviewVerdict::Rotten,
            _ => ReviewVerdict::Other(value),
        }
    }
}

impl From<ReviewVerdict> for String {
    fn from(value: ReviewVerdict) -> Self {
        value.label().to_string()
    }
}

/// A review joined with its reviewer, as the detail page lists it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewEntry {
    pub review: Review,
    pub reviewer_name: Option<String>,
    pub reviewer_source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_roundtrips_labels() {
        let verdicts: Vec<ReviewVerdict> =
            serde_json::from_str(r#"["Fresh", "Rotten", "B+"]"#).unwrap();
        assert_eq!(
            verdicts,
            vec![
                ReviewVerdict::Fresh,
                ReviewVerdict::Rotten,
                ReviewVerdict::Other("B+".to_string())
            ]
        );
        assert!(verdicts[0].is_fresh());
        assert!(!verdicts[2].is_fresh());
        assert_eq!(serde_json::to_string(&verdicts[2]).unwrap(), "\"B+\"");
    }
}
