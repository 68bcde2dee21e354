use media_trends_models::ReviewEntry;
use serde::{Deserialize, Serialize};

/// Review tally shown above the review list
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ReviewSummary {
    pub count: usize,
    pub fresh: usize,
    pub fresh_score: f64, // Percentage of Fresh reviews, 0 when there are none
}

impl ReviewSummary {
    pub fn from_reviews(reviews: &[ReviewEntry]) -> Self {
        let count = reviews.len();
        let fresh = reviews.iter().filter(|r| r.review.rating.is_fresh()).count();
        let fresh_score = if count == 0 {
            0.0
        } else {
            fresh as f64 / count as f64 * 100.0
        };
        Self {
            count,
            fresh,
            fresh_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_trends_models::{Review, ReviewVerdict};

    fn entry(rating: ReviewVerdict) -> ReviewEntry {
        ReviewEntry {
            review: Review {
                id: 1,
                reviewer_id: 1,
                movie_title: "Night Train".to_string(),
                rating,
                content: String::new(),
                review_date: None,
                source_url: None,
            },
            reviewer_name: None,
            reviewer_source: None,
        }
    }

    #[test]
    fn test_fresh_score() {
        let reviews = vec![
            entry(ReviewVerdict::Fresh),
            entry(ReviewVerdict::Fresh),
            entry(ReviewVerdict::Rotten),
            entry(ReviewVerdict::Other("B+".to_string())),
        ];
        let summary = ReviewSummary::from_reviews(&reviews);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.fresh, 2);
        assert_eq!(summary.fresh_score, 50.0);
    }

    #[test]
    fn test_no_reviews() {
        assert_eq!(ReviewSummary::from_reviews(&[]), ReviewSummary::default());
    }
}
