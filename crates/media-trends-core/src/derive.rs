use chrono::NaiveDate;
use media_trends_models::{Movie, RatingSnapshot, RatingSource, RatingType, ReviewSnapshot};
use std::collections::BTreeMap;

#[derive(Default)]
struct DayReadings<'a> {
    critic: Option<&'a RatingSnapshot>,
    audience: Option<&'a RatingSnapshot>,
}

impl<'a> DayReadings<'a> {
    fn keep_latest(slot: &mut Option<&'a RatingSnapshot>, snapshot: &'a RatingSnapshot) {
        if slot.map_or(true, |s| s.snapshot_time <= snapshot.snapshot_time) {
            *slot = Some(snapshot);
        }
    }
}

fn days_since_release(movie: &Movie, date: NaiveDate) -> i64 {
    movie
        .release_date
        .map(|release| (date - release).num_days())
        .unwrap_or(1)
        .max(1)
}

/// Build daily review snapshots for a movie from its Rotten Tomatoes readings.
///
/// One row per calendar day with a tomatometer or audience reading; the
/// latest reading of each type wins within a day. `total_reviews` sums the
/// critic and audience review counts. Day-over-day fields compare against
/// the row for the previous calendar day and stay 0 without one; the score
/// change also needs a critic score on both days. Rows come back in date order.
pub fn derive_review_snapshots(movie: &Movie, snapshots: &[RatingSnapshot]) -> Vec<ReviewSnapshot> {
    let mut days: BTreeMap<NaiveDate, DayReadings<'_>> = BTreeMap::new();
    for snapshot in snapshots
        .iter()
        .filter(|s| s.movie_id == movie.id && s.source == RatingSource::RottenTomatoes)
    {
        let day = days.entry(snapshot.snapshot_time.date_naive()).or_default();
        match snapshot.rating_type {
            RatingType::Tomatometer => DayReadings::keep_latest(&mut day.critic, snapshot),
            RatingType::Audience => DayReadings::keep_latest(&mut day.audience, snapshot),
            _ => {}
        }
    }

    let mut rows: Vec<ReviewSnapshot> = Vec::with_capacity(days.len());
    for (date, readings) in days {
        let mut row = ReviewSnapshot::new(movie.id, date);
        row.source = Some(RatingSource::RottenTomatoes);
        row.snapshot_time = [readings.critic, readings.audience]
            .into_iter()
            .flatten()
            .map(|s| s.snapshot_time)
            .max();
        row.total_reviews = [readings.critic, readings.audience]
            .into_iter()
            .flatten()
            .map(|s| i64::from(s.review_count))
            .sum();
        row.critic_score = readings.critic.map_or(0.0, |s| s.rating_value);
        row.audience_score = readings.audience.map_or(0.0, |s| s.rating_value);

        if let Some(previous) = rows.last().filter(|p| date.pred_opt() == Some(p.snapshot_date)) {
            row.new_reviews_today = row.total_reviews - previous.total_reviews;
            if previous.critic_score != 0.0 && readings.critic.is_some() {
                row.score_change = row.critic_score - previous.critic_score;
            }
        }
        row.review_velocity = row.total_reviews as f64 / days_since_release(movie, date) as f64;
        rows.push(row);
    }
    rows
}
