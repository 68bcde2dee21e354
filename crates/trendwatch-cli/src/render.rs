//! Terminal rendering of dashboard pages.

use comfy_table::{modifiers, presets, Attribute, Cell, Color, Table};
use media_trends_core::{MoverCard, MovieDetail, RecomputeReport, ReviewSummary};
use media_trends_models::{Direction, Movie, MovieTrend, RatingDelta, ReviewEntry, SeriesResult, TrendStatus};

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(
        header
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

/// Badge text, e.g. "🔥 Trending Up (70%)"
pub fn trend_badge(trend: &MovieTrend) -> String {
    format!(
        "{} {} ({})",
        trend.trend_status.icon(),
        trend.trend_status.label(),
        percent(trend.trend_confidence)
    )
}

fn status_color(status: TrendStatus) -> Color {
    match status {
        TrendStatus::TrendingUp => Color::Green,
        TrendStatus::TrendingDown => Color::Red,
        TrendStatus::SleeperHit => Color::Magenta,
        TrendStatus::Stable => Color::Grey,
    }
}

/// 24h movement; a missing baseline and an unchanged rating are both neutral
/// but read differently.
pub fn delta_indicator(delta: &RatingDelta) -> String {
    match delta.direction() {
        Direction::Up => format!("▲ +{:.1}", delta.change),
        Direction::Down => format!("▼ {:.1}", delta.change),
        Direction::Flat if delta.has_baseline() => "● 0.0".to_string(),
        Direction::Flat => "– no 24h data".to_string(),
    }
}

fn delta_cell(delta: &RatingDelta) -> Cell {
    let cell = Cell::new(delta_indicator(delta));
    match delta.direction() {
        Direction::Up => cell.fg(Color::Green),
        Direction::Down => cell.fg(Color::Red),
        Direction::Flat => cell.fg(Color::Grey),
    }
}

pub fn movers_table(cards: &[MoverCard]) -> Table {
    let mut table = new_table(&["#", "Movie", "Source", "Rating", "24h", "Reviews", "Updated"]);
    for (i, card) in cards.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&card.title),
            Cell::new(card.source),
            Cell::new(format!("{:.0}%", card.delta.current)),
            delta_cell(&card.delta),
            Cell::new(card.review_count),
            Cell::new(card.snapshot_time.format("%b %-d %H:%M")),
        ]);
    }
    table
}

pub fn releases_table(movies: &[Movie]) -> Table {
    let mut table = new_table(&["Movie", "TMDB", "Released", "Language", "Region", "Votes"]);
    for movie in movies {
        table.add_row(vec![
            Cell::new(&movie.title),
            Cell::new(movie.tmdb_id),
            Cell::new(
                movie
                    .release_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "TBA".to_string()),
            ),
            Cell::new(movie.language.as_deref().unwrap_or("-")),
            Cell::new(movie.primary_region().unwrap_or("-")),
            Cell::new(
                movie
                    .vote_average
                    .map(|v| format!("{:.1}", v))
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }
    table
}

/// Summary card for the detail page
pub fn detail_table(detail: &MovieDetail) -> Table {
    let movie = &detail.movie;
    let mut table = new_table(&["Field", "Value"]);
    table.add_row(vec![Cell::new("Title"), Cell::new(&movie.title).add_attribute(Attribute::Bold)]);
    if let Some(original) = movie.original_title.as_deref().filter(|o| *o != movie.title) {
        table.add_row(vec!["Original title", original]);
    }
    table.add_row(vec![
        Cell::new("Released"),
        Cell::new(
            movie
                .release_date
                .map(|d| d.format("%B %-d, %Y").to_string())
                .unwrap_or_else(|| "TBA".to_string()),
        ),
    ]);

    match &detail.trend {
        Some(stored) => {
            let trend = &stored.trend;
            table.add_row(vec![
                Cell::new("Trend"),
                Cell::new(trend_badge(trend)).fg(status_color(trend.trend_status)),
            ]);
            table.add_row(vec![Cell::new("Review growth"), Cell::new(percent(trend.review_growth_rate))]);
            table.add_row(vec![
                Cell::new("Avg daily reviews"),
                Cell::new(format!("{:.1}", trend.avg_daily_reviews)),
            ]);
            let consistency = if trend.is_rising_star() {
                format!("{} ⭐ Rising Star", percent(trend.consistency_score))
            } else {
                percent(trend.consistency_score)
            };
            table.add_row(vec![Cell::new("Consistency"), Cell::new(consistency)]);
            table.add_row(vec![
                Cell::new("Rating change (24h)"),
                Cell::new(format!("{:+.1}", trend.rating_change_24h)),
            ]);
            if let Some(spike) = trend.spike_date {
                table.add_row(vec![
                    Cell::new("Suspicious activity"),
                    Cell::new(format!("⚠ spike on {}", spike)).fg(Color::Yellow),
                ]);
            }
            table.add_row(vec![
                Cell::new("Calculated"),
                Cell::new(stored.last_calculated_at.format("%Y-%m-%d %H:%M UTC")),
            ]);
        }
        None => {
            table.add_row(vec!["Trend", "No trend data"]);
        }
    }

    if let Some(positive) = &movie.ai_summary_positive {
        table.add_row(vec![Cell::new("What critics liked"), Cell::new(positive)]);
    }
    if let Some(negative) = &movie.ai_summary_negative {
        table.add_row(vec![Cell::new("What critics disliked"), Cell::new(negative)]);
    }
    table
}

/// Series as a table, one row per point; `None` when there is nothing to plot
pub fn chart_table(series: &SeriesResult) -> Option<Table> {
    let series = series.series()?;
    let mut table = new_table(&["Time", "Reviews", "New", "Critic", "Audience", "Velocity", ""]);
    for point in &series.points {
        let marker = if point.anomalous {
            Cell::new("⚠ spike").fg(Color::Yellow)
        } else {
            Cell::new("")
        };
        table.add_row(vec![
            Cell::new(point.label(series.cadence)),
            Cell::new(point.total_reviews),
            Cell::new(point.new_reviews),
            Cell::new(format!("{:.0}", point.critic_score)),
            Cell::new(format!("{:.0}", point.audience_score)),
            Cell::new(format!("{:.1}", point.review_velocity)),
            marker,
        ]);
    }
    Some(table)
}

pub fn reviews_table(reviews: &[ReviewEntry]) -> Table {
    let mut table = new_table(&["Critic", "Outlet", "Verdict", "Date", "Review"]);
    for entry in reviews {
        let verdict = Cell::new(entry.review.rating.label());
        let verdict = if entry.review.rating.is_fresh() {
            verdict.fg(Color::Green)
        } else {
            verdict
        };
        table.add_row(vec![
            Cell::new(entry.reviewer_name.as_deref().unwrap_or("Unknown")),
            Cell::new(entry.reviewer_source.as_deref().unwrap_or("-")),
            verdict,
            Cell::new(
                entry
                    .review
                    .review_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
            Cell::new(&entry.review.content),
        ]);
    }
    table
}

pub fn summary_line(summary: &ReviewSummary) -> String {
    if summary.count == 0 {
        return "No reviews yet".to_string();
    }
    format!(
        "{} review{} · {:.0}% fresh",
        summary.count,
        if summary.count == 1 { "" } else { "s" },
        summary.fresh_score
    )
}

pub fn report_table(report: &RecomputeReport) -> Table {
    let mut table = new_table(&["Result", "Movies"]);
    table.add_row(vec![Cell::new("Active"), Cell::new(report.active_movies)]);
    table.add_row(vec![Cell::new("Analyzed"), Cell::new(report.analyzed)]);
    for (status, count) in &report.by_status {
        table.add_row(vec![
            Cell::new(format!("  {} {}", status.icon(), status.label())),
            Cell::new(count),
        ]);
    }
    table.add_row(vec![Cell::new("Skipped (in flight)"), Cell::new(report.skipped_in_flight)]);
    table.add_row(vec![Cell::new("Snapshots unavailable"), Cell::new(report.unavailable)]);
    table.add_row(vec![Cell::new("Failed"), Cell::new(report.failed)]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use media_trends_core::build_series;
    use media_trends_models::{ReviewSnapshot, SnapshotKey};
    use std::collections::HashSet;

    #[test]
    fn test_trend_badge() {
        let mut trend = MovieTrend::empty(1);
        trend.trend_status = TrendStatus::TrendingUp;
        trend.trend_confidence = 0.7;
        assert_eq!(trend_badge(&trend), "🔥 Trending Up (70%)");
    }

    #[test]
    fn test_delta_indicator_distinguishes_missing_baseline() {
        assert_eq!(delta_indicator(&RatingDelta::new(75.0, Some(70.0))), "▲ +5.0");
        assert_eq!(delta_indicator(&RatingDelta::new(68.5, Some(70.0))), "▼ -1.5");
        assert_eq!(delta_indicator(&RatingDelta::new(75.0, Some(75.0))), "● 0.0");
        assert_eq!(delta_indicator(&RatingDelta::new(75.0, None)), "– no 24h data");
    }

    #[test]
    fn test_summary_line() {
        let summary = ReviewSummary {
            count: 3,
            fresh: 2,
            fresh_score: 200.0 / 3.0,
        };
        assert_eq!(summary_line(&summary), "3 reviews · 67% fresh");
        assert_eq!(summary_line(&ReviewSummary::default()), "No reviews yet");
    }

    #[test]
    fn test_chart_table_rows() {
        assert!(chart_table(&SeriesResult::NoTrendData).is_none());

        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let time = Utc.with_ymd_and_hms(2026, 1, 3, 9, 0, 0).unwrap();
        let rows = vec![ReviewSnapshot::new(1, date), ReviewSnapshot::at(1, time)];
        let keys: HashSet<SnapshotKey> = [SnapshotKey::On(date)].into();

        let table = chart_table(&build_series(&rows, &keys)).unwrap();
        assert_eq!(table.row_iter().count(), 2);
        assert!(table.to_string().contains("⚠ spike"));
    }
}
