use crate::context::AppContext;
use crate::output::Output;
use crate::render;
use chrono::Utc;
use color_eyre::Result;
use media_trends_core::{DetailError, MovieDetailLoader, MoversBoard};
use owo_colors::OwoColorize;
use serde_json::json;

fn board(ctx: &AppContext, limit: Option<usize>) -> MoversBoard {
    let mut config = ctx.config.movers.clone();
    if let Some(limit) = limit {
        config.limit = limit;
        config.recent_limit = limit;
    }
    MoversBoard::new(ctx.accessor.clone(), config)
}

pub async fn run_movers(ctx: &AppContext, limit: Option<usize>, output: &Output) -> Result<()> {
    let Some(cards) = board(ctx, limit).biggest_movers(Utc::now()).await else {
        output.warn("Rating data is unavailable right now");
        output.data(&json!({ "movers": null }));
        return Ok(());
    };

    if cards.is_empty() {
        output.info("No rating activity in the last week");
    } else if output.is_human() && !output.is_quiet() {
        println!("\n{}", "Biggest Movers (24h)".bright_cyan().bold());
    }
    output.table(&render::movers_table(&cards));
    output.data(&json!({ "movers": cards }));
    Ok(())
}

pub async fn run_recent(ctx: &AppContext, limit: Option<usize>, output: &Output) -> Result<()> {
    let Some(movies) = board(ctx, limit).latest_releases().await else {
        output.warn("Movie catalog is unavailable right now");
        output.data(&json!({ "releases": null }));
        return Ok(());
    };

    if movies.is_empty() {
        output.info("No movies in the catalog yet");
    } else if output.is_human() && !output.is_quiet() {
        println!("\n{}", "Latest Releases".bright_cyan().bold());
    }
    output.table(&render::releases_table(&movies));
    output.data(&json!({ "releases": movies }));
    Ok(())
}

pub async fn run_show(ctx: &AppContext, tmdb_id: u32, output: &Output) -> Result<()> {
    let loader = MovieDetailLoader::new(ctx.accessor.clone());
    let detail = match loader.load(tmdb_id).await {
        Ok(detail) => detail,
        Err(DetailError::NotFound { tmdb_id }) => {
            output.error(format!("Movie not found (TMDB id {})", tmdb_id));
            output.data(&json!({ "movie": null, "tmdb_id": tmdb_id }));
            return Ok(());
        }
        Err(DetailError::Unavailable { tmdb_id }) => {
            output.warn("Movie data is unavailable right now");
            output.data(&json!({ "movie": null, "tmdb_id": tmdb_id, "unavailable": true }));
            return Ok(());
        }
    };

    output.table(&render::detail_table(&detail));

    if output.is_human() && !output.is_quiet() {
        println!("\n{}", "Review activity".bright_cyan().bold());
    }
    match render::chart_table(&detail.series) {
        Some(chart) => output.table(&chart),
        None => output.info("No trend data yet"),
    }

    if output.is_human() && !output.is_quiet() {
        println!(
            "\n{} {}",
            "Critic reviews".bright_cyan().bold(),
            render::summary_line(&detail.review_summary).dimmed()
        );
    }
    if !detail.reviews.is_empty() {
        output.table(&render::reviews_table(&detail.reviews));
    }

    output.data(&detail);
    Ok(())
}
