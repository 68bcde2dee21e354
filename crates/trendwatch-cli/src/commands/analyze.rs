use crate::commands::analyze_ui::AnalyzeUI;
use crate::context::AppContext;
use crate::output::Output;
use crate::render;
use chrono::Utc;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use media_trends_core::{RecomputeReport, TrendRecomputer};

pub fn recomputer(ctx: &AppContext) -> TrendRecomputer {
    TrendRecomputer::new(
        ctx.accessor.clone(),
        ctx.store.clone(),
        ctx.classifier(),
        ctx.config.analysis.clone(),
    )
}

pub async fn run_analyze(ctx: &AppContext, output: &Output) -> Result<()> {
    let recomputer = recomputer(ctx);
    let ui = AnalyzeUI::new(output.is_human() && !output.is_quiet());

    let report = recomputer
        .run_with_progress(Utc::now(), |total| ui.start(total), |outcome| ui.record(outcome))
        .await;
    ui.finish();
    let report = report.map_err(|e| eyre!("Trend analysis failed: {}", e))?;

    print_report(&report, output);
    Ok(())
}

fn print_report(report: &RecomputeReport, output: &Output) {
    if report.active_movies == 0 {
        output.info("No movies released recently, nothing to analyze");
    } else {
        output.success(format!(
            "Analyzed {} of {} active movies in {:.1}s",
            report.analyzed,
            report.active_movies,
            report.duration.as_secs_f64()
        ));
    }
    output.table(&render::report_table(report));
    for error in &report.errors {
        output.warn(error);
    }
    output.data(report);
}
