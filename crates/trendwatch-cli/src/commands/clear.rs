use crate::context::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;

pub fn run_clear(ctx: &AppContext, trends: bool, output: &Output) -> Result<()> {
    if !trends {
        output.warn("No clear option specified. Use --trends");
        output.info("\nExample: trendwatch clear --trends");
        return Ok(());
    }

    let size = ctx.store.trends_size().unwrap_or(0);
    let removed = ctx
        .store
        .clear_trends()
        .map_err(|e| eyre!("Failed to clear stored trends: {}", e))?;
    if removed {
        output.success(format!(
            "Cleared stored trends ({} bytes): {}",
            size,
            ctx.paths.trends_dir().display()
        ));
    } else {
        output.info("No stored trends found to clear");
    }
    Ok(())
}
