use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{modifiers, presets, Attribute, Cell, Color, Table};
use media_trends_config::{Config, PathManager};
use owo_colors::OwoColorize;
use serde_json::json;

pub fn run_config(cmd: Option<ConfigCommands>, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    match cmd.unwrap_or(ConfigCommands::Show) {
        ConfigCommands::Show => show_config(&paths, output),
        ConfigCommands::Init { force } => init_config(&paths, force, output),
        ConfigCommands::Path => show_paths(&paths, output),
    }
}

fn section(title: &str, rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![Cell::new(title)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)]);
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    table
}

fn show_config(paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    let exists = config_file.exists();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }
            println!("\n{}", "Configuration".bright_cyan().bold());
            if exists {
                println!("{}\n", config_file.display().dimmed());
            } else {
                println!("{}\n", "No config file, showing defaults".dimmed());
            }

            let data_dir = config
                .store
                .data_dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| format!("{} (default)", paths.data_dir().display()));
            println!("{}", section("Store", vec![("Data directory", data_dir)]));

            let t = &config.trends;
            println!(
                "{}",
                section(
                    "Trend thresholds",
                    vec![
                        ("Window (days)", t.window_days.to_string()),
                        ("Full confidence at", format!("{} snapshots", t.full_confidence_snapshots)),
                        ("Trending up: min consistency", format!("{:.2}", t.trending_up_min_consistency)),
                        ("Trending down: min drop", format!("{:.1} pts", t.trending_down_min_drop)),
                        ("Sleeper: max avg daily reviews", format!("{:.1}", t.sleeper_max_avg_daily_reviews)),
                        ("Sleeper: min snapshots", t.sleeper_min_snapshots.to_string()),
                        ("Rating change scale", format!("{:.1} pts", t.rating_change_scale)),
                        ("Anomaly z threshold", format!("{:.1}", t.anomaly_z_threshold)),
                        ("Anomaly min snapshots", t.anomaly_min_snapshots.to_string()),
                    ],
                )
            );

            println!(
                "{}",
                section(
                    "Dashboard",
                    vec![
                        ("Movers window (days)", config.movers.window_days.to_string()),
                        ("Movers limit", config.movers.limit.to_string()),
                        ("Latest releases limit", config.movers.recent_limit.to_string()),
                    ],
                )
            );

            let scheduler = config.scheduler_or_default();
            println!(
                "{}",
                section(
                    "Analysis",
                    vec![
                        ("Active window (days)", config.analysis.active_days.to_string()),
                        ("Concurrency", config.analysis.concurrency.to_string()),
                        ("Schedule", scheduler.schedule),
                        ("Run on startup", if scheduler.run_on_startup { "yes" } else { "no" }.to_string()),
                    ],
                )
            );
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.data(&json!({
                "config_file": config_file,
                "exists": exists,
                "config": config,
            }));
        }
    }
    Ok(())
}

fn init_config(paths: &PathManager, force: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_file.display()
        ));
        return Ok(());
    }

    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create directories: {}", e))?;
    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write config to {}: {}", config_file.display(), e))?;
    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}

fn show_paths(paths: &PathManager, output: &Output) -> Result<()> {
    output.info(format!("Config file: {}", paths.config_file().display()));
    output.info(format!("Data:        {}", paths.data_dir().display()));
    output.info(format!("Trends:      {}", paths.trends_dir().display()));
    output.info(format!("Logs:        {}", paths.log_dir().display()));
    Ok(())
}
