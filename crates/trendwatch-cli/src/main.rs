use clap::{ArgAction, Parser, Subcommand};
use commands::{analyze, clear, config, daemon, dashboard};
use context::AppContext;
use media_trends_config::PathManager;
use std::path::PathBuf;

mod commands;
mod context;
mod logging;
mod output;
mod render;

#[derive(Parser)]
#[command(name = "trendwatch")]
#[command(about = "Trendwatch - Which movies are heating up with critics right now")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Directory holding the exported rating tables (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Biggest 24h rating movers
    #[command(long_about = "List the movies whose headline rating moved the most over the last 24 hours, among movies with a rating snapshot in the last week.")]
    Movers {
        /// Maximum number of movies to list
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Latest releases
    Recent {
        /// Maximum number of movies to list
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one movie: trend badge, review activity chart and critic reviews
    Show {
        /// TMDB id of the movie
        tmdb_id: u32,
    },
    /// Recompute trends for recently released movies (one-time run)
    #[command(long_about = "Classify every movie released within the active window and store the result. Movies whose snapshots cannot be read keep their previous trend.")]
    Analyze,
    /// Run as daemon with internal scheduler
    #[command(long_about = "Run in the foreground and recompute trends on the configured cron schedule until interrupted. An initial run happens on startup unless --no-startup-run is specified.")]
    Daemon {
        /// Six-field cron schedule (e.g., '0 0 */6 * * *' for every 6 hours)
        #[arg(long, value_name = "SCHEDULE")]
        schedule: Option<String>,

        /// Skip the initial run on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_run: bool,
    },
    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Clear stored data
    Clear {
        /// Clear stored trends (recomputed on the next analyze run)
        #[arg(long, action = ArgAction::SetTrue)]
        trends: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Print the config, data and log locations
    Path,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match &cli.command {
        Commands::Daemon { .. } => {
            let log_file = PathManager::default().daemon_log_file();
            logging::init_file_logging(cli.verbose, cli.quiet, &log_file)
        }
        _ => logging::init_logging(cli.verbose, cli.quiet),
    }
    .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    let data_dir = cli.data_dir;
    let context = || AppContext::load(data_dir.clone());

    match cli.command {
        Commands::Movers { limit } => dashboard::run_movers(&context()?, limit, &output).await,
        Commands::Recent { limit } => dashboard::run_recent(&context()?, limit, &output).await,
        Commands::Show { tmdb_id } => dashboard::run_show(&context()?, tmdb_id, &output).await,
        Commands::Analyze => analyze::run_analyze(&context()?, &output).await,
        Commands::Daemon {
            schedule,
            no_startup_run,
        } => daemon::run_daemon(&context()?, schedule, no_startup_run, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output),
        Commands::Clear { trends } => clear::run_clear(&context()?, trends, &output),
    }
}
