use crate::commands::analyze::recomputer;
use crate::context::AppContext;
use crate::output::Output;
use chrono::Utc;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use media_trends_config::SchedulerConfig;
use media_trends_core::TrendRecomputer;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

pub struct Scheduler {
    scheduler: JobScheduler,
    recomputer: TrendRecomputer,
    config: SchedulerConfig,
}

impl Scheduler {
    pub async fn new(recomputer: TrendRecomputer, config: SchedulerConfig) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler,
            recomputer,
            config,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.config.run_on_startup {
            info!(
                operation = "scheduler_startup",
                "Running initial recompute on startup"
            );
            run_recompute(&self.recomputer, "startup").await;
        }

        let recomputer = self.recomputer.clone();
        let job = Job::new_async(self.config.schedule.as_str(), move |_uuid, _scheduler| {
            let recomputer = recomputer.clone();
            Box::pin(async move {
                run_recompute(&recomputer, "scheduled").await;
            })
        })
        .map_err(|e| eyre!("Invalid schedule '{}': {}", self.config.schedule, e))?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;

        info!(
            operation = "scheduler_started",
            schedule = %self.config.schedule,
            "Scheduler started"
        );
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        info!(operation = "scheduler_stopped", "Scheduler stopped");
        Ok(())
    }
}

/// One recompute pass; failures are logged and the next tick retries
async fn run_recompute(recomputer: &TrendRecomputer, trigger: &'static str) {
    info!(operation = "recompute_trigger", trigger = trigger, "Starting trend recompute");
    match recomputer.run(Utc::now()).await {
        Ok(report) => {
            info!(
                operation = "recompute_complete",
                trigger = trigger,
                analyzed = report.analyzed,
                failed = report.failed,
                duration_ms = report.duration.as_millis() as u64,
                "Trend recompute finished"
            );
        }
        Err(e) => {
            error!(
                operation = "recompute_error",
                trigger = trigger,
                error = %e,
                "Trend recompute failed"
            );
        }
    }
}

pub async fn run_daemon(
    ctx: &AppContext,
    schedule_override: Option<String>,
    no_startup_run: bool,
    output: &Output,
) -> Result<()> {
    let mut config = ctx.config.scheduler_or_default();
    if let Some(schedule) = schedule_override {
        config.schedule = schedule;
    }
    if no_startup_run {
        config.run_on_startup = false;
    }

    output.info(format!(
        "Recomputing trends on schedule '{}' (logs: {})",
        config.schedule,
        ctx.paths.daemon_log_file().display()
    ));

    let mut scheduler = Scheduler::new(recomputer(ctx), config)
        .await
        .map_err(|e| eyre!("Failed to create scheduler: {}", e))?;
    scheduler.start().await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| eyre!("Failed to listen for shutdown signal: {}", e))?;
    info!(operation = "shutdown_signal", "Shutdown requested");

    scheduler.shutdown().await?;
    output.success("Daemon stopped");
    Ok(())
}
