use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub trends: TrendThresholds,
    #[serde(default)]
    pub movers: MoversConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the exported tables; defaults to the PathManager data dir
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Classification and anomaly thresholds.
///
/// None of these are calibrated against product data yet; they are kept in
/// config so they can be tuned without a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendThresholds {
    /// Trailing window, measured back from the latest observation
    #[serde(default = "default_window_days")]
    pub window_days: i64,

    /// Sample size at which confidence stops growing with more snapshots
    #[serde(default = "default_full_confidence_snapshots")]
    pub full_confidence_snapshots: u32,

    #[serde(default = "default_trending_up_min_consistency")]
    pub trending_up_min_consistency: f64,

    /// Minimum 24h rating drop (percentage points) for trending_down
    #[serde(default = "default_trending_down_min_drop")]
    pub trending_down_min_drop: f64,

    #[serde(default = "default_sleeper_max_avg_daily_reviews")]
    pub sleeper_max_avg_daily_reviews: f64,

    #[serde(default = "default_sleeper_min_snapshots")]
    pub sleeper_min_snapshots: usize,

    /// Rating change (percentage points) treated as a full-strength signal
    #[serde(default = "default_rating_change_scale")]
    pub rating_change_scale: f64,

    #[serde(default = "default_anomaly_z_threshold")]
    pub anomaly_z_threshold: f64,

    #[serde(default = "default_anomaly_min_snapshots")]
    pub anomaly_min_snapshots: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoversConfig {
    /// Only movies with a headline snapshot this recent appear on the board
    #[serde(default = "default_movers_window_days")]
    pub window_days: i64,
    #[serde(default = "default_movers_limit")]
    pub limit: usize,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Movies released within this many days are re-analyzed
    #[serde(default = "default_active_days")]
    pub active_days: i64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    /// Six-field cron expression (seconds first)
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

/// Longest trailing window accepted for classification and the movers board
pub const MAX_WINDOW_DAYS: i64 = 3650;

fn default_true() -> bool {
    true
}

fn default_window_days() -> i64 {
    7
}

fn default_full_confidence_snapshots() -> u32 {
    7
}

fn default_trending_up_min_consistency() -> f64 {
    0.6
}

fn default_trending_down_min_drop() -> f64 {
    1.0
}

fn default_sleeper_max_avg_daily_reviews() -> f64 {
    5.0
}

fn default_sleeper_min_snapshots() -> usize {
    5
}

fn default_rating_change_scale() -> f64 {
    5.0
}

fn default_anomaly_z_threshold() -> f64 {
    2.0
}

fn default_anomaly_min_snapshots() -> usize {
    3
}

fn default_movers_window_days() -> i64 {
    7
}

fn default_movers_limit() -> usize {
    20
}

fn default_recent_limit() -> usize {
    12
}

fn default_active_days() -> i64 {
    30
}

fn default_concurrency() -> usize {
    4
}

fn default_schedule() -> String {
    "0 0 * * * *".to_string() // Hourly, on the hour
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        schedule: default_schedule(),
        run_on_startup: default_true(),
    }
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            full_confidence_snapshots: default_full_confidence_snapshots(),
            trending_up_min_consistency: default_trending_up_min_consistency(),
            trending_down_min_drop: default_trending_down_min_drop(),
            sleeper_max_avg_daily_reviews: default_sleeper_max_avg_daily_reviews(),
            sleeper_min_snapshots: default_sleeper_min_snapshots(),
            rating_change_scale: default_rating_change_scale(),
            anomaly_z_threshold: default_anomaly_z_threshold(),
            anomaly_min_snapshots: default_anomaly_min_snapshots(),
        }
    }
}

impl Default for MoversConfig {
    fn default() -> Self {
        Self {
            window_days: default_movers_window_days(),
            limit: default_movers_limit(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            active_days: default_active_days(),
            concurrency: default_concurrency(),
        }
    }
}

impl TrendThresholds {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            return Err(anyhow::anyhow!(
                "trends.window_days must be between 1 and {}",
                MAX_WINDOW_DAYS
            ));
        }
        if self.full_confidence_snapshots == 0 {
            return Err(anyhow::anyhow!("trends.full_confidence_snapshots must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.trending_up_min_consistency) {
            return Err(anyhow::anyhow!("trends.trending_up_min_consistency must be between 0 and 1"));
        }
        if !self.trending_down_min_drop.is_finite() || self.trending_down_min_drop < 0.0 {
            return Err(anyhow::anyhow!("trends.trending_down_min_drop must be non-negative"));
        }
        if !self.sleeper_max_avg_daily_reviews.is_finite() || self.sleeper_max_avg_daily_reviews < 0.0 {
            return Err(anyhow::anyhow!("trends.sleeper_max_avg_daily_reviews must be non-negative"));
        }
        if self.sleeper_min_snapshots < 2 {
            return Err(anyhow::anyhow!("trends.sleeper_min_snapshots must be at least 2"));
        }
        if !self.rating_change_scale.is_finite() || self.rating_change_scale <= 0.0 {
            return Err(anyhow::anyhow!("trends.rating_change_scale must be positive"));
        }
        if !self.anomaly_z_threshold.is_finite() || self.anomaly_z_threshold <= 0.0 {
            return Err(anyhow::anyhow!("trends.anomaly_z_threshold must be positive"));
        }
        if self.anomaly_min_snapshots < 3 {
            return Err(anyhow::anyhow!("trends.anomaly_min_snapshots must be at least 3"));
        }
        Ok(())
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, or defaults when it has not been created yet
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::load_from_file(path)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.trends.validate()?;

        if !(1..=MAX_WINDOW_DAYS).contains(&self.movers.window_days) {
            return Err(anyhow::anyhow!(
                "movers.window_days must be between 1 and {}",
                MAX_WINDOW_DAYS
            ));
        }
        if self.analysis.active_days < 0 {
            return Err(anyhow::anyhow!("analysis.active_days must be non-negative"));
        }
        if self.analysis.concurrency == 0 {
            return Err(anyhow::anyhow!("analysis.concurrency must be at least 1"));
        }
        if let Some(scheduler) = &self.scheduler {
            // Seconds, minutes, hours, day of month, month, day of week (optional year)
            let fields = scheduler.schedule.split_whitespace().count();
            if !(6..=7).contains(&fields) {
                return Err(anyhow::anyhow!(
                    "scheduler.schedule must have 6 or 7 fields, got {}: '{}'",
                    fields,
                    scheduler.schedule
                ));
            }
        }

        Ok(())
    }

    /// Scheduler section, falling back to defaults when absent
    pub fn scheduler_or_default(&self) -> SchedulerConfig {
        self.scheduler.clone().unwrap_or_else(default_scheduler_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.trends.anomaly_z_threshold = 3.5;
        config.movers.limit = 5;
        config.scheduler = Some(SchedulerConfig {
            schedule: "0 */30 * * * *".to_string(),
            run_on_startup: false,
        });

        let path = file.path().to_path_buf();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.trends.anomaly_z_threshold, 3.5);
        assert_eq!(loaded.movers.limit, 5);
        assert_eq!(loaded.scheduler.as_ref().unwrap().schedule, "0 */30 * * * *");
        assert!(!loaded.scheduler.as_ref().unwrap().run_on_startup);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [trends]
            window_days = 14
            "#,
        )
        .unwrap();

        assert_eq!(config.trends.window_days, 14);
        assert_eq!(config.trends.trending_up_min_consistency, 0.6);
        assert_eq!(config.movers, MoversConfig::default());
        assert_eq!(config.analysis.active_days, 30);
        assert!(config.scheduler.is_none());
        assert_eq!(config.scheduler_or_default(), default_scheduler_config());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.trends, TrendThresholds::default());
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.trends.trending_up_min_consistency = 1.5;
        assert!(config.validate().is_err());
        config.trends.trending_up_min_consistency = 0.6;

        config.trends.rating_change_scale = 0.0;
        assert!(config.validate().is_err());
        config.trends.rating_change_scale = 5.0;

        config.trends.window_days = 200_000_000;
        assert!(config.validate().is_err());
        config.trends.window_days = MAX_WINDOW_DAYS;
        assert!(config.validate().is_ok());

        config.movers.window_days = MAX_WINDOW_DAYS + 1;
        assert!(config.validate().is_err());
        config.movers.window_days = 7;

        config.analysis.concurrency = 0;
        assert!(config.validate().is_err());
        config.analysis.concurrency = 2;

        config.scheduler = Some(SchedulerConfig {
            schedule: "0 */6 * * *".to_string(),
            run_on_startup: true,
        });
        assert!(config.validate().is_err());
    }
}
