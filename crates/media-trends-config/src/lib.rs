pub mod config;
pub mod paths;

pub use config::{AnalysisConfig, Config, MoversConfig, SchedulerConfig, StoreConfig, TrendThresholds, default_scheduler_config, MAX_WINDOW_DAYS};
pub use paths::{PathManager, container_base_path};
