use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use media_trends_config::{Config, PathManager};
use media_trends_core::TrendClassifier;
use media_trends_store::{DirectoryStore, StoreAccessor};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Resolved paths, configuration and store shared by the commands
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
    pub store: Arc<DirectoryStore>,
    pub accessor: StoreAccessor,
}

impl AppContext {
    /// Data directory precedence: `--data-dir`, then `[store] data_dir`, then the default location
    pub fn load(data_dir_override: Option<PathBuf>) -> Result<Self> {
        let paths = PathManager::default();
        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

        let paths = match data_dir_override.or_else(|| config.store.data_dir.clone()) {
            Some(data_dir) => paths.with_data_dir(data_dir),
            None => paths,
        };
        std::fs::create_dir_all(paths.trends_dir())
            .wrap_err_with(|| format!("Failed to create {}", paths.trends_dir().display()))?;

        debug!(
            config_file = %config_file.display(),
            data_dir = %paths.data_dir().display(),
            "Resolved application context"
        );

        let store = Arc::new(DirectoryStore::new(paths.data_dir(), &paths.trends_dir()));
        let accessor = StoreAccessor::new(store.clone());
        Ok(Self {
            paths,
            config,
            store,
            accessor,
        })
    }

    pub fn classifier(&self) -> TrendClassifier {
        TrendClassifier::new(self.config.trends.clone())
    }
}
