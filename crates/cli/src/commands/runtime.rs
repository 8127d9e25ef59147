//! Wiring shared by the commands: config, history store, controller.

use std::sync::Arc;
use agentlab_agent::ReactController;
use agentlab_config::AppConfig;
use agentlab_core::memory::HistoryStore;
use agentlab_core::{Error, Result};
use agentlab_memory::InMemoryHistory;
use tracing::debug;

pub fn load_config() -> Result<AppConfig> {
    AppConfig::load().map_err(|e| Error::Config {
        message: e.to_string(),
    })
}

/// Open the configured history store.
pub async fn open_history(config: &AppConfig) -> Result<Arc<dyn HistoryStore>> {
    let store: Arc<dyn HistoryStore> = match config.memory.backend.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => Arc::new(agentlab_memory::SqliteHistory::open_file(&config.memory.path).await?),
        "in_memory" => Arc::new(InMemoryHistory::new()),
        other => {
            return Err(Error::Internal(format!(
                "memory backend '{other}' is not available in this build"
            )));
        }
    };
    debug!(backend = store.name(), "History store ready");
    Ok(store)
}

/// Build a controller over the configured generator, the built-in tools and
/// `history`.
pub fn build_controller(config: &AppConfig, history: Arc<dyn HistoryStore>) -> Result<ReactController> {
    let generator = agentlab_providers::build_from_config(config)?;
    let tools = Arc::new(agentlab_tools::default_registry());
    Ok(ReactController::new(generator, tools, history).with_config(&config.agent))
}
