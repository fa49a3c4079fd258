//! Wires an orchestrator together from configuration.

use std::sync::Arc;
use jarvis_config::AppConfig;
use jarvis_core::Error;
use jarvis_memory::{JsonFileStore, MemoryLog};
use jarvis_tools::DuckDuckGoSearch;
use tracing::info;

use crate::orchestrator::TurnOrchestrator;

/// Load the memory log configured in `config`.
pub async fn load_memory(config: &AppConfig) -> Arc<MemoryLog> {
    let store = Arc::new(JsonFileStore::new(config.memory.resolved_path()));
    Arc::new(MemoryLog::load(store, config.memory.max_turns).await)
}

/// Build the orchestrator hosts use: default provider, file-backed memory,
/// and DuckDuckGo search when enabled.
pub async fn build_orchestrator(config: &AppConfig) -> Result<TurnOrchestrator, Error> {
    let router = jarvis_providers::build_from_config(config);
    let provider = router.default().ok_or_else(|| Error::Config {
        message: format!("provider '{}' is not configured", config.default_provider),
    })?;
    let model = jarvis_providers::resolve_model(config);
    let memory = load_memory(config).await;

    info!(
        provider = %config.default_provider,
        model = %model,
        turns = memory.len().await,
        "Assistant ready"
    );

    let mut orchestrator = TurnOrchestrator::from_config(config, provider, model, memory);
    if config.search.enabled {
        orchestrator =
            orchestrator.with_search(Arc::new(DuckDuckGoSearch::from_config(&config.search)));
    }
    Ok(orchestrator)
}
