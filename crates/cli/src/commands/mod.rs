//! Command handlers for the ragcourse CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod build;
pub mod eval;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use build::BuildCommand;
pub use eval::EvalCommand;
pub use stats::StatsCommand;

use ragcourse_core::config::{AppConfig, ProviderConfig};
use ragcourse_core::AppResult;
use ragcourse_knowledge::{AnsweringSession, ArticleStore};
use ragcourse_llm::{create_client, LlmClient};
use ragcourse_prompt::{load_prompt, ANSWER_PROMPT_ID};
use std::sync::Arc;

/// Create the completion client for the configured provider.
pub fn completion_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let provider = config.provider.as_str();

    let timeout = match config.get_provider_config(provider) {
        Some(ProviderConfig::Ollama { timeout, .. }) => *timeout,
        _ => None,
    };
    let endpoint = config.endpoint_for(provider);
    let api_key = config.resolve_api_key(provider);

    tracing::debug!("Creating {} client (endpoint: {:?})", provider, endpoint);
    create_client(provider, endpoint.as_deref(), api_key.as_deref(), timeout)
}

/// Build an answering session over `store` from the configuration.
pub fn open_session<'a>(
    config: &AppConfig,
    store: &'a ArticleStore,
) -> AppResult<AnsweringSession<'a>> {
    let client = completion_client(config)?;
    let prompt = load_prompt(&config.workspace, ANSWER_PROMPT_ID)?;

    Ok(AnsweringSession::new(store, client, config.model.clone())
        .with_top_k(config.top_k)
        .with_prompt(prompt))
}
