//! Completion provider factory.
//!
//! Resolves a provider name to a client. The credential is an explicit
//! argument; the factory never reads the environment.

use crate::client::LlmClient;
use crate::providers::{GroqClient, OllamaClient};
use crate::types::{ProviderType, OLLAMA_BASE_URL};
use ragcourse_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create a completion client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("groq", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key for providers that require one
/// * `timeout_secs` - Optional request timeout
///
/// # Errors
/// - `AppError::Config` if the provider is unknown
/// - `AppError::Auth` if a credentialed provider gets no key
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout_secs: Option<u64>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider).ok_or_else(|| {
        AppError::Config(format!(
            "Unknown provider: {}. Supported: groq, ollama",
            provider
        ))
    })?;

    let timeout = timeout_secs.map(Duration::from_secs);

    match provider_type {
        ProviderType::Groq => {
            let mut client = GroqClient::new(api_key.map(str::to_string))?;
            if let Some(endpoint) = endpoint {
                client = client.with_base_url(endpoint);
            }
            if let Some(timeout) = timeout {
                client = client.with_timeout(timeout)?;
            }
            Ok(Arc::new(client))
        }
        ProviderType::Ollama => {
            let mut client = OllamaClient::with_base_url(endpoint.unwrap_or(OLLAMA_BASE_URL));
            if let Some(timeout) = timeout {
                client = client.with_timeout(timeout)?;
            }
            Ok(Arc::new(client))
        }
    }
}
