//! Completion client crate for ragcourse.
//!
//! This crate provides a provider-agnostic abstraction over text-completion
//! endpoints. A client takes a prompt and returns the generated text verbatim,
//! or a typed failure (`Transport`, `Auth`, `RateLimit`, `Llm`). Clients never
//! retry; retry policy belongs to the caller.
//!
//! # Providers
//! - **Groq**: OpenAI-compatible chat completions (default)
//! - **Ollama**: Local LLM runtime
//! - **Mock**: Scripted responses for tests
//!
//! # Example
//! ```no_run
//! use ragcourse_llm::{LlmClient, LlmRequest, providers::GroqClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GroqClient::new(Some("gsk_...".to_string()))?;
//! let request = LlmRequest::new("Which courses require CSCI070?", "llama-3.1-70b-versatile");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GroqClient, MockClient, OllamaClient};
pub use types::ProviderType;
