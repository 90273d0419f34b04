//! Provider identification.

/// Default Groq API base URL (OpenAI-compatible).
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default Ollama base URL.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Groq,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "groq" => Some(Self::Groq),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::Ollama => "ollama",
        }
    }

    /// Whether the provider needs an API credential.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Groq)
    }
}
