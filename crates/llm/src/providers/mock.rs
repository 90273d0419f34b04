//! Scripted completion client for tests and offline runs.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use ragcourse_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::Mutex;

type Handler = Box<dyn Fn(&LlmRequest) -> AppResult<String> + Send + Sync>;

/// Completion client that answers from a script instead of the network.
///
/// Either replays a queue of canned results in order, or computes each reply
/// from the request with a handler. Every request is recorded so tests can
/// inspect the prompt that was sent.
pub struct MockClient {
    script: Mutex<VecDeque<AppResult<String>>>,
    handler: Option<Handler>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockClient {
    /// Replay these results in order; extra requests fail with `AppError::Llm`.
    pub fn with_script(results: Vec<AppResult<String>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            handler: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with the same text.
    pub fn constant(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::with_handler(move |_| Ok(reply.clone()))
    }

    /// Compute each reply from the request.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&LlmRequest) -> AppResult<String> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            handler: Some(Box::new(handler)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self, request: &LlmRequest) -> AppResult<String> {
        if let Some(ref handler) = self.handler {
            return handler(request);
        }

        let mut script = self
            .script
            .lock()
            .map_err(|_| AppError::Other("Mock script lock poisoned".to_string()))?;
        script
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Llm("Mock script exhausted".to_string())))
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let content = self.next_reply(request)?;
        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_replays_in_order() {
        let client = MockClient::with_script(vec![
            Ok("first".to_string()),
            Err(AppError::RateLimit("429".to_string())),
        ]);
        let request = LlmRequest::new("q", "m");

        assert_eq!(client.complete(&request).await.unwrap().content, "first");
        assert!(matches!(
            client.complete(&request).await,
            Err(AppError::RateLimit(_))
        ));
        assert!(matches!(
            client.complete(&request).await,
            Err(AppError::Llm(_))
        ));
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_handler_sees_prompt() {
        let client = MockClient::with_handler(|req| Ok(req.prompt.to_uppercase()));
        let response = client.complete(&LlmRequest::new("csci070", "m")).await.unwrap();
        assert_eq!(response.content, "CSCI070");
        assert_eq!(client.requests()[0].prompt, "csci070");
    }

    #[tokio::test]
    async fn test_constant_reply() {
        let client = MockClient::constant("True");
        let response = client.complete(&LlmRequest::new("x", "m")).await.unwrap();
        assert_eq!(response.content, "True");
        assert_eq!(client.provider_name(), "mock");
    }
}
