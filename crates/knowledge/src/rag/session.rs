//! Question answering over the article store.
//!
//! Each question is handled on its own: retrieve articles, assemble the
//! labeled prompt, send it to the completion client and return the raw text.
//! Nothing carries over from one question to the next.

use super::assemble;
use super::types::RagResponse;
use crate::retriever::{Retriever, DEFAULT_TOP_K};
use crate::store::ArticleStore;
use ragcourse_core::AppResult;
use ragcourse_llm::{LlmClient, LlmRequest};
use ragcourse_prompt::{build_prompt, BuiltPrompt, PromptDefinition};
use std::sync::Arc;

/// Answers questions from one store with one completion client.
pub struct AnsweringSession<'a> {
    store: &'a ArticleStore,
    client: Arc<dyn LlmClient>,
    model: String,
    top_k: usize,
    prompt: Option<PromptDefinition>,
    seed: Option<u64>,
}

impl<'a> AnsweringSession<'a> {
    pub fn new(store: &'a ArticleStore, client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            store,
            client,
            model: model.into(),
            top_k: DEFAULT_TOP_K,
            prompt: None,
            seed: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Use this prompt definition instead of the built-in answer prompt.
    pub fn with_prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Fixed sampling seed for reproducible completions.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer a question. Returns the model's raw text.
    pub async fn answer(&self, question: &str) -> AppResult<String> {
        self.answer_with_query(question, question).await
    }

    /// Retrieve with `retrieval_query` but ask the model `prompt_text`.
    pub async fn answer_with_query(
        &self,
        prompt_text: &str,
        retrieval_query: &str,
    ) -> AppResult<String> {
        Ok(self.respond(prompt_text, retrieval_query).await?.answer)
    }

    /// Answer and report which articles were shown to the model.
    pub async fn respond(&self, prompt_text: &str, retrieval_query: &str) -> AppResult<RagResponse> {
        tracing::info!("Answering question: {}", retrieval_query);

        let result = Retriever::new(self.store)
            .with_top_k(self.top_k)
            .retrieve(retrieval_query)?;

        let built = match self.prompt {
            Some(ref definition) => build_prompt(definition, prompt_text, result.texts())?,
            None => assemble(prompt_text, &result)?,
        };

        let answer = self.complete(built).await?;
        Ok(RagResponse::new(answer, &result))
    }

    async fn complete(&self, built: BuiltPrompt) -> AppResult<String> {
        let mut request = LlmRequest::new(built.user, self.model.clone());
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(seed) = self.seed {
            request = request.with_seed(seed);
        }

        tracing::debug!(
            "Sending prompt with {} articles to {}",
            built.metadata.article_labels.len(),
            self.client.provider_name()
        );

        let response = self.client.complete(&request).await?;

        tracing::info!(
            "Received answer ({} prompt / {} completion tokens)",
            response.usage.prompt_tokens,
            response.usage.completion_tokens
        );

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceText;
    use ragcourse_core::AppError;
    use ragcourse_llm::MockClient;
    use tempfile::TempDir;

    const CSCI070: &str =
        "CSCI070 Data Structures and Program Development. Prerequisites: CSCI042 or CSCI060.";

    fn catalog(dir: &TempDir) -> ArticleStore {
        let (store, _) = ArticleStore::build(
            &dir.path().join("catalog.db"),
            vec![
                SourceText::new(CSCI070).with_source("https://www.hmc.edu/cs/csci070"),
                SourceText::new("Students may take up to 18 credits without overload."),
            ],
        )
        .unwrap();
        store
    }

    /// Answers from ARTICLE0 and cites it, or says nothing was found.
    fn echo_first_article() -> MockClient {
        MockClient::with_handler(|req| {
            Ok(req
                .prompt
                .lines()
                .find_map(|line| line.strip_prefix("ARTICLE0: "))
                .map(|text| format!("According to ARTICLE0: {}", text))
                .unwrap_or_else(|| "No relevant information was found.".to_string()))
        })
    }

    #[tokio::test]
    async fn test_answer_is_grounded_in_top_article() {
        let dir = TempDir::new().unwrap();
        let store = catalog(&dir);
        let client = Arc::new(echo_first_article());
        let session = AnsweringSession::new(&store, client.clone(), "test-model");

        let answer = session
            .answer("What are prerequisites for CSCI070?")
            .await
            .unwrap();
        assert!(answer.contains("ARTICLE0"));
        assert!(answer.contains("CSCI042"));
        assert!(answer.contains("CSCI060"));

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "test-model");
        assert!(requests[0].prompt.contains(&format!("ARTICLE0: {}", CSCI070)));
        assert!(!requests[0].prompt.contains("ARTICLE1"));
        assert!(requests[0].prompt.contains("QUESTION: What are prerequisites for CSCI070?"));
        assert!(requests[0].system.as_deref().unwrap().contains("college adviser"));
    }

    #[tokio::test]
    async fn test_no_match_still_asks_with_no_context_prompt() {
        let dir = TempDir::new().unwrap();
        let store = catalog(&dir);
        let client = Arc::new(echo_first_article());
        let session = AnsweringSession::new(&store, client.clone(), "m");

        let answer = session.answer("Who coaches the water polo team?").await.unwrap();
        assert_eq!(answer, "No relevant information was found.");
        let requests = client.requests();
        assert!(!requests[0].prompt.contains("ARTICLE"));
    }

    #[tokio::test]
    async fn test_completion_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let store = catalog(&dir);
        let client = Arc::new(MockClient::with_script(vec![Err(AppError::Transport(
            "connection refused".to_string(),
        ))]));
        let session = AnsweringSession::new(&store, client, "m");

        let err = session.answer("CSCI070?").await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[tokio::test]
    async fn test_questions_are_independent() {
        let dir = TempDir::new().unwrap();
        let store = catalog(&dir);
        let client = Arc::new(MockClient::constant("ok"));
        let session = AnsweringSession::new(&store, client.clone(), "m");

        session.answer("CSCI070 prerequisites").await.unwrap();
        session.answer("credits overload").await.unwrap();

        let requests = client.requests();
        assert!(!requests[1].prompt.contains("CSCI070 prerequisites"));
        assert!(requests[1].prompt.contains("ARTICLE0: Students may take"));
    }

    #[tokio::test]
    async fn test_answer_with_query_retrieves_with_the_query() {
        let dir = TempDir::new().unwrap();
        let store = catalog(&dir);
        let client = Arc::new(MockClient::constant("True"));
        let session = AnsweringSession::new(&store, client.clone(), "m").with_top_k(1);

        let response = session
            .respond("Wrapped: is it true?", "CSCI070 prerequisites")
            .await
            .unwrap();
        assert_eq!(response.answer, "True");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(
            response.sources[0].source.as_deref(),
            Some("https://www.hmc.edu/cs/csci070")
        );
        let requests = client.requests();
        assert!(requests[0].prompt.contains("QUESTION: Wrapped: is it true?"));
    }

    #[tokio::test]
    async fn test_custom_prompt_and_seed() {
        let dir = TempDir::new().unwrap();
        let store = catalog(&dir);
        let client = Arc::new(MockClient::constant("ok"));
        let session = AnsweringSession::new(&store, client.clone(), "m")
            .with_seed(7)
            .with_prompt(PromptDefinition {
                id: "custom".to_string(),
                title: "Custom".to_string(),
                api_version: "1.0".to_string(),
                system: None,
                template: "{{question}} / {{#each articles}}[{{this}}]{{/each}}".to_string(),
            });

        session.answer("credits").await.unwrap();
        let requests = client.requests();
        let request = &requests[0];
        assert_eq!(
            request.prompt,
            "credits / [Students may take up to 18 credits without overload.]"
        );
        assert_eq!(request.seed, Some(7));
        assert!(request.system.is_none());
    }
}
