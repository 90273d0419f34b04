//! Eval command handler.
//!
//! Replays a true/false benchmark through the answering pipeline.

use super::open_session;
use clap::Args;
use ragcourse_core::{config::AppConfig, AppError, AppResult};
use ragcourse_eval::{load_dataset, Evaluator, NegationCueClassifier};
use ragcourse_knowledge::ArticleStore;
use ragcourse_prompt::{load_prompt, TRUE_FALSE_PROMPT_ID};
use std::path::PathBuf;

/// Score the pipeline against a labeled true/false benchmark
#[derive(Args, Debug)]
pub struct EvalCommand {
    /// JSONL file with `question` and `answer` fields
    #[arg(long)]
    pub dataset: PathBuf,

    /// Sampling seed passed to the completion endpoint
    #[arg(long)]
    pub seed: Option<u64>,

    /// Send statements without the few-shot true/false prompt
    #[arg(long)]
    pub raw: bool,
}

impl EvalCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing eval command");
        tracing::debug!("Eval options: {:?}", self);

        let dataset = if self.dataset.is_absolute() {
            self.dataset.clone()
        } else {
            config.workspace.join(&self.dataset)
        };
        let cases = load_dataset(&dataset)?;

        let store = ArticleStore::open(&config.db_path())?;
        let mut session = open_session(config, &store)?;
        if let Some(seed) = self.seed {
            session = session.with_seed(seed);
        }

        let classifier = NegationCueClassifier;
        let evaluator = Evaluator::new(&session, &classifier);
        let mut evaluator = if self.raw {
            evaluator.without_prompt()
        } else {
            evaluator.with_prompt(load_prompt(&config.workspace, TRUE_FALSE_PROMPT_ID)?)
        };

        match evaluator.evaluate(&cases).await {
            Ok(run) => {
                tracing::info!(
                    success = run.success,
                    failure = run.failure,
                    "Evaluation completed"
                );
                Ok(())
            }
            Err(e) => {
                let partial = evaluator.run();
                Err(AppError::Evaluation(format!(
                    "stopped after {} of {} cases: {}",
                    partial.total(),
                    cases.len(),
                    e
                )))
            }
        }
    }
}
