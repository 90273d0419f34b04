//! Benchmark replay and scoring.

use crate::classify::TextToBool;
use crate::dataset::BenchmarkCase;
use ragcourse_core::{AppError, AppResult};
use ragcourse_knowledge::AnsweringSession;
use ragcourse_prompt::{builtin_prompt, render_template, PromptDefinition, TRUE_FALSE_PROMPT_ID};
use serde::Serialize;
use std::io::Write;

const SEPARATOR_WIDTH: usize = 70;

/// Lifecycle of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EvaluationState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Success and failure counts of one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationRun {
    pub success: usize,
    pub failure: usize,
}

impl EvaluationRun {
    pub fn total(&self) -> usize {
        self.success + self.failure
    }

    /// `success / total`, or `None` when no cases ran.
    pub fn ratio(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.success as f64 / total as f64),
        }
    }

    fn record(&mut self, correct: bool) {
        if correct {
            self.success += 1;
        } else {
            self.failure += 1;
        }
    }
}

/// Replays benchmark cases through an answering session.
pub struct Evaluator<'a> {
    session: &'a AnsweringSession<'a>,
    classifier: &'a dyn TextToBool,
    prompt: Option<PromptDefinition>,
    state: EvaluationState,
    run: EvaluationRun,
}

impl<'a> Evaluator<'a> {
    pub fn new(session: &'a AnsweringSession<'a>, classifier: &'a dyn TextToBool) -> Self {
        Self {
            session,
            classifier,
            prompt: builtin_prompt(TRUE_FALSE_PROMPT_ID),
            state: EvaluationState::Idle,
            run: EvaluationRun::default(),
        }
    }

    /// Wrap statements in this prompt instead of the built-in few-shot prompt.
    pub fn with_prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Send statements to the session as-is.
    pub fn without_prompt(mut self) -> Self {
        self.prompt = None;
        self
    }

    pub fn state(&self) -> EvaluationState {
        self.state
    }

    /// Counts so far; partial when the evaluation failed.
    pub fn run(&self) -> EvaluationRun {
        self.run
    }

    /// Evaluate all cases, printing the trace and summary to stdout.
    pub async fn evaluate(&mut self, cases: &[BenchmarkCase]) -> AppResult<EvaluationRun> {
        let mut out = std::io::stdout();
        self.evaluate_to(cases, &mut out).await
    }

    /// Evaluate all cases, writing the trace and summary to `out`.
    ///
    /// The first completion failure stops the evaluation: the state becomes
    /// [`EvaluationState::Failed`], the error is returned and no summary is
    /// written.
    pub async fn evaluate_to<W: Write>(
        &mut self,
        cases: &[BenchmarkCase],
        out: &mut W,
    ) -> AppResult<EvaluationRun> {
        self.state = EvaluationState::Running;
        self.run = EvaluationRun::default();

        tracing::info!("Evaluating {} benchmark cases", cases.len());

        for (index, case) in cases.iter().enumerate() {
            let predicted = match self.predict(&case.question).await {
                Ok(predicted) => predicted,
                Err(e) => {
                    self.state = EvaluationState::Failed;
                    tracing::error!("Evaluation stopped at case {}: {}", index + 1, e);
                    return Err(e);
                }
            };

            writeln!(out, "Question: {}", case.question)?;
            writeln!(out, "Actual labels: {}", label(case.expected))?;
            writeln!(out, "Predicted labels: {}", label(predicted))?;
            writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;

            self.run.record(predicted == case.expected);
        }

        self.state = EvaluationState::Completed;
        write_summary(out, &self.run)?;

        Ok(self.run)
    }

    async fn predict(&self, statement: &str) -> AppResult<bool> {
        let answer = match self.prompt {
            Some(ref definition) => {
                let wrapped = render_template(
                    &definition.template,
                    &serde_json::json!({ "question": statement }),
                )?;
                self.session.answer_with_query(&wrapped, statement).await?
            }
            None => self.session.answer(statement).await?,
        };

        let predicted = self.classifier.to_bool(&answer);
        tracing::debug!("Answer {:?} classified as {}", answer, predicted);
        Ok(predicted)
    }
}

fn label(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn write_summary<W: Write>(out: &mut W, run: &EvaluationRun) -> AppResult<()> {
    writeln!(out, "Success: {}", run.success)?;
    writeln!(out, "Failure: {}", run.failure)?;
    match run.ratio() {
        Some(ratio) => writeln!(out, "Success ratio: {:.2}", ratio)?,
        None => writeln!(out, "No data")?,
    }
    out.flush().map_err(AppError::from)
}
