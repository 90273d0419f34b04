//! Ask command handler.
//!
//! Answers one question, or runs the interactive question loop when no
//! question is given.

use super::open_session;
use clap::Args;
use ragcourse_core::{config::AppConfig, AppError, AppResult};
use ragcourse_knowledge::{AnsweringSession, ArticleStore};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Prompt shown before each interactive question.
pub const PROMPT: &str = "ragcourse> ";

/// Ask a question about the course catalog
#[derive(Args, Debug, Default)]
pub struct AskCommand {
    /// The question to ask (omit for an interactive session)
    pub question: Option<String>,

    /// List the labeled articles the answer was based on
    #[arg(long)]
    pub sources: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let store = ArticleStore::open(&config.db_path())?;
        let session = open_session(config, &store)?;

        match self.question {
            Some(ref question) => self.answer_once(&session, question).await,
            None => {
                let stdin = BufReader::new(tokio::io::stdin());
                run_interactive(&session, stdin, &mut std::io::stdout(), &mut std::io::stderr())
                    .await
            }
        }
    }

    async fn answer_once(&self, session: &AnsweringSession<'_>, question: &str) -> AppResult<()> {
        let response = session.respond(question, question).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&response)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        println!("{}", response.answer);

        if self.sources && !response.sources.is_empty() {
            println!();
            for source in &response.sources {
                println!(
                    "{}: {} ({})",
                    source.label,
                    source.title,
                    source.source.as_deref().unwrap_or("no source")
                );
            }
        }

        Ok(())
    }
}

/// Read questions line by line and print an answer for each.
///
/// Blank lines are skipped. The loop ends on end of input, `quit` or `exit`.
/// A failed question prints an error and the loop continues; Ctrl-C cancels
/// the question in flight.
pub async fn run_interactive<R, W, E>(
    session: &AnsweringSession<'_>,
    input: R,
    out: &mut W,
    err: &mut E,
) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    E: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                writeln!(out)?;
                continue;
            }
        };

        let Some(line) = line else {
            writeln!(out)?;
            break;
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "quit" || question == "exit" {
            break;
        }

        tokio::select! {
            result = session.answer(question) => match result {
                Ok(answer) => writeln!(out, "{}", answer)?,
                Err(e) => {
                    tracing::warn!("Question failed: {}", e);
                    writeln!(err, "Error: {}", e)?;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                writeln!(err, "\nCancelled")?;
            }
        }
    }

    tracing::info!("Interactive session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcourse_knowledge::SourceText;
    use ragcourse_llm::MockClient;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn catalog(dir: &TempDir) -> ArticleStore {
        let (store, _) = ArticleStore::build(
            &dir.path().join("catalog.db"),
            vec![SourceText::new("CSCI070 requires CSCI060.")],
        )
        .unwrap();
        store
    }

    async fn run(session: &AnsweringSession<'_>, input: &str) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        run_interactive(session, input.as_bytes(), &mut out, &mut err)
            .await
            .unwrap();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[tokio::test]
    async fn test_loop_answers_until_quit() {
        let dir = TempDir::new().unwrap();
        let store = catalog(&dir);
        let client = Arc::new(MockClient::constant("CSCI060 first."));
        let session = AnsweringSession::new(&store, client.clone(), "m");

        let (out, err) = run(&session, "\n   \nWhat about CSCI070?\nquit\nnever asked\n").await;

        assert_eq!(out, "ragcourse> ragcourse> ragcourse> CSCI060 first.\nragcourse> ");
        assert!(err.is_empty());
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_loop_ends_on_eof() {
        let dir = TempDir::new().unwrap();
        let store = catalog(&dir);
        let session = AnsweringSession::new(&store, Arc::new(MockClient::constant("ok")), "m");

        let (out, _) = run(&session, "CSCI070").await;
        assert_eq!(out, "ragcourse> ok\nragcourse> \n");
    }

    #[tokio::test]
    async fn test_loop_continues_after_failure() {
        let dir = TempDir::new().unwrap();
        let store = catalog(&dir);
        let client = Arc::new(MockClient::with_script(vec![
            Err(AppError::Auth("GROQ_API_KEY rejected".to_string())),
            Ok("second answer".to_string()),
        ]));
        let session = AnsweringSession::new(&store, client, "m");

        let (out, err) = run(&session, "first\nsecond\nexit\n").await;
        assert!(err.contains("Error: Authentication error: GROQ_API_KEY rejected"));
        assert!(out.contains("second answer"));
    }
}
