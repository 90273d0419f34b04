//! ragcourse CLI
//!
//! Main entry point for the course catalog question-answering tool.
//! Without a subcommand it crawls `--url` into the store, or starts an
//! interactive question session.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, BuildCommand, EvalCommand, StatsCommand};
use ragcourse_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;
use tracing::Instrument;

/// Answer questions about a university course catalog
#[derive(Parser, Debug)]
#[command(name = "ragcourse")]
#[command(about = "Retrieval-augmented answers over a course catalog", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "RAGCOURSE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "RAGCOURSE_CONFIG")]
    config: Option<PathBuf>,

    /// Article store file (relative paths resolve against the workspace)
    #[arg(long, global = true, env = "RAGCOURSE_DB")]
    db: Option<PathBuf>,

    /// Completion provider (groq, ollama)
    #[arg(short, long, global = true, env = "RAGCOURSE_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "RAGCOURSE_MODEL")]
    model: Option<String>,

    /// Number of articles retrieved per question
    #[arg(short = 'k', long, global = true, env = "RAGCOURSE_TOP_K")]
    top_k: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Crawl this URL into the store instead of starting a session
    #[arg(long)]
    url: Option<String>,

    /// Link depth for --url
    #[arg(long, requires = "url")]
    depth: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask one question, or start an interactive session
    Ask(AskCommand),

    /// Build or extend the article store
    Build(BuildCommand),

    /// Score answers against a true/false benchmark
    Eval(EvalCommand),

    /// Show article store statistics
    Stats(StatsCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ask(_) => "ask",
            Commands::Build(_) => "build",
            Commands::Eval(_) => "eval",
            Commands::Stats(_) => "stats",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace.clone(), cli.config)?.with_overrides(
        cli.workspace,
        cli.db,
        cli.provider,
        cli.model,
        cli.top_k,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("ragcourse starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Store: {:?}", config.db_path());
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    // Bare invocation: crawl when given a URL, otherwise an interactive session
    let command = cli.command.unwrap_or_else(|| match cli.url {
        Some(url) => Commands::Build(BuildCommand {
            urls: vec![url],
            depth: cli.depth,
            ..Default::default()
        }),
        None => Commands::Ask(AskCommand::default()),
    });

    let span = tracing::info_span!("command", name = command.name());
    let result = async {
        match command {
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Build(cmd) => cmd.execute(&config).await,
            Commands::Eval(cmd) => cmd.execute(&config).await,
            Commands::Stats(cmd) => cmd.execute(&config).await,
        }
    }
    .instrument(span)
    .await;

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
