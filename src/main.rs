//! # ChatRAG CLI (`chatrag`)
//!
//! ## Usage
//!
//! ```bash
//! chatrag [--config ./chatrag.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `chatrag chat [FILES...]` | Index the given PDFs and chat in the terminal |
//! | `chatrag serve` | Start the HTTP API |
//!
//! Credentials come from the environment (`GROQ_API_KEY`, `OPENAI_API_KEY`);
//! a `.env` file in the working directory or its parents is loaded first.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use chatrag::config::{self, Config};
use chatrag::controller::RagController;
use chatrag::factory::ModelFactory;
use chatrag::{repl, server};

/// ChatRAG — talk with your PDF documents.
#[derive(Parser)]
#[command(
    name = "chatrag",
    about = "ChatRAG — talk with your PDF documents",
    version,
    long_about = "ChatRAG indexes the text of uploaded PDF files in an in-memory vector index \
    and answers questions about them with a chat model, keeping the conversation history \
    across turns."
)]
struct Cli {
    /// Path to a configuration file (TOML). Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with documents in the terminal.
    ///
    /// The given PDFs are indexed before the prompt appears; more can be
    /// added with `/add`.
    Chat {
        /// PDF files to index.
        files: Vec<PathBuf>,
    },

    /// Start the HTTP API.
    Serve {
        /// Override `[server].bind` (e.g. `0.0.0.0:8501`).
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => {
            let cfg = Config::default();
            cfg.validate()?;
            cfg
        }
    };

    let factory = ModelFactory::new(&cfg)?;
    let controller = RagController::new(&factory, &cfg)?;

    match cli.command {
        Commands::Chat { files } => {
            repl::run_chat(controller, files).await?;
        }
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            server::run_server(&cfg, controller).await?;
        }
    }

    Ok(())
}
