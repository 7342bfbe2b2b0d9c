//! docq — ask questions about a local document knowledge base.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use docq::{Agent, Config, KnowledgeBase};

/// docq - conversational agent over a local document knowledge base
#[derive(Parser)]
#[command(
    name = "docq",
    version,
    about = "Conversational agent over a local document knowledge base",
    long_about = r#"
docq answers questions by retrieving passages from a knowledge base built
from your local documentation, with auxiliary tools for dates, arithmetic,
and a persistent memory about you.

Examples:
  docq                      Start the interactive chat session
  docq chat                 Same as above
  docq init                 Build the knowledge-base index and exit
  docq info                 Print the resolved configuration
  docq -c other.json chat   Use an alternate configuration file
"#
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the JSON configuration file
    #[arg(short, long, global = true, default_value = "config.json")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive chat session (default)
    #[command(alias = "repl")]
    Chat,

    /// Build the knowledge-base index eagerly and exit
    Init,

    /// Display the resolved configuration
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load_from_file(&cli.config)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let agent = Agent::from_config(&config)?;
            docq::cli::run(agent).await
        }
        Commands::Init => {
            // Eager initialization: a missing documents folder is fatal here
            let kb = KnowledgeBase::for_config(&config);
            kb.ensure_ready(true)?;
            println!("Knowledge base ready.");
            Ok(())
        }
        Commands::Info => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
