//! Jarvis CLI, the main entry point.
//!
//! Commands:
//! - `chat`    Interactive conversation
//! - `ask`     Single message, optionally spoken or saved as audio
//! - `serve`   Start the HTTP gateway
//! - `memory`  Show or clear the conversation log
//! - `search`  Run a web search directly
//! - `voices`  List text-to-speech voices
//! - `onboard` Write a default config file

use std::path::PathBuf;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "jarvis",
    about = "Jarvis: an AI assistant with memory, web search and voice",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a config file (defaults to ~/.jarvis/config.toml)
    #[arg(short, long, global = true, env = "JARVIS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively
    Chat,

    /// Send a single message
    Ask {
        /// The message to send
        #[arg(short, long)]
        message: String,

        /// Speak the reply aloud
        #[arg(long)]
        speak: bool,

        /// Save the spoken reply to an audio file
        #[arg(long, value_name = "PATH")]
        save: Option<PathBuf>,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Inspect or clear conversation memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Search the web
    Search {
        /// What to search for
        #[arg(required = true)]
        query: Vec<String>,

        /// Treat the query as a news topic
        #[arg(long, conflicts_with_all = ["weather", "define"])]
        news: bool,

        /// Treat the query as a location and look up the weather
        #[arg(long, conflicts_with = "define")]
        weather: bool,

        /// Look up a definition
        #[arg(long)]
        define: bool,
    },

    /// List available voices
    Voices,

    /// Initialize configuration
    Onboard,
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Show recent turns
    Show {
        /// Number of turns to show
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },

    /// Delete all stored turns
    Clear {
        /// Required to actually clear
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Chat => commands::chat::run(config_path).await?,
        Commands::Ask { message, speak, save } => {
            commands::ask::run(config_path, &message, speak, save.as_deref()).await?
        }
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Memory { action } => match action {
            MemoryAction::Show { count } => commands::memory::show(config_path, count).await?,
            MemoryAction::Clear { confirm } => commands::memory::clear(config_path, confirm).await?,
        },
        Commands::Search {
            query,
            news,
            weather,
            define,
        } => {
            let kind = if news {
                commands::search::SearchKind::News
            } else if weather {
                commands::search::SearchKind::Weather
            } else if define {
                commands::search::SearchKind::Definition
            } else {
                commands::search::SearchKind::General
            };
            commands::search::run(config_path, &query.join(" "), kind).await?
        }
        Commands::Voices => commands::voices::run(config_path)?,
        Commands::Onboard => commands::onboard::run(config_path)?,
    }

    Ok(())
}
