//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ragline",
    version,
    about = "Retrieval-augmented chat assistant grounded in a document corpus",
    long_about = "Ragline indexes a directory of documents into a vector index, retrieves relevant, \
                  non-redundant passages per question using Maximal Marginal Relevance, and answers \
                  with a generative model constrained to that evidence, keeping per-session chat history."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/ragline/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the vector index from the corpus directory
    Index {
        /// Corpus directory (overrides the configured path)
        #[arg(short = 'p', long)]
        corpus: Option<PathBuf>,

        /// Rebuild even if a snapshot already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Ask a single question
    Ask {
        /// Question to ask
        question: String,

        /// Session id to continue (a fresh one is generated otherwise)
        #[arg(short, long)]
        session: Option<String>,

        /// Show the reply in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Interactive chat session
    Chat {
        /// Session id to continue (a fresh one is generated otherwise)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Show a session's conversation history
    History {
        /// Session id
        session_id: String,

        /// Show turns in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show index and conversation store status
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
