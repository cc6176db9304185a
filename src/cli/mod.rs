//! CLI module for Forsk.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::research::ResponseProfile;
use clap::{Parser, Subcommand};

/// Forsk - Research assistant
///
/// Runs a tool-using language model agent over web search, Wikipedia and arXiv,
/// and returns a structured research record.
/// The name "Forsk" comes from the Norwegian/Danish word for "research."
#[derive(Parser, Debug)]
#[command(name = "forsk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level for the `forsk` target: `-v` flags win over the configured level.
    pub fn log_level(&self, configured: &str) -> String {
        match self.verbose {
            0 => configured.to_string(),
            1 => "info".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a topic and print the structured result as JSON
    Research {
        /// The topic to research
        topic: String,

        /// Key question to address (repeatable)
        #[arg(short, long = "question")]
        questions: Vec<String>,

        /// LLM model to use for the agent
        #[arg(short, long)]
        model: Option<String>,

        /// Response shape (tool_details or tools_used)
        #[arg(long)]
        profile: Option<ResponseProfile>,
    },

    /// Start the HTTP research API
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

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

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
