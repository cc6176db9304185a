//! Error types for Forsk.

use thiserror::Error;

/// Library-level error type for Forsk operations.
#[derive(Error, Debug)]
pub enum ForskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

impl ForskError {
    /// Build a tool failure for the named capability.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for Forsk operations.
pub type Result<T> = std::result::Result<T, ForskError>;
