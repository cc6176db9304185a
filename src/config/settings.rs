//! Configuration settings for Forsk.

use crate::research::ResponseProfile;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub agent: AgentSettings,
    pub tools: ToolSettings,
    pub research: ResearchSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Settings for the tool-calling agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// LLM model driving the research loop.
    pub model: String,
    /// Maximum number of model calls per request.
    pub max_iterations: usize,
    /// Upper bound for a single model call, in seconds.
    pub timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_iterations: 15,
            timeout_secs: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Settings for the individual research tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Maximum number of web search results in a digest.
    pub search_max_results: usize,
    /// Number of Wikipedia pages to summarize.
    pub wikipedia_top_k: usize,
    /// Wikipedia language edition.
    pub wikipedia_lang: String,
    /// Character cap on the Wikipedia digest.
    pub wikipedia_max_chars: usize,
    /// Number of arXiv entries to summarize.
    pub arxiv_max_results: usize,
    /// Character cap on the arXiv digest.
    pub arxiv_max_chars: usize,
    /// Model used by the calculator. Falls back to the agent model.
    pub calculator_model: Option<String>,
    /// File that `save_text_to_file` appends to.
    pub save_path: String,
    /// Timeout for tool HTTP requests, in seconds.
    pub http_timeout_secs: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            search_max_results: 5,
            wikipedia_top_k: 3,
            wikipedia_lang: "en".to_string(),
            wikipedia_max_chars: 4000,
            arxiv_max_results: 3,
            arxiv_max_chars: 4000,
            calculator_model: None,
            save_path: "research_output.txt".to_string(),
            http_timeout_secs: 30,
        }
    }
}

/// Settings for response extraction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResearchSettings {
    /// Output shape of a successful research record.
    pub profile: ResponseProfile,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ForskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("forsk")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded research log path.
    pub fn save_path(&self) -> PathBuf {
        Self::expand_path(&self.tools.save_path)
    }

    /// Model used by the calculator tool.
    pub fn calculator_model(&self) -> &str {
        self.tools
            .calculator_model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.agent.model)
    }
}
