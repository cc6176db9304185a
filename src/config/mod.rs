//! Configuration module for Forsk.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{CalculatorPrompts, Prompts, ResearchPrompts};
pub use settings::{
    AgentSettings, GeneralSettings, PromptSettings, ResearchSettings, ServerSettings, Settings,
    ToolSettings,
};
