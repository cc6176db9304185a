//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{ForskError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Research calls the model and may append to the research log.
    Research,
    /// Serving needs the same as research, checked once at startup.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Research | Operation::Serve => {
            check_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref())?;
            check_save_path(settings)?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key(key: Option<&str>) -> Result<()> {
    match key {
        Some(key) if !key.is_empty() => Ok(()),
        Some(_) => Err(ForskError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        None => Err(ForskError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// The research log must not point at a directory.
fn check_save_path(settings: &Settings) -> Result<()> {
    let path = settings.save_path();
    if path.is_dir() {
        return Err(ForskError::Config(format!(
            "tools.save_path points at a directory: {}",
            path.display()
        )));
    }
    Ok(())
}
