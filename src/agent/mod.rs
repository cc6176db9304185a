//! Agent system for research with tool calling.
//!
//! The research pipeline only depends on the [`AgentRunner`] trait: give it
//! inputs, get back the final transcript and the ordered trace of tool calls.
//! [`Agent`] is the OpenAI-backed implementation.

mod runner;

pub use runner::Agent;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool call the model asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    /// Name of the tool called.
    pub tool: String,
    /// Arguments as supplied by the model, a string or a mapping.
    pub tool_input: Value,
    /// Free-form note on how the call came about.
    #[serde(default)]
    pub log: String,
}

/// A tool call together with what it returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStep {
    pub action: AgentAction,
    pub observation: Value,
}

impl AgentStep {
    pub fn new(tool: &str, tool_input: Value, observation: impl Into<Value>) -> Self {
        Self {
            action: AgentAction {
                tool: tool.to_string(),
                tool_input,
                log: String::new(),
            },
            observation: observation.into(),
        }
    }
}

/// Everything a single agent run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentRun {
    /// The inputs the run was started with.
    pub inputs: Map<String, Value>,
    /// Final model output: a string, or a list of content blocks with `text`.
    pub output: Option<Value>,
    /// Tool calls in the order they were made.
    pub intermediate_steps: Vec<AgentStep>,
}

/// Drives an iterative tool-use loop against a language model.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Run the agent to completion for the given inputs.
    async fn invoke(&self, inputs: &Map<String, Value>) -> Result<AgentRun>;
}
