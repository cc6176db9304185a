//! Assembly of the final research response from an agent run.

use super::extract::{extract, ExtractError};
use super::record::{ResearchRecord, ResponseProfile, ToolInvocation};
use crate::agent::{AgentRun, AgentStep};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// A response that could not be turned into a record.
///
/// Every value in `raw_response` is already a display string, so this shape
/// always serializes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionFailure {
    pub error: String,
    pub raw_response: BTreeMap<String, String>,
}

/// Result of interpreting one agent run.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Record(ResearchRecord),
    Failure(ExtractionFailure),
}

impl ExtractionOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ExtractionOutcome::Failure(_))
    }

    pub fn record(&self) -> Option<&ResearchRecord> {
        match self {
            ExtractionOutcome::Record(record) => Some(record),
            ExtractionOutcome::Failure(_) => None,
        }
    }

    /// Render as the JSON body handed back to callers.
    pub fn to_value(&self, profile: ResponseProfile) -> Value {
        match self {
            ExtractionOutcome::Record(record) => record.to_value(profile),
            ExtractionOutcome::Failure(failure) => serde_json::json!({
                "error": failure.error,
                "raw_response": failure.raw_response,
            }),
        }
    }
}

/// Build the tool-invocation trace from the runner's intermediate steps.
pub fn build_trace(steps: &[AgentStep]) -> Vec<ToolInvocation> {
    steps
        .iter()
        .map(|step| ToolInvocation {
            tool_name: step.action.tool.clone(),
            tool_input: trace_input(&step.action.tool_input),
            tool_output: display_string(&step.observation),
        })
        .collect()
}

/// Tool inputs are a string or a mapping; anything else is kept as its display string.
fn trace_input(input: &Value) -> Value {
    match input {
        Value::String(_) | Value::Object(_) => input.clone(),
        other => Value::String(display_string(other)),
    }
}

/// Interpret an agent run: extract the record, or build the failure shape.
pub fn assemble(run: &AgentRun) -> ExtractionOutcome {
    let trace = build_trace(&run.intermediate_steps);

    match extract(run.output.as_ref(), &trace) {
        Ok(record) => ExtractionOutcome::Record(record),
        Err(e) => {
            warn!("Could not extract research record: {}", e);
            let message = if e == ExtractError::NoOutput {
                e.to_string()
            } else {
                format!("Error parsing response: {}", e)
            };
            ExtractionOutcome::Failure(failure(message, run))
        }
    }
}

/// Build the failure shape for a run, stringifying every top-level value.
pub fn failure(error: impl Into<String>, run: &AgentRun) -> ExtractionFailure {
    let mut raw_response: BTreeMap<String, String> = run
        .inputs
        .iter()
        .map(|(key, value)| (key.clone(), display_string(value)))
        .collect();

    raw_response.insert(
        "output".to_string(),
        run.output.as_ref().map(display_string).unwrap_or_default(),
    );
    raw_response.insert(
        "intermediate_steps".to_string(),
        serde_json::to_string(&run.intermediate_steps)
            .unwrap_or_else(|e| format!("<unrenderable steps: {}>", e)),
    );

    ExtractionFailure {
        error: error.into(),
        raw_response,
    }
}

/// Strings as-is, anything else as compact JSON.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
