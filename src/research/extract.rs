//! Recovery of a structured record from a free-form model transcript.
//!
//! The transcript may wrap the JSON answer in prose, a ```json fence, stray
//! braces from the model's reasoning, or trailing commentary. Extraction walks
//! every `{` in order, decodes one balanced JSON value from that position, and
//! returns the first one that validates as a [`ResearchRecord`].

use super::record::{ResearchRecord, SchemaError, ToolInvocation};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Why no record could be recovered from a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("No valid output found in response.")]
    NoOutput,

    #[error("no JSON object in the response matched the research schema")]
    NoValidJson,

    #[error("{0}")]
    SchemaInvalid(#[from] SchemaError),
}

/// Normalize the runner's raw output into a single transcript string.
///
/// Accepts a plain string, or a sequence whose first element is a mapping
/// with a string `text` field. Blank text counts as no output.
pub fn transcript_text(output: Option<&Value>) -> Result<&str, ExtractError> {
    let text = match output {
        Some(Value::String(text)) => Some(text.as_str()),
        Some(Value::Array(items)) => items
            .first()
            .and_then(|first| first.get("text"))
            .and_then(Value::as_str),
        _ => None,
    };
    text.filter(|t| !t.trim().is_empty())
        .ok_or(ExtractError::NoOutput)
}

/// Keep only the body of the first ```json fence, if the text has one.
pub fn strip_json_fence(text: &str) -> &str {
    let Some(open) = text.find(JSON_FENCE) else {
        return text;
    };
    let body_start = open + JSON_FENCE.len();
    match text[body_start..].find(FENCE) {
        Some(close) => &text[body_start..body_start + close],
        None => text,
    }
}

/// Extract a record from the runner's raw output value.
pub fn extract(
    output: Option<&Value>,
    trace: &[ToolInvocation],
) -> Result<ResearchRecord, ExtractError> {
    let text = transcript_text(output)?;
    extract_from_text(text, trace)
}

/// Extract a record from a transcript string.
///
/// `trace` is injected as `tool_details` into every candidate before it is
/// validated. When candidates run out, the last validation error wins over
/// [`ExtractError::NoValidJson`].
#[instrument(skip_all, fields(len = text.len(), tool_calls = trace.len()))]
pub fn extract_from_text(
    text: &str,
    trace: &[ToolInvocation],
) -> Result<ResearchRecord, ExtractError> {
    let text = strip_json_fence(text);
    let tool_details = trace_value(trace);

    let mut last_schema_error = None;
    let mut cursor = text.find('{');

    while let Some(start) = cursor {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();

        match values.next() {
            Some(Ok(mut candidate)) => {
                if let Some(map) = candidate.as_object_mut() {
                    map.insert("tool_details".to_string(), tool_details.clone());
                }
                match ResearchRecord::from_value(&candidate) {
                    Ok(record) => {
                        debug!(offset = start, "Extracted research record");
                        return Ok(record);
                    }
                    Err(e) => {
                        debug!(offset = start, "Candidate rejected: {}", e);
                        last_schema_error = Some(e);
                    }
                }
            }
            Some(Err(e)) => debug!(offset = start, "No JSON value at offset: {}", e),
            None => {}
        }

        cursor = text[start + 1..].find('{').map(|i| start + 1 + i);
    }

    Err(match last_schema_error {
        Some(e) => ExtractError::SchemaInvalid(e),
        None => ExtractError::NoValidJson,
    })
}

fn trace_value(trace: &[ToolInvocation]) -> Value {
    Value::Array(
        trace
            .iter()
            .map(|call| {
                serde_json::json!({
                    "tool_name": call.tool_name,
                    "tool_input": call.tool_input,
                    "tool_output": call.tool_output,
                })
            })
            .collect(),
    )
}
