//! The structured research record and its typed validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One tool call made by the agent, in invocation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    /// A plain string or a mapping, exactly as the model supplied it.
    pub tool_input: Value,
    pub tool_output: String,
}

/// A validated research result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub topic: String,
    pub summary: String,
    pub sources: Vec<String>,
    pub tool_details: Vec<ToolInvocation>,
}

/// Why a decoded JSON value is not a [`ResearchRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

/// Output shape used when a record is rendered to JSON.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseProfile {
    /// `topic, summary, sources, tool_details`.
    #[default]
    ToolDetails,
    /// `topic, summary, sources, tools_used` with tool names only.
    ToolsUsed,
}

impl std::str::FromStr for ResponseProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "tool_details" | "details" => Ok(ResponseProfile::ToolDetails),
            "tools_used" | "names" => Ok(ResponseProfile::ToolsUsed),
            _ => Err(format!("Unknown response profile: {}", s)),
        }
    }
}

impl std::fmt::Display for ResponseProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseProfile::ToolDetails => write!(f, "tool_details"),
            ResponseProfile::ToolsUsed => write!(f, "tools_used"),
        }
    }
}

impl ResearchRecord {
    /// Build a record from an untyped JSON value.
    ///
    /// Every required field is checked for presence and shape. Unknown fields
    /// are ignored.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let map = value.as_object().ok_or(SchemaError::NotAnObject)?;

        let topic = string_field(map, "topic")?;
        let summary = string_field(map, "summary")?;
        let sources = string_list_field(map, "sources")?;

        let details = required(map, "tool_details")?
            .as_array()
            .ok_or_else(|| wrong_type("tool_details", "an array of objects"))?;
        let tool_details = details
            .iter()
            .enumerate()
            .map(|(i, item)| parse_invocation(i, item))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            topic,
            summary,
            sources,
            tool_details,
        })
    }

    /// Distinct tool names in first-use order.
    pub fn tools_used(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for call in &self.tool_details {
            if !names.contains(&call.tool_name) {
                names.push(call.tool_name.clone());
            }
        }
        names
    }

    /// Render the record in the given output profile.
    pub fn to_value(&self, profile: ResponseProfile) -> Value {
        match profile {
            ResponseProfile::ToolDetails => serde_json::json!({
                "topic": self.topic,
                "summary": self.summary,
                "sources": self.sources,
                "tool_details": self.tool_details,
            }),
            ResponseProfile::ToolsUsed => serde_json::json!({
                "topic": self.topic,
                "summary": self.summary,
                "sources": self.sources,
                "tools_used": self.tools_used(),
            }),
        }
    }
}

fn parse_invocation(index: usize, item: &Value) -> Result<ToolInvocation, SchemaError> {
    let field = |name: &str| format!("tool_details[{}].{}", index, name);

    let map = item
        .as_object()
        .ok_or_else(|| wrong_type(format!("tool_details[{}]", index), "an object"))?;

    let tool_name = map
        .get("tool_name")
        .ok_or_else(|| SchemaError::MissingField(field("tool_name")))?
        .as_str()
        .ok_or_else(|| wrong_type(field("tool_name"), "a string"))?
        .to_string();

    let tool_input = map
        .get("tool_input")
        .ok_or_else(|| SchemaError::MissingField(field("tool_input")))?;
    if !(tool_input.is_string() || tool_input.is_object()) {
        return Err(wrong_type(field("tool_input"), "a string or an object"));
    }

    let tool_output = map
        .get("tool_output")
        .ok_or_else(|| SchemaError::MissingField(field("tool_output")))?
        .as_str()
        .ok_or_else(|| wrong_type(field("tool_output"), "a string"))?
        .to_string();

    Ok(ToolInvocation {
        tool_name,
        tool_input: tool_input.clone(),
        tool_output,
    })
}

fn required<'a>(map: &'a Map<String, Value>, field: &str) -> Result<&'a Value, SchemaError> {
    map.get(field)
        .ok_or_else(|| SchemaError::MissingField(field.to_string()))
}

fn string_field(map: &Map<String, Value>, field: &str) -> Result<String, SchemaError> {
    required(map, field)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_type(field, "a string"))
}

fn string_list_field(map: &Map<String, Value>, field: &str) -> Result<Vec<String>, SchemaError> {
    let items = required(map, field)?
        .as_array()
        .ok_or_else(|| wrong_type(field, "an array of strings"))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| wrong_type(field, "an array of strings"))
        })
        .collect()
}

fn wrong_type(field: impl Into<String>, expected: &'static str) -> SchemaError {
    SchemaError::WrongType {
        field: field.into(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "topic": "T",
            "summary": "S",
            "sources": ["https://example.org"],
            "tool_details": [
                {"tool_name": "search", "tool_input": "rust", "tool_output": "results"},
                {"tool_name": "wikipedia", "tool_input": {"query": "Rust"}, "tool_output": "page"}
            ]
        })
    }

    #[test]
    fn test_from_value_accepts_valid_record() {
        let record = ResearchRecord::from_value(&valid()).unwrap();
        assert_eq!(record.topic, "T");
        assert_eq!(record.sources, vec!["https://example.org"]);
        assert_eq!(record.tool_details.len(), 2);
        assert_eq!(record.tool_details[1].tool_input, json!({"query": "Rust"}));
    }

    #[test]
    fn test_from_value_ignores_unknown_fields() {
        let mut value = valid();
        value["data"] = json!({"2023": 1});
        value["tools_used"] = json!(["search"]);
        assert!(ResearchRecord::from_value(&value).is_ok());
    }

    #[test]
    fn test_from_value_reports_missing_field() {
        let mut value = valid();
        value.as_object_mut().unwrap().remove("sources");
        assert_eq!(
            ResearchRecord::from_value(&value),
            Err(SchemaError::MissingField("sources".to_string()))
        );
    }

    #[test]
    fn test_from_value_rejects_wrong_types() {
        let mut value = valid();
        value["summary"] = json!(42);
        assert!(matches!(
            ResearchRecord::from_value(&value),
            Err(SchemaError::WrongType { ref field, .. }) if field == "summary"
        ));

        let mut value = valid();
        value["sources"] = json!(["ok", 3]);
        assert!(matches!(
            ResearchRecord::from_value(&value),
            Err(SchemaError::WrongType { ref field, .. }) if field == "sources"
        ));

        let mut value = valid();
        value["tool_details"][0]["tool_input"] = json!([1, 2]);
        assert!(matches!(
            ResearchRecord::from_value(&value),
            Err(SchemaError::WrongType { ref field, .. }) if field == "tool_details[0].tool_input"
        ));
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert_eq!(
            ResearchRecord::from_value(&json!(["topic"])),
            Err(SchemaError::NotAnObject)
        );
    }

    #[test]
    fn test_profiles_render_different_shapes() {
        let mut value = valid();
        value["tool_details"]
            .as_array_mut()
            .unwrap()
            .push(json!({"tool_name": "search", "tool_input": "again", "tool_output": "more"}));
        let record = ResearchRecord::from_value(&value).unwrap();

        let details = record.to_value(ResponseProfile::ToolDetails);
        assert_eq!(details["tool_details"].as_array().unwrap().len(), 3);
        assert!(details.get("tools_used").is_none());

        let names = record.to_value(ResponseProfile::ToolsUsed);
        assert_eq!(names["tools_used"], json!(["search", "wikipedia"]));
        assert!(names.get("tool_details").is_none());
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("tools-used".parse::<ResponseProfile>(), Ok(ResponseProfile::ToolsUsed));
        assert_eq!(
            "tool_details".parse::<ResponseProfile>(),
            Ok(ResponseProfile::ToolDetails)
        );
        assert!("other".parse::<ResponseProfile>().is_err());
    }
}
