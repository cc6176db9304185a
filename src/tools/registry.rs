//! Name-keyed registry of the agent's tools.

use super::{
    http_client, ArxivTool, CalculatorTool, OpenAIExpressionModel, SaveTool, SearchTool, Tool,
    ToolKind, WikipediaTool,
};
use crate::config::{Prompts, Settings};
use crate::error::{ForskError, Result};
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// The set of tools offered to the model, at most one per [`ToolKind`].
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any tool of the same kind.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.retain(|t| t.kind() != tool.kind());
        self.tools.push(tool);
        self
    }

    /// Build the standard research toolset from settings.
    pub fn standard(
        settings: &Settings,
        prompts: &Prompts,
        llm: async_openai::Client<async_openai::config::OpenAIConfig>,
    ) -> Result<Self> {
        let http = http_client(Duration::from_secs(settings.tools.http_timeout_secs))?;
        let tools = &settings.tools;

        let calculator_model = Arc::new(OpenAIExpressionModel::new(
            llm,
            settings.calculator_model(),
            prompts.clone(),
        ));

        Ok(Self::new()
            .with_tool(Arc::new(SearchTool::new(http.clone(), tools.search_max_results)?))
            .with_tool(Arc::new(WikipediaTool::new(
                http.clone(),
                &tools.wikipedia_lang,
                tools.wikipedia_top_k,
                tools.wikipedia_max_chars,
            )))
            .with_tool(Arc::new(ArxivTool::new(
                http,
                tools.arxiv_max_results,
                tools.arxiv_max_chars,
            )?))
            .with_tool(Arc::new(CalculatorTool::new(calculator_model)?))
            .with_tool(Arc::new(SaveTool::new(settings.save_path()))))
    }

    /// Look up a tool by the name the model used.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>> {
        let kind: ToolKind = name.parse()?;
        self.tools
            .iter()
            .find(|t| t.kind() == kind)
            .cloned()
            .ok_or_else(|| ForskError::UnknownTool(name.to_string()))
    }

    /// Registered tool kinds, in registration order.
    pub fn kinds(&self) -> Vec<ToolKind> {
        self.tools.iter().map(|t| t.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name with model-supplied arguments.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> Result<String> {
        let tool = self.get(name)?;
        let query = query_text(arguments)?;
        tool.invoke(&query).await
    }

    /// OpenAI function definitions for every registered tool.
    pub fn definitions(&self) -> Vec<ChatCompletionTool> {
        self.tools
            .iter()
            .map(|tool| {
                let kind = tool.kind();
                ChatCompletionTool {
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionObject {
                        name: kind.name().to_string(),
                        description: Some(kind.description().to_string()),
                        parameters: Some(serde_json::json!({
                            "type": "object",
                            "properties": {
                                "query": {
                                    "type": "string",
                                    "description": "The text input for the tool"
                                }
                            },
                            "required": ["query"]
                        })),
                        strict: None,
                    },
                }
            })
            .collect()
    }
}

/// The single text input carried by a tool call's arguments.
///
/// Accepts a bare string, `{"query": "..."}`, or a mapping with exactly one
/// string value.
pub fn query_text(arguments: &Value) -> Result<String> {
    match arguments {
        Value::String(s) => Ok(s.clone()),
        Value::Object(map) => {
            if let Some(query) = map.get("query").and_then(Value::as_str) {
                return Ok(query.to_string());
            }
            let strings: Vec<&str> = map.values().filter_map(Value::as_str).collect();
            match strings.as_slice() {
                [only] if map.len() == 1 => Ok(only.to_string()),
                _ => Err(ForskError::InvalidInput(format!(
                    "Missing 'query' argument in {}",
                    arguments
                ))),
            }
        }
        other => Err(ForskError::InvalidInput(format!(
            "Tool arguments must be a string or an object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool(ToolKind);

    #[async_trait]
    impl Tool for EchoTool {
        fn kind(&self) -> ToolKind {
            self.0
        }

        async fn invoke(&self, input: &str) -> Result<String> {
            Ok(format!("{}:{}", self.0, input))
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = ToolRegistry::new()
            .with_tool(Arc::new(EchoTool(ToolKind::Search)))
            .with_tool(Arc::new(EchoTool(ToolKind::Arxiv)));

        assert_eq!(registry.get("arxiv").unwrap().kind(), ToolKind::Arxiv);
        assert!(matches!(registry.get("wikipedia"), Err(ForskError::UnknownTool(_))));
        assert!(matches!(registry.get("python_repl"), Err(ForskError::UnknownTool(_))));
    }

    #[test]
    fn test_with_tool_replaces_same_kind() {
        let registry = ToolRegistry::new()
            .with_tool(Arc::new(EchoTool(ToolKind::Search)))
            .with_tool(Arc::new(EchoTool(ToolKind::Search)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invoke_extracts_query() {
        let registry = ToolRegistry::new().with_tool(Arc::new(EchoTool(ToolKind::Search)));
        let result =
            tokio_test::block_on(registry.invoke("search", &json!({"query": "rust"}))).unwrap();
        assert_eq!(result, "search:rust");
    }

    #[test]
    fn test_query_text_shapes() {
        assert_eq!(query_text(&json!("plain")).unwrap(), "plain");
        assert_eq!(query_text(&json!({"query": "q", "x": 1})).unwrap(), "q");
        assert_eq!(query_text(&json!({"__arg1": "solo"})).unwrap(), "solo");
        assert!(query_text(&json!({"a": "1", "b": "2"})).is_err());
        assert!(query_text(&json!(5)).is_err());
    }

    #[test]
    fn test_standard_registry_has_every_tool() {
        let settings = Settings::default();
        let registry = ToolRegistry::standard(
            &settings,
            &Prompts::default(),
            crate::openai::create_client().unwrap(),
        )
        .unwrap();

        assert_eq!(registry.kinds(), ToolKind::ALL.to_vec());
        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        assert_eq!(
            names,
            vec!["search", "wikipedia", "arxiv", "calculator", "save_text_to_file"]
        );
    }
}
