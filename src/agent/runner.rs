//! Agent runner with tool calling loop.

use super::{AgentAction, AgentRun, AgentRunner, AgentStep};
use crate::config::Prompts;
use crate::error::{ForskError, Result};
use crate::tools::ToolRegistry;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// OpenAI-backed agent that can call the research tools.
pub struct Agent {
    client: async_openai::Client<OpenAIConfig>,
    model: String,
    tools: Arc<ToolRegistry>,
    prompts: Prompts,
    max_iterations: usize,
}

impl Agent {
    /// Create a new agent over the given tools.
    pub fn new(
        client: async_openai::Client<OpenAIConfig>,
        model: &str,
        tools: Arc<ToolRegistry>,
        prompts: Prompts,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            tools,
            prompts,
            max_iterations: 15,
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    fn user_message(&self, inputs: &Map<String, Value>) -> Result<String> {
        let query = inputs
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| ForskError::InvalidInput("Missing 'query' input".to_string()))?;

        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        Ok(self
            .prompts
            .render_with_custom(&self.prompts.research.user, &vars))
    }

    /// Execute a single tool call and record it as a step.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> AgentStep {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent calling tool: {} with args: {}", name, arguments);

        let tool_input = parse_arguments(arguments);
        let observation = match self.tools.invoke(name, &tool_input).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                format!("Tool error: {}", e)
            }
        };

        AgentStep {
            action: AgentAction {
                tool: name.clone(),
                tool_input,
                log: format!("Invoking `{}` with `{}`", name, arguments),
            },
            observation: Value::String(observation),
        }
    }
}

/// Tool arguments as the model sent them: parsed JSON when possible,
/// otherwise the raw string.
fn parse_arguments(arguments: &str) -> Value {
    serde_json::from_str::<Value>(arguments)
        .ok()
        .filter(|v| v.is_object() || v.is_string())
        .unwrap_or_else(|| Value::String(arguments.to_string()))
}

#[async_trait]
impl AgentRunner for Agent {
    async fn invoke(&self, inputs: &Map<String, Value>) -> Result<AgentRun> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.research_system())
                .build()
                .map_err(|e| ForskError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(self.user_message(inputs)?)
                .build()
                .map_err(|e| ForskError::Agent(e.to_string()))?
                .into(),
        ];

        let mut steps = Vec::new();
        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(ForskError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);

            let request = CreateChatCompletionRequestArgs::default()
                .model(&self.model)
                .messages(messages.clone())
                .tools(self.tools.definitions())
                .build()
                .map_err(|e| ForskError::Agent(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| ForskError::OpenAI(format!("Agent API error: {}", e)))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| ForskError::Agent("No response from model".to_string()))?;

            let tool_calls = match &choice.message.tool_calls {
                Some(calls) if !calls.is_empty() => calls,
                _ => {
                    info!(
                        "Agent finished after {} iterations and {} tool calls",
                        iterations,
                        steps.len()
                    );
                    return Ok(AgentRun {
                        inputs: inputs.clone(),
                        output: choice.message.content.clone().map(Value::String),
                        intermediate_steps: steps,
                    });
                }
            };

            let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(tool_calls.clone())
                .build()
                .map_err(|e| ForskError::Agent(e.to_string()))?;
            messages.push(assistant_msg.into());

            for tool_call in tool_calls {
                let step = self.execute_tool_call(tool_call).await;

                let content = match &step.observation {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(content)
                    .build()
                    .map_err(|e| ForskError::Agent(e.to_string()))?;
                messages.push(tool_msg.into());

                steps.push(step);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(r#"{"query": "GDP"}"#), json!({"query": "GDP"}));
        assert_eq!(parse_arguments(r#""2+2""#), json!("2+2"));
        assert_eq!(parse_arguments("not json"), json!("not json"));
        assert_eq!(parse_arguments("42"), json!("42"));
    }

    #[test]
    fn test_user_message_renders_query() {
        let agent = Agent::new(
            crate::openai::create_client().unwrap(),
            "gpt-4o-mini",
            Arc::new(ToolRegistry::new()),
            Prompts::default(),
        );

        let mut inputs = Map::new();
        inputs.insert("query".to_string(), json!("Economic impact of AI"));
        assert!(agent
            .user_message(&inputs)
            .unwrap()
            .contains("Economic impact of AI"));

        assert!(matches!(
            agent.user_message(&Map::new()),
            Err(ForskError::InvalidInput(_))
        ));
    }
}
