//! Calculator tool backed by a language model and a local evaluator.
//!
//! The model translates a natural-language question into a single expression
//! inside a ```text fence; the expression is then evaluated locally. Verbose
//! models often put prose before the fence, which the strict first pass
//! rejects, so a failed pass is retried once with the fenced expression
//! recovered from the failure text.

use super::math::{self, MathError};
use super::{Tool, ToolKind};
use crate::config::Prompts;
use crate::error::{ForskError, Result};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, Stop,
};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Turns a math question into model output containing an expression.
#[async_trait]
pub trait ExpressionModel: Send + Sync {
    async fn translate(&self, question: &str) -> Result<String>;
}

/// [`ExpressionModel`] backed by OpenAI chat completions.
pub struct OpenAIExpressionModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    prompts: Prompts,
}

impl OpenAIExpressionModel {
    pub fn new(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
        prompts: Prompts,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            prompts,
        }
    }
}

#[async_trait]
impl ExpressionModel for OpenAIExpressionModel {
    async fn translate(&self, question: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.calculator.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.calculator.system.clone())
                .build()
                .map_err(|e| ForskError::tool("calculator", e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| ForskError::tool("calculator", e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .stop(Stop::String("```output".to_string()))
            .build()
            .map_err(|e| ForskError::tool("calculator", e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ForskError::OpenAI(format!("Calculator API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| ForskError::tool("calculator", "Empty response from model"))
    }
}

/// Why a calculation pass failed.
#[derive(Debug, Error)]
pub enum CalculatorError {
    #[error("unknown format from LLM: {0}")]
    UnknownFormat(String),

    #[error("evaluating \"{expression}\" raised error: {source}. Please try again with a valid numerical expression")]
    Evaluation {
        expression: String,
        #[source]
        source: MathError,
    },

    #[error(transparent)]
    Model(#[from] ForskError),
}

/// The `calculator` tool.
pub struct CalculatorTool {
    model: Arc<dyn ExpressionModel>,
    leading_fence: Regex,
    any_fence: Regex,
}

impl CalculatorTool {
    pub fn new(model: Arc<dyn ExpressionModel>) -> Result<Self> {
        Ok(Self {
            model,
            leading_fence: Regex::new(r"(?s)^```text(.*?)```")?,
            any_fence: Regex::new(r"(?s)```text\n(.*?)\n```")?,
        })
    }

    /// Answer a math question, retrying once with a recovered expression.
    pub async fn calculate(&self, question: &str) -> std::result::Result<String, CalculatorError> {
        let first = match self.run_once(question).await {
            Ok(answer) => return Ok(answer),
            Err(e) => e,
        };

        let failure_text = first.to_string();
        let Some(expression) = self
            .any_fence
            .captures(&failure_text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
        else {
            return Err(first);
        };

        info!("Retrying calculation with extracted expression: {}", expression);
        self.run_once(&expression).await
    }

    async fn run_once(&self, question: &str) -> std::result::Result<String, CalculatorError> {
        let output = self.model.translate(question).await?;
        self.interpret(output.trim())
    }

    fn interpret(&self, output: &str) -> std::result::Result<String, CalculatorError> {
        if let Some(caps) = self.leading_fence.captures(output) {
            let expression = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            debug!("Evaluating expression: {}", expression);
            let value = math::evaluate(expression).map_err(|source| CalculatorError::Evaluation {
                expression: expression.to_string(),
                source,
            })?;
            return Ok(format!("Answer: {}", math::format_number(value)));
        }

        if output.starts_with("Answer:") {
            return Ok(output.to_string());
        }

        if let Some((_, answer)) = output.rsplit_once("Answer:") {
            return Ok(format!("Answer: {}", answer.trim_start()));
        }

        Err(CalculatorError::UnknownFormat(output.to_string()))
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Calculator
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        self.calculate(input)
            .await
            .map_err(|e| ForskError::tool(ToolKind::Calculator.name(), e.to_string()))
    }
}
