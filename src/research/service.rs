//! Request-level research service.

use super::assemble::{assemble, failure, ExtractionOutcome};
use super::record::ResponseProfile;
use crate::agent::{Agent, AgentRun, AgentRunner};
use crate::config::{Prompts, Settings};
use crate::error::{ForskError, Result};
use crate::openai::create_client_with_timeout;
use crate::tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// A research request: a topic plus optional key questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub topic: String,
    #[serde(default)]
    pub questions: Vec<String>,
}

impl ResearchRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            questions: Vec::new(),
        }
    }

    pub fn with_questions(mut self, questions: Vec<String>) -> Self {
        self.questions = questions;
        self
    }

    /// Check that there is something to research.
    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(ForskError::InvalidInput("Topic not provided".to_string()));
        }
        Ok(())
    }

    /// Render the request as the agent's query text.
    pub fn render_query(&self) -> String {
        let questions: Vec<&str> = self
            .questions
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .collect();

        if questions.is_empty() {
            return self.topic.trim().to_string();
        }

        let bullets = questions
            .iter()
            .map(|q| format!("- {}", q))
            .collect::<Vec<_>>()
            .join("\n");

        format!("{}\n\nKey questions:\n{}", self.topic.trim(), bullets)
    }
}

/// Runs research requests against an agent and interprets the result.
///
/// The runner is built once at startup and shared by all requests.
#[derive(Clone)]
pub struct Researcher {
    runner: Arc<dyn AgentRunner>,
    profile: ResponseProfile,
}

impl Researcher {
    pub fn new(runner: Arc<dyn AgentRunner>, profile: ResponseProfile) -> Self {
        Self { runner, profile }
    }

    /// Wire up the OpenAI agent and the standard toolset from settings.
    ///
    /// `model` and `profile` override the configured values when given.
    pub fn from_settings(
        settings: &Settings,
        model: Option<&str>,
        profile: Option<ResponseProfile>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let client = create_client_with_timeout(Duration::from_secs(settings.agent.timeout_secs))?;
        let tools = Arc::new(ToolRegistry::standard(settings, &prompts, client.clone())?);

        let model = model.unwrap_or(&settings.agent.model);
        info!("Using model {} with {} tools", model, tools.len());

        let agent = Agent::new(client, model, tools, prompts)
            .with_max_iterations(settings.agent.max_iterations);

        Ok(Self::new(
            Arc::new(agent),
            profile.unwrap_or(settings.research.profile),
        ))
    }

    pub fn profile(&self) -> ResponseProfile {
        self.profile
    }

    /// Research a request. Never fails: errors come back as the failure shape.
    #[instrument(skip_all, fields(topic = %request.topic))]
    pub async fn run(&self, request: &ResearchRequest) -> ExtractionOutcome {
        let mut inputs = Map::new();
        inputs.insert("query".to_string(), Value::String(request.render_query()));

        info!("Starting research");

        let outcome = match self.runner.invoke(&inputs).await {
            Ok(run) => assemble(&run),
            Err(e) => {
                let run = AgentRun {
                    inputs,
                    ..AgentRun::default()
                };
                ExtractionOutcome::Failure(failure(format!("Error running agent: {}", e), &run))
            }
        };

        info!(error = outcome.is_error(), "Research finished");
        outcome
    }

    /// Research a request and render the response body in the configured profile.
    pub async fn run_json(&self, request: &ResearchRequest) -> Value {
        self.run(request).await.to_value(self.profile)
    }
}
