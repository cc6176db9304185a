//! HTTP API server for integration with other systems.
//!
//! Provides a single research endpoint plus a health check.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::research::{ResearchRequest, Researcher};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, info_span, Instrument};

/// Shared application state.
pub struct AppState {
    researcher: Researcher,
}

impl AppState {
    pub fn new(researcher: Researcher) -> Self {
        Self { researcher }
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/research", post(research))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    preflight::check(Operation::Serve, &settings)?;

    let researcher = Researcher::from_settings(&settings, None, None)?;
    let state = Arc::new(AppState::new(researcher));

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Forsk API Server");
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Health", "GET  /health");
    Output::kv("Research", "POST /research");
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

// === Request/Response Types ===

/// Body of `POST /research`: `{topic, questions}` or `{query}`.
#[derive(Debug, Default, Deserialize)]
struct ResearchBody {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    questions: Vec<String>,
    #[serde(default)]
    query: Option<String>,
}

impl ResearchBody {
    fn into_request(self) -> Option<ResearchRequest> {
        let topic = [self.topic, self.query]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())?;
        Some(ResearchRequest::new(topic).with_questions(self.questions))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn bad_request(error: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn research(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<ResearchBody>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(body)) = body else {
        return bad_request("Invalid JSON body");
    };
    let Some(request) = body.into_request() else {
        return bad_request("Topic not provided");
    };

    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("research_request", %request_id);

    async move {
        info!("Received research request");
        Json(state.researcher.run_json(&request).await).into_response()
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentRun, AgentRunner, AgentStep};
    use crate::error::Result;
    use crate::research::ResponseProfile;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Map, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct ScriptedRunner {
        output: Value,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AgentRunner for ScriptedRunner {
        async fn invoke(&self, inputs: &Map<String, Value>) -> Result<AgentRun> {
            let query = inputs["query"].as_str().unwrap_or_default().to_string();
            self.seen.lock().unwrap().push(query);
            Ok(AgentRun {
                inputs: inputs.clone(),
                output: Some(self.output.clone()),
                intermediate_steps: vec![AgentStep::new(
                    "search",
                    json!("GDP growth"),
                    "GDP grew 2.8%",
                )],
            })
        }
    }

    fn app(output: Value, profile: ResponseProfile) -> (Router, Arc<ScriptedRunner>) {
        let runner = Arc::new(ScriptedRunner {
            output,
            seen: Mutex::new(Vec::new()),
        });
        let researcher = Researcher::new(runner.clone(), profile);
        (router(Arc::new(AppState::new(researcher))), runner)
    }

    async fn post_json(app: Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/research")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    const RECORD: &str = r#"Here you go: {"topic": "GDP", "summary": "It grew.", "sources": ["bea.gov"], "tools_used": ["search"]}"#;

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(json!(RECORD), ResponseProfile::ToolDetails);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            serde_json::from_slice::<Value>(&bytes).unwrap(),
            json!({"status": "ok"})
        );
    }

    #[tokio::test]
    async fn test_research_returns_record_with_trace() {
        let (app, runner) = app(json!(RECORD), ResponseProfile::ToolDetails);
        let (status, body) =
            post_json(app, r#"{"topic": "GDP", "questions": ["How fast?"]}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["topic"], "GDP");
        assert_eq!(body["sources"], json!(["bea.gov"]));
        assert_eq!(
            body["tool_details"],
            json!([{"tool_name": "search", "tool_input": "GDP growth", "tool_output": "GDP grew 2.8%"}])
        );
        assert!(body.get("error").is_none());
        assert_eq!(
            runner.seen.lock().unwrap().as_slice(),
            ["GDP\n\nKey questions:\n- How fast?"]
        );
    }

    #[tokio::test]
    async fn test_research_accepts_query_and_tools_used_profile() {
        let (app, runner) = app(json!(RECORD), ResponseProfile::ToolsUsed);
        let (status, body) = post_json(app, r#"{"query": "GDP"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tools_used"], json!(["search"]));
        assert!(body.get("tool_details").is_none());
        assert_eq!(runner.seen.lock().unwrap().as_slice(), ["GDP"]);
    }

    #[tokio::test]
    async fn test_research_rejects_missing_topic() {
        for body in [r#"{}"#, r#"{"topic": "  "}"#, r#"{"query": ""}"#, "not json"] {
            let (app, runner) = app(json!(RECORD), ResponseProfile::ToolDetails);
            let (status, response) = post_json(app, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert!(response["error"].is_string());
            assert!(runner.seen.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_unparseable_output_is_200_with_error_shape() {
        let (app, _) = app(json!("I could not find anything."), ResponseProfile::ToolDetails);
        let (status, body) = post_json(app, r#"{"topic": "GDP"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Error parsing response:"));
        assert_eq!(body["raw_response"]["output"], "I could not find anything.");
    }
}
