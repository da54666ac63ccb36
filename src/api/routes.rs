//! HTTP routes for the agent service.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::agent::{Agent, LoopError, TerminatedBy};
use crate::config::Config;
use crate::llm::VllmClient;
use crate::tools::{ToolRegistry, WebSearch};

use super::types::{
    ErrorResponse, GenerateRequest, GenerateResponse, HealthResponse, InvalidRequestError,
};

/// Shared application state. Built once at startup; the registry is never
/// mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub agent: Arc<Agent>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let llm = Arc::new(VllmClient::new(&config.vllm_base_url, &config.model_id));

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(WebSearch::new(
            &config.google_api_key,
            &config.google_cse_id,
        )))?;

        let agent = Arc::new(Agent::new(llm, Arc::new(tools), config.max_tokens));

        Ok(Self {
            config: Arc::new(config),
            agent,
        })
    }
}

/// Build the router and serve until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/generate", post(generate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.config.model_id.clone(),
        tools: state
            .agent
            .tools()
            .names()
            .iter()
            .map(|name| name.to_string())
            .collect(),
    })
}

/// Run the reasoning loop on a question.
///
/// The whole run is bounded by the configured request timeout; on timeout the
/// in-flight model or tool call is dropped and the partial transcript is
/// discarded.
async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let loop_config = request.validate()?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("generate", %request_id);

    let outcome = tokio::time::timeout(
        state.config.request_timeout,
        state.agent.run(&request.prompt, &loop_config),
    )
    .instrument(span)
    .await;

    match outcome {
        Err(_) => Err(ApiError::Timeout(state.config.request_timeout)),
        Ok(Err(err)) => Err(ApiError::Loop(err)),
        Ok(Ok(result)) => {
            info!(
                %request_id,
                tool_calls = result.tool_calls,
                steps = result.steps.len(),
                terminated_by = ?result.terminated_by,
                "request completed"
            );
            Ok(Json(GenerateResponse::new(request.prompt, result)))
        }
    }
}

/// Fatal request failures, mapped to HTTP responses.
pub enum ApiError {
    InvalidRequest(InvalidRequestError),
    Loop(LoopError),
    Timeout(Duration),
}

impl From<InvalidRequestError> for ApiError {
    fn from(err: InvalidRequestError) -> Self {
        ApiError::InvalidRequest(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::InvalidRequest(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "invalid_request",
                    message: err.to_string(),
                    terminated_by: None,
                    reasoning_steps: Vec::new(),
                    tool_calls: 0,
                },
            ),
            ApiError::Loop(err) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: "inference_error",
                    message: err.to_string(),
                    terminated_by: Some(TerminatedBy::Error),
                    reasoning_steps: err.steps,
                    tool_calls: err.tool_calls,
                },
            ),
            ApiError::Timeout(limit) => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorResponse {
                    error: "timeout",
                    message: format!("request exceeded the {}s budget", limit.as_secs()),
                    terminated_by: Some(TerminatedBy::Error),
                    reasoning_steps: Vec::new(),
                    tool_calls: 0,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
