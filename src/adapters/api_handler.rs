//! HTTP surface: request/response envelopes and axum handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::agents::error::AgentError;
use crate::domain::{SearchRequest, UserDecision};
use crate::orchestrator::Orchestrator;

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    fn ok(data: Value) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }

    fn err(message: String) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(message),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct OrchestrateRequest {
    pub user_prompt: String,
    #[serde(default)]
    pub clarification_response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub session_id: String,
    pub user_decision: UserDecision,
}

fn error_status(err: &AgentError) -> StatusCode {
    match err {
        AgentError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        AgentError::Llm(_) => StatusCode::BAD_GATEWAY,
        AgentError::Configuration(_) => StatusCode::NOT_FOUND,
        AgentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn fail(err: AgentError) -> (StatusCode, Json<ApiResponse>) {
    error!(error = %err, "request failed");
    (error_status(&err), ApiResponse::err(err.to_string()))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn orchestrate(
    State(state): State<ApiState>,
    Json(request): Json<OrchestrateRequest>,
) -> Result<Json<ApiResponse>, (StatusCode, Json<ApiResponse>)> {
    let result = state
        .orchestrator
        .execute(
            &request.user_prompt,
            request.clarification_response.as_deref(),
        )
        .await
        .map_err(fail)?;
    Ok(ApiResponse::ok(serde_json::to_value(result).map_err(
        |e| fail(AgentError::Internal(e.to_string())),
    )?))
}

pub async fn resume(
    State(state): State<ApiState>,
    Json(request): Json<ResumeRequest>,
) -> Result<Json<ApiResponse>, (StatusCode, Json<ApiResponse>)> {
    let result = state
        .orchestrator
        .resume(&request.session_id, &request.user_decision)
        .await
        .map_err(fail)?;
    Ok(ApiResponse::ok(serde_json::to_value(result).map_err(
        |e| fail(AgentError::Internal(e.to_string())),
    )?))
}

/// Run one specialist in isolation. Debug aid, not part of the normal flow.
pub async fn debug_agent(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<ApiResponse>, (StatusCode, Json<ApiResponse>)> {
    let outcome = state
        .orchestrator
        .run_specialist(&name, request)
        .await
        .map_err(fail)?;
    Ok(ApiResponse::ok(serde_json::to_value(outcome).map_err(
        |e| fail(AgentError::Internal(e.to_string())),
    )?))
}
