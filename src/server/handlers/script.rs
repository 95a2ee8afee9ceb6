use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Error;
use crate::platform::parse_execute_response;
use crate::server::response::{WebDriverResponse, WebDriverResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteAtomRequest {
    pub atom: String,
    #[serde(default)]
    pub args: Vec<Value>,
    /// Replaces the session's frame path before running
    #[serde(default)]
    pub frames: Option<Vec<String>>,
    #[serde(default)]
    pub always_default_frame: bool,
}

#[derive(Debug, Deserialize)]
pub struct AsyncResponseRequest {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub value: Value,
}

/// POST `/session/{session_id}/atom/execute` - Run an atom synchronously
pub async fn execute_atom(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<ExecuteAtomRequest>,
) -> WebDriverResult {
    let commands = state.commands(&session_id).await?;
    if let Some(frames) = request.frames {
        commands.set_frames(frames);
    }
    let result = commands
        .execute_atom(&request.atom, &request.args, request.always_default_frame)
        .await?;
    Ok(WebDriverResponse::success(result))
}

/// POST `/session/{session_id}/atom/execute_async` - Run an atom that posts
/// its result back to this server
pub async fn execute_atom_async(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<ExecuteAtomRequest>,
) -> WebDriverResult {
    let commands = state.commands(&session_id).await?;
    if let Some(frames) = request.frames {
        commands.set_frames(frames);
    }
    let response_url = state.async_response_url(&session_id);
    let result = commands
        .execute_atom_async(&request.atom, &request.args, &response_url)
        .await?;
    Ok(WebDriverResponse::success(result))
}

/// POST `/session/{session_id}/receive_async_response` - Result of an async atom
pub async fn receive_async_response(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<AsyncResponseRequest>,
) -> WebDriverResult {
    let result = match parse_execute_response(json!({
        "status": request.status,
        "value": request.value,
    })) {
        Ok(value) => Ok(value),
        Err(Error::JavaScript(message)) => Err(message),
        Err(other) => Err(other.to_string()),
    };
    state.async_responses.complete(&session_id, result);
    Ok(WebDriverResponse::null())
}
