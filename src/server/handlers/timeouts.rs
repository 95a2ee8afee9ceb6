use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::server::response::{WebDriverResponse, WebDriverResult};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TimeoutsRequest {
    #[serde(default)]
    pub implicit: Option<u64>,
    #[serde(rename = "pageLoad", default)]
    pub page_load: Option<u64>,
    #[serde(default)]
    pub script: Option<u64>,
}

/// GET `/session/{session_id}/timeouts` - Get session timeouts
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> WebDriverResult {
    let settings = state.settings(&session_id).await?;
    Ok(WebDriverResponse::success(settings.timeouts()))
}

/// POST `/session/{session_id}/timeouts` - Set session timeouts
pub async fn set(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<TimeoutsRequest>,
) -> WebDriverResult {
    let settings = state.settings(&session_id).await?;

    if let Some(implicit) = request.implicit {
        settings.set_implicit_wait(implicit);
    }
    if let Some(page_load) = request.page_load {
        settings.set_page_load(page_load);
    }
    if let Some(script) = request.script {
        settings.set_script(script);
    }

    Ok(WebDriverResponse::null())
}
