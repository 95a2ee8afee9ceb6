use std::sync::Arc;

use axum::extract::{Path, State};

use crate::server::response::{WebDriverResponse, WebDriverResult};
use crate::server::AppState;

/// POST `/session/{session_id}/element/{element_id}/click` - Tap a web element natively
pub async fn click(
    State(state): State<Arc<AppState>>,
    Path((session_id, element_id)): Path<(String, String)>,
) -> WebDriverResult {
    let commands = state.commands(&session_id).await?;
    commands.native_web_tap(&element_id).await?;
    Ok(WebDriverResponse::null())
}
