use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::geometry::WebPoint;
use crate::server::response::{WebDriverResponse, WebDriverResult};
use crate::server::AppState;

/// GET `/session/{session_id}/webview/rect` - Web view rect without browser chrome
pub async fn rect(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> WebDriverResult {
    let commands = state.commands(&session_id).await?;
    let rect = commands.get_corrected_webview_rect().await?;
    Ok(WebDriverResponse::success(rect))
}

/// POST `/session/{session_id}/webview/translate` - Map a web point to native
/// coordinates. `null` when the screen cannot be measured.
pub async fn translate(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(point): Json<WebPoint>,
) -> WebDriverResult {
    let commands = state.commands(&session_id).await?;
    match commands.translate_web_to_native_detailed(point).await {
        Some((native, translation)) => Ok(WebDriverResponse::success(json!({
            "x": native.x,
            "y": native.y,
            "translation": translation,
        }))),
        None => Ok(WebDriverResponse::null()),
    }
}
