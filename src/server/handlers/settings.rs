use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::server::response::{WebDriverResponse, WebDriverResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub settings: DriverSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSettings {
    #[serde(default)]
    pub check_for_modal_dialogs: Option<bool>,
}

/// POST `/session/{session_id}/appium/settings` - Update driver settings
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<SettingsRequest>,
) -> WebDriverResult {
    let settings = state.settings(&session_id).await?;
    if let Some(check) = request.settings.check_for_modal_dialogs {
        tracing::debug!(%session_id, check, "setting checkForModalDialogs");
        settings.set_check_for_modal_dialogs(check);
    }
    Ok(WebDriverResponse::success(json!({
        "checkForModalDialogs": settings.check_for_modal_dialogs()
    })))
}
