use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::server::response::{WebDriverErrorResponse, WebDriverResponse, WebDriverResult};
use crate::server::AppState;
use crate::webdriver::SessionSettings;

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub capabilities: Capabilities,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default)]
    pub always_match: Value,
    #[serde(default)]
    pub first_match: Vec<Value>,
}

impl Capabilities {
    /// Look a capability up in `alwaysMatch`, then the first `firstMatch`
    /// entry, with or without the `appium:` prefix
    fn get(&self, name: &str) -> Option<&Value> {
        let prefixed = format!("appium:{name}");
        std::iter::once(&self.always_match)
            .chain(self.first_match.first())
            .find_map(|caps| caps.get(name).or_else(|| caps.get(&prefixed)))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub capabilities: Value,
}

/// POST /session - Create a new session
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> WebDriverResult {
    let caps = &request.capabilities;
    let implicit = caps
        .get("timeouts")
        .and_then(|t| t.get("implicit"))
        .and_then(Value::as_u64)
        .unwrap_or(state.config.implicit_wait.default_ms);
    let settings = Arc::new(SessionSettings::new(implicit));
    if let Some(check) = caps.get("checkForModalDialogs").and_then(Value::as_bool) {
        settings.set_check_for_modal_dialogs(check);
    }

    let mut sessions = state.sessions.write().await;
    let session = sessions.create(settings, |id, settings| state.build_commands(id, settings));
    tracing::info!(session_id = %session.id, "created session");

    let response = SessionResponse {
        session_id: session.id.clone(),
        capabilities: json!({
            "browserName": "safari",
            "platformName": "iOS",
            "checkForModalDialogs": session.settings.check_for_modal_dialogs(),
            "timeouts": session.settings.timeouts(),
        }),
    };

    Ok(WebDriverResponse::success(response))
}

/// DELETE /session/{session_id} - Delete a session
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> WebDriverResult {
    let mut sessions = state.sessions.write().await;

    if sessions.delete(&session_id) {
        state.async_responses.cancel(&session_id);
        tracing::info!(%session_id, "deleted session");
        Ok(WebDriverResponse::null())
    } else {
        Err(WebDriverErrorResponse::invalid_session_id(&session_id))
    }
}
