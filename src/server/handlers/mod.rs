use std::sync::Arc;

use axum::extract::State;
use serde_json::json;

use super::response::{WebDriverResponse, WebDriverResult};
use super::AppState;

pub mod actions;
pub mod element;
pub mod script;
pub mod session;
pub mod settings;
pub mod timeouts;
pub mod webview;

/// GET /status - `WebDriver` server status
pub async fn status(_state: State<Arc<AppState>>) -> WebDriverResult {
    Ok(WebDriverResponse::success(json!({
        "ready": true,
        "message": "mobile-web-driver is ready"
    })))
}
