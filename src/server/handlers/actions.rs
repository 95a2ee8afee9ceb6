use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::geometry::NativePoint;
use crate::server::response::{WebDriverErrorResponse, WebDriverResponse, WebDriverResult};
use crate::server::AppState;
use crate::webdriver::element::unwrap_element;

#[derive(Debug, Default, Deserialize)]
pub struct TapRequest {
    /// Web element to tap; takes precedence over coordinates
    #[serde(default)]
    pub element: Option<Value>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

/// POST `/session/{session_id}/touch/click` - Tap a web element or absolute
/// native coordinates
pub async fn tap(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<TapRequest>,
) -> WebDriverResult {
    let commands = state.commands(&session_id).await?;

    if let Some(element) = &request.element {
        let element_id = unwrap_element(element).ok_or_else(|| {
            WebDriverErrorResponse::invalid_argument(&format!("Not an element reference: {element}"))
        })?;
        commands.native_web_tap(&element_id).await?;
        return Ok(WebDriverResponse::null());
    }

    let (Some(x), Some(y)) = (request.x, request.y) else {
        return Err(WebDriverErrorResponse::invalid_argument(
            "tap needs an element or both x and y",
        ));
    };
    if !x.is_finite() || !y.is_finite() {
        return Err(WebDriverErrorResponse::invalid_argument(
            "tap coordinates must be finite numbers",
        ));
    }
    commands.click_coords(NativePoint { x, y }).await?;
    Ok(WebDriverResponse::null())
}
