use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers;
use super::AppState;

/// Create the router for the web-context `WebDriver` endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Status
        .route("/status", get(handlers::status))
        // Session management
        .route("/session", post(handlers::session::create))
        .route("/session/{session_id}", delete(handlers::session::delete))
        // Timeouts and settings
        .route(
            "/session/{session_id}/timeouts",
            get(handlers::timeouts::get).post(handlers::timeouts::set),
        )
        .route(
            "/session/{session_id}/appium/settings",
            post(handlers::settings::update),
        )
        // Web view geometry
        .route(
            "/session/{session_id}/webview/rect",
            get(handlers::webview::rect),
        )
        .route(
            "/session/{session_id}/webview/translate",
            post(handlers::webview::translate),
        )
        // Taps
        .route(
            "/session/{session_id}/element/{element_id}/click",
            post(handlers::element::click),
        )
        .route(
            "/session/{session_id}/touch/click",
            post(handlers::actions::tap),
        )
        // Atoms
        .route(
            "/session/{session_id}/atom/execute",
            post(handlers::script::execute_atom),
        )
        .route(
            "/session/{session_id}/atom/execute_async",
            post(handlers::script::execute_atom_async),
        )
        .route(
            "/session/{session_id}/receive_async_response",
            post(handlers::script::receive_async_response),
        )
        .with_state(state)
}
