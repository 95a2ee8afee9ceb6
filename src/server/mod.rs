use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::RwLock;

pub mod handlers;
pub mod response;
pub mod router;

use crate::commands::WebCommands;
use crate::config::DriverConfig;
use crate::error::{Error, Result};
use crate::platform::{AsyncResponseState, NativeAgent, RemoteDebugger};
use crate::webdriver::{SessionManager, SessionSettings};

/// Shared state for the `WebDriver` server
pub struct AppState {
    pub native: Arc<dyn NativeAgent>,
    pub remote: Arc<dyn RemoteDebugger>,
    pub config: DriverConfig,
    pub sessions: RwLock<SessionManager>,
    pub async_responses: Arc<AsyncResponseState>,
}

impl AppState {
    pub fn new(
        native: Arc<dyn NativeAgent>,
        remote: Arc<dyn RemoteDebugger>,
        config: DriverConfig,
    ) -> Self {
        Self {
            native,
            remote,
            config,
            sessions: RwLock::new(SessionManager::new()),
            async_responses: Arc::new(AsyncResponseState::new()),
        }
    }

    /// Build the web-context commands for a new session
    pub fn build_commands(&self, session_id: &str, settings: Arc<SessionSettings>) -> WebCommands {
        WebCommands::new(
            session_id,
            settings,
            Arc::clone(&self.native),
            Arc::clone(&self.remote),
            Arc::clone(&self.async_responses),
            &self.config,
        )
    }

    /// URL the browser posts async atom results to
    pub fn async_response_url(&self, session_id: &str) -> String {
        format!(
            "http://{}:{}/session/{session_id}/receive_async_response",
            self.config.server.host, self.config.server.port
        )
    }

    pub async fn commands(&self, session_id: &str) -> Result<Arc<WebCommands>> {
        let sessions = self.sessions.read().await;
        Ok(Arc::clone(&sessions.get(session_id)?.commands))
    }

    pub async fn settings(&self, session_id: &str) -> Result<Arc<SessionSettings>> {
        let sessions = self.sessions.read().await;
        Ok(Arc::clone(&sessions.get(session_id)?.settings))
    }
}

/// Serve the `WebDriver` HTTP surface until the listener fails
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let host = state
        .config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .map_err(|e| Error::Config(format!("invalid server host: {e}")))?;
    let addr = SocketAddr::new(host, state.config.server.port);
    let router = router::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("WebDriver server listening on http://{}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}

/// Start the `WebDriver` HTTP server in the background
pub fn start(state: Arc<AppState>) -> tokio::task::JoinHandle<Result<()>> {
    tokio::spawn(async move {
        let result = serve(state).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "WebDriver server stopped");
        }
        result
    })
}
