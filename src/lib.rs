//! Web-context commands for a mobile browser automation driver.
//!
//! Element taps and coordinates in a mobile browser are resolved through two
//! collaborators supplied by the embedder: a [`NativeAgent`] that drives the
//! device UI and a [`RemoteDebugger`] that runs scripts inside the page.
//! Atoms run under an [`supervisor::AtomSupervisor`] that reports blocking
//! dialogs instead of hanging on them.

pub mod commands;
pub mod config;
mod error;
pub mod geometry;
pub mod platform;
pub mod server;
pub mod supervisor;
pub mod tap;
pub mod webdriver;

#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use commands::WebCommands;
pub use config::{DriverConfig, DEFAULT_PORT};
pub use error::{Error, Result};
pub use platform::{NativeAgent, RemoteDebugger};
pub use server::AppState;

/// Start the `WebDriver` HTTP server for the given collaborators
pub fn init(
    native: Arc<dyn NativeAgent>,
    remote: Arc<dyn RemoteDebugger>,
    config: DriverConfig,
) -> tokio::task::JoinHandle<Result<()>> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(native, remote, config));
    let handle = server::start(state);
    tracing::info!("WebDriver initialized on {addr}");
    handle
}
