use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::commands::WebCommands;
use crate::error::{Error, Result};

/// Session timeouts snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_field_names)]
pub struct Timeouts {
    /// Implicit wait timeout in milliseconds
    #[serde(rename = "implicit")]
    pub implicit_ms: u64,
    /// Page load timeout in milliseconds
    #[serde(rename = "pageLoad")]
    pub page_load_ms: u64,
    /// Script execution timeout in milliseconds
    #[serde(rename = "script")]
    pub script_ms: u64,
}

/// Mutable per-session settings shared by every command of the session.
#[derive(Debug)]
pub struct SessionSettings {
    implicit_wait_ms: AtomicU64,
    page_load_ms: AtomicU64,
    script_ms: AtomicU64,
    check_for_modal_dialogs: AtomicBool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SessionSettings {
    pub fn new(implicit_wait_ms: u64) -> Self {
        Self {
            implicit_wait_ms: AtomicU64::new(implicit_wait_ms),
            page_load_ms: AtomicU64::new(300_000),
            script_ms: AtomicU64::new(30_000),
            check_for_modal_dialogs: AtomicBool::new(true),
        }
    }

    pub fn implicit_wait_ms(&self) -> u64 {
        self.implicit_wait_ms.load(Ordering::SeqCst)
    }

    pub fn implicit_wait(&self) -> Duration {
        Duration::from_millis(self.implicit_wait_ms())
    }

    pub fn set_implicit_wait(&self, ms: u64) {
        self.implicit_wait_ms.store(ms, Ordering::SeqCst);
    }

    pub fn set_page_load(&self, ms: u64) {
        self.page_load_ms.store(ms, Ordering::SeqCst);
    }

    pub fn set_script(&self, ms: u64) {
        self.script_ms.store(ms, Ordering::SeqCst);
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            implicit_ms: self.implicit_wait_ms(),
            page_load_ms: self.page_load_ms.load(Ordering::SeqCst),
            script_ms: self.script_ms.load(Ordering::SeqCst),
        }
    }

    pub fn check_for_modal_dialogs(&self) -> bool {
        self.check_for_modal_dialogs.load(Ordering::SeqCst)
    }

    pub fn set_check_for_modal_dialogs(&self, enabled: bool) {
        self.check_for_modal_dialogs.store(enabled, Ordering::SeqCst);
    }

    /// Force the implicit wait to zero until the guard is dropped
    pub fn zero_implicit_wait(&self) -> ImplicitWaitGuard<'_> {
        let previous_ms = self.implicit_wait_ms.swap(0, Ordering::SeqCst);
        ImplicitWaitGuard {
            settings: self,
            previous_ms,
        }
    }
}

/// Restores the saved implicit wait on drop, on every exit path.
#[must_use = "the implicit wait is restored as soon as the guard is dropped"]
pub struct ImplicitWaitGuard<'a> {
    settings: &'a SessionSettings,
    previous_ms: u64,
}

impl Drop for ImplicitWaitGuard<'_> {
    fn drop(&mut self) {
        self.settings.set_implicit_wait(self.previous_ms);
    }
}

/// Represents a `WebDriver` session
pub struct Session {
    /// Unique session identifier
    pub id: String,
    pub settings: Arc<SessionSettings>,
    /// Web-context commands bound to this session
    pub commands: Arc<WebCommands>,
}

/// Manages `WebDriver` sessions
#[derive(Default)]
pub struct SessionManager {
    sessions: HashMap<String, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Create a new session around commands built for it
    pub fn create<F>(&mut self, settings: Arc<SessionSettings>, build: F) -> &Session
    where
        F: FnOnce(&str, Arc<SessionSettings>) -> WebCommands,
    {
        let id = Uuid::new_v4().to_string();
        let commands = Arc::new(build(&id, Arc::clone(&settings)));
        self.sessions
            .entry(id.clone())
            .or_insert(Session {
                id,
                settings,
                commands,
            })
    }

    /// Get a session by ID
    pub fn get(&self, id: &str) -> Result<&Session> {
        self.sessions
            .get(id)
            .ok_or_else(|| Error::NoSuchSession(id.to_string()))
    }

    /// Delete a session
    pub fn delete(&mut self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }
}
