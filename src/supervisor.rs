//! Alert-safe execution of browser atoms.
//!
//! An atom runs as a detached task that is never cancelled. While it runs the
//! supervisor waits on a watchdog; if the watchdog fires first it starts
//! polling for a blocking dialog, since a native alert opened by the page
//! would otherwise leave the atom hanging forever.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::sleep;

use crate::config::SupervisorConfig;
use crate::error::{Error, Result};
use crate::platform::{parse_execute_response, AsyncResponseState, NativeAgent, RemoteDebugger};
use crate::webdriver::SessionSettings;

/// Where the supervisor is in one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Started,
    Running,
    TimedOutWaiting,
    PollingForAlert(u32),
    Completed,
    AlertInterrupted,
}

/// When a blocking dialog was seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPhase {
    BeforeAction,
    AfterStart,
}

impl AlertPhase {
    fn message(self) -> &'static str {
        match self {
            Self::BeforeAction => "an alert was open before action performed",
            Self::AfterStart => "an alert appeared after action had already started",
        }
    }
}

/// Terminal outcome of one supervised atom
#[derive(Debug, Clone, PartialEq)]
pub enum AtomOutcome {
    Completed(Value),
    Failed(String),
    TimedOutThenCompleted(Value),
    TimedOutThenFailed(String),
    InterruptedByAlert(AlertPhase),
}

impl AtomOutcome {
    fn settled(joined: std::result::Result<Result<Value>, JoinError>, timed_out: bool) -> Self {
        let result = joined
            .map_err(|e| e.to_string())
            .and_then(|r| r.map_err(|e| atom_error_message(&e)));
        match (result, timed_out) {
            (Ok(value), false) => Self::Completed(value),
            (Ok(value), true) => Self::TimedOutThenCompleted(value),
            (Err(message), false) => Self::Failed(message),
            (Err(message), true) => Self::TimedOutThenFailed(message),
        }
    }

    /// Parse a successful result, or turn the outcome into its error
    pub fn into_result(self) -> Result<Value> {
        match self {
            Self::Completed(value) | Self::TimedOutThenCompleted(value) => {
                parse_execute_response(value)
            }
            Self::Failed(message) | Self::TimedOutThenFailed(message) => {
                Err(Error::AtomExecution(message))
            }
            Self::InterruptedByAlert(phase) => {
                Err(Error::UnexpectedAlertOpen(phase.message().to_string()))
            }
        }
    }
}

fn atom_error_message(err: &Error) -> String {
    match err {
        Error::JavaScript(message) | Error::AtomExecution(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Races atoms against the watchdog and polls for alerts
pub struct AtomSupervisor {
    native: Arc<dyn NativeAgent>,
    settings: Arc<SessionSettings>,
    config: SupervisorConfig,
}

impl AtomSupervisor {
    pub fn new(
        native: Arc<dyn NativeAgent>,
        settings: Arc<SessionSettings>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            native,
            settings,
            config,
        }
    }

    /// Whether a blocking dialog is open. Always false when modal dialog
    /// checks are disabled for the session.
    pub async fn check_for_alert(&self) -> bool {
        if !self.settings.check_for_modal_dialogs() {
            return false;
        }
        match self.native.get_alert_text().await {
            Ok(text) => {
                tracing::debug!(%text, "alert present");
                true
            }
            Err(_) => false,
        }
    }

    fn transition(state: &mut SupervisorState, next: SupervisorState) {
        tracing::trace!(from = ?*state, to = ?next, "atom supervisor");
        *state = next;
    }

    /// Run `action` to a single terminal outcome
    pub async fn supervise<F>(&self, action: F) -> AtomOutcome
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        let mut state = SupervisorState::Started;

        if self.check_for_alert().await {
            Self::transition(&mut state, SupervisorState::AlertInterrupted);
            return AtomOutcome::InterruptedByAlert(AlertPhase::BeforeAction);
        }

        let mut handle: JoinHandle<Result<Value>> = tokio::spawn(action);
        Self::transition(&mut state, SupervisorState::Running);

        let early = tokio::select! {
            biased;
            joined = &mut handle => Some(joined),
            () = sleep(self.config.watchdog()) => None,
        };
        if let Some(joined) = early {
            Self::transition(&mut state, SupervisorState::Completed);
            return AtomOutcome::settled(joined, false);
        }

        Self::transition(&mut state, SupervisorState::TimedOutWaiting);
        tracing::debug!(
            watchdog_ms = self.config.watchdog_ms,
            "atom still running, polling for alerts"
        );

        let mut joined = None;
        for poll in 1..=self.config.max_polls {
            if handle.is_finished() {
                break;
            }
            Self::transition(&mut state, SupervisorState::PollingForAlert(poll));
            if self.check_for_alert().await {
                Self::transition(&mut state, SupervisorState::AlertInterrupted);
                return AtomOutcome::InterruptedByAlert(AlertPhase::AfterStart);
            }
            tokio::select! {
                biased;
                settled = &mut handle => {
                    joined = Some(settled);
                    break;
                }
                () = sleep(self.config.poll_interval()) => {}
            }
        }

        let joined = match joined {
            Some(joined) => joined,
            None => handle.await,
        };
        Self::transition(&mut state, SupervisorState::Completed);
        AtomOutcome::settled(joined, true)
    }
}

/// Runs named atoms through the supervisor
pub struct AtomExecutor {
    session_id: String,
    remote: Arc<dyn RemoteDebugger>,
    supervisor: AtomSupervisor,
    async_responses: Arc<AsyncResponseState>,
    frames: Mutex<Vec<String>>,
}

impl AtomExecutor {
    pub fn new(
        session_id: &str,
        remote: Arc<dyn RemoteDebugger>,
        supervisor: AtomSupervisor,
        async_responses: Arc<AsyncResponseState>,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            remote,
            supervisor,
            async_responses,
            frames: Mutex::new(Vec::new()),
        }
    }

    /// Frame path atoms run in, outermost first
    pub fn set_frames(&self, frames: Vec<String>) {
        *self.frames.lock().unwrap_or_else(PoisonError::into_inner) = frames;
    }

    fn frames(&self, always_default_frame: bool) -> Vec<String> {
        if always_default_frame {
            Vec::new()
        } else {
            self.frames
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    pub async fn execute_atom(
        &self,
        name: &str,
        args: &[Value],
        always_default_frame: bool,
    ) -> Result<Value> {
        let remote = Arc::clone(&self.remote);
        let name = name.to_string();
        let args = args.to_vec();
        let frames = self.frames(always_default_frame);
        tracing::debug!(atom = %name, "executing atom");

        self.supervisor
            .supervise(async move { remote.execute_atom(&name, &args, &frames).await })
            .await
            .into_result()
    }

    /// Start an atom whose result is posted back to `response_url`
    pub async fn execute_atom_async(
        &self,
        name: &str,
        args: &[Value],
        response_url: &str,
    ) -> Result<Value> {
        let remote = Arc::clone(&self.remote);
        let name = name.to_string();
        let args = args.to_vec();
        let response_url = response_url.to_string();
        let frames = self.frames(false);
        let async_responses = Arc::clone(&self.async_responses);
        let session_id = self.session_id.clone();
        tracing::debug!(atom = %name, %response_url, "executing async atom");

        self.supervisor
            .supervise(async move {
                let response = async_responses.register(&session_id);
                remote
                    .execute_atom_async(&name, &args, &frames, &response_url)
                    .await?;
                match response.await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(message)) => Err(Error::JavaScript(message)),
                    Err(_) => Err(Error::AtomExecution(
                        "async response was superseded or cancelled".to_string(),
                    )),
                }
            })
            .await
            .into_result()
    }
}
