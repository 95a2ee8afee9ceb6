use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::oneshot;

/// Pending asynchronous atom responses, keyed by session id.
///
/// A session has at most one outstanding async atom. Registering again drops
/// the previous sender, so the superseded receiver sees a closed channel.
#[derive(Debug, Default)]
pub struct AsyncResponseState {
    pending: Mutex<HashMap<String, oneshot::Sender<Result<Value, String>>>>,
}

impl AsyncResponseState {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, oneshot::Sender<Result<Value, String>>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a pending async atom and return the receiver
    pub fn register(&self, session_id: &str) -> oneshot::Receiver<Result<Value, String>> {
        let (tx, rx) = oneshot::channel();
        if self.pending().insert(session_id.to_string(), tx).is_some() {
            tracing::debug!(session_id, "superseding pending async atom response");
        }
        rx
    }

    /// Deliver the result posted to the response URL.
    /// Returns false when nothing was waiting for it.
    pub fn complete(&self, session_id: &str, result: Result<Value, String>) -> bool {
        let sender = self.pending().remove(session_id);
        match sender {
            Some(tx) => tx.send(result).is_ok(),
            None => {
                tracing::warn!(session_id, "async atom response arrived with nothing pending");
                false
            }
        }
    }

    /// Drop a pending async atom (e.g. when its session is deleted)
    pub fn cancel(&self, session_id: &str) {
        self.pending().remove(session_id);
    }
}
