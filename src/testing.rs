//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::DriverConfig;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::platform::{HttpMethod, NativeAgent, RemoteDebugger};
use crate::server::AppState;
use crate::webdriver::locator::NativeLocator;
use crate::webdriver::SessionSettings;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

struct FakeElement {
    id: String,
    /// Lookups that must happen before the element shows up
    after_lookups: usize,
}

#[derive(Default)]
struct NativeState {
    elements: HashMap<NativeLocator, Vec<FakeElement>>,
    rects: HashMap<String, Rect>,
    lookups: HashMap<NativeLocator, usize>,
    rect_reads: HashMap<String, usize>,
    fail_lookups: bool,
    failing_paths: HashSet<String>,
    orientation: String,
    alert_from_check: Option<usize>,
    alert_checks: usize,
    proxy_calls: Vec<(String, HttpMethod, Option<Value>)>,
    settings: Option<Arc<SessionSettings>>,
    observed_waits: Vec<u64>,
}

/// Native agent backed by a table of elements
#[derive(Default)]
pub struct FakeNativeAgent {
    state: Mutex<NativeState>,
}

impl FakeNativeAgent {
    pub fn new() -> Self {
        let agent = Self::default();
        lock(&agent.state).orientation = "PORTRAIT".to_string();
        agent
    }

    /// Record the implicit wait in effect at every lookup
    pub fn attach_settings(&self, settings: &Arc<SessionSettings>) {
        lock(&self.state).settings = Some(Arc::clone(settings));
    }

    pub fn add_element(&self, locator: NativeLocator, id: &str, rect: Rect) {
        self.add_element_after(locator, id, rect, 0);
    }

    pub fn add_element_after(&self, locator: NativeLocator, id: &str, rect: Rect, after_lookups: usize) {
        let mut state = lock(&self.state);
        state.elements.entry(locator).or_default().push(FakeElement {
            id: id.to_string(),
            after_lookups,
        });
        state.rects.insert(id.to_string(), rect);
    }

    pub fn set_rect(&self, id: &str, rect: Rect) {
        lock(&self.state).rects.insert(id.to_string(), rect);
    }

    pub fn fail_lookups(&self) {
        lock(&self.state).fail_lookups = true;
    }

    pub fn fail_proxy(&self, path: &str) {
        lock(&self.state).failing_paths.insert(path.to_string());
    }

    pub fn set_orientation(&self, orientation: &str) {
        lock(&self.state).orientation = orientation.to_string();
    }

    /// Alert checks numbered from 1; from `check` on an alert is open
    pub fn open_alert_from_check(&self, check: usize) {
        lock(&self.state).alert_from_check = Some(check);
    }

    pub fn lookup_count(&self, locator: &NativeLocator) -> usize {
        lock(&self.state).lookups.get(locator).copied().unwrap_or(0)
    }

    pub fn rect_reads(&self, id: &str) -> usize {
        lock(&self.state).rect_reads.get(id).copied().unwrap_or(0)
    }

    pub fn alert_checks(&self) -> usize {
        lock(&self.state).alert_checks
    }

    pub fn observed_waits(&self) -> Vec<u64> {
        lock(&self.state).observed_waits.clone()
    }

    pub fn proxy_calls(&self) -> Vec<(String, HttpMethod, Option<Value>)> {
        lock(&self.state).proxy_calls.clone()
    }
}

#[async_trait]
impl NativeAgent for FakeNativeAgent {
    async fn proxy_command(&self, path: &str, method: HttpMethod, body: Option<Value>) -> Result<Value> {
        let mut state = lock(&self.state);
        state.proxy_calls.push((path.to_string(), method, body));
        if state.failing_paths.contains(path) {
            return Err(Error::proxy(path, "agent refused command"));
        }
        Ok(match path {
            "/orientation" => json!(state.orientation),
            _ => Value::Null,
        })
    }

    async fn find_native_elements(&self, locator: &NativeLocator) -> Result<Vec<String>> {
        let mut state = lock(&self.state);
        if let Some(wait) = state.settings.as_ref().map(|s| s.implicit_wait_ms()) {
            state.observed_waits.push(wait);
        }
        let prior = {
            let count = state.lookups.entry(locator.clone()).or_insert(0);
            *count += 1;
            *count - 1
        };
        if state.fail_lookups {
            return Err(Error::proxy("/elements", "agent unavailable"));
        }
        Ok(state
            .elements
            .get(locator)
            .map(|found| {
                found
                    .iter()
                    .filter(|el| prior >= el.after_lookups)
                    .map(|el| el.id.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_native_rect(&self, element_id: &str) -> Result<Rect> {
        let mut state = lock(&self.state);
        *state.rect_reads.entry(element_id.to_string()).or_insert(0) += 1;
        state
            .rects
            .get(element_id)
            .copied()
            .ok_or_else(|| Error::ElementNotFound(element_id.to_string()))
    }

    async fn get_alert_text(&self) -> Result<String> {
        let mut state = lock(&self.state);
        state.alert_checks += 1;
        match state.alert_from_check {
            Some(from) if state.alert_checks >= from => Ok("Are you sure?".to_string()),
            _ => Err(Error::proxy("/alert/text", "no alert open")),
        }
    }
}

/// How a fake atom answers
#[derive(Debug, Clone)]
pub enum AtomReply {
    Value(Value),
    Error(String),
    Delayed(Duration, std::result::Result<Value, String>),
    Never,
}

struct RemoteState {
    user_agent: String,
    screen: (f64, f64),
    viewport: Option<(f64, f64)>,
    fail_scripts: bool,
    script_calls: usize,
    replies: HashMap<String, AtomReply>,
    queued: HashMap<String, VecDeque<AtomReply>>,
    atom_calls: Vec<(String, Vec<Value>, Vec<String>)>,
    async_calls: Vec<(String, String)>,
}

/// Remote debugger with scripted atom replies
pub struct FakeRemote {
    state: Mutex<RemoteState>,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RemoteState {
                user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 11_0 like Mac OS X)".to_string(),
                screen: (375.0, 667.0),
                viewport: Some((400.0, 756.0)),
                fail_scripts: false,
                script_calls: 0,
                replies: HashMap::new(),
                queued: HashMap::new(),
                atom_calls: Vec::new(),
                async_calls: Vec::new(),
            }),
        }
    }

    pub fn set_device(&self, user_agent: &str, width: f64, height: f64) {
        let mut state = lock(&self.state);
        state.user_agent = user_agent.to_string();
        state.screen = (width, height);
    }

    pub fn set_viewport(&self, viewport: Option<(f64, f64)>) {
        lock(&self.state).viewport = viewport;
    }

    pub fn fail_scripts(&self) {
        lock(&self.state).fail_scripts = true;
    }

    /// Answer every call of `name` with `reply`
    pub fn set_atom(&self, name: &str, reply: AtomReply) {
        lock(&self.state).replies.insert(name.to_string(), reply);
    }

    /// Answer the next call of `name` with `reply`, ahead of the standing reply
    pub fn push_atom(&self, name: &str, reply: AtomReply) {
        lock(&self.state)
            .queued
            .entry(name.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn script_calls(&self) -> usize {
        lock(&self.state).script_calls
    }

    pub fn atom_calls(&self) -> Vec<(String, Vec<Value>, Vec<String>)> {
        lock(&self.state).atom_calls.clone()
    }

    pub fn atom_call_count(&self, name: &str) -> usize {
        lock(&self.state)
            .atom_calls
            .iter()
            .filter(|(n, _, _)| n == name)
            .count()
    }

    pub fn async_calls(&self) -> Vec<(String, String)> {
        lock(&self.state).async_calls.clone()
    }

    fn next_reply(&self, name: &str, args: &[Value], frames: &[String]) -> AtomReply {
        let mut state = lock(&self.state);
        state
            .atom_calls
            .push((name.to_string(), args.to_vec(), frames.to_vec()));
        if let Some(reply) = state.queued.get_mut(name).and_then(VecDeque::pop_front) {
            return reply;
        }
        state
            .replies
            .get(name)
            .cloned()
            .unwrap_or(AtomReply::Value(Value::Null))
    }
}

#[async_trait]
impl RemoteDebugger for FakeRemote {
    async fn execute(&self, script: &str) -> Result<Value> {
        let mut state = lock(&self.state);
        state.script_calls += 1;
        if state.fail_scripts {
            return Err(Error::JavaScript("remote debugger disconnected".to_string()));
        }
        if script.contains("navigator.userAgent") {
            return Ok(json!({
                "userAgent": state.user_agent,
                "screenWidth": state.screen.0,
                "screenHeight": state.screen.1,
            }));
        }
        if script.contains("innerWidth") {
            return Ok(state
                .viewport
                .map_or(Value::Null, |(width, height)| json!({"width": width, "height": height})));
        }
        Ok(Value::Null)
    }

    async fn execute_atom(&self, name: &str, args: &[Value], frames: &[String]) -> Result<Value> {
        match self.next_reply(name, args, frames) {
            AtomReply::Value(value) => Ok(value),
            AtomReply::Error(message) => Err(Error::JavaScript(message)),
            AtomReply::Delayed(delay, result) => {
                tokio::time::sleep(delay).await;
                result.map_err(Error::JavaScript)
            }
            AtomReply::Never => std::future::pending().await,
        }
    }

    async fn execute_atom_async(
        &self,
        name: &str,
        args: &[Value],
        frames: &[String],
        response_url: &str,
    ) -> Result<()> {
        lock(&self.state)
            .async_calls
            .push((name.to_string(), response_url.to_string()));
        match self.next_reply(name, args, frames) {
            AtomReply::Error(message) => Err(Error::JavaScript(message)),
            _ => Ok(()),
        }
    }
}

/// Server state over fresh fakes with the default configuration
pub fn app_state() -> (Arc<AppState>, Arc<FakeNativeAgent>, Arc<FakeRemote>) {
    let native = Arc::new(FakeNativeAgent::new());
    let remote = Arc::new(FakeRemote::new());
    let state = Arc::new(AppState::new(
        native.clone(),
        remote.clone(),
        DriverConfig::default(),
    ));
    (state, native, remote)
}

/// Register a session with default settings and return its id
pub async fn create_session(state: &Arc<AppState>) -> String {
    let mut sessions = state.sessions.write().await;
    sessions
        .create(Arc::new(SessionSettings::default()), |id, settings| {
            state.build_commands(id, settings)
        })
        .id
        .clone()
}
