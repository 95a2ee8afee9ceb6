use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::webdriver::element::{ATOMS_ELEMENT_KEY, W3C_ELEMENT_KEY};
use crate::webdriver::locator::NativeLocator;

/// HTTP verb for native agent proxy commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// Native UI-automation agent reachable through the driver's proxy.
/// The embedding driver implements this trait.
#[async_trait]
pub trait NativeAgent: Send + Sync {
    // =========================================================================
    // Transport
    // =========================================================================

    /// Send a raw command to the native agent and return its JSON value
    async fn proxy_command(
        &self,
        path: &str,
        method: HttpMethod,
        body: Option<Value>,
    ) -> Result<Value>;

    // =========================================================================
    // Element Queries
    // =========================================================================

    /// Run a single native lookup. An empty list means nothing matched.
    async fn find_native_elements(&self, locator: &NativeLocator) -> Result<Vec<String>>;

    /// Get the native rectangle of an element
    async fn get_native_rect(&self, element_id: &str) -> Result<Rect> {
        let path = format!("/element/{element_id}/rect");
        let value = self.proxy_command(&path, HttpMethod::Get, None).await?;
        serde_json::from_value(value).map_err(|e| Error::proxy(&path, e.to_string()))
    }

    // =========================================================================
    // Alerts
    // =========================================================================

    /// Text of the currently open alert. An error means no alert is open.
    async fn get_alert_text(&self) -> Result<String> {
        let value = self
            .proxy_command("/alert/text", HttpMethod::Get, None)
            .await?;
        Ok(value.as_str().map(str::to_string).unwrap_or_default())
    }
}

/// Browser-side execution channel into the web view
#[async_trait]
pub trait RemoteDebugger: Send + Sync {
    /// Evaluate a plain script and return its value
    async fn execute(&self, script: &str) -> Result<Value>;

    /// Run a named atom synchronously
    async fn execute_atom(&self, name: &str, args: &[Value], frames: &[String]) -> Result<Value>;

    /// Start a named atom whose result is posted to `response_url`
    async fn execute_atom_async(
        &self,
        name: &str,
        args: &[Value],
        frames: &[String],
        response_url: &str,
    ) -> Result<()>;
}

// =============================================================================
// Response Parsing
// =============================================================================

/// Unwrap an atom response envelope.
///
/// Objects carrying a numeric `status` are `{status, value}` envelopes: zero
/// yields `value`, anything else is a script failure. Element references in
/// the result gain the W3C element key alongside the atoms key.
pub fn parse_execute_response(result: Value) -> Result<Value> {
    let value = match result {
        Value::Object(mut obj) if obj.get("status").is_some_and(Value::is_number) => {
            let status = obj.get("status").and_then(Value::as_i64).unwrap_or(0);
            let value = obj.remove("value").unwrap_or(Value::Null);
            if status != 0 {
                return Err(Error::JavaScript(error_message(&value, status)));
            }
            value
        }
        other => other,
    };
    Ok(convert_elements(value))
}

fn error_message(value: &Value, status: i64) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| value.to_string(), str::to_string),
        Value::Null => format!("atom returned status {status}"),
        other => other.to_string(),
    }
}

fn convert_elements(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(convert_elements).collect()),
        Value::Object(obj) => {
            if let Some(id) = obj.get(ATOMS_ELEMENT_KEY).and_then(Value::as_str) {
                if obj.len() == 1 {
                    let id = id.to_string();
                    let mut element = Map::new();
                    element.insert(ATOMS_ELEMENT_KEY.to_string(), Value::String(id.clone()));
                    element.insert(W3C_ELEMENT_KEY.to_string(), Value::String(id));
                    return Value::Object(element);
                }
            }
            Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, convert_elements(v)))
                    .collect(),
            )
        }
        other => other,
    }
}
