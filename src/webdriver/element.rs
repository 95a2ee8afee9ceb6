use serde_json::{json, Value};

/// Element key used by browser atoms
pub const ATOMS_ELEMENT_KEY: &str = "ELEMENT";
/// W3C `WebDriver` element key
pub const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Wrap a web element id in the form atoms expect as an argument
pub fn use_atoms_element(element_id: &str) -> Value {
    json!({ ATOMS_ELEMENT_KEY: element_id })
}

/// Extract an element id from a bare string or either element reference form
pub fn unwrap_element(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Object(obj) => obj
            .get(ATOMS_ELEMENT_KEY)
            .or_else(|| obj.get(W3C_ELEMENT_KEY))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
