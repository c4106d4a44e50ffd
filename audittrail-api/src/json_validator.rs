//! Nesting-depth guard for audit event response bodies
//!
//! Event payloads carry free-form `metadata` and field change values, so the
//! body is checked for excessive nesting before it is decoded into typed events.

use serde_json::Value;

/// Maximum allowed JSON nesting depth
///
/// Audit event pages nest about six levels deep
/// (`events[].targets[].fieldChanges[].added[]`), plus whatever the service puts
/// in `metadata`.
pub const MAX_JSON_DEPTH: usize = 32;

/// Validate JSON nesting depth
///
/// # Errors
///
/// Returns a message if the body is not valid JSON or nests deeper than
/// `max_depth`.
///
/// # Examples
///
/// ```
/// use audittrail_api::json_validator::{validate_json_depth, MAX_JSON_DEPTH};
///
/// let json = r#"{"events": [{"timestamp": 1, "actor": {"name": "alice"}}]}"#;
/// assert!(validate_json_depth(json, MAX_JSON_DEPTH).is_ok());
///
/// let deep_json = "[".repeat(50) + &"]".repeat(50);
/// assert!(validate_json_depth(&deep_json, MAX_JSON_DEPTH).is_err());
/// ```
pub fn validate_json_depth(json_str: &str, max_depth: usize) -> Result<Value, String> {
    let value: Value = serde_json::from_str(json_str).map_err(|e| format!("Invalid JSON: {e}"))?;

    let depth = calculate_depth(&value);
    if depth > max_depth {
        return Err(format!(
            "JSON nesting depth {depth} exceeds maximum allowed depth of {max_depth}"
        ));
    }

    Ok(value)
}

/// Maximum nesting depth of a JSON value (0 for scalars)
fn calculate_depth(value: &Value) -> usize {
    match value {
        Value::Array(arr) => {
            1_usize.saturating_add(arr.iter().map(calculate_depth).max().unwrap_or(0))
        }
        Value::Object(obj) => {
            1_usize.saturating_add(obj.values().map(calculate_depth).max().unwrap_or(0))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => 0,
    }
}
