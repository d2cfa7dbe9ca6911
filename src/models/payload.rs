use serde_json::{Map, Value};

use crate::error::AppError;

/// Unnormalized backend response: a flat key/value mapping that may carry
/// non-room keys alongside the rooms.
pub type RawPayload = Map<String, Value>;

pub const LOGGED_IN_USERS_KEY: &str = "loggedInUsers";

/// Accept a decoded response body as a payload. `null`, a non-object, or an
/// empty object is a failed fetch, not "zero rooms".
pub fn from_value(value: Value) -> Result<RawPayload, AppError> {
    match value {
        Value::Object(map) if !map.is_empty() => Ok(map),
        _ => Err(AppError::EmptyPayload),
    }
}

/// Booleans pass through; the device API's integer 0/1 becomes off/on.
pub fn state_of(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}

pub fn logged_in_users(payload: &RawPayload) -> Option<i64> {
    payload.get(LOGGED_IN_USERS_KEY).and_then(|v| v.as_i64())
}

/// Loose truthiness for acknowledgment bodies, which the device returns as
/// whatever JSON scalar its firmware prefers.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
