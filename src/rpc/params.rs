//! Typed extraction of handler parameters.
//!
//! Presence and type checks only; anything deeper belongs to the handler.

use serde_json::Value;

use super::registry::{MethodError, MethodResult};

/// Extract a required boolean param.
pub fn require_bool(params: &Value, key: &'static str) -> MethodResult<bool> {
    params
        .get(key)
        .and_then(Value::as_bool)
        .ok_or(MethodError::InvalidParams(key))
}

/// Extract a required integer param.
pub fn require_i64(params: &Value, key: &'static str) -> MethodResult<i64> {
    params
        .get(key)
        .and_then(Value::as_i64)
        .ok_or(MethodError::InvalidParams(key))
}

/// Extract a required numeric param (integers are widened).
pub fn require_f64(params: &Value, key: &'static str) -> MethodResult<f64> {
    params
        .get(key)
        .and_then(Value::as_f64)
        .ok_or(MethodError::InvalidParams(key))
}

/// Extract a required string param.
pub fn require_str<'a>(params: &'a Value, key: &'static str) -> MethodResult<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or(MethodError::InvalidParams(key))
}

/// Extract an optional boolean param.
pub fn optional_bool(params: &Value, key: &str) -> Option<bool> {
    params.get(key).and_then(Value::as_bool)
}

/// Extract an optional i64 param.
pub fn optional_i64(params: &Value, key: &str) -> Option<i64> {
    params.get(key).and_then(Value::as_i64)
}
