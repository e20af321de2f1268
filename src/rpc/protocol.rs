//! JSON-RPC 2.0 wire types.
//!
//! A message carrying an `id` member is a *request* and is always answered;
//! one without is a *notification* and never is.

use serde::Serialize;
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    pub fn new(code: i32, message: &'static str) -> Self {
        Self {
            code,
            message,
            data: None,
        }
    }

    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn parse_error() -> Self {
        Self::new(PARSE_ERROR, "Parse error.")
    }

    pub fn invalid_request(reason: &'static str) -> Self {
        Self::new(INVALID_REQUEST, "Invalid Request.").with_data(reason)
    }

    pub fn method_not_found() -> Self {
        Self::new(METHOD_NOT_FOUND, "Method not found.")
    }
}

/// JSON-RPC response envelope.
///
/// `id: Some(Value::Null)` serializes as `"id": null`; `None` omits the
/// member.  Exactly one of `result` / `error` is set, except for
/// `ResultKind::None` methods which carry neither.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    /// Empty envelope echoing the request id.
    pub fn new(id: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: None,
        }
    }

    pub fn error(id: Option<Value>, error: ErrorObject) -> Self {
        Self {
            error: Some(error),
            ..Self::new(id)
        }
    }

    /// Reply to input that could not be parsed at all.
    pub fn parse_error() -> Self {
        Self::error(Some(Value::Null), ErrorObject::parse_error())
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
