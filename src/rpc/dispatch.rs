//! Request dispatcher — resolves one parsed message against the registry.
//!
//! Every message is handled to completion; nothing persists between
//! messages.
//!
//! ```text
//!  bytes ──parse──▶ object? ──no──▶ Parse error / Invalid Request (id: null)
//!                      │yes
//!                      ▼
//!               has "method"? ──no──▶ id? ── no ──▶ drop
//!                      │yes                └─ yes ─▶ Invalid Request
//!                      ▼
//!               registry lookup ──miss──▶ id? ── no ──▶ drop
//!                      │hit                    └─ yes ─▶ Method not found
//!                      ▼
//!               call handler ──▶ id? ── no ──▶ drop (side effects kept)
//!                                    └─ yes ─▶ result / handler error
//! ```

use log::{debug, warn};
use serde_json::{Map, Value};

use super::protocol::{ErrorObject, INTERNAL_ERROR, INVALID_PARAMS, Response};
use super::registry::{MethodError, Registry};

impl From<MethodError> for ErrorObject {
    fn from(e: MethodError) -> Self {
        match e {
            MethodError::InvalidParams(detail) => {
                ErrorObject::new(INVALID_PARAMS, "Invalid params.").with_data(detail)
            }
            MethodError::Internal(detail) => {
                ErrorObject::new(INTERNAL_ERROR, "Internal error.").with_data(detail)
            }
        }
    }
}

/// Parse raw bytes and dispatch them.
///
/// Unparseable input is answered with a parse error (`id: null`).
pub fn dispatch_bytes<C>(registry: &Registry<C>, ctx: &mut C, bytes: &[u8]) -> Option<Response> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(message) => dispatch(registry, ctx, &message),
        Err(e) => {
            warn!("RPC: unparseable message ({} bytes): {}", bytes.len(), e);
            Some(Response::parse_error())
        }
    }
}

/// Dispatch one parsed message.  Returns the response to send, or `None`
/// when the protocol forbids a reply.
pub fn dispatch<C>(registry: &Registry<C>, ctx: &mut C, message: &Value) -> Option<Response> {
    let Some(request) = message.as_object() else {
        warn!("RPC: message is not an object");
        return Some(Response::error(
            Some(Value::Null),
            ErrorObject::invalid_request("Request must be an object."),
        ));
    };

    // A notification is a request without an "id" member.
    let id = request.get("id").cloned();

    let method = match request.get("method") {
        Some(Value::String(method)) => method.as_str(),
        Some(_) => return reject_invalid(id, "Method must be a string."),
        None => return reject_invalid(id, "Missing method."),
    };

    let empty = Value::Object(Map::new());
    let params = request.get("params").unwrap_or(&empty);

    let Some(mapping) = registry.lookup(method) else {
        if id.is_none() {
            debug!("RPC: unknown notification '{}' dropped", method);
            return None;
        }
        debug!("RPC: method '{}' not found", method);
        return Some(Response::error(id, ErrorObject::method_not_found()));
    };

    let outcome = mapping.handler.call(ctx, params);

    if id.is_none() {
        if let Err(e) = outcome {
            warn!("RPC: notification '{}' failed: {}", method, e);
        }
        return None;
    }

    let mut response = Response::new(id);
    match outcome {
        Ok(result) => response.result = result,
        Err(e) => {
            warn!("RPC: '{}' failed: {}", method, e);
            response.error = Some(e.into());
        }
    }
    Some(response)
}

fn reject_invalid(id: Option<Value>, reason: &'static str) -> Option<Response> {
    match id {
        Some(id) => Some(Response::error(Some(id), ErrorObject::invalid_request(reason))),
        None => {
            debug!("RPC: malformed notification dropped ({})", reason);
            None
        }
    }
}
