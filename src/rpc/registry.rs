//! Method registry — maps a method name to a typed handler.
//!
//! The registry is filled once during [`Server::setup`](super::server::Server::setup)
//! and only read afterwards.  Its capacity is fixed at construction; a
//! registration past capacity is reported, never dropped silently.
//!
//! Each [`Handler`] variant carries a fully-typed function pointer.  The
//! variant *is* the result kind, so the dispatcher matches it exhaustively
//! instead of reinterpreting an untyped callback.

use core::fmt;

use log::{info, warn};
use serde_json::{Map, Value};

use crate::error::{CapacityError, Error, Result};

// ───────────────────────────────────────────────────────────────
// Handler types
// ───────────────────────────────────────────────────────────────

/// Handler-level failure, answered with a JSON-RPC error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodError {
    /// Parameters missing or of the wrong type (-32602).
    InvalidParams(&'static str),
    /// The handler could not complete (-32603).
    Internal(&'static str),
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParams(msg) => write!(f, "invalid params: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

pub type MethodResult<T> = core::result::Result<T, MethodError>;

/// Shape of the value a handler produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    None,
    Int,
    Bool,
    Float,
    Double,
    String,
    Object,
}

/// Typed method callback.  `C` is the application context handed to every
/// call; `params` is the request's `params` member (an empty object when
/// absent).
pub enum Handler<C> {
    None(fn(&mut C, &Value) -> MethodResult<()>),
    Int(fn(&mut C, &Value) -> MethodResult<i64>),
    Bool(fn(&mut C, &Value) -> MethodResult<bool>),
    Float(fn(&mut C, &Value) -> MethodResult<f32>),
    Double(fn(&mut C, &Value) -> MethodResult<f64>),
    String(fn(&mut C, &Value) -> MethodResult<String>),
    Object(fn(&mut C, &Value) -> MethodResult<Map<String, Value>>),
}

impl<C> Handler<C> {
    pub fn result_kind(&self) -> ResultKind {
        match self {
            Self::None(_) => ResultKind::None,
            Self::Int(_) => ResultKind::Int,
            Self::Bool(_) => ResultKind::Bool,
            Self::Float(_) => ResultKind::Float,
            Self::Double(_) => ResultKind::Double,
            Self::String(_) => ResultKind::String,
            Self::Object(_) => ResultKind::Object,
        }
    }

    /// Invoke the handler.  `Ok(None)` means "no result member".
    pub fn call(&self, ctx: &mut C, params: &Value) -> MethodResult<Option<Value>> {
        Ok(match *self {
            Self::None(f) => {
                f(ctx, params)?;
                None
            }
            Self::Int(f) => Some(Value::from(f(ctx, params)?)),
            Self::Bool(f) => Some(Value::from(f(ctx, params)?)),
            Self::Float(f) => Some(Value::from(f(ctx, params)?)),
            Self::Double(f) => Some(Value::from(f(ctx, params)?)),
            Self::String(f) => Some(Value::from(f(ctx, params)?)),
            Self::Object(f) => Some(Value::Object(f(ctx, params)?)),
        })
    }
}

impl<C> Clone for Handler<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Handler<C> {}

impl<C> fmt::Debug for Handler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler::{:?}", self.result_kind())
    }
}

// ───────────────────────────────────────────────────────────────
// Registry
// ───────────────────────────────────────────────────────────────

/// One registered method.
#[derive(Debug)]
pub struct MethodMapping<C> {
    pub name: &'static str,
    pub handler: Handler<C>,
}

impl<C> MethodMapping<C> {
    pub fn result_kind(&self) -> ResultKind {
        self.handler.result_kind()
    }
}

/// Bounded, append-only method table with linear exact-match lookup.
pub struct Registry<C> {
    mappings: Vec<MethodMapping<C>>,
    capacity: usize,
}

impl<C> Registry<C> {
    /// Allocate storage for exactly `capacity` mappings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mappings: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a mapping.  Duplicate names are accepted; lookups resolve to
    /// the first one registered.
    pub fn register(&mut self, name: &'static str, handler: Handler<C>) -> Result<()> {
        if self.mappings.len() >= self.capacity {
            warn!(
                "Registry: '{}' rejected, table full ({} entries)",
                name, self.capacity
            );
            return Err(Error::from(CapacityError::RegistrationOverflow {
                capacity: self.capacity,
            }));
        }
        if self.lookup(name).is_some() {
            warn!("Registry: '{}' already registered, first entry wins", name);
        }
        info!("Registry: {} -> {:?}", name, handler.result_kind());
        self.mappings.push(MethodMapping { name, handler });
        Ok(())
    }

    /// Case-sensitive exact-match lookup; first registration wins.
    pub fn lookup(&self, name: &str) -> Option<&MethodMapping<C>> {
        self.mappings.iter().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.mappings.iter().map(|m| m.name)
    }
}
