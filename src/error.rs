//! Unified error types for the property engine and RPC server.
//!
//! A single `Error` enum that every subsystem converts into.  All variants
//! are `Copy` and carry only `&'static str` context so they can be returned
//! from the notify path without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible local operation funnels into this type.
///
/// Protocol-level failures (invalid request, unknown method) are not errors
/// here: they are answered to the remote caller as JSON-RPC error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A fixed-capacity table is full.
    Capacity(CapacityError),
    /// An observer failed and aborted a notification fan-out.
    Observer(ObserverFailure),
    /// A shared property was entered while already borrowed (carries its name).
    Reentrant(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capacity(e) => write!(f, "capacity: {e}"),
            Self::Observer(e) => write!(f, "observer: {e}"),
            Self::Reentrant(name) => write!(f, "re-entrant access to property '{name}'"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Capacity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    /// The method registry already holds `capacity` mappings.
    RegistrationOverflow { capacity: usize },
    /// The property already holds `capacity` observers.
    ObserverOverflow { capacity: usize },
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistrationOverflow { capacity } => {
                write!(f, "method registry full ({capacity} entries)")
            }
            Self::ObserverOverflow { capacity } => {
                write!(f, "observer list full ({capacity} entries)")
            }
        }
    }
}

impl From<CapacityError> for Error {
    fn from(e: CapacityError) -> Self {
        Self::Capacity(e)
    }
}

// ---------------------------------------------------------------------------
// Observer errors
// ---------------------------------------------------------------------------

/// Failure reported by a single observer invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverError {
    /// The observer refused the change.
    Rejected(&'static str),
    /// The observer's hand-off queue is full.
    QueueFull,
}

impl fmt::Display for ObserverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
            Self::QueueFull => write!(f, "change queue full"),
        }
    }
}

/// Where a notification fan-out stopped.
///
/// Observers after `index` were not invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverFailure {
    pub property: &'static str,
    pub index: usize,
    pub error: ObserverError,
}

impl fmt::Display for ObserverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "property '{}' observer #{} failed: {}",
            self.property, self.index, self.error
        )
    }
}

impl From<ObserverFailure> for Error {
    fn from(e: ObserverFailure) -> Self {
        Self::Observer(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
