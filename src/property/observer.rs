//! Observers — the units a [`Property`](super::Property) invokes on change.
//!
//! An observer is stored by value inside the property, so registering one
//! is a plain copy: both variants are `Copy` (a function pointer, or a
//! shared owner reference plus a method pointer).

use core::ptr;

use super::event::ChangeEvent;
use crate::error::ObserverError;

/// Outcome of one observer invocation.
pub type ObserverResult = Result<(), ObserverError>;

/// Free-standing observer function.
pub type ObserverFn<T> = fn(&ChangeEvent<'_, T>) -> ObserverResult;

/// Observer method bound to an owner of type `O`.
pub type MethodFn<O, T> = fn(&O, &ChangeEvent<'_, T>) -> ObserverResult;

/// Polymorphic change observer.
///
/// `O` is the owner type for bound-method observers; properties that only
/// take free functions leave it at `()`.
pub enum Observer<'a, T, O: ?Sized = ()> {
    /// Calls a free function.
    Function(ObserverFn<T>),
    /// Calls `method(owner, event)`.
    Method { owner: &'a O, method: MethodFn<O, T> },
}

impl<'a, T, O: ?Sized> Observer<'a, T, O> {
    pub fn function(f: ObserverFn<T>) -> Self {
        Self::Function(f)
    }

    pub fn method(owner: &'a O, method: MethodFn<O, T>) -> Self {
        Self::Method { owner, method }
    }

    /// Deliver one event.
    pub fn invoke(&self, event: &ChangeEvent<'_, T>) -> ObserverResult {
        match *self {
            Self::Function(f) => f(event),
            Self::Method { owner, method } => method(owner, event),
        }
    }

    /// Identity comparison used by `unobserve`: same function, or same
    /// owner address and same method.
    pub fn same_target(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Function(a), Self::Function(b)) => ptr::fn_addr_eq(*a, *b),
            (
                Self::Method { owner: oa, method: ma },
                Self::Method { owner: ob, method: mb },
            ) => ptr::addr_eq(*oa as *const O, *ob as *const O) && ptr::fn_addr_eq(*ma, *mb),
            _ => false,
        }
    }
}

impl<T, O: ?Sized> Clone for Observer<'_, T, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, O: ?Sized> Copy for Observer<'_, T, O> {}

impl<T, O: ?Sized> core::fmt::Debug for Observer<'_, T, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Observer::Function"),
            Self::Method { .. } => f.write_str("Observer::Method"),
        }
    }
}
