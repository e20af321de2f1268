//! Observable properties.
//!
//! A [`Property`] is a named value cell with a fixed-capacity list of
//! observers.  Writing a different value notifies every observer in
//! registration order, synchronously, on the caller's stack.
//!
//! ```text
//!  set(v) ──▶ v != current? ──no──▶ (nothing)
//!                 │yes
//!                 ▼
//!         replace value, build ChangeEvent
//!                 │
//!                 ▼
//!   observer[0] ─▶ observer[1] ─▶ ... ─▶ observer[n-1]
//!        (first failure aborts the rest)
//! ```
//!
//! The notify path never allocates and never blocks: observers live in a
//! `heapless::Vec` and the event only borrows the old and new values.

pub mod event;
pub mod observer;
pub mod queue;
pub mod shared;

pub use event::{ChangeEvent, ChangeKind, PendingChange};
pub use observer::{MethodFn, Observer, ObserverFn, ObserverResult};
pub use queue::ChangeQueue;
pub use shared::SharedProperty;

use log::warn;

use crate::error::{CapacityError, Error, ObserverFailure, Result};

/// Observer slots per property unless overridden.
pub const DEFAULT_MAX_OBSERVERS: usize = 8;

/// Named value cell that notifies observers when its value changes.
pub struct Property<'a, T, O: ?Sized = (), const N: usize = DEFAULT_MAX_OBSERVERS> {
    name: &'static str,
    value: T,
    observers: heapless::Vec<Observer<'a, T, O>, N>,
}

impl<'a, T, O: ?Sized, const N: usize> Property<'a, T, O, N> {
    pub const fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            value,
            observers: heapless::Vec::new(),
        }
    }

    pub fn with_default(name: &'static str) -> Self
    where
        T: Default,
    {
        Self::new(name, T::default())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Store `value` and notify observers if it differs from the current one.
    ///
    /// Returns `Ok(false)` when the value was unchanged (no notification),
    /// `Ok(true)` when every observer accepted the change.  On observer
    /// failure the new value stays stored and the remaining observers are
    /// skipped.
    pub fn set(&mut self, value: T) -> Result<bool>
    where
        T: PartialEq,
    {
        if value == self.value {
            return Ok(false);
        }
        let old = core::mem::replace(&mut self.value, value);
        self.notify(&ChangeEvent::update(self.name, &old, &self.value))?;
        Ok(true)
    }

    /// Deliver `event` to every observer in registration order.
    pub fn notify(&self, event: &ChangeEvent<'_, T>) -> Result<()> {
        for (index, observer) in self.observers.iter().enumerate() {
            observer.invoke(event).map_err(|error| {
                warn!(
                    "Property '{}': observer #{} failed ({}), {} skipped",
                    self.name,
                    index,
                    error,
                    self.observers.len() - index - 1
                );
                Error::from(ObserverFailure {
                    property: self.name,
                    index,
                    error,
                })
            })?;
        }
        Ok(())
    }

    /// Append a copy of `observer`.  Fails without mutation when all `N`
    /// slots are taken.  Duplicates are not filtered.
    pub fn observe(&mut self, observer: Observer<'a, T, O>) -> Result<()> {
        self.observers.push(observer).map_err(|_| {
            warn!("Property '{}': observer list full ({})", self.name, N);
            Error::from(CapacityError::ObserverOverflow { capacity: N })
        })
    }

    /// Remove the first observer with the same target as `observer`.
    ///
    /// Remaining observers keep their relative order.  Returns `false` if
    /// no registered observer matched.
    pub fn unobserve(&mut self, observer: &Observer<'a, T, O>) -> bool {
        match self.observers.iter().position(|o| o.same_target(observer)) {
            Some(index) => {
                self.observers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T: core::fmt::Debug, O: ?Sized, const N: usize> core::fmt::Debug for Property<'_, T, O, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("observers", &self.observers.len())
            .finish()
    }
}
