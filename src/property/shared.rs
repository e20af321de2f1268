//! Interrupt-safe property wrapper.
//!
//! [`SharedProperty`] lets a property live in a `static` and be written
//! from any context (timer callback, sampler thread, ISR) while the
//! session loop reads it.  Every access runs inside a critical section;
//! notification therefore completes before the writer's context resumes.
//!
//! Re-entrant access (an observer calling `set` on the property that is
//! currently notifying it) is detected through the inner `RefCell` and
//! rejected with [`Error::Reentrant`] instead of panicking.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::warn;

use super::{DEFAULT_MAX_OBSERVERS, Observer, Property};
use crate::error::{Error, Result};

pub struct SharedProperty<'a, T, O: ?Sized = (), const N: usize = DEFAULT_MAX_OBSERVERS> {
    name: &'static str,
    inner: Mutex<CriticalSectionRawMutex, RefCell<Property<'a, T, O, N>>>,
}

impl<'a, T, O: ?Sized, const N: usize> SharedProperty<'a, T, O, N> {
    pub const fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            inner: Mutex::new(RefCell::new(Property::new(name, value))),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run `f` with exclusive access, or fail if the property is already
    /// borrowed further up the stack.
    fn with_mut<R>(&self, f: impl FnOnce(&mut Property<'a, T, O, N>) -> Result<R>) -> Result<R> {
        self.inner.lock(|cell| {
            let mut property = cell.try_borrow_mut().map_err(|_| {
                warn!("Property '{}': re-entrant write rejected", self.name);
                Error::Reentrant(self.name)
            })?;
            f(&mut property)
        })
    }

    fn with_ref<R>(&self, f: impl FnOnce(&Property<'a, T, O, N>) -> R) -> Result<R> {
        self.inner.lock(|cell| {
            let property = cell.try_borrow().map_err(|_| Error::Reentrant(self.name))?;
            Ok(f(&property))
        })
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> Result<T>
    where
        T: Clone,
    {
        self.with_ref(|p| p.get().clone())
    }

    /// See [`Property::set`].
    pub fn set(&self, value: T) -> Result<bool>
    where
        T: PartialEq,
    {
        self.with_mut(|p| p.set(value))
    }

    pub fn observe(&self, observer: Observer<'a, T, O>) -> Result<()> {
        self.with_mut(|p| p.observe(observer))
    }

    pub fn unobserve(&self, observer: &Observer<'a, T, O>) -> Result<bool> {
        self.with_mut(|p| Ok(p.unobserve(observer)))
    }

    pub fn observer_count(&self) -> Result<usize> {
        self.with_ref(Property::observer_count)
    }
}
