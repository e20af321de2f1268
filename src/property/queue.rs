//! Bounded hand-off of change events to the session loop.
//!
//! Uses an `embassy-sync` channel so a property written from interrupt or
//! timer context can publish its change without allocating, blocking or
//! touching the transport.  The session loop drains the queue with
//! [`Server::flush_changes`](crate::rpc::server::Server::flush_changes).
//!
//! ```text
//!  Property::set ──▶ ChangeQueue::forward ──▶ [ Channel<N> ] ──▶ Server::flush_changes ──▶ broadcast
//!   (any context)       (try_send, no wait)                       (session loop)
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use super::event::{ChangeEvent, PendingChange};
use super::observer::{Observer, ObserverResult};
use crate::error::ObserverError;

pub struct ChangeQueue<T, const N: usize> {
    channel: Channel<CriticalSectionRawMutex, PendingChange<T>, N>,
    /// Number of changes rejected because the queue was full.
    dropped: AtomicU32,
}

impl<T: Clone, const N: usize> ChangeQueue<T, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Observer method: enqueue an owned copy of `event`.
    pub fn forward(&self, event: &ChangeEvent<'_, T>) -> ObserverResult {
        self.channel.try_send(event.to_pending()).map_err(|_| {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            ObserverError::QueueFull
        })
    }

    /// Bound-method observer forwarding into this queue.
    pub fn observer(&self) -> Observer<'_, T, Self> {
        Observer::method(self, Self::forward)
    }

    /// Pop the oldest pending change, if any.
    pub fn try_next(&self) -> Option<PendingChange<T>> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn dropped_count(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T: Clone, const N: usize> Default for ChangeQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
