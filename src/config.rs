//! Server configuration parameters
//!
//! Capacities are fixed once by [`Server::setup`](crate::rpc::server::Server::setup)
//! and never change for the lifetime of the process.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound on client slots (slot ids are `u8`).
pub const MAX_CLIENT_SLOTS: usize = u8::MAX as usize;

/// Upper bound on registry size.
pub const MAX_METHODS: usize = 256;

/// Core server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    // --- Capacities ---
    /// Number of method mappings the registry can hold
    pub max_methods: usize,
    /// Number of pre-allocated client slots
    pub max_clients: usize,

    // --- Transport ---
    /// TCP listen port
    pub port: u16,

    // --- Timing ---
    /// Delay between session loop ticks (milliseconds)
    pub tick_interval_ms: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_methods: 16,
            max_clients: 4,
            port: 4242,
            tick_interval_ms: 10, // 100 Hz
        }
    }
}

impl ServerConfig {
    /// Range-check every field.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_METHODS).contains(&self.max_methods) {
            return Err(Error::Config("max_methods must be 1-256"));
        }
        if !(1..=MAX_CLIENT_SLOTS).contains(&self.max_clients) {
            return Err(Error::Config("max_clients must be 1-255"));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be non-zero"));
        }
        Ok(())
    }
}
