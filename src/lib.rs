//! memberrpc library.
//!
//! Observable properties and a JSON-RPC 2.0 method server for small
//! devices.  Exposes the pure-logic modules for integration testing; the
//! ESP-IDF specifics live in the binary behind the `espidf` feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod property;
pub mod rpc;

pub use error::{Error, Result};
