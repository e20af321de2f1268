//! Application contexts served by the RPC layer.
//!
//! A context owns the device state exposed to callers and implements
//! [`SessionHooks`](crate::rpc::server::SessionHooks); its methods are
//! registered once during setup.

pub mod thermostat;
