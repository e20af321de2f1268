//! Transport-agnostic JSON-RPC 2.0 subsystem.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       RPC Stack                              │
//! │                                                              │
//! │  ┌────────────┐   ┌──────────┐   ┌────────────┐  ┌────────┐ │
//! │  │ Connection │──▶│  Codec   │──▶│ Dispatcher │─▶│Registry│ │
//! │  │  (trait)   │   │ (framing)│   │ (protocol) │  │(lookup)│ │
//! │  └────────────┘   └──────────┘   └────────────┘  └────────┘ │
//! │        ▲                               │                     │
//! │        └──────── Server (session loop, broadcast) ◀──────────┤
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod dispatch;
pub mod params;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;

pub use dispatch::{dispatch, dispatch_bytes};
pub use protocol::{ErrorObject, Response};
pub use registry::{Handler, MethodError, MethodMapping, MethodResult, Registry, ResultKind};
pub use server::{ClientId, Server, SessionHooks, SessionStats, SlotState};
pub use transport::{Connection, Listener};
