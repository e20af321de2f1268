//! Adapters — concrete implementations of the transport port traits.
//!
//! | Adapter | Implements             | Connects to          |
//! |---------|------------------------|----------------------|
//! | `tcp`   | Listener, Connection   | `std::net` sockets   |

pub mod tcp;
