//! Transport abstraction — the byte-level collaborator of the session loop.
//!
//! Concrete implementations:
//! - TCP socket over `std::net` ([`crate::adapters::tcp`])
//! - in-memory doubles in the integration tests
//!
//! The session loop is generic over `Listener`, so adding a transport
//! requires zero changes to the RPC logic.  Framing and parsing stay on
//! the session side; a connection only moves bytes.

/// One accepted client connection.
pub trait Connection {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Whether the peer is still connected.  Implementations may refresh
    /// their state here (e.g. detect EOF).
    fn is_connected(&mut self) -> bool;

    /// Number of bytes that can be read without blocking.
    fn bytes_available(&mut self) -> usize;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write all of `data` to the peer.
    fn send(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

/// Source of new connections for freed slots.
pub trait Listener {
    type Connection: Connection;

    /// Accept the next pending connection, if any (non-blocking).
    fn accept_next(&mut self) -> Option<Self::Connection>;
}
