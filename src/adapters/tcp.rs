//! TCP transport adapter.
//!
//! Implements [`Listener`] and [`Connection`] over `std::net`.  ESP-IDF
//! ships a std socket layer on top of lwIP, so the same code serves the
//! host build and the device build.
//!
//! ## Connection model
//!
//! 1. [`TcpServer::bind`] binds a non-blocking listener on the given port.
//! 2. [`Listener::accept_next`] polls for an incoming client; accepted
//!    sockets are switched to non-blocking mode.
//! 3. Reads never block: [`Connection::bytes_available`] peeks the socket,
//!    and a peek that reports EOF or an error drops the stream, which the
//!    session loop sees as a disconnect on its next tick.
//! 4. Writes are sent in full (the socket is briefly switched to blocking
//!    mode), so a response is never truncated by a full send buffer.

use core::fmt;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use log::{info, warn};

use crate::rpc::codec::MAX_MESSAGE_SIZE;
use crate::rpc::transport::{Connection, Listener};

/// Default listen port for the RPC server.
pub const DEFAULT_PORT: u16 = 4242;

/// Errors originating from the TCP transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpTransportError {
    /// Socket I/O failure.
    Io,
    /// Operation requires a connected peer but none is present.
    NotConnected,
}

impl fmt::Display for TcpTransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "TCP/socket I/O error"),
            Self::NotConnected => write!(f, "no client connected"),
        }
    }
}

impl core::error::Error for TcpTransportError {}

// ───────────────────────────────────────────────────────────────
// TcpServer
// ───────────────────────────────────────────────────────────────

/// Non-blocking TCP listener.
pub struct TcpServer {
    listener: TcpListener,
}

impl TcpServer {
    /// Bind to `0.0.0.0:<port>`.  Pass port `0` to let the OS pick a free
    /// port (use [`local_addr()`](Self::local_addr) to discover it).
    pub fn bind(port: u16) -> Result<Self, TcpTransportError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).map_err(|e| {
            warn!("TCP: bind to port {} failed: {}", port, e);
            TcpTransportError::Io
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|_| TcpTransportError::Io)?;

        info!("TCP: listening on port {}", port);
        Ok(Self { listener })
    }

    /// The actual bound address.
    pub fn local_addr(&self) -> Result<SocketAddr, TcpTransportError> {
        self.listener.local_addr().map_err(|_| TcpTransportError::Io)
    }
}

impl Listener for TcpServer {
    type Connection = TcpClient;

    fn accept_next(&mut self) -> Option<TcpClient> {
        match self.listener.accept() {
            Ok((stream, addr)) => {
                if stream.set_nonblocking(true).is_err() {
                    warn!("TCP: failed to set non-blocking on client socket");
                    return None;
                }
                // Small request/response messages; don't wait on Nagle.
                if let Err(e) = stream.set_nodelay(true) {
                    warn!("TCP: failed to set nodelay for {}: {}", addr, e);
                }
                info!("TCP: client connected from {}", addr);
                Some(TcpClient {
                    stream: Some(stream),
                    peer: addr,
                })
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("TCP: accept error: {}", e);
                None
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// TcpClient
// ───────────────────────────────────────────────────────────────

/// One accepted client socket.
pub struct TcpClient {
    stream: Option<TcpStream>,
    peer: SocketAddr,
}

impl TcpClient {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn drop_stream(&mut self, reason: &str) {
        if self.stream.take().is_some() {
            info!("TCP: client {} disconnected ({})", self.peer, reason);
        }
    }

    /// Peek the socket: bytes readable now, dropping the stream on EOF.
    fn probe(&mut self) -> usize {
        let Some(stream) = self.stream.as_ref() else {
            return 0;
        };
        let mut scratch = [0u8; MAX_MESSAGE_SIZE];
        match stream.peek(&mut scratch) {
            Ok(0) => {
                self.drop_stream("EOF");
                0
            }
            Ok(n) => n,
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => 0,
            Err(_) => {
                self.drop_stream("peek error");
                0
            }
        }
    }

    fn send_blocking(stream: &mut TcpStream, data: &[u8]) -> std::io::Result<()> {
        stream.set_nonblocking(false)?;
        let written = stream.write_all(data).and_then(|()| stream.flush());
        stream.set_nonblocking(true)?;
        written
    }
}

impl Connection for TcpClient {
    type Error = TcpTransportError;

    fn is_connected(&mut self) -> bool {
        self.probe();
        self.stream.is_some()
    }

    fn bytes_available(&mut self) -> usize {
        self.probe()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TcpTransportError> {
        let stream = self.stream.as_mut().ok_or(TcpTransportError::NotConnected)?;
        match stream.read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.drop_stream("EOF");
                Err(TcpTransportError::NotConnected)
            }
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(_) => {
                self.drop_stream("read error");
                Err(TcpTransportError::Io)
            }
        }
    }

    fn send(&mut self, data: &[u8]) -> Result<(), TcpTransportError> {
        let stream = self.stream.as_mut().ok_or(TcpTransportError::NotConnected)?;
        if let Err(e) = Self::send_blocking(stream, data) {
            warn!("TCP: write to {} failed: {}", self.peer, e);
            self.drop_stream("write error");
            return Err(TcpTransportError::Io);
        }
        Ok(())
    }
}
