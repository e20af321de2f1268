//! In-memory transport for integration tests.
//!
//! Each [`MockPeer`] is the test's end of a connection; the server sees the
//! matching [`MockConnection`].  Nothing touches a real socket.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use memberrpc::rpc::transport::{Connection, Listener};
use serde_json::Value;

#[derive(Default)]
struct Wire {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    connected: bool,
    fail_writes: bool,
}

/// Test-side handle of one connection.
#[derive(Clone)]
pub struct MockPeer(Rc<RefCell<Wire>>);

#[allow(dead_code)]
impl MockPeer {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Wire {
            connected: true,
            ..Wire::default()
        })))
    }

    /// Queue raw bytes for the server to read.
    pub fn write_raw(&self, bytes: &[u8]) {
        self.0.borrow_mut().inbound.extend(bytes);
    }

    /// Queue one JSON document for the server to read.
    pub fn write(&self, doc: &Value) {
        self.write_raw(&serde_json::to_vec(doc).unwrap());
    }

    pub fn hang_up(&self) {
        self.0.borrow_mut().connected = false;
    }

    pub fn fail_writes(&self) {
        self.0.borrow_mut().fail_writes = true;
    }

    pub fn pending_inbound(&self) -> usize {
        self.0.borrow().inbound.len()
    }

    /// Drain everything the server sent, one document per line.
    pub fn read_all(&self) -> Vec<Value> {
        let out = std::mem::take(&mut self.0.borrow_mut().outbound);
        let text = String::from_utf8(out).unwrap();
        assert!(text.is_empty() || text.ends_with('\n'), "messages end with newline");
        text.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }

    pub fn connection(&self) -> MockConnection {
        MockConnection(self.0.clone())
    }
}

/// Server-side end of a [`MockPeer`].
pub struct MockConnection(Rc<RefCell<Wire>>);

#[derive(Debug, PartialEq, Eq)]
pub struct MockError;

impl Connection for MockConnection {
    type Error = MockError;

    fn is_connected(&mut self) -> bool {
        self.0.borrow().connected
    }

    fn bytes_available(&mut self) -> usize {
        self.0.borrow().inbound.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, MockError> {
        let mut wire = self.0.borrow_mut();
        let n = buf.len().min(wire.inbound.len());
        for (dst, src) in buf.iter_mut().zip(wire.inbound.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn send(&mut self, data: &[u8]) -> Result<(), MockError> {
        let mut wire = self.0.borrow_mut();
        if wire.fail_writes || !wire.connected {
            return Err(MockError);
        }
        wire.outbound.extend_from_slice(data);
        Ok(())
    }
}

/// Listener handing out pre-queued connections in order.
#[derive(Default)]
pub struct MockListener {
    backlog: Rc<RefCell<VecDeque<MockConnection>>>,
}

#[allow(dead_code)]
impl MockListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for queueing connections after the listener was moved.
    pub fn backlog(&self) -> Backlog {
        Backlog(self.backlog.clone())
    }
}

impl Listener for MockListener {
    type Connection = MockConnection;

    fn accept_next(&mut self) -> Option<MockConnection> {
        self.backlog.borrow_mut().pop_front()
    }
}

#[derive(Clone)]
pub struct Backlog(Rc<RefCell<VecDeque<MockConnection>>>);

impl Backlog {
    /// Queue a new client and return its test-side handle.
    pub fn connect(&self) -> MockPeer {
        let peer = MockPeer::new();
        self.0.borrow_mut().push_back(peer.connection());
        peer
    }
}
