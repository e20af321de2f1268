//! JSON message framer.
//!
//! Wire format: concatenated JSON documents, optionally separated by
//! whitespace.  Outgoing documents are terminated by `\n`.
//!
//! ```text
//! {"id":1,"method":"getTemp"}\n{"method":"reset"}   ...
//! └────────── message ──────┘  └──── message ────┘
//! ```
//!
//! The decoder accumulates incoming bytes in a fixed buffer and yields one
//! complete top-level document per call, found by bracket-depth scanning
//! (aware of strings and escapes).  A single `Connection::read` may
//! return part of a message or several messages; leftovers stay buffered.
//! Bytes that do not start a document (`this is not json`) form a frame
//! ending at the next newline or bracket, so they surface as a parse error
//! instead of stalling the slot.  Likewise an unterminated document ends
//! where a bracket opens in a position no JSON value allows, e.g.
//! `{"id":1{"id":2}`, and a partial document that stops growing can be
//! flushed with [`MessageDecoder::take_pending`].

use serde::Serialize;

/// Maximum buffered message size (protects against memory exhaustion).
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// One complete message, copied out of the decoder.
pub type Frame = heapless::Vec<u8, MAX_MESSAGE_SIZE>;

/// Returned when pushed bytes do not fit the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

/// Streaming message decoder.
pub struct MessageDecoder {
    buf: heapless::Vec<u8, MAX_MESSAGE_SIZE>,
}

impl MessageDecoder {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
        }
    }

    /// Append bytes.  On overflow the buffer is discarded entirely.
    pub fn push(&mut self, data: &[u8]) -> Result<(), Overflow> {
        if self.buf.extend_from_slice(data).is_err() {
            self.buf.clear();
            return Err(Overflow);
        }
        Ok(())
    }

    /// Free space left in the buffer.
    pub fn spare_capacity(&self) -> usize {
        MAX_MESSAGE_SIZE - self.buf.len()
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Whether a full buffer holds no complete message (it never will).
    pub fn is_stalled(&self) -> bool {
        self.spare_capacity() == 0 && self.frame_bounds().is_none()
    }

    /// Remove and return the next complete message, if one is buffered.
    pub fn next_message(&mut self) -> Option<Frame> {
        let (start, end) = match self.frame_bounds() {
            Some(bounds) => bounds,
            None => {
                if self.buf.iter().all(u8::is_ascii_whitespace) {
                    self.buf.clear();
                }
                return None;
            }
        };

        let mut frame = Frame::new();
        // Cannot fail: the frame is a sub-slice of an equally sized buffer.
        let _ = frame.extend_from_slice(&self.buf[start..end]);

        let remaining = self.buf.len() - end;
        self.buf.copy_within(end.., 0);
        self.buf.truncate(remaining);
        Some(frame)
    }

    /// Remove and return whatever is buffered as one frame, complete or
    /// not.  Used when a partial message has stopped growing.
    pub fn take_pending(&mut self) -> Option<Frame> {
        let start = self.buf.iter().position(|b| !b.is_ascii_whitespace());
        let frame = start.and_then(|start| Frame::from_slice(&self.buf[start..]).ok());
        self.buf.clear();
        frame
    }

    /// Reset decoder state (e.g. after a transport reconnect).
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// `(start, end)` of the first complete message in the buffer.
    fn frame_bounds(&self) -> Option<(usize, usize)> {
        let start = self.buf.iter().position(|b| !b.is_ascii_whitespace())?;

        match self.buf[start] {
            b'{' | b'[' => scan_document(&self.buf, start).map(|end| (start, end)),
            _ => {
                let end = self.buf[start..]
                    .iter()
                    .position(|b| matches!(b, b'\n' | b'{' | b'['))
                    .map_or(self.buf.len(), |offset| start + offset);
                Some((start, end))
            }
        }
    }
}

impl Default for MessageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Index one past the bracket closing the document opened at `start`.
///
/// An opening bracket that cannot follow the previous token (anything but
/// `:`, `,` or `[`) marks the start of a new document; the broken one ends
/// just before it.
fn scan_document(buf: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut last = b',';

    for (i, &b) in buf.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => {
                    in_string = false;
                    last = b'"';
                }
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' if depth > 0 && !matches!(last, b':' | b',' | b'[') => return Some(i),
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        if !b.is_ascii_whitespace() && b != b'"' {
            last = b;
        }
    }
    None
}

/// Serialize a document into a newline-terminated message.
pub fn encode_message<T: Serialize + ?Sized>(document: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = serde_json::to_vec(document)?;
    out.push(b'\n');
    Ok(out)
}
