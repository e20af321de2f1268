//! Fuzz target: `MessageDecoder`
//!
//! Splits arbitrary input at a fuzzer-chosen point, pushes both halves and
//! drains every message.  The decoder must never panic, never yield an
//! empty or oversized message, and must always make progress.
//!
//! cargo fuzz run fuzz_message_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use memberrpc::rpc::codec::{MAX_MESSAGE_SIZE, MessageDecoder};

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = (split as usize).min(rest.len());
    let (head, tail) = rest.split_at(split);

    let mut decoder = MessageDecoder::new();
    for chunk in [head, tail] {
        if decoder.push(chunk).is_err() {
            assert_eq!(decoder.buffered(), 0, "overflow must discard the buffer");
            continue;
        }
        let mut previous = decoder.buffered();
        while let Some(message) = decoder.next_message() {
            assert!(!message.is_empty(), "decoder must not yield empty messages");
            assert!(message.len() <= MAX_MESSAGE_SIZE);
            assert!(decoder.buffered() < previous, "decoder must consume input");
            previous = decoder.buffered();
        }
    }

    decoder.reset();
    assert_eq!(decoder.buffered(), 0);
});
