//! End-to-end request handling over the in-memory transport.
//!
//! Mirrors the device's serial stress sequence: requests, notifications,
//! malformed messages and raw garbage interleaved on one connection.

use memberrpc::config::ServerConfig;
use memberrpc::rpc::params::require_bool;
use memberrpc::rpc::registry::{Handler, MethodResult};
use memberrpc::rpc::server::{STALE_FRAME_TICKS, Server, SessionHooks};
use serde_json::{Value, json};

use crate::mock_transport::{MockListener, MockPeer};

#[derive(Default)]
struct Device {
    led: bool,
    toggles: u32,
}

impl SessionHooks for Device {}

fn toggle_led(dev: &mut Device, params: &Value) -> MethodResult<bool> {
    dev.led = require_bool(params, "status")?;
    dev.toggles += 1;
    Ok(dev.led)
}

fn measured_temp(_: &mut Device, _: &Value) -> MethodResult<f64> {
    Ok(21.5)
}

fn connected() -> (Server<MockListener, Device>, Device, MockPeer) {
    let listener = MockListener::new();
    let backlog = listener.backlog();
    let mut server = Server::setup(&ServerConfig::default(), listener, |reg| {
        reg.register("toggleLed", Handler::Bool(toggle_led))?;
        reg.register("getMeasuredTemp", Handler::Double(measured_temp))
    })
    .unwrap();
    let mut device = Device::default();

    let peer = backlog.connect();
    server.poll(&mut device); // accept
    server.poll(&mut device); // connect hook
    (server, device, peer)
}

/// Send one message and run one tick; return everything sent back.
fn exchange(server: &mut Server<MockListener, Device>, device: &mut Device, peer: &MockPeer, raw: &[u8]) -> Vec<Value> {
    peer.write_raw(raw);
    server.poll(device);
    peer.read_all()
}

#[test]
fn stress_sequence() {
    let (mut server, mut device, peer) = connected();

    for i in 0..20 {
        let r = exchange(&mut server, &mut device, &peer, json!({"method": "toggleLed", "params": {"status": true}, "id": i}).to_string().as_bytes());
        assert_eq!(r, vec![json!({"jsonrpc": "2.0", "id": i, "result": true})]);

        let r = exchange(&mut server, &mut device, &peer, br#"{"method":"noid","params":{"status":false}}"#);
        assert!(r.is_empty(), "unknown notification must not be answered");

        let r = exchange(&mut server, &mut device, &peer, br#"{"id":"nomethod","params":{"status":false}}"#);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0]["id"], json!("nomethod"));
        assert_eq!(r[0]["error"]["code"], json!(-32600));
        assert_eq!(r[0]["error"]["message"], json!("Invalid Request."));
        assert_eq!(r[0]["error"]["data"], json!("Missing method."));

        let r = exchange(&mut server, &mut device, &peer, json!({"method": "toggleLed", "params": {"status": false}, "id": i}).to_string().as_bytes());
        assert_eq!(r[0]["result"], json!(false));

        let r = exchange(&mut server, &mut device, &peer, json!({"method": "crap", "id": i}).to_string().as_bytes());
        assert_eq!(r[0]["error"]["code"], json!(-32601));
        assert_eq!(r[0]["error"]["message"], json!("Method not found."));

        let r = exchange(&mut server, &mut device, &peer, json!({"method": "getMeasuredTemp", "id": i}).to_string().as_bytes());
        assert_eq!(r[0]["result"], json!(21.5));
    }

    assert_eq!(device.toggles, 40);
    let stats = server.stats();
    assert_eq!(stats.messages_dispatched, 120);
    assert_eq!(stats.responses_sent, 100);
    assert_eq!(stats.notifications_dropped, 20);
}

#[test]
fn garbage_gets_parse_error_and_session_recovers() {
    let (mut server, mut device, peer) = connected();

    let r = exchange(&mut server, &mut device, &peer, br#"{"method":"getMeasuredTemp","id":0}"#);
    assert_eq!(r[0]["result"], json!(21.5));

    let r = exchange(&mut server, &mut device, &peer, b"this is not json");
    assert_eq!(
        r,
        vec![json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error."}})]
    );

    let r = exchange(&mut server, &mut device, &peer, br#"{"method":"getMeasuredTemp","id":1}"#);
    assert_eq!(r[0]["id"], json!(1));
    assert_eq!(r[0]["result"], json!(21.5));
}

#[test]
fn notification_side_effect_without_reply() {
    let (mut server, mut device, peer) = connected();

    let r = exchange(&mut server, &mut device, &peer, br#"{"method":"toggleLed","params":{"status":true}}"#);
    assert!(r.is_empty());
    assert!(device.led);
}

#[test]
fn invalid_params_reported_to_requester() {
    let (mut server, mut device, peer) = connected();

    let r = exchange(&mut server, &mut device, &peer, br#"{"method":"toggleLed","params":{"status":"on"},"id":5}"#);
    assert_eq!(r[0]["error"]["code"], json!(-32602));
    assert_eq!(r[0]["error"]["data"], json!("status"));
    assert!(!device.led);
}

#[test]
fn batch_arrays_are_rejected() {
    let (mut server, mut device, peer) = connected();

    let r = exchange(&mut server, &mut device, &peer, br#"[{"method":"getMeasuredTemp","id":1}]"#);
    assert_eq!(r[0]["id"], Value::Null);
    assert_eq!(r[0]["error"]["code"], json!(-32600));
}

#[test]
fn message_split_across_reads() {
    let (mut server, mut device, peer) = connected();

    assert!(exchange(&mut server, &mut device, &peer, br#"{"method":"getMeas"#).is_empty());
    let r = exchange(&mut server, &mut device, &peer, br#"uredTemp","id":"split"}"#);
    assert_eq!(r[0]["id"], json!("split"));
}

#[test]
fn unterminated_request_does_not_swallow_the_next() {
    let (mut server, mut device, peer) = connected();

    peer.write_raw(br#"{"id":1,"method":"getMeasuredTemp""#);
    peer.write_raw(br#"{"id":2,"method":"getMeasuredTemp"}"#);
    server.poll(&mut device);
    let r = peer.read_all();
    assert_eq!(r.len(), 1);
    assert_eq!(r[0]["id"], Value::Null);
    assert_eq!(r[0]["error"]["code"], json!(-32700));

    server.poll(&mut device);
    assert_eq!(peer.read_all(), vec![json!({"jsonrpc": "2.0", "id": 2, "result": 21.5})]);
}

#[test]
fn lone_unterminated_request_times_out_into_parse_error() {
    let (mut server, mut device, peer) = connected();

    assert!(exchange(&mut server, &mut device, &peer, br#"{"id":1,"method":"getMeasuredTemp""#).is_empty());
    for _ in 0..STALE_FRAME_TICKS {
        server.poll(&mut device);
    }
    let r = peer.read_all();
    assert_eq!(r.len(), 1);
    assert_eq!(r[0]["error"]["code"], json!(-32700));

    let r = exchange(&mut server, &mut device, &peer, br#"{"id":2,"method":"getMeasuredTemp"}"#);
    assert_eq!(r[0]["id"], json!(2));
    assert_eq!(r[0]["result"], json!(21.5));
}
