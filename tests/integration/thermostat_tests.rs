//! Thermostat context served end to end: methods, change broadcasts and
//! the measured-temperature shared property.

use memberrpc::app::thermostat::{DEFAULT_TARGET, MeasuredTemp, SwitchQueue, TempQueue, Thermostat};
use memberrpc::config::ServerConfig;
use memberrpc::property::{ChangeQueue, SharedProperty};
use memberrpc::rpc::server::Server;
use serde_json::{Value, json};

use crate::mock_transport::{MockListener, MockPeer};

struct Rig {
    server: Server<MockListener, Thermostat<'static, 'static>>,
    thermostat: Thermostat<'static, 'static>,
    peer: MockPeer,
    temps: &'static TempQueue,
    leds: &'static SwitchQueue,
    measured: &'static MeasuredTemp<'static>,
}

impl Rig {
    /// Each rig owns leaked statics so tests never share queues.
    fn new() -> Self {
        let temps: &'static TempQueue = Box::leak(Box::new(ChangeQueue::new()));
        let leds: &'static SwitchQueue = Box::leak(Box::new(ChangeQueue::new()));
        let measured: &'static MeasuredTemp<'static> =
            Box::leak(Box::new(SharedProperty::new("measuredTemp", 19.0)));
        measured.observe(temps.observer()).unwrap();

        let thermostat = Thermostat::new("lab", measured, temps, leds).unwrap();
        let listener = MockListener::new();
        let backlog = listener.backlog();
        let server = Server::setup(&ServerConfig::default(), listener, Thermostat::register_methods).unwrap();

        let mut rig = Self {
            server,
            thermostat,
            peer: backlog.connect(),
            temps,
            leds,
            measured,
        };
        rig.tick();
        rig.tick();
        rig
    }

    fn tick(&mut self) {
        self.server.poll(&mut self.thermostat);
        self.thermostat.step();
        self.server.flush_changes(self.temps);
        self.server.flush_changes(self.leds);
    }

    fn call(&mut self, request: Value) -> Vec<Value> {
        self.peer.write(&request);
        self.tick();
        self.peer.read_all()
    }
}

#[test]
fn getters_return_typed_results() {
    let mut rig = Rig::new();

    assert_eq!(rig.call(json!({"id": 1, "method": "getMeasuredTemp"}))[0]["result"], json!(19.0));
    assert_eq!(rig.call(json!({"id": 2, "method": "getTargetTemp"}))[0]["result"], json!(DEFAULT_TARGET));
    assert_eq!(rig.call(json!({"id": 3, "method": "getName"}))[0]["result"], json!("lab"));
    assert_eq!(rig.call(json!({"id": 4, "method": "getHumidity"}))[0]["result"], json!(45.0));
    assert_eq!(rig.call(json!({"id": 5, "method": "isHeating"}))[0]["result"], json!(true));
    assert_eq!(rig.call(json!({"id": 6, "method": "getClients"}))[0]["result"], json!(1));
}

#[test]
fn temperatures_share_one_unit_everywhere() {
    let mut rig = Rig::new();

    let measured = rig.call(json!({"id": 1, "method": "getMeasuredTemp"}))[0]["result"].clone();
    let target = rig.call(json!({"id": 2, "method": "getTargetTemp"}))[0]["result"].clone();
    let state = rig.call(json!({"id": 3, "method": "getState"}))[0]["result"].clone();
    assert_eq!(state["measuredTemp"], measured);
    assert_eq!(state["targetTemp"], target);
    assert_eq!(state["heating"], json!(true));

    rig.measured.set(19.5).unwrap();
    rig.tick();
    let change = &rig.peer.read_all()[0];
    assert_eq!(change["old"], measured);
    assert_eq!(change["value"], json!(19.5));
}

#[test]
fn toggle_led_broadcasts_change() {
    let mut rig = Rig::new();

    let out = rig.call(json!({"id": 1, "method": "toggleLed", "params": {"status": true}}));
    assert_eq!(
        out,
        vec![
            json!({"jsonrpc": "2.0", "id": 1, "result": true}),
            json!({"name": "led", "type": "update", "old": false, "value": true}),
        ]
    );
    assert!(rig.thermostat.led());

    // Same value again: answered, but nothing to broadcast.
    let out = rig.call(json!({"id": 2, "method": "toggleLed", "params": {"status": true}}));
    assert_eq!(out.len(), 1);
}

#[test]
fn set_target_validates_and_broadcasts() {
    let mut rig = Rig::new();

    let out = rig.call(json!({"id": 1, "method": "setTargetTemp", "params": {"value": 22.5}}));
    assert_eq!(out[0]["result"], json!(22.5));
    assert_eq!(out[1], json!({"name": "targetTemp", "type": "update", "old": DEFAULT_TARGET, "value": 22.5}));

    let out = rig.call(json!({"id": 2, "method": "setTargetTemp", "params": {"value": 100}}));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["error"]["code"], json!(-32602));
    assert_eq!(rig.thermostat.target(), 22.5);
}

#[test]
fn set_state_applies_known_keys_and_returns_state() {
    let mut rig = Rig::new();

    let out = rig.call(json!({"id": 1, "method": "setState", "params": {"targetTemp": 23.0, "led": true}}));
    let state = &out[0]["result"];
    assert_eq!(out[0]["id"], json!(1));
    assert_eq!(state["targetTemp"], json!(23.0));
    assert_eq!(state["led"], json!(true));
    assert_eq!(state["name"], json!("lab"));
    assert_eq!(
        &out[1..],
        &[
            json!({"name": "targetTemp", "type": "update", "old": DEFAULT_TARGET, "value": 23.0}),
            json!({"name": "led", "type": "update", "old": false, "value": true}),
        ]
    );

    // One key at a time, the way a client mirrors a single member.
    let out = rig.call(json!({"id": 2, "method": "setState", "params": {"led": false}}));
    assert_eq!(out[0]["result"]["led"], json!(false));
    assert_eq!(out[0]["result"]["targetTemp"], json!(23.0));

    let out = rig.call(json!({"id": 3, "method": "setState", "params": {"targetTemp": 99.0}}));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["error"]["code"], json!(-32602));
    assert_eq!(rig.thermostat.target(), 23.0);
}

#[test]
fn reset_notification_restores_defaults_silently() {
    let mut rig = Rig::new();
    rig.call(json!({"id": 1, "method": "setTargetTemp", "params": {"value": 30.0}}));
    rig.call(json!({"id": 2, "method": "toggleLed", "params": {"status": true}}));

    let out = rig.call(json!({"method": "reset"}));
    // No reply, only the two change broadcasts.
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|doc| doc.get("jsonrpc").is_none()));
    assert_eq!(rig.thermostat.target(), DEFAULT_TARGET);
    assert!(!rig.thermostat.led());
}

#[test]
fn measured_temperature_updates_are_broadcast() {
    let mut rig = Rig::new();

    rig.measured.set(21.5).unwrap();
    rig.tick();
    assert_eq!(
        rig.peer.read_all(),
        vec![json!({"name": "measuredTemp", "type": "update", "old": 19.0, "value": 21.5})]
    );
    assert!(!rig.thermostat.is_heating());
}

#[test]
fn full_queue_fails_the_write_but_keeps_the_value() {
    let mut rig = Rig::new();

    // No ticks in between: the queue (16 slots) overflows.
    let mut last = Ok(true);
    for t in 0..20 {
        last = rig.measured.set(10.0 + f64::from(t));
    }
    assert!(last.is_err());
    assert_eq!(rig.measured.get().unwrap(), 29.0);
    assert!(rig.temps.dropped_count() >= 4);
    assert_eq!(rig.server.flush_changes(rig.temps), 16);
}

#[test]
fn target_write_succeeds_when_its_broadcast_is_dropped() {
    let mut rig = Rig::new();
    for t in 0..16 {
        rig.measured.set(10.0 + f64::from(t)).unwrap();
    }
    let dropped = rig.temps.dropped_count();

    // The handler runs before this tick's flush, while the queue is full.
    let out = rig.call(json!({"id": 1, "method": "setTargetTemp", "params": {"value": 25.0}}));
    assert_eq!(out[0], json!({"jsonrpc": "2.0", "id": 1, "result": 25.0}));
    assert_eq!(rig.thermostat.target(), 25.0);
    assert_eq!(rig.temps.dropped_count(), dropped + 1);
    // Only the 16 queued measurements went out.
    assert_eq!(out.len(), 17);
}
