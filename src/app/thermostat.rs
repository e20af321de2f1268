//! Thermostat demo — application context served over RPC.
//!
//! Temperatures are degrees Celsius everywhere on the wire: method
//! results, `getState` and change broadcasts.  The measured temperature is
//! a [`SharedProperty`] written by a sampler outside the session loop;
//! target and LED state are plain properties owned by the context and
//! mutated only by RPC handlers.  Every property forwards its changes into
//! a [`ChangeQueue`] that the session loop drains and broadcasts.
//!
//! | Method            | Kind   | Params                      |
//! |-------------------|--------|-----------------------------|
//! | `getMeasuredTemp` | Double |                             |
//! | `getTargetTemp`   | Double |                             |
//! | `setTargetTemp`   | Double | `value` (°C)                |
//! | `toggleLed`       | Bool   | `status`                    |
//! | `isHeating`       | Bool   |                             |
//! | `getHumidity`     | Float  |                             |
//! | `getClients`      | Int    |                             |
//! | `getName`         | String |                             |
//! | `getState`        | Object |                             |
//! | `setState`        | Object | `targetTemp`, `led` (each optional) |
//! | `reset`           | None   |                             |
//!
//! A write whose change cannot be queued for broadcast (queue full) still
//! takes effect; the handler answers with the stored value and the dropped
//! broadcast is only logged.

use log::{info, warn};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::property::{ChangeQueue, Property, SharedProperty};
use crate::rpc::params::{require_bool, require_f64};
use crate::rpc::registry::{Handler, MethodError, MethodResult, Registry};
use crate::rpc::server::{ClientId, SessionHooks};

/// Pending temperature changes awaiting broadcast.
pub type TempQueue = ChangeQueue<f64, 16>;
/// Pending switch changes awaiting broadcast.
pub type SwitchQueue = ChangeQueue<bool, 4>;
/// Measured temperature, shared with the sampler.
pub type MeasuredTemp<'q> = SharedProperty<'q, f64, TempQueue>;

/// Target temperature after boot or `reset` (°C).
pub const DEFAULT_TARGET: f64 = 20.0;
/// Accepted target range (°C).
pub const TARGET_RANGE: core::ops::RangeInclusive<f64> = 5.0..=35.0;
/// Half-width of the heating dead band (°C).
const HYSTERESIS: f64 = 0.5;

/// Application context handed to every RPC handler.
pub struct Thermostat<'p, 'q> {
    name: &'static str,
    measured: &'p MeasuredTemp<'q>,
    target: Property<'q, f64, TempQueue>,
    led: Property<'q, bool, SwitchQueue>,
    heating: bool,
    humidity: f32,
    clients: u8,
}

impl<'p, 'q> Thermostat<'p, 'q> {
    /// Build the context and wire its properties to the change queues.
    pub fn new(
        name: &'static str,
        measured: &'p MeasuredTemp<'q>,
        temp_changes: &'q TempQueue,
        led_changes: &'q SwitchQueue,
    ) -> Result<Self> {
        let mut target = Property::new("targetTemp", DEFAULT_TARGET);
        target.observe(temp_changes.observer())?;

        let mut led = Property::new("led", false);
        led.observe(led_changes.observer())?;

        Ok(Self {
            name,
            measured,
            target,
            led,
            heating: false,
            humidity: 45.0,
            clients: 0,
        })
    }

    /// Register every exposed method.
    pub fn register_methods(registry: &mut Registry<Self>) -> Result<()> {
        registry.register("getMeasuredTemp", Handler::Double(Self::rpc_measured_temp))?;
        registry.register("getTargetTemp", Handler::Double(Self::rpc_target_temp))?;
        registry.register("setTargetTemp", Handler::Double(Self::rpc_set_target_temp))?;
        registry.register("toggleLed", Handler::Bool(Self::rpc_toggle_led))?;
        registry.register("isHeating", Handler::Bool(Self::rpc_is_heating))?;
        registry.register("getHumidity", Handler::Float(Self::rpc_humidity))?;
        registry.register("getClients", Handler::Int(Self::rpc_clients))?;
        registry.register("getName", Handler::String(Self::rpc_name))?;
        registry.register("getState", Handler::Object(Self::rpc_state))?;
        registry.register("setState", Handler::Object(Self::rpc_set_state))?;
        registry.register("reset", Handler::None(Self::rpc_reset))?;
        Ok(())
    }

    /// Re-evaluate the heater against the latest measurement.
    pub fn step(&mut self) {
        let measured = match self.measured.get() {
            Ok(m) => m,
            Err(e) => {
                warn!("Thermostat: measurement unavailable: {}", e);
                return;
            }
        };
        let target = *self.target.get();

        let heating = if measured < target - HYSTERESIS {
            true
        } else if measured > target + HYSTERESIS {
            false
        } else {
            self.heating
        };

        if heating != self.heating {
            info!(
                "Thermostat: heater {} (measured {}, target {})",
                if heating { "on" } else { "off" },
                measured,
                target
            );
            self.heating = heating;
        }
    }

    pub fn is_heating(&self) -> bool {
        self.heating
    }

    pub fn target(&self) -> f64 {
        *self.target.get()
    }

    pub fn led(&self) -> bool {
        *self.led.get()
    }

    pub fn set_humidity(&mut self, humidity: f32) {
        self.humidity = humidity;
    }

    pub fn clients(&self) -> u8 {
        self.clients
    }

    // ── RPC handlers ──────────────────────────────────────────

    fn rpc_measured_temp(&mut self, _: &Value) -> MethodResult<f64> {
        self.measured
            .get()
            .map_err(|_| MethodError::Internal("measurement busy"))
    }

    fn rpc_target_temp(&mut self, _: &Value) -> MethodResult<f64> {
        Ok(*self.target.get())
    }

    fn rpc_set_target_temp(&mut self, params: &Value) -> MethodResult<f64> {
        let value = checked_target(require_f64(params, "value")?)?;
        publish("target", self.target.set(value));
        Ok(*self.target.get())
    }

    fn rpc_toggle_led(&mut self, params: &Value) -> MethodResult<bool> {
        let status = require_bool(params, "status")?;
        publish("LED", self.led.set(status));
        Ok(*self.led.get())
    }

    fn rpc_is_heating(&mut self, _: &Value) -> MethodResult<bool> {
        Ok(self.heating)
    }

    fn rpc_humidity(&mut self, _: &Value) -> MethodResult<f32> {
        Ok(self.humidity)
    }

    fn rpc_clients(&mut self, _: &Value) -> MethodResult<i64> {
        Ok(i64::from(self.clients))
    }

    fn rpc_name(&mut self, _: &Value) -> MethodResult<String> {
        Ok(self.name.into())
    }

    fn rpc_state(&mut self, _: &Value) -> MethodResult<Map<String, Value>> {
        let mut state = Map::new();
        state.insert("name".into(), self.name.into());
        if let Ok(measured) = self.measured.get() {
            state.insert("measuredTemp".into(), measured.into());
        }
        state.insert("targetTemp".into(), (*self.target.get()).into());
        state.insert("led".into(), (*self.led.get()).into());
        state.insert("heating".into(), self.heating.into());
        state.insert("humidity".into(), self.humidity.into());
        Ok(state)
    }

    /// Apply any of `targetTemp` / `led`, then answer with the full state.
    /// Every present key is validated before anything is written; other
    /// keys are ignored.
    fn rpc_set_state(&mut self, params: &Value) -> MethodResult<Map<String, Value>> {
        if !params.is_object() {
            return Err(MethodError::InvalidParams("params must be an object"));
        }
        let target = match params.get("targetTemp") {
            Some(_) => Some(checked_target(require_f64(params, "targetTemp")?)?),
            None => None,
        };
        let led = match params.get("led") {
            Some(_) => Some(require_bool(params, "led")?),
            None => None,
        };

        if let Some(target) = target {
            publish("target", self.target.set(target));
        }
        if let Some(led) = led {
            publish("LED", self.led.set(led));
        }
        self.rpc_state(params)
    }

    fn rpc_reset(&mut self, _: &Value) -> MethodResult<()> {
        info!("Thermostat: reset");
        publish("target", self.target.set(DEFAULT_TARGET));
        publish("LED", self.led.set(false));
        self.heating = false;
        Ok(())
    }
}

fn checked_target(value: f64) -> MethodResult<f64> {
    if TARGET_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(MethodError::InvalidParams("value out of range"))
    }
}

/// The value is stored before observers run, so a failed broadcast never
/// undoes the write.
fn publish(what: &str, outcome: Result<bool>) {
    if let Err(e) = outcome {
        warn!("Thermostat: {} applied, change broadcast dropped: {}", what, e);
    }
}

impl SessionHooks for Thermostat<'_, '_> {
    fn on_connect(&mut self, client: ClientId) {
        self.clients = self.clients.saturating_add(1);
        info!("Thermostat: client {} connected ({} total)", client, self.clients);
    }

    fn on_disconnect(&mut self, client: ClientId) {
        self.clients = self.clients.saturating_sub(1);
        info!("Thermostat: client {} disconnected ({} total)", client, self.clients);
    }
}

/// First-order room model driving the simulated sensor.
///
/// Works in tenths of a degree so readings stay on the 0.1 °C grid: each
/// step moves the temperature one tenth toward the heater's set point
/// while heating, or toward ambient otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSimulation {
    tenths: i32,
    ambient: i32,
    heater: i32,
}

impl RoomSimulation {
    /// `ambient` and `heater` in tenths of a degree Celsius.
    pub const fn new(ambient: i32, heater: i32) -> Self {
        Self {
            tenths: ambient,
            ambient,
            heater,
        }
    }

    /// Current temperature (°C).
    pub fn temperature(&self) -> f64 {
        f64::from(self.tenths) / 10.0
    }

    pub fn advance(&mut self, heating: bool) -> f64 {
        let goal = if heating { self.heater } else { self.ambient };
        self.tenths += (goal - self.tenths).signum();
        self.temperature()
    }
}
