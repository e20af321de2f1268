//! MemberRPC — thermostat demo server.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  sampler thread                 session loop (main thread)   │
//! │                                                              │
//! │  RoomSimulation                  Server::poll                │
//! │       │                             │  TcpServer / TcpClient │
//! │       ▼                             ▼                        │
//! │  MEASURED.set ──▶ TEMP_CHANGES   Thermostat (RPC context)    │
//! │                        │            │  target / led ──▶ *_CHANGES
//! │                        └────────────┴──▶ Server::flush_changes ──▶ broadcast
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use memberrpc::adapters::tcp::TcpServer;
use memberrpc::app::thermostat::{MeasuredTemp, RoomSimulation, SwitchQueue, TempQueue, Thermostat};
use memberrpc::config::ServerConfig;
use memberrpc::property::{ChangeQueue, SharedProperty};
use memberrpc::rpc::Server;

/// Simulated room ambient and heater set point, in tenths of a degree.
const AMBIENT_TENTHS: i32 = 180;
const HEATER_TENTHS: i32 = 260;

/// Sampling period of the simulated sensor.
const SAMPLE_PERIOD: Duration = Duration::from_secs(1);

static MEASURED: MeasuredTemp<'static> = SharedProperty::new("measuredTemp", AMBIENT_TENTHS as f64 / 10.0);
static TEMP_CHANGES: TempQueue = ChangeQueue::new();
static LED_CHANGES: SwitchQueue = ChangeQueue::new();
static HEATING: AtomicBool = AtomicBool::new(false);

fn main() -> Result<()> {
    // ── 1. Platform bootstrap + logging ───────────────────────
    init_logging()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  MemberRPC v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config()?;
    config.validate()?;

    // ── 3. Application context + change routing ───────────────
    MEASURED.observe(TEMP_CHANGES.observer())?;
    let mut thermostat = Thermostat::new("thermostat", &MEASURED, &TEMP_CHANGES, &LED_CHANGES)?;

    // ── 4. Transport + session loop ───────────────────────────
    let listener = TcpServer::bind(config.port)?;
    let mut server = Server::setup(&config, listener, Thermostat::register_methods)?;

    spawn_sampler()?;

    let tick = Duration::from_millis(u64::from(config.tick_interval_ms));
    info!("System ready. Entering session loop.");

    loop {
        server.poll(&mut thermostat);

        thermostat.step();
        HEATING.store(thermostat.is_heating(), Ordering::Relaxed);

        server.flush_changes(&TEMP_CHANGES);
        server.flush_changes(&LED_CHANGES);

        std::thread::sleep(tick);
    }
}

#[cfg(feature = "espidf")]
fn init_logging() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    Ok(())
}

#[cfg(not(feature = "espidf"))]
fn init_logging() -> Result<()> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .finish()
        .try_init()
        .map_err(|e| anyhow::anyhow!("logger init failed: {e}"))
}

/// Config from the JSON file named by the first argument, else defaults.
fn load_config() -> Result<ServerConfig> {
    let Some(path) = std::env::args().nth(1) else {
        info!("Config: using defaults");
        return Ok(ServerConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config = serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("parsing {path}: {e}"))?;
    info!("Config loaded from {}", path);
    Ok(config)
}

/// Simulated temperature sensor feeding `MEASURED` from its own thread.
fn spawn_sampler() -> Result<()> {
    std::thread::Builder::new()
        .name("sampler".into())
        .spawn(|| {
            let mut room = RoomSimulation::new(AMBIENT_TENTHS, HEATER_TENTHS);
            loop {
                let temperature = room.advance(HEATING.load(Ordering::Relaxed));
                if let Err(e) = MEASURED.set(temperature) {
                    warn!("Sampler: measurement not published: {}", e);
                }
                std::thread::sleep(SAMPLE_PERIOD);
            }
        })
        .context("spawning sampler thread")?;
    Ok(())
}
