//! Laundrymon firmware entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink     NvsAdapter            │
//! │  (Sensor+Mode+Indicator)(TelemetrySink)  (Config+Storage)      │
//! │  WifiAdapter            TelemetryQueue   EspWsTransport        │
//! │  (Connectivity)         (TelemetrySink)  (uplink thread)       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Channel 1 FSM · Channel 2 FSM · status snapshot       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Local HTTP /status (reads the published snapshot)             │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{OutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::EspWifi;
use log::{debug, info, warn};

use laundrymon::adapters::hardware::HardwareAdapter;
use laundrymon::adapters::log_sink::LogEventSink;
use laundrymon::adapters::nvs::NvsAdapter;
use laundrymon::adapters::telemetry::{self, Tee, TelemetryQueue, TELEMETRY_CHANNEL};
use laundrymon::adapters::time::Esp32TimeAdapter;
use laundrymon::adapters::web;
use laundrymon::adapters::websocket::{EspWsTransport, NullTransport, Transport};
use laundrymon::adapters::wifi::{ConnectivityPort, WifiAdapter};
use laundrymon::app::ports::ConfigPort;
use laundrymon::app::service::AppService;
use laundrymon::config::{NetworkConfig, SystemConfig};
use laundrymon::drivers::hw_init;
use laundrymon::drivers::status_led::ChannelLeds;
use laundrymon::error::Error;
use laundrymon::sensors::ChannelSensors;

/// Uplink drain period.
const UPLINK_PERIOD_MS: u32 = 50;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Laundrymon v{}                   ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    hw_init::init_peripherals().map_err(Error::from)?;
    if let Err(e) = hw_init::init_isr_service() {
        warn!("ISR service init failed: {}; flow readings will stay at zero", e);
    }

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new() {
        Ok(nvs) => nvs.load().unwrap_or_else(|e| {
            warn!("NVS config load failed ({}), using defaults", Error::from(e));
            SystemConfig::default()
        }),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            SystemConfig::default()
        }
    };

    // ── 4. Construct adapters ─────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    let leds = ChannelLeds::new(
        PinDriver::output(peripherals.pins.gpio18.downgrade_output())?,
        PinDriver::output(peripherals.pins.gpio19.downgrade_output())?,
    );
    let mut hw = HardwareAdapter::new(ChannelSensors::both(config.current_counts_per_amp), leds);

    let mut wifi = WifiAdapter::new(EspWifi::new(peripherals.modem, sysloop, None)?);
    let net = &config.network;
    match wifi.set_credentials(&net.ap_ssid, &net.ap_passwd) {
        Ok(()) => {
            if let Err(e) = wifi.connect() {
                warn!("WiFi: initial connect failed ({}), will retry", e);
            }
        }
        Err(e) => warn!("WiFi: stored credentials unusable ({}), staying offline", e),
    }

    let mut sink = Tee(LogEventSink::new(), TelemetryQueue::new(&TELEMETRY_CHANNEL));

    let uplink_net = config.network.clone();
    std::thread::Builder::new()
        .name("uplink".into())
        .stack_size(8 * 1024)
        .spawn(move || run_uplink(&uplink_net))?;

    let shared_status = web::shared_status();
    let _http = web::start_status_server(shared_status.clone())
        .inspect_err(|e| warn!("web: status server failed to start: {}", e))
        .ok();

    // ── 5. Construct app service ──────────────────────────────
    let time = Esp32TimeAdapter::new();
    let mut app = AppService::new(config.clone());
    app.start(time.uptime_ms());

    info!("System ready. Entering driver loop.");

    // ── 6. Driver loop ────────────────────────────────────────
    loop {
        let now_ms = time.uptime_ms();
        app.tick(now_ms, &mut hw, &mut sink);
        web::publish(&shared_status, app.status());
        wifi.poll(now_ms);

        FreeRtos::delay_ms(config.poll_interval_ms);
    }
}

// ── Uplink thread ─────────────────────────────────────────────

fn run_uplink(net: &NetworkConfig) {
    if net.auth_id.is_empty() {
        warn!("uplink: no credentials configured, discarding telemetry");
        return pump(NullTransport);
    }
    match EspWsTransport::connect(net) {
        Ok(transport) => pump(transport),
        Err(e) => {
            warn!("uplink: transport init failed ({}), discarding telemetry", e);
            pump(NullTransport)
        }
    }
}

/// Drain the telemetry queue forever.
fn pump<T: Transport>(mut transport: T) {
    loop {
        let stats = telemetry::drain(&TELEMETRY_CHANNEL, &mut transport);
        if stats.discarded > 0 {
            debug!("uplink: sent {}, discarded {}", stats.sent, stats.discarded);
        }
        FreeRtos::delay_ms(UPLINK_PERIOD_MS);
    }
}
