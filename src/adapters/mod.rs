//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                     | Connects to                |
//! |-------------|--------------------------------|----------------------------|
//! | `hardware`  | SensorPort, ModeSelectorPort,  | ESP32 ADC, GPIO            |
//! |             | IndicatorPort                  |                            |
//! | `log_sink`  | TelemetrySink                  | Serial log output          |
//! | `nvs`       | ConfigPort, StoragePort        | NVS / in-memory store      |
//! | `telemetry` | TelemetrySink                  | Bounded frame queue        |
//! | `time`      | -                              | ESP32 system timer         |
//! | `web`       | -                              | Local HTTP status endpoint |
//! | `websocket` | Transport                      | Remote status service      |
//! | `wifi`      | ConnectivityPort               | ESP-IDF WiFi STA           |
//! | `wire`      | -                              | JSON frame encoding        |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod telemetry;
pub mod time;
pub mod web;
pub mod websocket;
pub mod wifi;
pub mod wire;
