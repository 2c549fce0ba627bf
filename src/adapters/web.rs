//! Local HTTP status endpoint.
//!
//! The control loop publishes a [`StatusSnapshot`] into shared state
//! after every tick; `GET /status` serialises the latest copy.  The
//! server thread never touches the state machines.

use std::sync::{Arc, Mutex};

use log::warn;

use crate::app::status::StatusSnapshot;

pub type SharedStatus = Arc<Mutex<StatusSnapshot>>;

pub fn shared_status() -> SharedStatus {
    Arc::new(Mutex::new(StatusSnapshot::default()))
}

/// Replace the published snapshot.
pub fn publish(shared: &SharedStatus, snapshot: StatusSnapshot) {
    match shared.lock() {
        Ok(mut guard) => *guard = snapshot,
        Err(poisoned) => *poisoned.into_inner() = snapshot,
    }
}

/// JSON body for `GET /status`.
pub fn render(shared: &SharedStatus) -> String {
    let snapshot = match shared.lock() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    };
    snapshot.to_json().unwrap_or_else(|e| {
        warn!("web: status encode failed: {}", e);
        String::from("{}")
    })
}

#[cfg(target_os = "espidf")]
pub fn start_status_server(
    shared: SharedStatus,
) -> anyhow::Result<esp_idf_svc::http::server::EspHttpServer<'static>> {
    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::io::Write;

    let cfg = Configuration {
        stack_size: 8 * 1024,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&cfg)?;

    server.fn_handler("/status", Method::Get, move |req| -> anyhow::Result<()> {
        let body = render(&shared);
        let headers = [("Content-Type", "application/json")];
        let mut resp = req.into_response(200, Some("OK"), &headers)?;
        resp.write_all(body.as_bytes())?;
        Ok(())
    })?;

    log::info!("web: status endpoint up at /status");
    Ok(server)
}
