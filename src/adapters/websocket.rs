//! Uplink transport to the remote status service.
//!
//! Each channel has its own websocket connection, identified by its
//! hardware id.  The handshake carries HTTP basic auth (built by the IDF
//! client from the configured id and password) plus `HWID` and `ROOM`
//! headers.
//!
//! The telemetry drain is generic over [`Transport`], so host tests and
//! boards without credentials use [`NullTransport`].

use crate::channel::ChannelId;

/// Text-frame transport with one logical connection per channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    fn is_connected(&self, channel: ChannelId) -> bool;

    /// Send one text frame on `channel`'s connection.
    fn send_text(&mut self, channel: ChannelId, text: &str) -> Result<(), Self::Error>;
}

/// A transport that is never connected.
/// Used when no uplink is configured.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn is_connected(&self, _channel: ChannelId) -> bool {
        false
    }

    fn send_text(&mut self, _channel: ChannelId, _text: &str) -> Result<(), ()> {
        Ok(())
    }
}

/// Extra handshake headers for `channel`.
pub fn handshake_headers(channel: ChannelId, room_no: &str) -> String {
    format!("HWID: {}\r\nROOM: {}\r\n", channel.hw_id(), room_no)
}

#[cfg(target_os = "espidf")]
pub use esp_impl::EspWsTransport;

#[cfg(target_os = "espidf")]
mod esp_impl {
    use core::time::Duration;

    use esp_idf_svc::ws::FrameType;
    use esp_idf_svc::ws::client::{
        EspWebSocketClient, EspWebSocketClientConfig, WebSocketEventType,
    };
    use log::{info, warn};

    use super::{Transport, handshake_headers};
    use crate::channel::ChannelId;
    use crate::config::NetworkConfig;
    use crate::error::CommsError;

    const NETWORK_TIMEOUT: Duration = Duration::from_secs(10);
    const PING_INTERVAL: Duration = Duration::from_secs(10);

    /// One `EspWebSocketClient` per channel. Reconnection is handled by
    /// the IDF client task.
    pub struct EspWsTransport {
        clients: [EspWebSocketClient<'static>; 2],
    }

    impl EspWsTransport {
        pub fn connect(net: &NetworkConfig) -> Result<Self, CommsError> {
            let one = open(ChannelId::One, net)?;
            let two = open(ChannelId::Two, net)?;
            Ok(Self { clients: [one, two] })
        }
    }

    fn open(
        channel: ChannelId,
        net: &NetworkConfig,
    ) -> Result<EspWebSocketClient<'static>, CommsError> {
        let headers = handshake_headers(channel, &net.room_no);
        let config = EspWebSocketClientConfig {
            username: Some(&net.auth_id),
            password: Some(&net.auth_passwd),
            headers: Some(&headers),
            network_timeout_ms: NETWORK_TIMEOUT,
            ping_interval_sec: PING_INTERVAL,
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let n = channel.number();
        EspWebSocketClient::new(
            &net.server_uri,
            &config,
            NETWORK_TIMEOUT,
            move |event| match event {
                Ok(ev) => match ev.event_type {
                    WebSocketEventType::Connected => info!("ws CH{}: connected", n),
                    WebSocketEventType::Disconnected => warn!("ws CH{}: disconnected", n),
                    _ => {}
                },
                Err(e) => warn!("ws CH{}: error {:?}", n, e),
            },
        )
        .map_err(|e| {
            warn!("ws CH{}: client init failed: {:?}", n, e);
            CommsError::SocketNotConnected
        })
    }

    impl Transport for EspWsTransport {
        type Error = CommsError;

        fn is_connected(&self, channel: ChannelId) -> bool {
            self.clients[channel.index()].is_connected()
        }

        fn send_text(&mut self, channel: ChannelId, text: &str) -> Result<(), CommsError> {
            self.clients[channel.index()]
                .send(FrameType::Text(false), text.as_bytes())
                .map_err(|_| CommsError::SocketSendFailed)
        }
    }
}
