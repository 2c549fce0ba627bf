//! State machine → telemetry queue → transport, end to end.

use laundrymon::adapters::telemetry::{self, Tee, TelemetryChannel, TelemetryQueue};
use laundrymon::adapters::websocket::Transport;
use laundrymon::app::service::AppService;
use laundrymon::channel::ChannelId;
use laundrymon::config::SystemConfig;
use laundrymon::fsm::mode::DeviceMode;

use crate::mock_hw::{MockBoard, RecordingSink};

/// Records every frame it is asked to send.
struct Uplink {
    connected: [bool; 2],
    sent: Vec<(ChannelId, String)>,
}

impl Uplink {
    fn new(connected: [bool; 2]) -> Self {
        Self {
            connected,
            sent: Vec::new(),
        }
    }
}

impl Transport for Uplink {
    type Error = ();

    fn is_connected(&self, channel: ChannelId) -> bool {
        self.connected[channel.index()]
    }

    fn send_text(&mut self, channel: ChannelId, text: &str) -> Result<(), ()> {
        self.sent.push((channel, text.to_owned()));
        Ok(())
    }
}

#[test]
fn dryer_start_reaches_the_uplink_in_order() {
    static QUEUE: TelemetryChannel = TelemetryChannel::new();

    let mut app = AppService::new(SystemConfig::default());
    app.start(0);
    let mut board = MockBoard::new();
    board.ch(ChannelId::Two).mode = DeviceMode::Dryer;
    board.ch(ChannelId::Two).amps = 0.6;

    let mut sink = Tee(RecordingSink::default(), TelemetryQueue::new(&QUEUE));
    app.tick(0, &mut board, &mut sink);

    let mut uplink = Uplink::new([true, true]);
    let stats = telemetry::drain(&QUEUE, &mut uplink);
    assert_eq!(stats.sent, 3);
    assert_eq!(stats.discarded, 0);

    let texts: Vec<&str> = uplink.sent.iter().map(|(_, t)| t.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            r#"{"title":"Log","id":102,"log":{"START":{"local_time":""}}}"#,
            r#"{"id":102,"device_type":"DRY","state":0}"#,
            r#"{"title":"Log","id":102,"log":{"1":{"t":0,"n":"C","s":1}}}"#,
        ]
    );
    assert!(uplink.sent.iter().all(|(ch, _)| *ch == ChannelId::Two));

    // The serial-log half of the tee saw the same run.
    assert!(!sink.0.events.is_empty());
}

#[test]
fn frames_for_a_disconnected_channel_are_discarded() {
    static QUEUE: TelemetryChannel = TelemetryChannel::new();

    let mut app = AppService::new(SystemConfig::default());
    app.start(0);
    let mut board = MockBoard::new();
    for id in ChannelId::ALL {
        board.ch(id).mode = DeviceMode::Dryer;
        board.ch(id).amps = 0.6;
    }

    let mut sink = TelemetryQueue::new(&QUEUE);
    app.tick(0, &mut board, &mut sink);

    let mut uplink = Uplink::new([true, false]);
    let stats = telemetry::drain(&QUEUE, &mut uplink);
    assert_eq!(stats.sent, 3);
    assert_eq!(stats.discarded, 3);
    assert!(uplink.sent.iter().all(|(ch, _)| *ch == ChannelId::One));

    // Nothing is retried.
    assert_eq!(telemetry::drain(&QUEUE, &mut uplink), telemetry::DrainStats::default());
}

#[test]
fn full_queue_drops_without_blocking_the_tick() {
    static QUEUE: TelemetryChannel = TelemetryChannel::new();

    let mut app = AppService::new(SystemConfig::default());
    app.start(0);
    let mut board = MockBoard::new();
    board.ch(ChannelId::One).mode = DeviceMode::Dryer;
    let mut sink = TelemetryQueue::new(&QUEUE);

    // Each on/off pair yields two current edges; never drain.
    let mut t = 0;
    for _ in 0..12 {
        board.ch(ChannelId::One).amps = 0.6;
        app.tick(t, &mut board, &mut sink);
        board.ch(ChannelId::One).amps = 0.0;
        app.tick(t + 10, &mut board, &mut sink);
        t += 20;
    }

    // START + status + 24 current edges into a 16-deep queue.
    assert_eq!(sink.dropped(), 26 - telemetry::TELEMETRY_DEPTH as u32);
}
