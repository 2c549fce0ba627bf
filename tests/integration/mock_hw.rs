//! Mock board for integration tests.
//!
//! Sensor readings are plain fields the test sets between ticks.  Every
//! indicator write and every emitted event is recorded so tests can
//! assert on the full history.

use laundrymon::app::events::ChannelEvent;
use laundrymon::app::ports::{IndicatorPort, ModeSelectorPort, SensorPort, TelemetrySink};
use laundrymon::app::service::AppService;
use laundrymon::channel::ChannelId;
use laundrymon::error::SensorError;
use laundrymon::fsm::mode::DeviceMode;
use laundrymon::fsm::session::{LogEvent, LogKind};

/// Readings for one channel.
#[derive(Debug, Clone, Copy)]
pub struct Inputs {
    pub amps: f32,
    pub flow: u32,
    pub drain: bool,
    pub mode: DeviceMode,
    /// Make every current read fail.
    pub current_fault: bool,
}

impl Default for Inputs {
    fn default() -> Self {
        Self {
            amps: 0.0,
            flow: 0,
            drain: false,
            mode: DeviceMode::Washer,
            current_fault: false,
        }
    }
}

#[derive(Default)]
pub struct MockBoard {
    pub inputs: [Inputs; 2],
    pub leds: Vec<(ChannelId, bool)>,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ch(&mut self, id: ChannelId) -> &mut Inputs {
        &mut self.inputs[id.index()]
    }

    pub fn led(&self, id: ChannelId) -> bool {
        self.leds
            .iter()
            .rev()
            .find(|(c, _)| *c == id)
            .is_some_and(|(_, on)| *on)
    }
}

impl SensorPort for MockBoard {
    fn read_current_rms(&mut self, channel: ChannelId) -> Result<f32, SensorError> {
        let i = &self.inputs[channel.index()];
        if i.current_fault {
            Err(SensorError::AdcReadFailed)
        } else {
            Ok(i.amps)
        }
    }

    fn read_flow_rate(&mut self, channel: ChannelId) -> Result<u32, SensorError> {
        Ok(self.inputs[channel.index()].flow)
    }

    fn read_drain(&mut self, channel: ChannelId) -> Result<bool, SensorError> {
        Ok(self.inputs[channel.index()].drain)
    }
}

impl ModeSelectorPort for MockBoard {
    fn read_mode(&mut self, channel: ChannelId) -> DeviceMode {
        self.inputs[channel.index()].mode
    }
}

impl IndicatorPort for MockBoard {
    fn set_indicator(&mut self, channel: ChannelId, active: bool) {
        self.leds.push((channel, active));
    }
}

// ── Recording sink ────────────────────────────────────────────

/// A log record together with the absolute tick time it was emitted at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamped {
    pub at_ms: u64,
    pub event: LogEvent,
}

#[derive(Default)]
pub struct RecordingSink {
    pub now_ms: u64,
    pub events: Vec<(u64, ChannelEvent)>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn logs(&self, id: ChannelId) -> Vec<Stamped> {
        self.events
            .iter()
            .filter_map(|(at_ms, e)| match e {
                ChannelEvent::Logged { channel, event } if *channel == id => Some(Stamped {
                    at_ms: *at_ms,
                    event: *event,
                }),
                _ => None,
            })
            .collect()
    }

    pub fn kinds(&self, id: ChannelId) -> Vec<LogKind> {
        self.logs(id).iter().map(|s| s.event.kind).collect()
    }

    pub fn statuses(&self, id: ChannelId) -> Vec<(u64, bool)> {
        self.events
            .iter()
            .filter_map(|(at_ms, e)| match e {
                ChannelEvent::StatusChanged {
                    channel, running, ..
                } if *channel == id => Some((*at_ms, *running)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TelemetrySink for RecordingSink {
    fn emit(&mut self, event: &ChannelEvent) {
        self.events.push((self.now_ms, *event));
    }
}

// ── Driver ────────────────────────────────────────────────────

/// Tick `app` every `step_ms` from `from_ms` up to and including `to_ms`.
pub fn run(
    app: &mut AppService,
    board: &mut MockBoard,
    sink: &mut RecordingSink,
    from_ms: u64,
    to_ms: u64,
    step_ms: u64,
) {
    let mut t = from_ms;
    while t <= to_ms {
        sink.now_ms = t;
        app.tick(t, board, sink);
        t += step_ms;
    }
}
