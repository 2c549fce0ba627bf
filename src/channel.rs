//! One monitored appliance channel.
//!
//! Owns a state machine and its context, feeds it one sample per tick,
//! and forwards the side effects the handlers queue to the indicator and
//! telemetry ports.  Channels share nothing with each other.

use serde::Serialize;

use crate::app::events::ChannelEvent;
use crate::app::ports::{IndicatorPort, TelemetrySink};
use crate::config::ChannelConfig;
use crate::fsm::context::{ChannelContext, ChannelOutput, Sample};
use crate::fsm::mode::DeviceMode;
use crate::fsm::session::Session;
use crate::fsm::{Fsm, StateId, states};

/// Physical channel on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChannelId {
    One,
    Two,
}

impl ChannelId {
    pub const ALL: [Self; 2] = [Self::One, Self::Two];

    /// 1-based number used in logs and key names.
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// 0-based array index.
    pub const fn index(self) -> usize {
        self.number() as usize - 1
    }

    /// Hardware id reported to the remote service.
    pub const fn hw_id(self) -> u16 {
        match self {
            Self::One => 101,
            Self::Two => 102,
        }
    }
}

/// Externally visible activity of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActivityState {
    Idle,
    Running,
}

pub struct Channel {
    id: ChannelId,
    fsm: Fsm,
    ctx: ChannelContext,
}

impl Channel {
    pub fn new(id: ChannelId, config: ChannelConfig, confirm_window_ms: u32) -> Self {
        Self {
            id,
            fsm: Fsm::new(states::build_state_table(), StateId::Idle),
            ctx: ChannelContext::new(id, config, confirm_window_ms),
        }
    }

    /// Enter the initial state. Call once before the first tick.
    pub fn start(&mut self, now_ms: u64) {
        self.ctx.now_ms = now_ms;
        self.fsm.start(&mut self.ctx);
        self.ctx.outbox.clear();
    }

    /// Advance one tick with a fresh sample and mode reading.
    pub fn tick(
        &mut self,
        now_ms: u64,
        mode: DeviceMode,
        sample: Sample,
        indicator: &mut impl IndicatorPort,
        sink: &mut impl TelemetrySink,
    ) {
        if mode != self.ctx.mode {
            log::info!(
                "CH{}: mode {:?} -> {:?}",
                self.id.number(),
                self.ctx.mode,
                mode
            );
        }
        self.ctx.now_ms = now_ms;
        self.ctx.mode = mode;
        self.ctx.sample = sample;

        if let Some(from) = self.fsm.tick(&mut self.ctx) {
            sink.emit(&ChannelEvent::StateChanged {
                channel: self.id,
                from,
                to: self.fsm.current_state(),
            });
        }

        for out in &self.ctx.outbox {
            match *out {
                ChannelOutput::Indicator(on) => indicator.set_indicator(self.id, on),
                ChannelOutput::Status(running) => sink.notify_status(self.id, running, mode),
                ChannelOutput::Log(event) => sink.submit_log(self.id, event),
            }
        }
        self.ctx.outbox.clear();
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn state_name(&self) -> &'static str {
        self.fsm.current_name()
    }

    pub fn activity(&self) -> ActivityState {
        if self.state().is_active() {
            ActivityState::Running
        } else {
            ActivityState::Idle
        }
    }

    pub fn mode(&self) -> DeviceMode {
        self.ctx.mode
    }

    /// Current RMS from the most recent sample.
    pub fn last_current(&self) -> f32 {
        self.ctx.sample.current_rms
    }

    pub fn session(&self) -> Option<&Session> {
        self.ctx.session.as_ref()
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.ctx.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Leds(Vec<(ChannelId, bool)>);
    impl IndicatorPort for Leds {
        fn set_indicator(&mut self, channel: ChannelId, active: bool) {
            self.0.push((channel, active));
        }
    }

    #[derive(Default)]
    struct Sink(Vec<ChannelEvent>);
    impl TelemetrySink for Sink {
        fn emit(&mut self, event: &ChannelEvent) {
            self.0.push(*event);
        }
    }

    fn amps(current_rms: f32) -> Sample {
        Sample {
            current_rms,
            ..Sample::default()
        }
    }

    #[test]
    fn ids() {
        assert_eq!(ChannelId::One.hw_id(), 101);
        assert_eq!(ChannelId::Two.hw_id(), 102);
        assert_eq!(ChannelId::Two.index(), 1);
        assert_eq!(ChannelId::One.number(), 1);
    }

    #[test]
    fn dryer_start_reaches_ports_in_order() {
        let mut ch = Channel::new(ChannelId::Two, ChannelConfig::default(), 500);
        let (mut leds, mut sink) = (Leds::default(), Sink::default());
        ch.start(0);
        ch.tick(0, DeviceMode::Dryer, amps(0.6), &mut leds, &mut sink);

        assert_eq!(ch.activity(), ActivityState::Running);
        assert_eq!(leds.0, vec![(ChannelId::Two, true)]);
        assert!(matches!(sink.0[0], ChannelEvent::StateChanged { from: StateId::Idle, to: StateId::Running, .. }));
        assert!(matches!(sink.0[1], ChannelEvent::Logged { event, .. } if event.kind.tag() == "START"));
        assert!(matches!(
            sink.0[2],
            ChannelEvent::StatusChanged { running: true, mode: DeviceMode::Dryer, .. }
        ));
        assert!(matches!(sink.0[3], ChannelEvent::Logged { event, .. } if event.kind.tag() == "C"));
        assert_eq!(sink.0.len(), 4);
    }

    #[test]
    fn steady_input_is_idempotent() {
        let mut ch = Channel::new(ChannelId::One, ChannelConfig::default(), 500);
        let (mut leds, mut sink) = (Leds::default(), Sink::default());
        ch.start(0);
        ch.tick(0, DeviceMode::Dryer, amps(0.6), &mut leds, &mut sink);
        let before = sink.0.len();
        for t in 1..100 {
            ch.tick(t * 10, DeviceMode::Dryer, amps(0.6), &mut leds, &mut sink);
        }
        assert_eq!(sink.0.len(), before);
        assert_eq!(leds.0.len(), 1);
    }

    #[test]
    fn records_last_current() {
        let mut ch = Channel::new(ChannelId::One, ChannelConfig::default(), 500);
        let (mut leds, mut sink) = (Leds::default(), Sink::default());
        ch.start(0);
        ch.tick(10, DeviceMode::Washer, amps(0.15), &mut leds, &mut sink);
        assert!((ch.last_current() - 0.15).abs() < f32::EPSILON);
        assert_eq!(ch.activity(), ActivityState::Idle);
        assert_eq!(ch.state_name(), "Idle");
    }
}
