//! Property tests for the channel state machine.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use laundrymon::app::events::ChannelEvent;
use laundrymon::app::ports::{IndicatorPort, TelemetrySink};
use laundrymon::channel::{Channel, ChannelId};
use laundrymon::config::{ChannelConfig, DEFAULT_CONFIRM_WINDOW_MS};
use laundrymon::fsm::StateId;
use laundrymon::fsm::context::Sample;
use laundrymon::fsm::mode::DeviceMode;
use laundrymon::fsm::session::{LogEvent, LogKind};
use proptest::prelude::*;

struct NoLed;

impl IndicatorPort for NoLed {
    fn set_indicator(&mut self, _: ChannelId, _: bool) {}
}

#[derive(Default)]
struct Logs(Vec<LogEvent>);

impl TelemetrySink for Logs {
    fn emit(&mut self, event: &ChannelEvent) {
        if let ChannelEvent::Logged { event, .. } = event {
            self.0.push(*event);
        }
    }
}

fn channel() -> Channel {
    let mut ch = Channel::new(ChannelId::One, ChannelConfig::default(), DEFAULT_CONFIRM_WINDOW_MS);
    ch.start(0);
    ch
}

fn arb_mode() -> impl Strategy<Value = DeviceMode> {
    prop_oneof![Just(DeviceMode::Washer), Just(DeviceMode::Dryer)]
}

fn arb_sample() -> impl Strategy<Value = Sample> {
    (0.0f32..1.5, 0u32..120, any::<bool>()).prop_map(|(current_rms, flow_rate, drain_active)| {
        Sample {
            current_rms,
            flow_rate,
            drain_active,
        }
    })
}

proptest! {
    /// Within one session, sequence numbers and relative times never go
    /// backwards, whatever the input stream.
    #[test]
    fn session_records_are_monotonic(
        steps in proptest::collection::vec((arb_mode(), arb_sample(), 1u64..3_000), 1..400),
    ) {
        let mut ch = channel();
        let mut logs = Logs::default();
        let mut now = 0u64;
        for (mode, sample, dt) in steps {
            now += dt;
            ch.tick(now, mode, sample, &mut NoLed, &mut logs);
        }

        let mut last: Option<LogEvent> = None;
        for ev in &logs.0 {
            if ev.kind == LogKind::Start {
                last = None;
            }
            if let Some(prev) = last {
                prop_assert!(ev.seq >= prev.seq);
                prop_assert!(ev.relative_ms >= prev.relative_ms);
            }
            last = Some(*ev);
        }
    }

    /// Repeating the same sample never logs a sub-signal twice in a row.
    #[test]
    fn unchanged_sample_logs_nothing_new(
        mode in arb_mode(),
        sample in arb_sample(),
        repeats in 2usize..50,
    ) {
        let mut ch = channel();
        let mut logs = Logs::default();
        // Enough ticks to get through any confirmation window.
        for i in 0..60u64 {
            ch.tick(i * 10, mode, sample, &mut NoLed, &mut logs);
        }
        let settled = logs.0.len();
        for i in 0..repeats as u64 {
            ch.tick(600 + i * 10, mode, sample, &mut NoLed, &mut logs);
        }
        prop_assert_eq!(logs.0.len(), settled);
    }

    /// A washer load held for `held_ms` starts a cycle iff it covers the
    /// confirmation window.
    #[test]
    fn confirmation_boundary(held_ms in 0u64..1_000) {
        let mut ch = channel();
        let mut logs = Logs::default();
        let on = Sample { current_rms: 0.3, ..Sample::default() };

        let mut t = 0;
        while t <= held_ms {
            ch.tick(t, DeviceMode::Washer, on, &mut NoLed, &mut logs);
            t += 1;
        }
        ch.tick(held_ms + 1, DeviceMode::Washer, Sample::default(), &mut NoLed, &mut logs);

        let started = !logs.0.is_empty();
        prop_assert_eq!(started, held_ms >= u64::from(DEFAULT_CONFIRM_WINDOW_MS));
    }

    /// Only the four defined states are ever reported.
    #[test]
    fn only_defined_states_are_reachable(
        steps in proptest::collection::vec((arb_mode(), arb_sample(), 1u64..500), 1..200),
    ) {
        let mut ch = channel();
        let mut logs = Logs::default();
        let mut now = 0;
        for (mode, sample, dt) in steps {
            now += dt;
            ch.tick(now, mode, sample, &mut NoLed, &mut logs);
            let s = ch.state();
            prop_assert!(matches!(
                s,
                StateId::Idle | StateId::Confirming | StateId::Running | StateId::Cooldown
            ));
            prop_assert_eq!(ch.session().is_some(), s.is_active());
        }
    }
}
