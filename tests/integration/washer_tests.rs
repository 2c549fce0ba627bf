//! Washer-mode scenarios driven through `AppService` at the 10 ms tick.

use laundrymon::app::service::AppService;
use laundrymon::channel::{ActivityState, ChannelId};
use laundrymon::config::SystemConfig;
use laundrymon::fsm::StateId;
use laundrymon::fsm::mode::DeviceMode;
use laundrymon::fsm::session::LogKind;

use crate::mock_hw::{MockBoard, RecordingSink, run};

const CH: ChannelId = ChannelId::One;

fn setup() -> (AppService, MockBoard, RecordingSink) {
    let mut app = AppService::new(SystemConfig::default());
    app.start(0);
    (app, MockBoard::new(), RecordingSink::default())
}

#[test]
fn full_wash_cycle_with_default_thresholds() {
    let (mut app, mut board, mut sink) = setup();

    board.ch(CH).amps = 0.3;
    run(&mut app, &mut board, &mut sink, 0, 490, 10);
    assert_eq!(app.channel(CH).state(), StateId::Confirming);
    assert!(sink.logs(CH).is_empty());

    run(&mut app, &mut board, &mut sink, 500, 500, 10);
    assert_eq!(app.channel(CH).activity(), ActivityState::Running);
    let logs = sink.logs(CH);
    assert_eq!(logs[0].event.kind, LogKind::Start);
    assert_eq!(logs[0].at_ms, 500);
    assert_eq!(logs[1].event.kind, LogKind::Current);
    assert_eq!(logs[1].event.relative_ms, 0);
    assert!(logs[1].event.asserted);
    assert!(board.led(CH));
    assert_eq!(sink.statuses(CH), vec![(500, true)]);

    // 120 s of load, then idle current.
    run(&mut app, &mut board, &mut sink, 510, 120_500, 10);
    board.ch(CH).amps = 0.05;
    run(&mut app, &mut board, &mut sink, 120_510, 220_500, 10);
    assert_eq!(app.channel(CH).state(), StateId::Cooldown);

    run(&mut app, &mut board, &mut sink, 220_510, 220_510, 10);
    assert_eq!(app.channel(CH).state(), StateId::Idle);
    let logs = sink.logs(CH);
    let end = logs.last().expect("END logged");
    assert_eq!(end.event.kind, LogKind::End);
    assert_eq!(end.at_ms, 220_510);
    assert!(!board.led(CH));
    assert_eq!(sink.statuses(CH), vec![(500, true), (220_510, false)]);

    // The current edge down is logged once, when it happens.
    let c_off: Vec<_> = logs
        .iter()
        .filter(|s| s.event.kind == LogKind::Current && !s.event.asserted)
        .collect();
    assert_eq!(c_off.len(), 1);
    assert_eq!(c_off[0].at_ms, 120_510);
}

#[test]
fn dropout_at_499_ms_never_starts() {
    let (mut app, mut board, mut sink) = setup();

    board.ch(CH).amps = 0.3;
    run(&mut app, &mut board, &mut sink, 0, 499, 1);
    board.ch(CH).amps = 0.1;
    run(&mut app, &mut board, &mut sink, 500, 600, 10);

    assert_eq!(app.channel(CH).state(), StateId::Idle);
    assert!(sink.logs(CH).is_empty());
    assert!(sink.statuses(CH).is_empty());
    assert!(board.leds.is_empty());
}

#[test]
fn flow_and_drain_are_logged_as_sub_signals() {
    let (mut app, mut board, mut sink) = setup();

    board.ch(CH).flow = 64;
    run(&mut app, &mut board, &mut sink, 0, 500, 10);
    assert_eq!(app.channel(CH).activity(), ActivityState::Running);
    assert_eq!(sink.kinds(CH), vec![LogKind::Start, LogKind::Flow]);

    board.ch(CH).flow = 0;
    board.ch(CH).drain = true;
    run(&mut app, &mut board, &mut sink, 510, 2_000, 10);
    assert_eq!(
        sink.kinds(CH),
        vec![LogKind::Start, LogKind::Flow, LogKind::Flow, LogKind::Water]
    );

    let seqs: Vec<u32> = sink.logs(CH).iter().map(|s| s.event.seq).collect();
    assert_eq!(seqs, vec![1, 1, 2, 3]);
}

#[test]
fn one_tick_dip_does_not_start_cooldown() {
    let (mut app, mut board, mut sink) = setup();

    board.ch(CH).amps = 0.3;
    run(&mut app, &mut board, &mut sink, 0, 1_000, 10);
    board.ch(CH).amps = 0.0;
    run(&mut app, &mut board, &mut sink, 1_010, 1_010, 10);
    board.ch(CH).amps = 0.3;
    run(&mut app, &mut board, &mut sink, 1_020, 5_000, 10);

    assert_eq!(app.channel(CH).state(), StateId::Running);
}

#[test]
fn reasserting_during_cooldown_keeps_the_session() {
    let (mut app, mut board, mut sink) = setup();

    board.ch(CH).amps = 0.3;
    run(&mut app, &mut board, &mut sink, 0, 1_000, 10);
    board.ch(CH).amps = 0.0;
    run(&mut app, &mut board, &mut sink, 1_010, 50_000, 10);
    assert_eq!(app.channel(CH).state(), StateId::Cooldown);

    board.ch(CH).amps = 0.3;
    run(&mut app, &mut board, &mut sink, 50_010, 60_000, 10);
    assert_eq!(app.channel(CH).state(), StateId::Running);
    let kinds = sink.kinds(CH);
    assert_eq!(kinds.iter().filter(|k| **k == LogKind::Start).count(), 1);
    assert!(!kinds.contains(&LogKind::End));
    assert_eq!(sink.statuses(CH), vec![(500, true)]);
}

#[test]
fn failed_current_read_counts_as_no_load() {
    let (mut app, mut board, mut sink) = setup();

    board.ch(CH).amps = 5.0;
    board.ch(CH).current_fault = true;
    run(&mut app, &mut board, &mut sink, 0, 2_000, 10);

    assert_eq!(app.channel(CH).state(), StateId::Idle);
    assert!(sink.events.is_empty());
}

#[test]
fn switching_to_dryer_in_cooldown_keeps_the_session() {
    let (mut app, mut board, mut sink) = setup();

    board.ch(CH).amps = 0.3;
    board.ch(CH).flow = 64;
    run(&mut app, &mut board, &mut sink, 0, 1_000, 10);
    board.ch(CH).amps = 0.0;
    board.ch(CH).flow = 0;
    run(&mut app, &mut board, &mut sink, 1_010, 3_000, 10);
    assert_eq!(app.channel(CH).state(), StateId::Cooldown);

    // Above the washer threshold, below the dryer one.
    board.ch(CH).mode = DeviceMode::Dryer;
    board.ch(CH).amps = 0.3;
    run(&mut app, &mut board, &mut sink, 3_010, 11_000, 10);
    assert_eq!(app.channel(CH).state(), StateId::Cooldown);
    assert_eq!(app.channel(CH).mode(), DeviceMode::Dryer);

    // Dryer end delay, counted from the first low sample at 1010.
    run(&mut app, &mut board, &mut sink, 11_010, 11_010, 10);
    assert_eq!(app.channel(CH).state(), StateId::Idle);

    let logs = sink.logs(CH);
    assert_eq!(
        sink.kinds(CH),
        vec![
            LogKind::Start,
            LogKind::Current,
            LogKind::Flow,
            LogKind::Current,
            LogKind::Flow,
            LogKind::End,
        ]
    );
    let seqs: Vec<u32> = logs.iter().map(|s| s.event.seq).collect();
    assert_eq!(seqs, vec![1, 1, 2, 3, 4, 5]);

    let end = logs.last().expect("END logged");
    assert_eq!(end.at_ms, 11_010);
    assert_eq!(end.event.relative_ms, 10_510);
    assert_eq!(sink.statuses(CH), vec![(500, true), (11_010, false)]);
}
