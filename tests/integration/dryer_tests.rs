//! Dryer-mode scenarios, plus both channels running side by side.

use laundrymon::app::service::AppService;
use laundrymon::channel::{ActivityState, ChannelId};
use laundrymon::config::SystemConfig;
use laundrymon::fsm::StateId;
use laundrymon::fsm::mode::DeviceMode;
use laundrymon::fsm::session::LogKind;

use crate::mock_hw::{MockBoard, RecordingSink, run};

const CH: ChannelId = ChannelId::Two;

fn setup() -> (AppService, MockBoard, RecordingSink) {
    let mut app = AppService::new(SystemConfig::default());
    app.start(0);
    let mut board = MockBoard::new();
    board.ch(CH).mode = DeviceMode::Dryer;
    (app, board, RecordingSink::default())
}

#[test]
fn dry_cycle_with_default_thresholds() {
    let (mut app, mut board, mut sink) = setup();

    board.ch(CH).amps = 0.6;
    run(&mut app, &mut board, &mut sink, 0, 0, 10);
    assert_eq!(app.channel(CH).activity(), ActivityState::Running);
    assert_eq!(sink.kinds(CH), vec![LogKind::Start, LogKind::Current]);
    assert_eq!(sink.logs(CH)[1].event.relative_ms, 0);

    run(&mut app, &mut board, &mut sink, 10, 4_990, 10);
    board.ch(CH).amps = 0.4;
    run(&mut app, &mut board, &mut sink, 5_000, 14_990, 10);
    assert_eq!(app.channel(CH).state(), StateId::Cooldown);

    run(&mut app, &mut board, &mut sink, 15_000, 15_000, 10);
    assert_eq!(app.channel(CH).state(), StateId::Idle);
    let end = *sink.logs(CH).last().expect("END logged");
    assert_eq!(end.event.kind, LogKind::End);
    assert_eq!(end.at_ms, 15_000);
    assert_eq!(end.event.relative_ms, 15_000);
    assert_eq!(sink.statuses(CH), vec![(0, true), (15_000, false)]);
}

#[test]
fn flow_and_drain_are_ignored_in_dryer_mode() {
    let (mut app, mut board, mut sink) = setup();

    board.ch(CH).flow = 500;
    board.ch(CH).drain = true;
    run(&mut app, &mut board, &mut sink, 0, 3_000, 10);
    assert_eq!(app.channel(CH).state(), StateId::Idle);
    assert!(sink.events.is_empty());
}

#[test]
fn reading_exactly_at_threshold_holds_state() {
    let (mut app, mut board, mut sink) = setup();

    board.ch(CH).amps = 0.5;
    run(&mut app, &mut board, &mut sink, 0, 1_000, 10);
    assert_eq!(app.channel(CH).state(), StateId::Idle);

    board.ch(CH).amps = 0.6;
    run(&mut app, &mut board, &mut sink, 1_010, 1_010, 10);
    board.ch(CH).amps = 0.5;
    run(&mut app, &mut board, &mut sink, 1_020, 60_000, 10);
    assert_eq!(app.channel(CH).state(), StateId::Running);
}

#[test]
fn channels_run_independently() {
    let (mut app, mut board, mut sink) = setup();

    board.ch(ChannelId::One).amps = 0.3;
    board.ch(CH).amps = 0.6;
    run(&mut app, &mut board, &mut sink, 0, 1_000, 10);
    assert_eq!(app.channel(ChannelId::One).activity(), ActivityState::Running);
    assert_eq!(app.channel(CH).activity(), ActivityState::Running);

    board.ch(CH).amps = 0.0;
    run(&mut app, &mut board, &mut sink, 1_010, 12_000, 10);
    assert_eq!(app.channel(CH).activity(), ActivityState::Idle);
    assert_eq!(app.channel(ChannelId::One).activity(), ActivityState::Running);

    let status = app.status();
    assert_eq!(status.channels[0].activity, ActivityState::Running);
    assert_eq!(status.channels[1].activity, ActivityState::Idle);
    assert_eq!(status.channels[1].mode, DeviceMode::Dryer);
}

#[test]
fn channel_not_marked_live_still_detects() {
    let mut cfg = SystemConfig::default();
    cfg.channels[CH.index()].live = false;
    let mut app = AppService::new(cfg);
    app.start(0);
    let mut board = MockBoard::new();
    let mut sink = RecordingSink::default();
    board.ch(CH).mode = DeviceMode::Dryer;
    board.ch(CH).amps = 3.0;

    run(&mut app, &mut board, &mut sink, 0, 1_000, 10);
    assert_eq!(app.channel(CH).activity(), ActivityState::Running);
    assert!(!sink.events.is_empty());
    assert!(!app.status().channels[CH.index()].live);
}
