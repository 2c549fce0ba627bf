//! Stored configuration flows into channel behaviour.

use laundrymon::adapters::nvs::NvsAdapter;
use laundrymon::app::ports::{ConfigPort, StoragePort};
use laundrymon::app::service::AppService;
use laundrymon::channel::{ActivityState, ChannelId};
use laundrymon::config::{SystemConfig, keys};
use laundrymon::fsm::mode::DeviceMode;

use crate::mock_hw::{MockBoard, RecordingSink, run};

#[test]
fn stored_thresholds_change_detection() {
    let mut nvs = NvsAdapter::new().unwrap();
    nvs.set_f32(&keys::channel(ChannelId::One, keys::CURR_D), 1.0).unwrap();
    nvs.set_u32(&keys::channel(ChannelId::One, keys::END_DELAY_D), 2_000).unwrap();

    let mut app = AppService::new(nvs.load().unwrap());
    app.start(0);
    let mut board = MockBoard::new();
    let mut sink = RecordingSink::default();
    board.ch(ChannelId::One).mode = DeviceMode::Dryer;

    // Above the default but below the stored threshold.
    board.ch(ChannelId::One).amps = 0.8;
    run(&mut app, &mut board, &mut sink, 0, 1_000, 10);
    assert_eq!(app.channel(ChannelId::One).activity(), ActivityState::Idle);

    board.ch(ChannelId::One).amps = 1.2;
    run(&mut app, &mut board, &mut sink, 1_010, 2_000, 10);
    assert_eq!(app.channel(ChannelId::One).activity(), ActivityState::Running);

    board.ch(ChannelId::One).amps = 0.0;
    run(&mut app, &mut board, &mut sink, 2_010, 4_010, 10);
    assert_eq!(app.channel(ChannelId::One).activity(), ActivityState::Idle);
}

#[test]
fn saved_config_survives_reload() {
    let mut nvs = NvsAdapter::new().unwrap();
    let mut cfg = SystemConfig::default();
    cfg.channels[1].live = false;
    cfg.channels[0].washer.flow_on = 120;
    cfg.network.room_no = "305".into();
    cfg.device_no = ["7".into(), "8".into()];
    nvs.save(&cfg).unwrap();

    let loaded = nvs.load().unwrap();
    assert_eq!(loaded.channels, cfg.channels);
    assert_eq!(loaded.network.room_no, "305");
    assert_eq!(loaded.device_no, cfg.device_no);
    assert!(!nvs.get_bool(&keys::live(ChannelId::Two)).unwrap());
}

#[test]
fn out_of_range_key_falls_back_alone() {
    let mut nvs = NvsAdapter::new().unwrap();
    nvs.set_f32(&keys::channel(ChannelId::One, keys::CURR_D), 1.0).unwrap();
    nvs.set_u32(&keys::channel(ChannelId::One, keys::END_DELAY_W), 250_000).unwrap();
    nvs.set_u32(&keys::channel(ChannelId::Two, keys::END_DELAY_W), 0).unwrap();
    nvs.set_f32(&keys::channel(ChannelId::Two, keys::CURR_W), -0.3).unwrap();
    nvs.set_str(keys::ROOM_NO, "101").unwrap();

    let loaded = nvs.load().unwrap();
    let defaults = SystemConfig::default();

    assert_eq!(loaded.channels[0].dryer.current_on_amps, 1.0);
    assert_eq!(loaded.channels[0].washer.end_delay_ms, 250_000);
    assert_eq!(loaded.channels[1].washer.end_delay_ms, defaults.channels[1].washer.end_delay_ms);
    assert_eq!(
        loaded.channels[1].washer.current_on_amps,
        defaults.channels[1].washer.current_on_amps
    );
    assert_eq!(loaded.channels[1].dryer, defaults.channels[1].dryer);
    assert_eq!(loaded.network.room_no, "101");
}
