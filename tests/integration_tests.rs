use framefix::host::{Clock, Control, PedHandle, VehicleHandle};
use framefix::sim::{HostCall, SimHost};
use framefix::*;

const FRAME_MS: u64 = 16;
const PLAYER: PedHandle = PedHandle(1);
const CAR: VehicleHandle = VehicleHandle(42);

fn run_frames(driver: &mut FrameDriver<SimHost>, host: &mut SimHost, frames: u64) {
    for _ in 0..frames {
        driver.tick(host);
        host.advance(FRAME_MS);
    }
}

#[test]
fn test_driver_runs_both_controllers_independently() {
    let config = Config::default();
    let mut host = SimHost::new();
    host.set_player(Some(PLAYER));
    host.set_vehicle(Some(CAR));
    host.set_engine_running(CAR, true);
    host.set_phone_open(true);

    let mut driver: FrameDriver<SimHost> = FrameDriver::from_config(&config, host.now_ms());

    host.enter_phrase(&config.repair.trigger_phrase);
    driver.key_up(&mut host, config.engine.toggle_key);
    run_frames(&mut driver, &mut host, 100);

    let snapshot = driver.snapshot();
    assert_eq!(snapshot["phone-repair"]["state"]["stage"], "Idle");
    assert_eq!(snapshot["phone-repair"]["stats"]["completed_runs"], 1);
    assert_eq!(snapshot["engine-override"]["state"], "ForceOff");
    assert_eq!(snapshot["engine-override"]["target"], 42);
    assert_eq!(snapshot["engine-override"]["stats"]["animations_played"], 1);

    assert!(host.calls().contains(&HostCall::EnableControl(Control::Phone)));
    assert!(host.calls().contains(&HostCall::SetEngineOn(CAR, false)));
}

#[test]
fn test_periodic_repair_through_driver() {
    let mut config = Config::default();
    config.repair.periodic_interval_ms = 1_000;
    let mut host = SimHost::new();
    let mut driver: FrameDriver<SimHost> = FrameDriver::from_config(&config, host.now_ms());

    // frames at t=0..=992, timer not due yet
    run_frames(&mut driver, &mut host, 63);
    assert!(!host.calls().contains(&HostCall::ClosePhone));

    run_frames(&mut driver, &mut host, 1);
    assert!(host.calls().contains(&HostCall::ClosePhone));
    assert_eq!(driver.snapshot()["phone-repair"]["next_periodic_at"], 2_000);

    // remaining 72 frames of the run
    run_frames(&mut driver, &mut host, 72);
    assert!(host.notices().is_empty());
    assert_eq!(driver.snapshot()["phone-repair"]["state"]["stage"], "Idle");
    assert_eq!(driver.snapshot()["phone-repair"]["stats"]["completed_runs"], 1);
    assert_eq!(driver.snapshot()["phone-repair"]["stats"]["periodic_runs"], 1);
}

#[test]
fn test_override_released_when_player_exits() {
    let config = Config::default();
    let mut host = SimHost::new();
    host.set_player(Some(PLAYER));
    host.set_vehicle(Some(CAR));
    let mut driver: FrameDriver<SimHost> = FrameDriver::from_config(&config, 0);

    driver.key_up(&mut host, Key::Letter('N'));
    run_frames(&mut driver, &mut host, 10);
    assert_eq!(driver.snapshot()["engine-override"]["state"], "ForceOn");

    host.set_vehicle(None);
    run_frames(&mut driver, &mut host, 1);
    assert_eq!(driver.snapshot()["engine-override"]["state"], "None");
    assert_eq!(driver.snapshot()["engine-override"]["stats"]["cancellations"], 1);

    // nothing re-asserted after release
    let before = host.count(|c| matches!(c, HostCall::SetEngineOn(..)));
    run_frames(&mut driver, &mut host, 10);
    assert_eq!(host.count(|c| matches!(c, HostCall::SetEngineOn(..))), before);
}

#[test]
fn test_custom_controller_registration() {
    struct FrameCounter(u64);

    impl FrameController<SimHost> for FrameCounter {
        fn name(&self) -> &'static str {
            "counter"
        }

        fn on_frame(&mut self, _host: &mut SimHost, _now: u64) {
            self.0 += 1;
        }

        fn snapshot(&self) -> serde_json::Value {
            serde_json::json!(self.0)
        }
    }

    let mut host = SimHost::new();
    let mut driver: FrameDriver<SimHost> = FrameDriver::new();
    driver.register(Box::new(FrameCounter(0)));
    run_frames(&mut driver, &mut host, 5);

    assert_eq!(driver.frame_count(), 5);
    assert_eq!(driver.snapshot()["counter"], 5);
}
