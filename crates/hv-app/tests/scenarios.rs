mod common;

use std::time::Duration;

use common::{harness, set_average};
use hv_controls::{FanSpeed, Mode, Relay, RunState, SequenceKind};

#[tokio::test(start_paused = true)]
async fn rising_temperature_starts_then_stops_cooling() {
    let mut h = harness();
    set_average(&h.shared, 73.0);
    h.commands.enable();

    assert_eq!(h.engine.cycle().next, RunState::Idle);
    for temp in [73.0, 74.5, 76.0, 77.9] {
        set_average(&h.shared, temp);
        let report = h.engine.cycle();
        assert_eq!(report.next, RunState::Idle, "at {temp}");
        assert!(report.launched.is_none());
    }

    set_average(&h.shared, 78.2);
    let report = h.engine.cycle();
    assert_eq!(report.previous, RunState::Idle);
    assert_eq!(report.next, RunState::Transition);
    assert_eq!(report.launched, Some(SequenceKind::StartCooling));

    h.engine.settle().await;
    assert_eq!(h.shared.snapshot().run_state(), RunState::Cooling);
    assert!(h.relays.energized().contains(&Relay::Cooling));

    for temp in [77.0, 76.0, 75.5] {
        set_average(&h.shared, temp);
        assert_eq!(h.engine.cycle().next, RunState::Cooling, "at {temp}");
    }

    set_average(&h.shared, 75.1);
    let report = h.engine.cycle();
    assert_eq!(report.next, RunState::Transition);
    assert_eq!(report.launched, Some(SequenceKind::StopCooling));

    h.engine.settle().await;
    assert_eq!(h.shared.snapshot().run_state(), RunState::Shutdown);
    assert!(h.relays.energized().is_empty());

    assert_eq!(h.engine.cycle().next, RunState::Idle);
}

#[tokio::test(start_paused = true)]
async fn cooling_stops_when_crossing_below_setpoint() {
    let mut h = harness();
    set_average(&h.shared, 79.0);
    h.commands.set_mode(Mode::Cool);
    h.commands.enable();
    h.engine.cycle();
    h.engine.cycle();
    h.engine.settle().await;
    assert_eq!(h.shared.snapshot().run_state(), RunState::Cooling);

    set_average(&h.shared, 74.0);
    let report = h.engine.cycle();
    assert_eq!(report.launched, Some(SequenceKind::StopCooling));
}

#[tokio::test(start_paused = true)]
async fn cooling_relay_waits_for_fan_lead_in() {
    let mut h = harness();
    set_average(&h.shared, 80.0);
    h.commands.enable();
    h.engine.cycle();
    h.engine.cycle();
    h.engine.settle().await;

    let fan_on = h.relays.first_on(Relay::FanLow).unwrap();
    let cooling_on = h.relays.first_on(Relay::Cooling).unwrap();
    assert!(cooling_on.duration_since(fan_on) >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn auto_fan_uses_high_speed_far_from_setpoint() {
    let mut h = harness();
    set_average(&h.shared, 83.0);
    h.commands.set_fan_speed(FanSpeed::Auto);
    h.commands.enable();
    h.engine.cycle();
    h.engine.cycle();
    h.engine.settle().await;
    assert!(h.relays.energized().contains(&Relay::FanHigh));

    // The stop sequence releases the same fan.
    set_average(&h.shared, 75.0);
    h.engine.cycle();
    h.engine.settle().await;
    assert!(h.relays.energized().is_empty());
}

#[tokio::test(start_paused = true)]
async fn disable_while_heating_runs_stop_sequence() {
    let mut h = harness();
    set_average(&h.shared, 70.0);
    h.commands.enable();
    h.engine.cycle();
    assert_eq!(h.engine.cycle().launched, Some(SequenceKind::StartHeating));
    h.engine.settle().await;
    assert_eq!(h.shared.snapshot().run_state(), RunState::Heating);

    h.commands.disable();
    let report = h.engine.cycle();
    assert_eq!(report.previous, RunState::Heating);
    assert_eq!(report.next, RunState::Transition);
    assert_eq!(report.launched, Some(SequenceKind::StopHeating));

    h.engine.settle().await;
    assert_eq!(h.shared.snapshot().run_state(), RunState::Shutdown);
    assert_eq!(h.engine.cycle().next, RunState::Idle);
    assert_eq!(h.engine.cycle().next, RunState::Disabled);

    assert_eq!(h.relays.attempts(Relay::Heating, false), 1);
    assert!(h.relays.energized().is_empty());
}

#[tokio::test(start_paused = true)]
async fn relay_failure_holds_transition_without_retry() {
    let mut h = harness();
    h.relays.fail_on(Relay::Cooling);
    set_average(&h.shared, 78.2);
    h.commands.enable();
    h.engine.cycle();
    assert_eq!(h.engine.cycle().launched, Some(SequenceKind::StartCooling));

    h.engine.settle().await;
    let snapshot = h.shared.snapshot();
    assert_eq!(snapshot.run_state(), RunState::Transition);
    let fault = snapshot.fault().unwrap();
    assert_eq!(fault.sequence, SequenceKind::StartCooling);
    assert!(h.engine.in_flight().is_none());

    for _ in 0..20 {
        tokio::time::advance(Duration::from_secs(3)).await;
        let report = h.engine.cycle();
        assert_eq!(report.next, RunState::Transition);
        assert!(report.launched.is_none());
        assert!(report.status.fault.is_some());
    }
    assert_eq!(h.relays.attempts(Relay::Cooling, true), 1);
}

#[tokio::test(start_paused = true)]
async fn no_second_sequence_while_one_is_in_flight() {
    let mut h = harness();
    set_average(&h.shared, 80.0);
    h.commands.enable();
    h.engine.cycle();
    h.engine.cycle();
    assert_eq!(h.engine.in_flight(), Some(SequenceKind::StartCooling));

    // Mode flip mid lead-in must not launch anything until the sequence lands.
    h.commands.set_mode(Mode::Heat);
    for _ in 0..5 {
        assert!(h.engine.cycle().launched.is_none());
    }
    h.engine.settle().await;
    assert_eq!(h.shared.snapshot().run_state(), RunState::Cooling);

    assert_eq!(h.engine.cycle().launched, Some(SequenceKind::StopCooling));
}

#[tokio::test(start_paused = true)]
async fn fan_only_mode_runs_fan_without_loads() {
    let mut h = harness();
    set_average(&h.shared, 75.0);
    h.commands.set_mode_code(3);
    h.commands.enable();
    h.engine.cycle();
    assert_eq!(h.engine.cycle().launched, Some(SequenceKind::StartFan));
    h.engine.settle().await;
    assert_eq!(h.shared.snapshot().run_state(), RunState::FanOnly);
    assert_eq!(h.relays.energized(), vec![Relay::FanLow]);

    h.commands.set_mode(Mode::Auto);
    assert_eq!(h.engine.cycle().launched, Some(SequenceKind::StopFan));
    h.engine.settle().await;
    assert!(h.relays.energized().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_aborts_sequence_and_releases_relays() {
    let mut h = harness();
    set_average(&h.shared, 80.0);
    h.commands.enable();
    h.engine.cycle();
    h.engine.cycle();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(h.relays.energized().contains(&Relay::FanLow));

    h.engine.shutdown();
    assert!(h.engine.in_flight().is_none());
    assert!(h.engine.relays().energized().is_empty());
    assert!(h.relays.energized().is_empty());

    // Aborted mid lead-in: the compressor never came on.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.relays.attempts(Relay::Cooling, true), 0);
}

#[tokio::test(start_paused = true)]
async fn status_reports_estimate_and_rounding() {
    let mut h = harness();
    set_average(&h.shared, 78.04);
    h.commands.enable();
    let report = h.engine.cycle();
    assert_eq!(report.status.current_temp, Some(78.0));
    // First estimate uses the nominal rate: 3.04° at 0.1°/s.
    let eta = report.status.time_to_target_min.unwrap();
    assert!((eta - 3.04 / 0.1 / 60.0).abs() < 1e-6);
}
