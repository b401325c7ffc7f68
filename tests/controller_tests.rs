//! Integration tests for the autopilot controller

use rs_autopilot::{
    AppliedHandles, Autopilot, AutopilotConfig, BrakeCharacteristic, BrakeConfig, ControlContext,
    DecelerationPattern, MotionModel, NotchCommand, VehicleSpec, VehicleState,
};

const TICK: f64 = 0.1;

fn brake() -> BrakeCharacteristic {
    let mut brake = BrakeCharacteristic::default();
    brake.configure(8, 0, 0, 1.0, 0.5, &[0.0, 0.125, 0.25, 0.375, 0.5, 0.625, 0.75, 0.875, 1.0]);
    brake
}

fn autopilot() -> Autopilot {
    let config = AutopilotConfig::default().with_brake(
        BrakeConfig::default()
            .with_max_service_deceleration(1.0)
            .with_pressure_rates(&[0.0, 0.125, 0.25, 0.375, 0.5, 0.625, 0.75, 0.875, 1.0]),
    );
    let mut autopilot = Autopilot::new(config);
    autopilot.set_vehicle_spec(VehicleSpec::default().with_brake_notches(8).with_cars(4));
    autopilot
}

/// Drive a point mass with the autopilot's commands until it stops or
/// passes `limit`. Returns the notch trace and the final model.
fn drive(
    autopilot: &mut Autopilot,
    target: &DecelerationPattern,
    start: MotionModel,
    limit: f64,
) -> (Vec<NotchCommand>, MotionModel) {
    let mut model = start;
    let mut applied = AppliedHandles::default();
    let mut trace = Vec::new();
    for _ in 0..10_000 {
        let state = VehicleState::new(model.position(), model.speed(), model.time());
        let cmd = autopilot.tick(state, applied, Some(target));
        trace.push(cmd);

        let deceleration = autopilot.brake().deceleration(f64::from(cmd.brake_notch()));
        applied = AppliedHandles::new(cmd.brake_notch(), 0);
        if model.speed() <= deceleration * TICK {
            model.advance_to_speed(0.0, -deceleration.max(1e-6));
            break;
        }
        model.advance_by_time(TICK, -deceleration, 0.0);
        if model.position() > limit {
            break;
        }
    }
    (trace, model)
}

#[test]
fn distant_stop_target_does_not_brake_yet() {
    let brake = brake();
    let pattern = DecelerationPattern::new(1000.0, 0.0, 1.0);
    let ctx = ControlContext::new(&brake);

    // 1000 m out the curve allows sqrt(2 * 1.0 * 1000) = 44.7 m/s, so at
    // 20 m/s the law asks for a negative deceleration. Powering for 1 s and
    // coasting 5 s still ends far under the curve: power stays allowed.
    assert!((pattern.expected_speed_at(0.0) - 2000f64.sqrt()).abs() < 1e-9);
    assert_eq!(pattern.compute_brake_notch(0.0, 20.0, &brake, 0.0), 0);
    let raw: i32 = pattern.output_notch(0.0, 20.0, &ctx).into();
    assert_eq!(raw, i32::MAX);
}

#[test]
fn brakes_once_above_stop_curve() {
    let brake = brake();
    let pattern = DecelerationPattern::new(1000.0, 0.0, 1.0);
    let ctx = ControlContext::new(&brake);

    // 150 m out the curve allows 17.3 m/s
    let cmd = pattern.output_notch(850.0, 20.0, &ctx);
    assert!(i32::from(cmd) < 0, "expected braking, got {cmd:?}");
}

#[test]
fn braking_notch_on_stop_approach() {
    let mut autopilot = autopilot();
    let target = DecelerationPattern::new(1000.0, 0.0, 1.0);
    let cmd = autopilot.tick(
        VehicleState::new(800.0, 20.0, 0.0),
        AppliedHandles::default(),
        Some(&target),
    );
    assert!(matches!(cmd, NotchCommand::Brake(n) if n > 0));
}

#[test]
fn notch_trends_to_zero_at_stop() {
    let brake = brake();
    let pattern = DecelerationPattern::new(1000.0, 0.0, 1.0);
    let ctx = ControlContext::new(&brake);

    // walk down the curve itself; the release clamp eases off at the end
    let mut notches = Vec::new();
    for remaining in [200.0, 50.0, 10.0, 1.0, 0.1, 0.01] {
        let position = 1000.0 - remaining;
        let speed = pattern.expected_speed_at(position);
        notches.push(pattern.compute_brake_notch(position, speed, &brake, 0.0));
    }
    assert_eq!(notches[0], 8);
    assert!(notches.windows(2).all(|w| w[1] <= w[0]), "{notches:?}");
    assert!(*notches.last().unwrap() < 8);

    let cmd = pattern.output_notch(1000.0, 0.0, &ctx);
    assert_eq!(cmd.brake_notch(), 0);
}

#[test]
fn moving_target_never_overruns_before_target() {
    let brake = brake();
    let pattern = DecelerationPattern::new(1000.0, 15.0, 0.8);
    for position in (0..1000).step_by(25) {
        let position = position as f64;
        let expected = pattern.expected_speed_at(position);
        // a little under the curve: never asked for full service
        let notch = pattern.compute_brake_notch(position, expected * 0.9, &brake, 0.0);
        assert!(notch < 8, "full service at {position}");
    }
}

#[test]
fn stops_near_target() {
    let mut autopilot = autopilot();
    let target = DecelerationPattern::new(1000.0, 0.0, 0.7);
    let (trace, model) = drive(
        &mut autopilot,
        &target,
        MotionModel::new(600.0, 20.0, 0.0),
        1100.0,
    );

    assert!(trace.iter().any(|cmd| cmd.brake_notch() > 0));
    assert_eq!(model.speed(), 0.0);
    assert!(
        (model.position() - 1000.0).abs() < 10.0,
        "stopped at {}",
        model.position()
    );
}

#[test]
fn slows_to_moving_target() {
    let mut autopilot = autopilot();
    let target = DecelerationPattern::new(1000.0, 10.0, 0.7);
    let (_, model) = drive(
        &mut autopilot,
        &target,
        MotionModel::new(500.0, 25.0, 0.0),
        1000.0,
    );

    assert!(model.position() > 1000.0);
    assert!(model.speed() <= 10.5, "passed target at {}", model.speed());
}

#[test]
fn no_single_tick_flapping() {
    let mut autopilot = autopilot();
    let target = DecelerationPattern::new(1000.0, 0.0, 0.7);
    let (trace, _) = drive(
        &mut autopilot,
        &target,
        MotionModel::new(600.0, 20.0, 0.0),
        1100.0,
    );

    let notches: Vec<u32> = trace.iter().map(NotchCommand::brake_notch).collect();
    for w in notches.windows(3) {
        let dipped = w[1] < w[0] && w[2] > w[1];
        assert!(!dipped, "brake flapped {} -> {} -> {}", w[0], w[1], w[2]);
    }
}

#[test]
fn overrun_applies_service_max() {
    let mut autopilot = autopilot();
    let target = DecelerationPattern::new(1000.0, 0.0, 1.0);
    let cmd = autopilot.tick(
        VehicleState::new(1005.0, 5.0, 0.0),
        AppliedHandles::default(),
        Some(&target),
    );
    assert_eq!(cmd, NotchCommand::Brake(8));
}

#[test]
fn uphill_grade_lets_brake_off_earlier() {
    let brake = brake();
    let pattern = DecelerationPattern::new(1000.0, 0.0, 0.5);
    let level = pattern.compute_brake_notch(900.0, 10.0, &brake, 0.0);
    let uphill = pattern.compute_brake_notch(900.0, 10.0, &brake, -0.2);
    assert!(uphill < level);
}

#[test]
fn previous_power_uses_measured_acceleration() {
    let brake = brake();
    let pattern = DecelerationPattern::new(1000.0, 0.0, 1.0);

    // a train barely accelerating can keep powering where the reference
    // acceleration would already be too much
    let powering = ControlContext::new(&brake)
        .with_previous(AppliedHandles::new(0, 3))
        .with_acceleration(0.0);
    let fresh = ControlContext::new(&brake);

    let position = 400.0;
    let speed = 27.0;
    assert_eq!(pattern.output_notch(position, speed, &fresh), NotchCommand::Neutral);
    assert_eq!(
        pattern.output_notch(position, speed, &powering),
        NotchCommand::Unrestricted
    );
}
