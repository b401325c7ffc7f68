//! Station approach on a point-mass train.
//!
//! Runs the autopilot against a crude simulation: the brake acts instantly,
//! power gives a flat 2.5 km/h/s and the track has a downhill stretch before
//! the platform. Prints one line per simulated second.
//!
//! ```sh
//! cargo run --example approach
//! ```

use rs_autopilot::{
    units, AppliedHandles, Autopilot, AutopilotConfig, BrakeConfig, DecelerationPattern,
    MotionModel, NotchCommand, VehicleSpec, VehicleState,
};

const TICK: f64 = 0.1;
const STOP_POSITION: f64 = 1500.0;

fn main() -> anyhow::Result<()> {
    let spec = VehicleSpec::default()
        .with_brake_notches(8)
        .with_power_notches(5)
        .with_cars(6);
    let config = AutopilotConfig::default().with_brake(
        BrakeConfig::default()
            .with_max_service_deceleration(units::mps2_from_kmphps(3.5))
            .with_pressure_rates(&[0.0, 0.14, 0.26, 0.38, 0.5, 0.62, 0.75, 0.87, 1.0]),
    );
    config.validate(&spec)?;

    let mut autopilot = Autopilot::new(config);
    autopilot.set_vehicle_spec(spec);
    autopilot.pass_gradient(-0.012, 600.0);
    autopilot.pass_gradient(0.0, 1200.0);

    let target =
        DecelerationPattern::new(STOP_POSITION, 0.0, units::mps2_from_kmphps(2.5));
    let power = units::mps2_from_kmphps(2.5);

    let mut model = MotionModel::new(0.0, units::mps_from_kmph(60.0), 0.0);
    let mut applied = AppliedHandles::default();
    let mut next_report = 0.0;

    loop {
        let state = VehicleState::new(model.position(), model.speed(), model.time());
        let cmd = autopilot.tick(state, applied, Some(&target));

        let gradient = autopilot.vehicle_gradient_acceleration();
        let acceleration = match cmd {
            NotchCommand::Brake(n) => -autopilot.brake().deceleration(f64::from(n)),
            NotchCommand::Neutral => 0.0,
            NotchCommand::Unrestricted if model.speed() < units::mps_from_kmph(80.0) => power,
            NotchCommand::Unrestricted => 0.0,
        } + gradient;
        applied = match cmd {
            NotchCommand::Brake(n) => AppliedHandles::new(n, 0),
            NotchCommand::Unrestricted if acceleration > gradient => AppliedHandles::new(0, 5),
            _ => AppliedHandles::default(),
        };

        if model.time() >= next_report {
            println!(
                "t={:6.1}s  x={:7.1}m  v={:5.1}km/h  cmd={:>11}  raw={}",
                model.time(),
                model.position(),
                units::kmph_from_mps(model.speed()),
                format!("{cmd:?}"),
                i32::from(cmd),
            );
            next_report += 1.0;
        }

        if acceleration < 0.0 && model.speed() <= -acceleration * TICK {
            model.advance_to_speed(0.0, acceleration);
            break;
        }
        model.advance_by_time(TICK, acceleration, 0.0);
        if model.time() > 600.0 {
            anyhow::bail!("train did not stop");
        }
    }

    println!(
        "stopped at {:.2} m ({:+.2} m from the mark) after {:.1} s",
        model.position(),
        model.position() - STOP_POSITION,
        model.time()
    );
    Ok(())
}
