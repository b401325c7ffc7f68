//! Per-vehicle autopilot that ties everything together.
//!
//! This module provides [`Autopilot`], the piece the host glue talks to. It
//! owns the calibrated brake, the gradient data collected from the track
//! and the acceleration estimate, and turns each tick's vehicle state and
//! active target into a [`NotchCommand`].
//!
//! # Overview
//!
//! The autopilot:
//! - Calibrates its brake whenever the host reports the vehicle spec
//! - Collects gradient changes as the train passes track beacons
//! - Forgets gradient data once the whole train has left it behind
//! - Runs the deceleration pattern of the active target every tick
//!
//! # Example
//!
//! ```rust
//! use rs_autopilot::{
//!     AppliedHandles, Autopilot, AutopilotConfig, DecelerationPattern, VehicleSpec,
//!     VehicleState,
//! };
//!
//! let mut autopilot = Autopilot::new(AutopilotConfig::default());
//! autopilot.set_vehicle_spec(VehicleSpec::default().with_brake_notches(8).with_cars(4));
//!
//! // 10‰ downhill from 300 m on
//! autopilot.pass_gradient(-0.010, 300.0);
//!
//! // stop at 1000 m
//! let target = DecelerationPattern::new(1000.0, 0.0, 0.8);
//! let state = VehicleState::new(0.0, 20.0, 0.0);
//! let cmd = autopilot.tick(state, AppliedHandles::default(), Some(&target));
//! assert!(cmd.brake_notch() <= 8);
//! ```

use crate::accelerometer::Accelerometer;
use crate::braking::BrakeCharacteristic;
use crate::config::{AutopilotConfig, VehicleSpec};
use crate::gradient::GradientGraph;
use crate::motion::MotionModel;
use crate::pattern::{AppliedHandles, ControlContext, DecelerationPattern, NotchCommand};
use crate::span::Span;

/// Vehicle state reported by the host each tick.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleState {
    /// Position of the front of the train (m).
    pub position: f64,
    /// Speed (m/s).
    pub speed: f64,
    /// Simulation time (s).
    pub time: f64,
}

impl VehicleState {
    /// Create a state.
    pub fn new(position: f64, speed: f64, time: f64) -> Self {
        Self {
            position,
            speed,
            time,
        }
    }

    /// The state as a motion model, ready for projections.
    pub fn motion(&self) -> MotionModel {
        MotionModel::new(self.position, self.speed, self.time)
    }
}

/// Automatic train operation for one vehicle.
///
/// Not thread-safe; the host calls it strictly serially.
#[derive(Clone, Debug)]
pub struct Autopilot {
    config: AutopilotConfig,
    spec: VehicleSpec,
    brake: BrakeCharacteristic,
    gradient: GradientGraph,
    accelerometer: Accelerometer,
    state: VehicleState,
}

impl Autopilot {
    /// Create an autopilot for the default vehicle spec.
    pub fn new(config: AutopilotConfig) -> Self {
        let mut autopilot = Self {
            config,
            spec: VehicleSpec::default(),
            brake: BrakeCharacteristic::default(),
            gradient: GradientGraph::new(),
            accelerometer: Accelerometer::new(),
            state: VehicleState::default(),
        };
        autopilot.calibrate();
        autopilot
    }

    /// Apply the vehicle spec reported by the host and recalibrate the brake.
    ///
    /// Problems with the configuration are logged and calibration goes ahead
    /// with a repaired curve and default values for unusable brake settings.
    pub fn set_vehicle_spec(&mut self, spec: VehicleSpec) {
        self.spec = spec;
        self.calibrate();
    }

    fn calibrate(&mut self) {
        if let Err(e) = self.config.validate(&self.spec) {
            log::warn!("autopilot configuration: {e}");
        }

        let brake = self.config.brake.repaired();
        self.brake.configure(
            self.spec.brake_notches,
            brake.disabled_notches,
            brake.extended_notches,
            brake.max_service_deceleration,
            brake.release_time,
            &brake.pressure_rates,
        );
    }

    /// Forget everything learned from the track and the previous ticks.
    pub fn reset(&mut self) {
        self.gradient.clear();
        self.accelerometer.reset();
        self.state = VehicleState::default();
    }

    /// Record a gradient change reported by a track beacon.
    pub fn pass_gradient(&mut self, grade: f64, position: f64) {
        self.gradient.insert_segment(position, grade);
    }

    /// Run one control tick.
    ///
    /// `applied` are the handles the host actually applied on the previous
    /// tick. Without a target the autopilot places no restriction.
    pub fn tick(
        &mut self,
        state: VehicleState,
        applied: AppliedHandles,
        target: Option<&DecelerationPattern>,
    ) -> NotchCommand {
        self.accelerometer.update(state.time, state.speed);
        self.state = state;
        let rear = state.position - self.train_length();
        self.gradient.advance_past(rear);

        let Some(target) = target else {
            return NotchCommand::Unrestricted;
        };

        target.output_notch(state.position, state.speed, &self.context(applied))
    }

    /// Run one tick against several targets and keep the most restrictive
    /// command.
    pub fn tick_all<'p>(
        &mut self,
        state: VehicleState,
        applied: AppliedHandles,
        targets: impl IntoIterator<Item = &'p DecelerationPattern>,
    ) -> NotchCommand {
        let mut command = self.tick(state, applied, None);
        let ctx = self.context(applied);
        for target in targets {
            let cmd = target.output_notch(state.position, state.speed, &ctx);
            command = command.most_restrictive(cmd);
        }
        command
    }

    fn context(&self, applied: AppliedHandles) -> ControlContext<'_> {
        ControlContext::new(&self.brake)
            .with_previous(applied)
            .with_acceleration(self.accelerometer.acceleration())
            .with_gradient_acceleration(self.vehicle_gradient_acceleration())
    }

    /// Span of track the train occupies.
    pub fn occupied_span(&self) -> Span {
        Span::new(self.state.position - self.train_length(), self.state.position)
    }

    /// Gradient acceleration averaged over the train (m/s², positive downhill).
    pub fn vehicle_gradient_acceleration(&self) -> f64 {
        self.gradient.acceleration_over_range(self.occupied_span())
    }

    /// Mean gradient acceleration between the train front and `target_position`.
    pub fn route_gradient_acceleration(&self, target_position: f64) -> f64 {
        self.gradient
            .acceleration_over_range(Span::new(self.state.position, target_position))
    }

    /// Total train length (m).
    pub fn train_length(&self) -> f64 {
        self.config.train_length(&self.spec)
    }

    /// Estimated acceleration (m/s²).
    pub fn acceleration(&self) -> f64 {
        self.accelerometer.acceleration()
    }

    /// Calibrated brake.
    pub fn brake(&self) -> &BrakeCharacteristic {
        &self.brake
    }

    /// Collected gradient data.
    pub fn gradient(&self) -> &GradientGraph {
        &self.gradient
    }

    /// Current vehicle spec.
    pub fn vehicle_spec(&self) -> &VehicleSpec {
        &self.spec
    }

    /// Current configuration.
    pub fn config(&self) -> &AutopilotConfig {
        &self.config
    }

    /// Last reported vehicle state.
    pub fn state(&self) -> VehicleState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrakeConfig;

    fn autopilot() -> Autopilot {
        let config = AutopilotConfig::default()
            .with_car_length(20.0)
            .with_brake(BrakeConfig::default().with_max_service_deceleration(1.0));
        let mut autopilot = Autopilot::new(config);
        autopilot.set_vehicle_spec(VehicleSpec::default().with_brake_notches(8).with_cars(5));
        autopilot
    }

    #[test]
    fn calibrates_from_spec() {
        let autopilot = autopilot();
        assert_eq!(autopilot.brake().standard_notch_count(), 8);
        assert_eq!(autopilot.brake().standard_curve().len(), 9);
        assert_eq!(autopilot.train_length(), 100.0);
    }

    #[test]
    fn no_target_is_unrestricted() {
        let mut autopilot = autopilot();
        let cmd = autopilot.tick(VehicleState::new(0.0, 10.0, 0.0), AppliedHandles::default(), None);
        assert_eq!(cmd, NotchCommand::Unrestricted);
    }

    #[test]
    fn gradient_averaged_over_train() {
        let mut autopilot = autopilot();
        autopilot.pass_gradient(0.01, 550.0);
        autopilot.tick(VehicleState::new(600.0, 10.0, 0.0), AppliedHandles::default(), None);
        // half of the 100 m train is on the slope
        let expected = crate::GradientSegment::new(0.01).influence_acceleration / 2.0;
        assert!((autopilot.vehicle_gradient_acceleration() - expected).abs() < 1e-12);
    }

    #[test]
    fn route_gradient_ahead_of_train() {
        let mut autopilot = autopilot();
        autopilot.pass_gradient(0.01, 550.0);
        autopilot.pass_gradient(0.0, 650.0);
        autopilot.tick(VehicleState::new(600.0, 10.0, 0.0), AppliedHandles::default(), None);
        // 50 of the 100 m up to the target are on the slope
        let expected = crate::GradientSegment::new(0.01).influence_acceleration / 2.0;
        assert!((autopilot.route_gradient_acceleration(700.0) - expected).abs() < 1e-12);
        assert_eq!(autopilot.route_gradient_acceleration(600.0), 0.0);
    }

    #[test]
    fn gradient_pruned_behind_train() {
        let mut autopilot = autopilot();
        autopilot.pass_gradient(0.01, 100.0);
        autopilot.pass_gradient(-0.01, 200.0);
        autopilot.pass_gradient(0.02, 300.0);
        autopilot.tick(VehicleState::new(350.0, 10.0, 0.0), AppliedHandles::default(), None);
        // rear of the train is at 250 m
        let starts: alloc::vec::Vec<f64> = autopilot.gradient().segments().map(|(s, _)| s).collect();
        assert_eq!(starts, [200.0, 300.0]);
    }

    #[test]
    fn reset_clears_track_data() {
        let mut autopilot = autopilot();
        autopilot.pass_gradient(0.01, 100.0);
        autopilot.tick(VehicleState::new(0.0, 10.0, 0.0), AppliedHandles::default(), None);
        autopilot.tick(VehicleState::new(1.0, 11.0, 1.0), AppliedHandles::default(), None);
        autopilot.reset();
        assert!(autopilot.gradient().is_empty());
        assert_eq!(autopilot.acceleration(), 0.0);
    }

    #[test]
    fn tick_all_takes_strongest() {
        let mut autopilot = autopilot();
        let far = DecelerationPattern::new(10_000.0, 0.0, 1.0);
        let near = DecelerationPattern::new(150.0, 0.0, 1.0);
        let state = VehicleState::new(0.0, 20.0, 0.0);

        let only_far = autopilot.tick(state, AppliedHandles::default(), Some(&far));
        assert_eq!(only_far, NotchCommand::Unrestricted);

        let both = autopilot.tick_all(state, AppliedHandles::default(), [&far, &near]);
        assert!(matches!(both, NotchCommand::Brake(_)));
    }
}
