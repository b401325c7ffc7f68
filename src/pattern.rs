//! Braking toward a position/speed target.
//!
//! A [`DecelerationPattern`] is one active restriction: reach
//! `target_position` at no more than `target_speed`, planning with
//! `target_deceleration`. Each tick the controller projects the ideal
//! speed curve backwards from the target, compares the train against it,
//! and picks a brake notch that pulls the train onto the curve.
//!
//! Nothing is carried between ticks except what the caller passes back in
//! (the pattern itself and the previously applied [`AppliedHandles`]), so
//! the pattern is a plain `Copy` value.
//!
//! # Output
//!
//! [`DecelerationPattern::output_notch`] returns a [`NotchCommand`]:
//!
//! | Command | Raw | Meaning |
//! |---------|-----|---------|
//! | `Brake(n)` | `-n` | Apply brake notch `n` |
//! | `Neutral` | `0` | No brake, but do not power either |
//! | `Unrestricted` | `i32::MAX` | This target does not limit power |
//!
//! # Example
//!
//! ```rust
//! use rs_autopilot::{
//!     AppliedHandles, BrakeCharacteristic, ControlContext, DecelerationPattern, NotchCommand,
//! };
//!
//! let mut brake = BrakeCharacteristic::default();
//! brake.configure(8, 0, 0, 1.0, 0.5, &[]);
//!
//! // stop at 1000 m, planning with 1 m/s²
//! let pattern = DecelerationPattern::new(1000.0, 0.0, 1.0);
//! let ctx = ControlContext::new(&brake);
//!
//! // 500 m out the curve allows about 31.6 m/s; at 30 m/s a light brake
//! // keeps the train on it
//! let cmd = pattern.output_notch(500.0, 30.0, &ctx);
//! assert!(matches!(cmd, NotchCommand::Brake(_)));
//! ```

use num_traits::Float;

use crate::braking::BrakeCharacteristic;
use crate::motion::MotionModel;
use crate::units::mps2_from_kmphps;

/// Time over which a speed error is corrected (s).
const CORRECTION_TIME: f64 = 2.0;

/// Length of the softened final approach toward a moving target (s).
const EASING_TIME: f64 = 5.0;

/// Divisor turning the excess speed into the hysteresis grace period.
const GRACE_DIVISOR: f64 = 8.0;

/// First leg of the power check: how long power is assumed to keep acting (s).
const POWER_LOOKAHEAD_TIME: f64 = 1.0;

/// Second leg of the power check: coasting on the gradient afterwards (s).
const COAST_LOOKAHEAD_TIME: f64 = 5.0;

/// Acceleration assumed for a fresh power application (m/s²).
fn reference_power_acceleration() -> f64 {
    mps2_from_kmphps(5.0)
}

// ============================================================================
// Commands
// ============================================================================

/// Notch command for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NotchCommand {
    /// Apply this brake notch (always > 0).
    Brake(u32),
    /// Neither brake nor power.
    Neutral,
    /// No limit on power from this target.
    Unrestricted,
}

impl NotchCommand {
    /// Sentinel raw value for [`Unrestricted`](Self::Unrestricted).
    pub const UNRESTRICTED: i32 = i32::MAX;

    /// Parse the host's signed representation.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::UNRESTRICTED => Self::Unrestricted,
            r if r < 0 => Self::Brake(r.unsigned_abs()),
            _ => Self::Neutral,
        }
    }

    /// Brake notch requested, 0 unless braking.
    pub fn brake_notch(&self) -> u32 {
        match self {
            Self::Brake(n) => *n,
            _ => 0,
        }
    }

    /// Whether power is allowed.
    pub fn allows_power(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    /// The stronger (more restrictive) of two commands.
    pub fn most_restrictive(self, other: Self) -> Self {
        match (self, other) {
            (Self::Brake(a), Self::Brake(b)) => Self::Brake(a.max(b)),
            (Self::Brake(a), _) | (_, Self::Brake(a)) => Self::Brake(a),
            (Self::Neutral, _) | (_, Self::Neutral) => Self::Neutral,
            _ => Self::Unrestricted,
        }
    }
}

impl From<NotchCommand> for i32 {
    fn from(cmd: NotchCommand) -> Self {
        match cmd {
            NotchCommand::Brake(n) => -(i32::try_from(n).unwrap_or(i32::MAX)),
            NotchCommand::Neutral => 0,
            NotchCommand::Unrestricted => NotchCommand::UNRESTRICTED,
        }
    }
}

/// Handle positions applied on the previous tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppliedHandles {
    /// Brake notch (0 = released).
    pub brake: u32,
    /// Power notch (0 = off).
    pub power: u32,
}

impl AppliedHandles {
    /// Create from brake and power notches.
    pub fn new(brake: u32, power: u32) -> Self {
        Self { brake, power }
    }
}

/// Vehicle state the controller reads each tick.
#[derive(Clone, Copy, Debug)]
pub struct ControlContext<'a> {
    /// Calibrated brake.
    pub brake: &'a BrakeCharacteristic,
    /// Handles applied on the previous tick.
    pub previous: AppliedHandles,
    /// Measured acceleration (m/s²).
    pub acceleration: f64,
    /// Gradient acceleration acting on the train (m/s², positive downhill).
    pub gradient_acceleration: f64,
}

impl<'a> ControlContext<'a> {
    /// Context on level track with nothing applied and no acceleration.
    pub fn new(brake: &'a BrakeCharacteristic) -> Self {
        Self {
            brake,
            previous: AppliedHandles::default(),
            acceleration: 0.0,
            gradient_acceleration: 0.0,
        }
    }

    /// Set the previously applied handles
    pub fn with_previous(mut self, previous: AppliedHandles) -> Self {
        self.previous = previous;
        self
    }

    /// Set the measured acceleration
    pub fn with_acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Set the gradient acceleration
    pub fn with_gradient_acceleration(mut self, acceleration: f64) -> Self {
        self.gradient_acceleration = acceleration;
        self
    }
}

// ============================================================================
// Pattern
// ============================================================================

/// One active speed restriction and the control law anchored on it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecelerationPattern {
    /// Position the restriction starts at (m).
    pub target_position: f64,
    /// Speed allowed from `target_position` on (m/s).
    pub target_speed: f64,
    /// Deceleration to plan with (m/s², positive).
    pub target_deceleration: f64,
}

impl DecelerationPattern {
    /// Create a pattern.
    pub fn new(target_position: f64, target_speed: f64, target_deceleration: f64) -> Self {
        Self {
            target_position,
            target_speed,
            target_deceleration,
        }
    }

    /// Speed on the plain constant-deceleration curve at `position`.
    pub fn expected_speed_at(&self, position: f64) -> f64 {
        if position >= self.target_position {
            return self.target_speed;
        }

        let mut model = MotionModel::new(self.target_position, self.target_speed, 0.0);
        model.advance_to_position(position, -self.target_deceleration, false);
        model.speed()
    }

    /// Speed and deceleration of the planned curve at `position`.
    ///
    /// For a target above standstill the last [`EASING_TIME`] seconds before
    /// the target use half the deceleration, so the train rolls onto the new
    /// speed instead of arriving hard. Stop targets do not ease; easing there
    /// tends to stop short.
    pub fn expected_speed_and_deceleration(&self, position: f64) -> (f64, f64) {
        if position >= self.target_position {
            return (self.target_speed, 0.0);
        }

        let mut model = MotionModel::new(self.target_position, self.target_speed, 0.0);
        let mut deceleration = self.target_deceleration / 2.0;
        if self.target_speed > 0.0 {
            model.advance_by_time(-EASING_TIME, -deceleration, 0.0);
        }

        if model.position() <= position {
            // inside the eased approach
            model.reset(self.target_position, self.target_speed, 0.0);
        } else {
            deceleration = self.target_deceleration;
        }
        model.advance_to_position(position, -deceleration, false);

        (model.speed(), deceleration)
    }

    /// Brake notch needed at this position and speed, in `0..=service max`.
    pub fn compute_brake_notch(
        &self,
        position: f64,
        speed: f64,
        brake: &BrakeCharacteristic,
        gradient_acceleration: f64,
    ) -> u32 {
        let service_max = brake.standard_notch_count() as f64;
        let (expected_speed, expected_deceleration) =
            self.expected_speed_and_deceleration(position);

        let notch = if self.target_position - position >= 0.0 {
            // Close the speed error over CORRECTION_TIME. The curve's own
            // deceleration scales with how fast we actually are relative to it.
            let deceleration = expected_deceleration * (speed / expected_speed)
                - (expected_speed - speed) / CORRECTION_TIME;

            let notch = brake.notch(deceleration + gradient_acceleration);
            if deceleration < expected_deceleration {
                Float::floor(notch)
            } else {
                Float::round(notch)
            }
        } else {
            // overrun
            service_max
        };

        // ease off near the target speed so the release does not jolt
        let release = Float::ceil(brake.notch(
            (speed - self.target_speed) / brake.release_time() + gradient_acceleration,
        ));
        let notch = notch.min(release);

        // `as` saturates and maps NaN to 0
        let notch = notch as i64;
        if notch <= brake.disabled_notch_count() as i64 {
            0
        } else if notch > brake.standard_notch_count() as i64 {
            brake.standard_notch_count() as u32
        } else {
            notch as u32
        }
    }

    /// Final command for this tick.
    ///
    /// On top of [`compute_brake_notch`](Self::compute_brake_notch) this holds
    /// a stronger previous brake while the weaker one would need to be
    /// strengthened again shortly, and withholds power when the train would
    /// need braking soon after powering.
    pub fn output_notch(&self, position: f64, speed: f64, ctx: &ControlContext<'_>) -> NotchCommand {
        let gradient = ctx.gradient_acceleration;
        let brake = ctx.brake;
        let mut notch = self.compute_brake_notch(position, speed, brake, gradient);

        let expected_deceleration = self.expected_speed_and_deceleration(position).1;
        let baseline_speed = self.target_speed + brake.release_time() * expected_deceleration;
        if notch < ctx.previous.brake && speed > baseline_speed && expected_deceleration > 0.0 {
            let grace = (speed - baseline_speed) / expected_deceleration / GRACE_DIVISOR;
            let deceleration = brake.deceleration(f64::from(notch)) - gradient;

            let mut model = MotionModel::new(position, speed, 0.0);
            model.advance_by_time(grace, -deceleration, 0.0);
            let later = self.compute_brake_notch(model.position(), model.speed(), brake, gradient);

            let held = notch.max(later.min(ctx.previous.brake));
            if held != notch {
                log::debug!("holding brake {held} instead of {notch} for {grace:.2}s");
            }
            notch = held;
        }

        if notch > 0 {
            return NotchCommand::Brake(notch);
        }

        let power_acceleration = if ctx.previous.power > 0 {
            ctx.acceleration
        } else {
            reference_power_acceleration()
        };
        let mut model = MotionModel::new(position, speed, 0.0);
        model.advance_by_time(POWER_LOOKAHEAD_TIME, power_acceleration, 0.0);
        model.advance_by_time(COAST_LOOKAHEAD_TIME, gradient.max(0.0), 0.0);
        if self.compute_brake_notch(model.position(), model.speed(), brake, gradient) > 0 {
            log::debug!("power withheld approaching target at {}", self.target_position);
            return NotchCommand::Neutral;
        }
        NotchCommand::Unrestricted
    }
}
