//! Point-mass kinematics for projecting train trajectories.
//!
//! [`MotionModel`] is a small `Copy` value holding position, speed and time.
//! Every projection the controller makes starts from a fresh model (usually
//! the current vehicle state or a target anchor) and advances it under a
//! constant acceleration or a constant jerk, forwards or backwards in time.
//!
//! Operations that aim for an exact end value (`advance_to_*`) re-pin that
//! value after integrating so floating error never leaks into the result.
//!
//! # Example
//!
//! ```rust
//! use rs_autopilot::MotionModel;
//!
//! // 20 m/s, braking at 1 m/s² until stopped
//! let mut model = MotionModel::new(0.0, 20.0, 0.0);
//! model.advance_to_speed(0.0, -1.0);
//! assert!((model.position() - 200.0).abs() < 1e-9);
//! assert!((model.time() - 20.0).abs() < 1e-9);
//! ```

use num_traits::Float;

/// Number of refinement rounds used by the jerk-based inverse solves.
const JERK_SOLVE_ITERATIONS: usize = 10;

/// Kinematic state of a point mass: position (m), speed (m/s), time (s).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionModel {
    position: f64,
    speed: f64,
    time: f64,
}

impl MotionModel {
    /// Create a model at the given position, speed and time.
    pub fn new(position: f64, speed: f64, time: f64) -> Self {
        Self {
            position,
            speed,
            time,
        }
    }

    /// Re-anchor this model in place.
    pub fn reset(&mut self, position: f64, speed: f64, time: f64) {
        *self = Self::new(position, speed, time);
    }

    /// Position in metres.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Speed in m/s.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advance by `dt` seconds with acceleration starting at `a0` and
    /// changing at `jerk` m/s³.
    ///
    /// `dt` may be negative to project backwards. Returns the acceleration
    /// reached at the end of the interval.
    pub fn advance_by_time(&mut self, dt: f64, a0: f64, jerk: f64) -> f64 {
        self.position += dt * (self.speed + dt * (a0 + dt * jerk / 3.0) / 2.0);
        self.speed += dt * (a0 + dt * jerk / 2.0);
        self.time += dt;
        a0 + dt * jerk
    }

    /// Advance until the clock reads exactly `time`.
    pub fn advance_to_time(&mut self, time: f64, a0: f64, jerk: f64) -> f64 {
        let a1 = self.advance_by_time(time - self.time, a0, jerk);
        self.time = time;
        a1
    }

    /// Advance by `distance` metres at constant acceleration `a`.
    ///
    /// The new speed follows `v'² = v² + 2·a·d`. When the train would stop
    /// before covering `distance` the speed clamps to zero. With `reverse`
    /// the negative root is taken, i.e. the state arrives moving backwards.
    pub fn advance_by_distance(&mut self, distance: f64, a: f64, reverse: bool) {
        if distance == 0.0 {
            return;
        }
        if a == 0.0 {
            self.time += distance / self.speed;
            self.position += distance;
            return;
        }

        let mut new_speed = Float::sqrt(self.speed * self.speed + 2.0 * distance * a);
        if !(new_speed >= 0.0) {
            new_speed = 0.0;
        }
        if reverse {
            new_speed = -new_speed;
        }
        self.time += (new_speed - self.speed) / a;
        self.speed = new_speed;
        self.position += distance;
    }

    /// Advance at constant acceleration until the position is exactly `position`.
    pub fn advance_to_position(&mut self, position: f64, a: f64, reverse: bool) {
        self.advance_by_distance(position - self.position, a, reverse);
        self.position = position;
    }

    /// Advance under constant jerk until the position is exactly `position`.
    ///
    /// The position equation is cubic in time, so instead of a closed form this
    /// runs a fixed number of fixed-point rounds: reach `position` at the trial
    /// acceleration, read the arrival time, then recompute the acceleration at
    /// that time from the starting state under the real jerk. Which root is
    /// reached when several exist is not specified. Returns the final
    /// acceleration.
    pub fn advance_to_position_with_jerk(&mut self, position: f64, a0: f64, jerk: f64) -> f64 {
        let mut scratch = *self;
        let mut a = a0;
        for _ in 0..JERK_SOLVE_ITERATIONS {
            scratch.advance_to_position(position, a, false);
            let arrival = scratch.time();
            scratch = *self;
            a = scratch.advance_to_time(arrival, a0, jerk);
        }

        *self = scratch;
        self.position = position;
        a
    }

    /// Advance under constant jerk until acceleration goes from `a0` to `a1`.
    pub fn advance_through_jerk_to_acceleration(&mut self, a0: f64, a1: f64, jerk: f64) {
        let dt = (a1 - a0) / jerk;
        self.advance_by_time(dt, a0, jerk);
    }

    /// Advance at constant acceleration until the speed is exactly `speed`.
    pub fn advance_to_speed(&mut self, speed: f64, a: f64) {
        if speed == self.speed {
            return;
        }
        self.advance_by_time((speed - self.speed) / a, a, 0.0);
        self.speed = speed;
    }

    /// Advance under constant jerk until the speed is exactly `speed`.
    ///
    /// Solved by treating speed as a position and acceleration as a speed in a
    /// nested model, which reduces to [`advance_by_distance`] with jerk playing
    /// the part of acceleration. `decelerating` selects the root where the
    /// acceleration is negative on arrival. Returns the final acceleration.
    ///
    /// [`advance_by_distance`]: Self::advance_by_distance
    pub fn advance_to_speed_with_jerk(
        &mut self,
        speed: f64,
        a0: f64,
        jerk: f64,
        decelerating: bool,
    ) -> f64 {
        let mut speed_model = MotionModel::new(self.speed, a0, self.time);
        speed_model.advance_to_position(speed, jerk, decelerating);
        self.advance_to_time(speed_model.time(), a0, jerk);
        self.speed = speed;
        speed_model.speed()
    }
}

/// Constant acceleration that takes speed from `v0` to `v1` over `distance`.
pub fn acceleration_from_distance_and_speeds(distance: f64, v0: f64, v1: f64) -> f64 {
    (v1 * v1 - v0 * v0) / distance / 2.0
}
