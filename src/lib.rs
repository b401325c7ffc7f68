//! # rs-autopilot
//!
//! Automatic train operation core for train-simulator plugins. Given the
//! train's position, speed and time each tick, it picks a brake or power
//! notch so the train reaches a target position at a target speed without
//! exceeding a planned deceleration, taking track gradient into account.
//!
//! ## Features
//!
//! - **Kinematic projection**: constant-acceleration and constant-jerk motion, forwards and backwards
//! - **Brake calibration**: notch ↔ deceleration curves built from pressure-rate tables, tolerant of bad data
//! - **Gradient tracking**: compact slope map fed from track beacons and pruned behind the train
//! - **Deceleration control**: feedback law with release smoothing, anti-chatter hysteresis and power cut-off
//!
//! ## Architecture
//!
//! The crate is `no_std` compatible (with `alloc`) and free of I/O:
//!
//! - `motion` - Point-mass kinematics used for every projection
//! - `braking` - Brake notch calibration
//! - `gradient` - Track gradient map
//! - `pattern` - Control law for one deceleration target
//! - `autopilot` - Per-vehicle state that ties everything together
//! - `config` - Vehicle and brake configuration
//!
//! ## Example
//!
//! ```rust
//! use rs_autopilot::{
//!     AppliedHandles, Autopilot, AutopilotConfig, DecelerationPattern, NotchCommand,
//!     VehicleSpec, VehicleState,
//! };
//!
//! let mut autopilot = Autopilot::new(AutopilotConfig::default());
//! autopilot.set_vehicle_spec(VehicleSpec::default().with_brake_notches(8));
//!
//! // stop at 1000 m planning with 0.8 m/s²
//! let target = DecelerationPattern::new(1000.0, 0.0, 0.8);
//!
//! // Call every tick with the host's state and last applied handles
//! let state = VehicleState::new(900.0, 20.0, 0.0);
//! let cmd = autopilot.tick(state, AppliedHandles::default(), Some(&target));
//! assert!(matches!(cmd, NotchCommand::Brake(_)));
//!
//! // Hosts expecting a signed notch
//! let raw: i32 = cmd.into();
//! assert!(raw < 0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Acceleration estimate from speed samples.
pub mod accelerometer;
/// Per-vehicle autopilot that coordinates calibration, gradient and control.
pub mod autopilot;
/// Brake notch ↔ deceleration calibration.
pub mod braking;
/// Vehicle and brake configuration.
pub mod config;
/// Configuration diagnostics.
pub mod error;
/// Track gradient map.
pub mod gradient;
/// Point-mass kinematics.
pub mod motion;
/// Deceleration control law and notch commands.
pub mod pattern;
/// Track position intervals.
pub mod span;
/// Unit conversions.
pub mod units;

// Re-exports for convenience
pub use accelerometer::Accelerometer;
pub use autopilot::{Autopilot, VehicleState};
pub use braking::{BrakeCharacteristic, NotchCurve, MAX_NOTCH_ENTRIES};
pub use config::{AutopilotConfig, BrakeConfig, PressureRates, VehicleSpec};
pub use error::ConfigError;
pub use gradient::{GradientGraph, GradientSegment};
pub use motion::{acceleration_from_distance_and_speeds, MotionModel};
pub use pattern::{AppliedHandles, ControlContext, DecelerationPattern, NotchCommand};
pub use span::Span;
