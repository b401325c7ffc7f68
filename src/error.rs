//! Configuration diagnostics.
//!
//! Calibration never refuses bad data (the brake curve is repaired instead),
//! but the problems are still worth reporting. [`ConfigError`] names the
//! first one found by `validate()`.

use core::fmt;

/// A problem found in vehicle or brake configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// The vehicle has no service brake notches.
    NoServiceNotches,

    /// More service notches than a brake curve can hold.
    TooManyNotches {
        /// Requested service notch count.
        requested: usize,
        /// Largest supported count.
        max: usize,
    },

    /// Every service notch is disabled.
    AllNotchesDisabled {
        /// Disabled notch count.
        disabled: usize,
        /// Service notch count.
        service: usize,
    },

    /// Full-service deceleration is zero, negative or not finite.
    InvalidMaxDeceleration(f64),

    /// Brake release time is negative or not finite.
    InvalidReleaseTime(f64),

    /// The first breakpoint (released brake) is not zero.
    ReleaseRatioNotZero(f64),

    /// A breakpoint lies outside `0.0..=1.0`.
    BreakpointOutOfRange {
        /// Notch index of the breakpoint.
        notch: usize,
        /// Offending ratio.
        ratio: f64,
    },

    /// A breakpoint is lower than the one before it.
    BreakpointsDecreasing {
        /// Notch index of the lower breakpoint.
        notch: usize,
    },

    /// Car length is zero, negative or not finite.
    InvalidCarLength(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoServiceNotches => write!(f, "vehicle has no service brake notches"),
            Self::TooManyNotches { requested, max } => {
                write!(f, "{requested} service notches requested, at most {max} supported")
            }
            Self::AllNotchesDisabled { disabled, service } => {
                write!(f, "{disabled} disabled notches leave none of {service} usable")
            }
            Self::InvalidMaxDeceleration(v) => {
                write!(f, "max service deceleration must be positive, got {v}")
            }
            Self::InvalidReleaseTime(v) => {
                write!(f, "brake release time must be non-negative, got {v}")
            }
            Self::ReleaseRatioNotZero(v) => {
                write!(f, "released brake must have ratio 0, got {v}")
            }
            Self::BreakpointOutOfRange { notch, ratio } => {
                write!(f, "breakpoint for notch {notch} is {ratio}, outside 0..=1")
            }
            Self::BreakpointsDecreasing { notch } => {
                write!(f, "breakpoint for notch {notch} is lower than the previous one")
            }
            Self::InvalidCarLength(v) => write!(f, "car length must be positive, got {v}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}
