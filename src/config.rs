//! Vehicle and brake configuration.
//!
//! These are plain data records filled in by whatever loads the host's
//! settings. Breakpoint tables use `heapless::Vec` so the crate stays
//! usable without an allocator for configuration.
//!
//! # Example
//!
//! ```rust
//! use rs_autopilot::config::{AutopilotConfig, BrakeConfig, VehicleSpec};
//!
//! let config = AutopilotConfig::default()
//!     .with_car_length(20.0)
//!     .with_brake(
//!         BrakeConfig::default()
//!             .with_max_service_deceleration(1.0)
//!             .with_pressure_rates(&[0.0, 0.2, 0.4, 0.6, 0.8, 1.0]),
//!     );
//!
//! let spec = VehicleSpec::default().with_brake_notches(5).with_cars(6);
//! assert!(config.brake.validate(&spec).is_ok());
//! assert_eq!(config.train_length(&spec), 120.0);
//! ```

use heapless::Vec;

use crate::braking::MAX_NOTCH_ENTRIES;
use crate::error::ConfigError;
use crate::units::mps2_from_kmphps;

/// Pressure-ratio table, one entry per brake notch starting at release.
pub type PressureRates = Vec<f64, MAX_NOTCH_ENTRIES>;

// ============================================================================
// Vehicle Spec
// ============================================================================

/// Vehicle description reported by the host.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleSpec {
    /// Number of service brake notches (emergency not included).
    pub brake_notches: usize,
    /// Number of power notches.
    pub power_notches: usize,
    /// Brake notch that satisfies the ATS check.
    pub ats_notch: usize,
    /// Brake notch at 70% of full service.
    pub b67_notch: usize,
    /// Number of cars in the train.
    pub cars: usize,
}

impl Default for VehicleSpec {
    fn default() -> Self {
        Self {
            brake_notches: 8,
            power_notches: 5,
            ats_notch: 1,
            b67_notch: 6,
            cars: 1,
        }
    }
}

impl VehicleSpec {
    /// Set the service brake notch count
    pub fn with_brake_notches(mut self, notches: usize) -> Self {
        self.brake_notches = notches;
        self
    }

    /// Set the power notch count
    pub fn with_power_notches(mut self, notches: usize) -> Self {
        self.power_notches = notches;
        self
    }

    /// Set the ATS notch
    pub fn with_ats_notch(mut self, notch: usize) -> Self {
        self.ats_notch = notch;
        self
    }

    /// Set the B67 notch
    pub fn with_b67_notch(mut self, notch: usize) -> Self {
        self.b67_notch = notch;
        self
    }

    /// Set the car count
    pub fn with_cars(mut self, cars: usize) -> Self {
        self.cars = cars;
        self
    }

    /// Check the notch counts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.brake_notches == 0 {
            return Err(ConfigError::NoServiceNotches);
        }
        let max = MAX_NOTCH_ENTRIES - 2;
        if self.brake_notches > max {
            return Err(ConfigError::TooManyNotches {
                requested: self.brake_notches,
                max,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Brake Config
// ============================================================================

/// Brake calibration settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrakeConfig {
    /// Leading notches that produce no braking.
    pub disabled_notches: usize,
    /// Notches available beyond the standard window.
    pub extended_notches: usize,
    /// Deceleration at full service (m/s²).
    pub max_service_deceleration: f64,
    /// Time the brake takes to release (s).
    pub release_time: f64,
    /// Pressure ratio per notch, starting at release.
    pub pressure_rates: PressureRates,
}

impl Default for BrakeConfig {
    fn default() -> Self {
        Self {
            disabled_notches: 0,
            extended_notches: 0,
            max_service_deceleration: mps2_from_kmphps(3.0),
            release_time: 0.5,
            pressure_rates: PressureRates::new(),
        }
    }
}

impl BrakeConfig {
    /// Set the disabled notch count
    pub fn with_disabled_notches(mut self, notches: usize) -> Self {
        self.disabled_notches = notches;
        self
    }

    /// Set the extended notch count
    pub fn with_extended_notches(mut self, notches: usize) -> Self {
        self.extended_notches = notches;
        self
    }

    /// Set the full-service deceleration (m/s²)
    pub fn with_max_service_deceleration(mut self, deceleration: f64) -> Self {
        self.max_service_deceleration = deceleration;
        self
    }

    /// Set the release time (s)
    pub fn with_release_time(mut self, seconds: f64) -> Self {
        self.release_time = seconds;
        self
    }

    /// Set the pressure-rate table, truncating if too long
    pub fn with_pressure_rates(mut self, rates: &[f64]) -> Self {
        self.pressure_rates.clear();
        for &rate in rates.iter().take(MAX_NOTCH_ENTRIES) {
            let pushed = self.pressure_rates.push(rate);
            debug_assert!(pushed.is_ok());
        }
        self
    }

    /// Copy with unusable scalar settings replaced by their defaults.
    ///
    /// The pressure table is left alone; calibration pads and clamps it
    /// itself.
    pub fn repaired(&self) -> Self {
        let defaults = Self::default();
        let mut repaired = self.clone();

        let deceleration = self.max_service_deceleration;
        if !(deceleration > 0.0) || !deceleration.is_finite() {
            log::warn!(
                "max service deceleration {deceleration} unusable, using {}",
                defaults.max_service_deceleration
            );
            repaired.max_service_deceleration = defaults.max_service_deceleration;
        }
        if !(self.release_time >= 0.0) || !self.release_time.is_finite() {
            log::warn!(
                "brake release time {} unusable, using {}",
                self.release_time,
                defaults.release_time
            );
            repaired.release_time = defaults.release_time;
        }
        repaired
    }

    /// Check the settings against the vehicle they will calibrate.
    ///
    /// Only the standard window of the pressure table (notches
    /// `0..=brake_notches`) is checked for ordering.
    pub fn validate(&self, spec: &VehicleSpec) -> Result<(), ConfigError> {
        spec.validate()?;

        if self.disabled_notches >= spec.brake_notches {
            return Err(ConfigError::AllNotchesDisabled {
                disabled: self.disabled_notches,
                service: spec.brake_notches,
            });
        }
        if !(self.max_service_deceleration > 0.0) || !self.max_service_deceleration.is_finite() {
            return Err(ConfigError::InvalidMaxDeceleration(
                self.max_service_deceleration,
            ));
        }
        if !(self.release_time >= 0.0) || !self.release_time.is_finite() {
            return Err(ConfigError::InvalidReleaseTime(self.release_time));
        }

        let rates = &self.pressure_rates;
        if let Some(&first) = rates.first() {
            if first != 0.0 {
                return Err(ConfigError::ReleaseRatioNotZero(first));
            }
        }
        let standard = &rates[..rates.len().min(spec.brake_notches + 1)];
        for (notch, &ratio) in standard.iter().enumerate() {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ConfigError::BreakpointOutOfRange { notch, ratio });
            }
            if notch > 0 && ratio < standard[notch - 1] {
                return Err(ConfigError::BreakpointsDecreasing { notch });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Autopilot Config
// ============================================================================

/// Complete autopilot configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AutopilotConfig {
    /// Length of one car (m)
    pub car_length: f64,
    /// Brake calibration
    pub brake: BrakeConfig,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            car_length: 20.0,
            brake: BrakeConfig::default(),
        }
    }
}

impl AutopilotConfig {
    /// Set the car length
    pub fn with_car_length(mut self, meters: f64) -> Self {
        self.car_length = meters;
        self
    }

    /// Set the brake configuration
    pub fn with_brake(mut self, brake: BrakeConfig) -> Self {
        self.brake = brake;
        self
    }

    /// Total train length for the given vehicle (m).
    pub fn train_length(&self, spec: &VehicleSpec) -> f64 {
        self.car_length * spec.cars as f64
    }

    /// Check the whole configuration against the vehicle.
    pub fn validate(&self, spec: &VehicleSpec) -> Result<(), ConfigError> {
        if !(self.car_length > 0.0) || !self.car_length.is_finite() {
            return Err(ConfigError::InvalidCarLength(self.car_length));
        }
        self.brake.validate(spec)
    }
}

// ============================================================================
// Tests
// ============================================================================
