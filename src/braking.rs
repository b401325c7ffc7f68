//! Brake notch ↔ deceleration calibration.
//!
//! A [`BrakeCharacteristic`] maps fractional brake notches to decelerations
//! and back by interpolating a per-vehicle table of brake-cylinder pressure
//! ratios (one breakpoint per notch, `0.0` = released, `1.0` = full service).
//!
//! # Calibration
//!
//! The raw table is split into two windows:
//!
//! - the **standard** curve, notches `0..=standard_count` (at most
//!   `standard_count + 2` entries are kept), padded when the table is short;
//! - an optional **extended** curve built from whatever follows the standard
//!   window, prefixed with a synthetic release entry.
//!
//! Short or missing tables never fail: the missing notches are synthesized
//! as zeros up to the disabled-notch count and then as an even ramp toward
//! full service.
//!
//! # Example
//!
//! ```rust
//! use rs_autopilot::BrakeCharacteristic;
//!
//! let mut brake = BrakeCharacteristic::default();
//! brake.configure(4, 0, 0, 1.0, 0.5, &[0.0, 0.25, 0.5, 0.75, 1.0]);
//!
//! assert!((brake.notch(0.5) - 2.0).abs() < 1e-9);
//! assert!((brake.deceleration(3.0) - 0.75).abs() < 1e-9);
//! ```

use heapless::Vec;

/// Maximum number of breakpoints a single curve can hold.
pub const MAX_NOTCH_ENTRIES: usize = 64;

/// Ordered pressure-ratio breakpoints, indexed by notch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotchCurve {
    ratios: Vec<f64, MAX_NOTCH_ENTRIES>,
}

impl NotchCurve {
    fn from_slice(ratios: &[f64]) -> Self {
        let mut curve = Self::default();
        for &ratio in ratios.iter().take(MAX_NOTCH_ENTRIES) {
            curve.push(ratio);
        }
        curve
    }

    fn push(&mut self, ratio: f64) {
        if self.ratios.push(ratio).is_err() {
            log::warn!("notch curve full, dropping breakpoint {ratio}");
        }
    }

    /// Number of breakpoints.
    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    /// Whether the curve has no breakpoints.
    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    /// Breakpoints in notch order.
    pub fn ratios(&self) -> &[f64] {
        &self.ratios
    }

    /// Extend the curve until it covers notches `0..=service_count`.
    ///
    /// Notches up to `disabled_count` get zero; the rest ramp evenly from the
    /// last known ratio toward `1.0`.
    fn pad(&mut self, service_count: usize, disabled_count: usize) {
        while self.len() <= service_count {
            if self.len() <= disabled_count {
                self.push(0.0);
            } else {
                let divisions = (service_count - self.len() + 1) as f64;
                let previous = self.ratios.last().copied().unwrap_or(0.0);
                self.push(previous + (1.0 - previous) / divisions);
            }
        }
    }

    /// Fractional notch that produces the given pressure ratio.
    pub fn notch(&self, ratio: f64) -> f64 {
        // first breakpoint not below `ratio`
        let i = self.ratios.partition_point(|&r| r < ratio);
        if i == 0 {
            return 0.0;
        }
        if i == self.len() {
            return ratio * self.len() as f64;
        }

        let lower = self.ratios[i - 1];
        let upper = self.ratios[i];
        (i - 1) as f64 + (ratio - lower) / (upper - lower)
    }

    /// Pressure ratio produced by the given fractional notch.
    pub fn ratio(&self, notch: f64) -> f64 {
        debug_assert!(notch >= 0.0, "negative notch {notch}");
        debug_assert!(!self.is_empty(), "empty notch curve");

        let last = self.len().saturating_sub(1);
        if notch >= last as f64 {
            return if last == 0 { 0.0 } else { notch / last as f64 };
        }

        let i = notch as usize;
        let lower = self.ratios[i];
        let upper = self.ratios[i + 1];
        let mut ratio = lower;
        if lower < upper {
            ratio += (notch - i as f64) * (upper - lower);
        }
        ratio
    }
}

/// Calibrated brake curve of one vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct BrakeCharacteristic {
    standard_count: usize,
    disabled_count: usize,
    max_service_deceleration: f64,
    release_time: f64,
    standard: NotchCurve,
    extended: NotchCurve,
}

impl Default for BrakeCharacteristic {
    fn default() -> Self {
        let mut brake = Self {
            standard_count: 0,
            disabled_count: 0,
            max_service_deceleration: 0.0,
            release_time: 0.0,
            standard: NotchCurve::default(),
            extended: NotchCurve::default(),
        };
        brake.configure(0, 0, 0, 0.0, 0.0, &[]);
        brake
    }
}

impl BrakeCharacteristic {
    /// Recalibrate from vehicle-spec data.
    ///
    /// - `standard_count`: number of service brake notches
    /// - `disabled_count`: leading notches that produce no braking
    /// - `extended_count`: notches available in the extended range
    /// - `max_service_deceleration`: deceleration at ratio `1.0` (m/s²)
    /// - `release_time`: time the brake needs to release (s)
    /// - `raw_breakpoints`: pressure ratio per notch, starting at release
    pub fn configure(
        &mut self,
        standard_count: usize,
        disabled_count: usize,
        extended_count: usize,
        max_service_deceleration: f64,
        release_time: f64,
        raw_breakpoints: &[f64],
    ) {
        let max_service = MAX_NOTCH_ENTRIES - 2;
        if standard_count > max_service {
            log::warn!("{standard_count} service notches requested, limiting to {max_service}");
        }
        let standard_count = standard_count.min(max_service);

        self.standard_count = standard_count;
        self.disabled_count = disabled_count;
        self.max_service_deceleration = max_service_deceleration;
        self.release_time = release_time;

        let standard_window = standard_count + 2;
        let standard_len = raw_breakpoints.len().min(standard_window);
        self.standard = NotchCurve::from_slice(&raw_breakpoints[..standard_len]);
        self.standard.pad(standard_count, disabled_count);

        self.extended = NotchCurve::default();
        if raw_breakpoints.len() > standard_window {
            self.extended.push(0.0);
            for &ratio in raw_breakpoints[standard_window..].iter().take(extended_count) {
                self.extended.push(ratio);
            }
            if self.extended.len() <= 1 {
                // a lone release entry is not a usable range
                self.extended = NotchCurve::default();
            }
        }

        log::debug!(
            "brake calibrated: {} standard breakpoints, {} extended, automatic notches {}",
            self.standard.len(),
            self.extended.len(),
            self.effective_automatic_notch_count()
        );
    }

    /// Fractional notch needed for the given deceleration (m/s²).
    pub fn notch(&self, deceleration: f64) -> f64 {
        self.standard.notch(deceleration / self.max_service_deceleration)
    }

    /// Deceleration (m/s²) produced by the given fractional notch.
    pub fn deceleration(&self, notch: f64) -> f64 {
        self.max_service_deceleration * self.standard.ratio(notch)
    }

    /// Strongest ordinary service notch.
    pub fn standard_notch_count(&self) -> usize {
        self.standard_count
    }

    /// Notches at or below this count produce no braking.
    pub fn disabled_notch_count(&self) -> usize {
        self.disabled_count
    }

    /// Number of notches in the extended range, 0 if there is none.
    pub fn extended_notch_count(&self) -> usize {
        self.extended.len().saturating_sub(1)
    }

    /// Strongest notch automatic control may use.
    pub fn effective_automatic_notch_count(&self) -> usize {
        match self.extended_notch_count() {
            0 => self.standard_count,
            n => n,
        }
    }

    /// Deceleration at full service (m/s²).
    pub fn max_service_deceleration(&self) -> f64 {
        self.max_service_deceleration
    }

    /// Time the brake takes to release (s).
    pub fn release_time(&self) -> f64 {
        self.release_time
    }

    /// The calibrated standard curve.
    pub fn standard_curve(&self) -> &NotchCurve {
        &self.standard
    }

    /// The calibrated extended curve, empty when there is none.
    pub fn extended_curve(&self) -> &NotchCurve {
        &self.extended
    }
}
