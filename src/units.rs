//! Unit conversions used at the host boundary.
//!
//! Everything inside the crate is SI: metres, seconds, m/s and m/s².
//! Train simulators usually talk in km/h and km/h/s, so these helpers
//! exist for the few places where a constant is more readable in those
//! units.

/// Standard gravity in m/s².
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// Convert km/h to m/s.
pub fn mps_from_kmph(kmph: f64) -> f64 {
    kmph / 3.6
}

/// Convert m/s to km/h.
pub fn kmph_from_mps(mps: f64) -> f64 {
    mps * 3.6
}

/// Convert an acceleration in km/h/s to m/s².
pub fn mps2_from_kmphps(kmphps: f64) -> f64 {
    kmphps / 3.6
}
