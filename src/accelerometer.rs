//! Acceleration estimate from host speed samples.
//!
//! The host reports speed but not acceleration. [`Accelerometer`] keeps the
//! samples from roughly the last second and differentiates across the whole
//! window, which smooths out the jitter of per-frame differences.

use heapless::Deque;

/// Sample capacity; enough for one second at typical frame rates.
const CAPACITY: usize = 32;

/// Span of samples used for the estimate (s).
const WINDOW: f64 = 1.0;

/// Sliding-window acceleration estimator.
#[derive(Clone, Debug, Default)]
pub struct Accelerometer {
    samples: Deque<(f64, f64), CAPACITY>,
}

impl Accelerometer {
    /// Create an estimator with no samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all samples.
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Record a speed (m/s) observed at `time` (s).
    pub fn update(&mut self, time: f64, speed: f64) {
        if let Some(&(last, _)) = self.samples.back() {
            if time < last {
                // host jumped back in time
                self.reset();
            } else if time == last {
                return;
            }
        }

        if self.samples.is_full() {
            self.samples.pop_front();
        }
        // keep one sample at or beyond the window edge
        while self.samples.len() >= 2 {
            let next_time = self.samples.iter().nth(1).map_or(time, |&(t, _)| t);
            if time - next_time < WINDOW {
                break;
            }
            self.samples.pop_front();
        }
        let pushed = self.samples.push_back((time, speed));
        debug_assert!(pushed.is_ok());
    }

    /// Estimated acceleration (m/s²), 0 until two samples are known.
    pub fn acceleration(&self) -> f64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(&(t0, v0)), Some(&(t1, v1))) if t1 > t0 => (v1 - v0) / (t1 - t0),
            _ => 0.0,
        }
    }
}
