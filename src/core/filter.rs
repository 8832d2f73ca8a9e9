//! Exponential moving average for RSSI smoothing.
//!
//! Raw advertisement RSSI is bursty; a single-pole IIR filter gives O(1)
//! memory and bounded-lag response without buffering history. `alpha` trades
//! responsiveness against jitter rejection.

/// Reference smoothing factor for advertisement RSSI.
pub const DEFAULT_ALPHA: f64 = 0.3;

/// Smooth a single sample against the previous smoothed value.
///
/// The first sample ever seeds the filter unchanged; afterwards
/// `alpha * value + (1 - alpha) * previous`.
pub fn smooth(previous: Option<f64>, value: f64, alpha: f64) -> f64 {
    match previous {
        None => value,
        Some(prev) => alpha * value + (1.0 - alpha) * prev,
    }
}

/// Exponential moving average tracker.
///
/// Higher alpha = faster response, more noise passthrough.
/// Lower alpha = slower response, smoother output.
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    alpha: f64,
    value: f64,
    initialized: bool,
}

impl Ema {
    /// Create a new filter with the given smoothing factor in (0, 1].
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            value: 0.0,
            initialized: false,
        }
    }

    /// Feed a sample and return the new smoothed value.
    pub fn update(&mut self, sample: f64) -> f64 {
        let previous = self.initialized.then_some(self.value);
        self.value = smooth(previous, sample, self.alpha);
        self.initialized = true;
        self.value
    }

    /// Current smoothed value, if at least one sample has been seen.
    pub fn value(&self) -> Option<f64> {
        self.initialized.then_some(self.value)
    }

    /// Whether the filter has been seeded.
    pub fn is_seeded(&self) -> bool {
        self.initialized
    }

    /// The smoothing factor.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}
