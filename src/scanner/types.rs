//! Observation types delivered by scan backends.

use std::time::Instant;

/// A single advertisement sighting.
///
/// Transient: produced continuously by the scan backend and consumed
/// immediately by the monitor loop.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Advertised device name, if the advertisement carried one.
    pub name: Option<String>,
    /// Hardware address as reported by the radio.
    pub address: String,
    /// Raw received signal strength in dBm.
    pub rssi: f64,
    /// Monotonic receipt time.
    pub at: Instant,
}

impl Observation {
    pub fn new(name: Option<String>, address: impl Into<String>, rssi: f64) -> Self {
        Self {
            name,
            address: address.into(),
            rssi,
            at: Instant::now(),
        }
    }
}
