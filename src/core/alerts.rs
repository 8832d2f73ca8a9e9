//! Throttled alerting while the device is far or lost.
//!
//! Repeated notifications fire on a fixed interval; the audible cue carries
//! its own, longer cooldown so it stays quiet even when notifications fire
//! more often. The enable toggle gates only this repeated nagging; one-shot
//! transition events bypass the scheduler entirely.

use crate::core::presence::PresenceState;
use std::time::{Duration, Instant};

/// Decision to raise a periodic alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    /// Degraded state the alert is about.
    pub state: PresenceState,
    /// Whether the audible cue should also fire.
    pub audible: bool,
}

/// Rate-limits repeated notifications and audible cues.
#[derive(Debug, Clone)]
pub struct AlertScheduler {
    alert_interval: Duration,
    audible_interval: Duration,
    last_alert: Option<Instant>,
    last_audible: Option<Instant>,
    enabled: bool,
}

impl AlertScheduler {
    pub fn new(alert_interval: Duration, audible_interval: Duration) -> Self {
        Self {
            alert_interval,
            audible_interval,
            last_alert: None,
            last_audible: None,
            enabled: true,
        }
    }

    /// Whether periodic alerting is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Evaluate once per scheduler tick.
    ///
    /// Returns an alert when the state is degraded (FAR or LOST), alerting
    /// is enabled, and the notification interval has elapsed. The first poll
    /// in a degraded state fires immediately. The audible flag is decided
    /// independently against its own cooldown.
    pub fn poll(&mut self, state: PresenceState, now: Instant) -> Option<Alert> {
        if !self.enabled || !state.is_degraded() {
            return None;
        }

        if let Some(last) = self.last_alert {
            if now.duration_since(last) < self.alert_interval {
                return None;
            }
        }
        self.last_alert = Some(now);

        let audible = match self.last_audible {
            Some(last) => now.duration_since(last) >= self.audible_interval,
            None => true,
        };
        if audible {
            self.last_audible = Some(now);
        }

        Some(Alert { state, audible })
    }
}
