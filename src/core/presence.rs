//! Hysteresis presence state machine.
//!
//! Converts smoothed RSSI plus observation freshness into a low-flap
//! NEAR / FAR / LOST classification. Two thresholds form a dead-band:
//! dropping below the far threshold moves the state to FAR, rising above the
//! near threshold moves it back to NEAR, and values in between leave the
//! state alone. LOST is driven purely by silence (no accepted observation
//! within the loss timeout), never by a weak-but-arriving signal.

use crate::core::filter::Ema;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Presence classification for the tracked device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceState {
    /// No observation has ever been accepted.
    Unknown,
    /// Smoothed signal above the near threshold.
    Near,
    /// Smoothed signal below the far threshold, packets still arriving.
    Far,
    /// No packets within the loss timeout.
    Lost,
}

impl PresenceState {
    /// States eligible for periodic alerting.
    pub fn is_degraded(&self) -> bool {
        matches!(self, PresenceState::Far | PresenceState::Lost)
    }
}

impl std::fmt::Display for PresenceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PresenceState::Unknown => "unknown",
            PresenceState::Near => "near",
            PresenceState::Far => "far",
            PresenceState::Lost => "lost",
        };
        write!(f, "{s}")
    }
}

/// Why a transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionReason {
    /// No packets within the loss timeout.
    SignalLost,
    /// Smoothed signal dropped below the far threshold.
    MovedAway,
    /// Smoothed signal rose above the near threshold.
    BackNear,
}

/// A single state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub to: PresenceState,
    pub reason: TransitionReason,
}

/// Base threshold plus hysteresis gap, both in dB.
///
/// `far()` is the base; `near()` sits `gap` dB above it, so
/// `near() >= far()` always holds (equality iff the gap is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    base: i32,
    gap: i32,
}

impl Thresholds {
    /// Create a threshold pair. A negative gap is clamped to zero.
    pub fn new(base: i32, gap: i32) -> Self {
        Self {
            base,
            gap: gap.max(0),
        }
    }

    /// Base threshold in dBm. Below this the device counts as far.
    pub fn base(&self) -> i32 {
        self.base
    }

    /// Hysteresis gap in dB.
    pub fn gap(&self) -> i32 {
        self.gap
    }

    /// Dropping below this moves the state to FAR.
    pub fn far(&self) -> f64 {
        self.base as f64
    }

    /// Rising above this moves the state to NEAR.
    pub fn near(&self) -> f64 {
        (self.base + self.gap) as f64
    }
}

/// The presence state machine.
///
/// Owns the smoothed signal and the last-observation timestamp. All inputs
/// carry an explicit `now` so the transition rules are a pure function of
/// (state, smoothed value, elapsed time, thresholds).
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    thresholds: Thresholds,
    loss_timeout: Duration,
    filter: Ema,
    state: PresenceState,
    last_seen: Option<Instant>,
}

impl PresenceTracker {
    pub fn new(thresholds: Thresholds, loss_timeout: Duration, alpha: f64) -> Self {
        Self {
            thresholds,
            loss_timeout,
            filter: Ema::new(alpha),
            state: PresenceState::Unknown,
            last_seen: None,
        }
    }

    /// Current classification.
    pub fn state(&self) -> PresenceState {
        self.state
    }

    /// Current smoothed RSSI, once at least one observation has been seen.
    /// Never resets, even while LOST.
    pub fn smoothed(&self) -> Option<f64> {
        self.filter.value()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Replace both thresholds in one step. The next rule evaluation sees a
    /// consistent pair; there is no window where near < far.
    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds;
    }

    /// Feed an accepted observation for the tracked identity.
    ///
    /// Smooths the raw RSSI, refreshes the last-seen timestamp, then applies
    /// the threshold rules. Returns a transition if the state changed.
    pub fn observe(&mut self, rssi: f64, now: Instant) -> Option<Transition> {
        let smoothed = self.filter.update(rssi);
        self.last_seen = Some(now);

        // The silence rule takes priority but cannot fire here: last_seen
        // was just refreshed.
        if smoothed < self.thresholds.far() && self.state != PresenceState::Far {
            return self.transition(PresenceState::Far, TransitionReason::MovedAway);
        }
        if smoothed > self.thresholds.near() && self.state != PresenceState::Near {
            return self.transition(PresenceState::Near, TransitionReason::BackNear);
        }
        // Dead-band: no change.
        None
    }

    /// Periodic silence check.
    ///
    /// Fires purely from elapsed time, independent of the smoothed value,
    /// and only once a first observation has ever been seen.
    pub fn tick(&mut self, now: Instant) -> Option<Transition> {
        let last_seen = self.last_seen?;
        if now.duration_since(last_seen) > self.loss_timeout && self.state != PresenceState::Lost {
            return self.transition(PresenceState::Lost, TransitionReason::SignalLost);
        }
        None
    }

    fn transition(&mut self, to: PresenceState, reason: TransitionReason) -> Option<Transition> {
        self.state = to;
        Some(Transition { to, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(base: i32, gap: i32, timeout_secs: u64) -> PresenceTracker {
        // alpha = 1.0 so tests reason about raw values directly
        PresenceTracker::new(
            Thresholds::new(base, gap),
            Duration::from_secs(timeout_secs),
            1.0,
        )
    }

    #[test]
    fn test_threshold_invariant() {
        for (base, gap) in [(-90, 5), (-90, 0), (-20, 40), (-100, 3)] {
            let t = Thresholds::new(base, gap);
            assert!(t.near() >= t.far());
            assert_eq!(t.near() == t.far(), gap == 0);
        }
        // Negative gap clamps to zero rather than inverting the pair.
        let t = Thresholds::new(-90, -5);
        assert_eq!(t.near(), t.far());
    }

    #[test]
    fn test_first_observation_classifies() {
        let now = Instant::now();

        let mut t = tracker(-90, 5, 8);
        let tr = t.observe(-95.0, now).unwrap();
        assert_eq!(tr.to, PresenceState::Far);
        assert_eq!(tr.reason, TransitionReason::MovedAway);

        let mut t = tracker(-90, 5, 8);
        let tr = t.observe(-60.0, now).unwrap();
        assert_eq!(tr.to, PresenceState::Near);
        assert_eq!(tr.reason, TransitionReason::BackNear);
    }

    #[test]
    fn test_dead_band_from_unknown_stays_unknown() {
        let mut t = tracker(-90, 5, 8);
        assert!(t.observe(-88.0, Instant::now()).is_none());
        assert_eq!(t.state(), PresenceState::Unknown);
    }

    #[test]
    fn test_hysteresis_dead_band_holds_state() {
        let now = Instant::now();
        let mut t = tracker(-90, 5, 8);
        t.observe(-95.0, now);
        assert_eq!(t.state(), PresenceState::Far);

        // far <= x <= near: no transition in either direction.
        for x in [-90.0, -89.0, -87.5, -85.0] {
            assert!(t.observe(x, now).is_none(), "x = {x}");
            assert_eq!(t.state(), PresenceState::Far);
        }
    }

    #[test]
    fn test_transition_idempotence() {
        let now = Instant::now();
        let mut t = tracker(-90, 5, 8);
        assert!(t.observe(-95.0, now).is_some());
        // Second low reading: already FAR, no event.
        assert!(t.observe(-96.0, now).is_none());
        assert!(t.observe(-97.0, now).is_none());
    }

    #[test]
    fn test_silence_enters_lost_exactly_once() {
        let now = Instant::now();
        let mut t = tracker(-90, 5, 8);
        t.observe(-60.0, now);
        assert_eq!(t.state(), PresenceState::Near);

        // Within the timeout: nothing.
        assert!(t.tick(now + Duration::from_secs(8)).is_none());

        let tr = t.tick(now + Duration::from_secs(9)).unwrap();
        assert_eq!(tr.to, PresenceState::Lost);
        assert_eq!(tr.reason, TransitionReason::SignalLost);

        // Subsequent ticks while still silent: no repeat event.
        assert!(t.tick(now + Duration::from_secs(20)).is_none());
    }

    #[test]
    fn test_silence_precedence_over_strong_signal() {
        let now = Instant::now();
        let mut t = tracker(-90, 5, 8);
        // Last smoothed value well above the near threshold.
        t.observe(-40.0, now);
        assert_eq!(t.state(), PresenceState::Near);

        // Elapsed time alone drives LOST.
        let tr = t.tick(now + Duration::from_secs(9)).unwrap();
        assert_eq!(tr.to, PresenceState::Lost);
        assert_eq!(t.smoothed(), Some(-40.0));
    }

    #[test]
    fn test_tick_before_first_observation_is_noop() {
        let mut t = tracker(-90, 5, 8);
        assert!(t.tick(Instant::now() + Duration::from_secs(3600)).is_none());
        assert_eq!(t.state(), PresenceState::Unknown);
    }

    #[test]
    fn test_weak_signal_never_enters_lost() {
        let now = Instant::now();
        let mut t = tracker(-90, 5, 8);
        t.observe(-99.0, now);
        assert_eq!(t.state(), PresenceState::Far);

        // Continuously arriving but very weak: stays FAR.
        for i in 1..20 {
            t.observe(-99.0, now + Duration::from_secs(i));
            assert_eq!(t.state(), PresenceState::Far);
            assert!(t.tick(now + Duration::from_secs(i)).is_none());
        }
    }

    #[test]
    fn test_weak_signal_after_lost_goes_far_not_near() {
        let now = Instant::now();
        let mut t = tracker(-90, 5, 8);
        t.observe(-60.0, now);
        t.tick(now + Duration::from_secs(9));
        assert_eq!(t.state(), PresenceState::Lost);

        // Packets resume but weak: FAR, not NEAR. Recovery to NEAR requires
        // crossing above the near threshold.
        let mut t2 = t.clone();
        let tr = t2
            .observe(-120.0, now + Duration::from_secs(10))
            .unwrap();
        assert_eq!(tr.to, PresenceState::Far);
        assert_eq!(tr.reason, TransitionReason::MovedAway);

        let tr = t.observe(-30.0, now + Duration::from_secs(10)).unwrap();
        assert_eq!(tr.to, PresenceState::Near);
        assert_eq!(tr.reason, TransitionReason::BackNear);
    }

    #[test]
    fn test_smoothed_value_survives_lost() {
        let now = Instant::now();
        let mut t = PresenceTracker::new(Thresholds::new(-90, 5), Duration::from_secs(8), 0.3);
        t.observe(-70.0, now);
        t.tick(now + Duration::from_secs(9));
        assert_eq!(t.state(), PresenceState::Lost);
        assert_eq!(t.smoothed(), Some(-70.0));

        // The next observation smooths against the surviving value.
        t.observe(-80.0, now + Duration::from_secs(10));
        let expected = 0.3 * -80.0 + 0.7 * -70.0;
        assert!((t.smoothed().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_full_lifecycle_base_minus_90_gap_5() {
        // base=-90, gap=5 => far=-90, near=-85
        let now = Instant::now();
        let mut t = tracker(-90, 5, 8);

        // -95 crosses below far from UNKNOWN => FAR after the first sample.
        let tr = t.observe(-95.0, now).unwrap();
        assert_eq!(tr.to, PresenceState::Far);
        assert!(t.observe(-95.0, now + Duration::from_secs(1)).is_none());
        assert!(t.observe(-95.0, now + Duration::from_secs(2)).is_none());

        // -80 > near(-85) => NEAR.
        let tr = t.observe(-80.0, now + Duration::from_secs(3)).unwrap();
        assert_eq!(tr.to, PresenceState::Near);

        // Silence for loss_timeout + 1 => LOST exactly once.
        let silent_until = now + Duration::from_secs(3 + 8 + 1);
        let tr = t.tick(silent_until).unwrap();
        assert_eq!(tr.to, PresenceState::Lost);
        assert!(t.tick(silent_until + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_set_thresholds_swaps_pair_atomically() {
        let now = Instant::now();
        let mut t = tracker(-90, 5, 8);
        t.observe(-75.0, now);
        assert_eq!(t.state(), PresenceState::Near);

        // Raising the base above the current signal reclassifies on the
        // next observation.
        t.set_thresholds(Thresholds::new(-60, 5));
        let tr = t.observe(-75.0, now + Duration::from_secs(1)).unwrap();
        assert_eq!(tr.to, PresenceState::Far);
    }
}
