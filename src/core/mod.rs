//! Core presence logic.
//!
//! This module contains:
//! - RSSI smoothing (exponential moving average)
//! - Identity matching for inbound advertisements
//! - The hysteresis presence state machine
//! - Alert throttling for degraded states
//!
//! Everything here is pure and synchronous; callers supply `Instant`s.

pub mod alerts;
pub mod filter;
pub mod matcher;
pub mod presence;

// Re-export commonly used types
pub use alerts::{Alert, AlertScheduler};
pub use filter::{smooth, Ema, DEFAULT_ALPHA};
pub use matcher::{matches_target, TargetMatcher};
pub use presence::{PresenceState, PresenceTracker, Thresholds, Transition, TransitionReason};
