//! Presence Agent - debounced BLE proximity monitoring.
//!
//! This library turns a noisy, intermittent stream of RSSI samples from one
//! tracked BLE device into a stable NEAR / FAR / LOST classification and a
//! throttled stream of alerts suitable for user-facing notification.
//!
//! # Approach
//!
//! - **Smoothing**: raw RSSI goes through a single-pole EMA filter, so
//!   classification never reacts to an unsmoothed sample.
//! - **Hysteresis**: two thresholds (far = base, near = base + gap) form a
//!   dead-band that keeps the state from flapping on jitter.
//! - **Silence**: LOST strictly means "no packets within the loss timeout",
//!   never "weak packets"; a weak but arriving signal stays FAR.
//! - **Throttling**: repeated far/lost notifications and the audible cue are
//!   rate-limited on independent cooldowns.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Presence Agent                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐    ┌──────────┐   ┌──────────┐   ┌──────────┐ │
//! │  │ Scanner  │──▶│ Matcher  │──▶│  Filter  │──▶│ Presence │ │
//! │  │ (replay) │    │(identity)│   │  (EMA)   │   │ tracker  │ │
//! │  └──────────┘    └──────────┘   └──────────┘   └────┬─────┘ │
//! │        1s ticker ─────────────────────────────────▶│       │
//! │                                               ┌─────▼─────┐ │
//! │                                               │  Alert    │ │
//! │                                               │ scheduler │ │
//! │                                               └─────┬─────┘ │
//! │                                  UiEvent channel    │       │
//! │                                               ┌─────▼─────┐ │
//! │                                               │   Sink    │ │
//! │                                               │(own thread)│ │
//! │                                               └───────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use presence_agent::{monitor, sink, Config};
//!
//! let config = Config::load_or_default();
//! let (obs_tx, obs_rx) = crossbeam_channel::bounded(1_024);
//! let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
//! let (ui_tx, ui_rx) = crossbeam_channel::unbounded();
//!
//! let _ = obs_tx; // fed by a scan backend
//! let _ = cmd_tx; // fed by the control surface
//! sink::spawn_sink(ui_rx, sink::ConsoleSink::new());
//! monitor::run(&config, obs_rx, cmd_rx, ui_tx);
//! ```

pub mod config;
pub mod core;
pub mod monitor;
pub mod scanner;
pub mod sink;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, THRESHOLD_OPTIONS};
pub use crate::core::{
    matches_target, Alert, AlertScheduler, Ema, PresenceState, PresenceTracker, TargetMatcher,
    Thresholds, Transition, TransitionReason,
};
pub use monitor::{Command, Monitor};
pub use scanner::{Observation, ReplayScanner, ReplayStep};
pub use sink::{ConsoleSink, EventSink, Severity, UiEvent};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
