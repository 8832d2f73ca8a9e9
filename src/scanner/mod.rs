//! Scan backends.
//!
//! A scan backend delivers [`Observation`]s over a bounded channel and is
//! bracketed by `start()`/`stop()`. The radio itself is an external
//! collaborator; this crate ships a trace-replay backend.

pub mod replay;
pub mod types;

// Re-export commonly used types
pub use replay::{ReplayScanner, ReplayStep, ScannerError};
pub use types::Observation;
