//! Presentation events and the console sink.
//!
//! The monitor never touches presentation state directly: everything the
//! tray/notification layer needs arrives as a [`UiEvent`] over a channel and
//! is handled on a dedicated presentation thread. This crate ships a console
//! sink; a tray backend would implement [`EventSink`] the same way.

use crate::core::presence::{PresenceState, TransitionReason};
use chrono::Local;
use crossbeam_channel::Receiver;
use std::io::Write;
use std::thread::{self, JoinHandle};

/// Severity tag prefixed to one-shot messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Near,
    Far,
    Lost,
    Alert,
    Info,
}

impl Severity {
    /// Display prefix for notification titles.
    pub fn prefix(&self) -> &'static str {
        match self {
            Severity::Near => "🟢 ",
            Severity::Far => "🟡 ",
            Severity::Lost => "🔴 ",
            Severity::Alert => "⚠️ ",
            Severity::Info => "ℹ️ ",
        }
    }
}

impl From<TransitionReason> for Severity {
    fn from(reason: TransitionReason) -> Self {
        match reason {
            TransitionReason::SignalLost => Severity::Lost,
            TransitionReason::MovedAway => Severity::Far,
            TransitionReason::BackNear => Severity::Near,
        }
    }
}

/// Events the monitor emits toward the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// One-shot state transition notice. Fires unconditionally, even when
    /// periodic alerting is toggled off.
    StateChanged {
        to: PresenceState,
        reason: TransitionReason,
    },
    /// Throttled repeat notification while far or lost.
    PeriodicAlert {
        state: PresenceState,
        audible: bool,
    },
    /// Live status line (smoothed RSSI) for tooltip display.
    Status { summary: String },
    /// Request the blocking full-screen warning.
    ShowWarning,
    /// Dismiss the full-screen warning.
    DismissWarning,
    /// Threshold change confirmation.
    ThresholdsChanged { base: i32, far: i32, near: i32 },
}

/// A presentation backend.
pub trait EventSink: Send {
    fn handle(&mut self, event: UiEvent);
}

/// Run a sink on its own thread, draining events until the monitor side
/// closes the channel.
pub fn spawn_sink<S: EventSink + 'static>(
    receiver: Receiver<UiEvent>,
    mut sink: S,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            sink.handle(event);
        }
    })
}

/// Console presentation: severity-prefixed notification lines, a textual
/// full-screen warning banner, and the terminal bell as the audible cue.
pub struct ConsoleSink {
    warning_active: bool,
    last_status: String,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            warning_active: false,
            last_status: "RSSI: N/A".to_string(),
        }
    }

    fn notify(&self, severity: Severity, title: &str, message: &str) {
        let stamp = Local::now().format("%H:%M:%S");
        println!("[{stamp}] {}{title}: {message}", severity.prefix());
    }

    fn ring_bell(&self) {
        // Audible failure must never crash the monitoring loop.
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }

    fn show_warning(&mut self) {
        if self.warning_active {
            return;
        }
        self.warning_active = true;
        println!();
        println!("██████████████████████████████████████████████");
        println!("██  WARNING: NO SIGNAL FROM TRACKED DEVICE  ██");
        println!("██████████████████████████████████████████████");
        println!();
    }

    fn dismiss_warning(&mut self) {
        if !self.warning_active {
            return;
        }
        self.warning_active = false;
        println!("(signal recovered, warning dismissed)");
    }

    /// Whether the full-screen warning is currently shown.
    pub fn warning_active(&self) -> bool {
        self.warning_active
    }

    /// Latest status line, tooltip-style.
    pub fn status(&self) -> &str {
        &self.last_status
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ConsoleSink {
    fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::StateChanged { to: _, reason } => match reason {
                TransitionReason::BackNear => {
                    self.notify(Severity::Near, "Device nearby", "Good signal detected.");
                }
                TransitionReason::MovedAway => {
                    self.notify(Severity::Far, "Device moving away", "Weak signal detected.");
                }
                TransitionReason::SignalLost => {
                    self.notify(
                        Severity::Lost,
                        "Signal lost",
                        "No packets from the device.",
                    );
                }
            },
            UiEvent::PeriodicAlert { state, audible } => {
                let message = match state {
                    PresenceState::Lost => "NO signal from the device.",
                    _ => "The device is far away.",
                };
                self.notify(Severity::Alert, "Alert", message);
                if audible {
                    self.ring_bell();
                }
            }
            UiEvent::Status { summary } => {
                tracing::debug!("{summary}");
                self.last_status = summary;
            }
            UiEvent::ShowWarning => self.show_warning(),
            UiEvent::DismissWarning => self.dismiss_warning(),
            UiEvent::ThresholdsChanged { base, far, near } => {
                self.notify(
                    Severity::Info,
                    "RSSI threshold updated",
                    &format!("base: {base} dBm | FAR: {far} dBm | NEAR: {near} dBm"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_prefixes() {
        assert_eq!(Severity::Near.prefix(), "🟢 ");
        assert_eq!(Severity::from(TransitionReason::SignalLost), Severity::Lost);
        assert_eq!(Severity::from(TransitionReason::MovedAway), Severity::Far);
        assert_eq!(Severity::from(TransitionReason::BackNear), Severity::Near);
    }

    #[test]
    fn test_warning_shown_once_and_dismissed() {
        let mut sink = ConsoleSink::new();
        assert!(!sink.warning_active());

        sink.handle(UiEvent::ShowWarning);
        assert!(sink.warning_active());
        // Already open: stays open, no double-show.
        sink.handle(UiEvent::ShowWarning);
        assert!(sink.warning_active());

        sink.handle(UiEvent::DismissWarning);
        assert!(!sink.warning_active());
        sink.handle(UiEvent::DismissWarning);
        assert!(!sink.warning_active());
    }

    #[test]
    fn test_status_updates_tooltip() {
        let mut sink = ConsoleSink::new();
        assert_eq!(sink.status(), "RSSI: N/A");
        sink.handle(UiEvent::Status {
            summary: "RSSI: -72.4 dBm".into(),
        });
        assert_eq!(sink.status(), "RSSI: -72.4 dBm");
    }

    #[test]
    fn test_sink_thread_drains_until_disconnect() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = spawn_sink(rx, ConsoleSink::new());
        tx.send(UiEvent::ShowWarning).unwrap();
        tx.send(UiEvent::DismissWarning).unwrap();
        drop(tx);
        handle.join().unwrap();
    }
}
