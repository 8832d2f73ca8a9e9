//! The monitoring loop.
//!
//! One thread owns all mutable presence state. It multiplexes three inputs
//! with `crossbeam_channel::select!`: observations from the scan backend, a
//! fixed 1-second ticker driving the silence check and alert scheduling, and
//! a command channel for runtime control. Presentation happens elsewhere:
//! every user-visible effect leaves this loop as a [`UiEvent`].

use crate::config::{Config, THRESHOLD_OPTIONS};
use crate::core::alerts::AlertScheduler;
use crate::core::matcher::TargetMatcher;
use crate::core::presence::{PresenceTracker, Thresholds, Transition, TransitionReason};
use crate::scanner::types::Observation;
use crate::sink::UiEvent;
use crossbeam_channel::{never, select, tick, Receiver, Sender};
use std::time::{Duration, Instant};

/// Runtime control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Set the base threshold to one of [`THRESHOLD_OPTIONS`].
    SetBaseThreshold(i32),
    /// Toggle periodic alerting. Transition events keep firing regardless.
    ToggleAlerts,
    /// Toggle the full-screen warning on future signal loss.
    ToggleFullscreen,
    /// Graceful shutdown.
    Exit,
}

/// The monitoring engine. Single owner of tracker, scheduler and matcher.
pub struct Monitor {
    matcher: TargetMatcher,
    tracker: PresenceTracker,
    scheduler: AlertScheduler,
    fullscreen_enabled: bool,
    base_threshold: i32,
    hysteresis_db: i32,
    tick_interval: Duration,
    watch_config: bool,
    events: Sender<UiEvent>,
    sink_gone: bool,
}

impl Monitor {
    pub fn new(config: &Config, events: Sender<UiEvent>) -> Self {
        let mut scheduler = AlertScheduler::new(config.alert_interval(), config.audible_interval());
        scheduler.set_enabled(config.alerts_enabled);

        Self {
            matcher: TargetMatcher::new(config.target.clone()),
            tracker: PresenceTracker::new(
                config.thresholds(),
                config.loss_timeout(),
                config.smoothing_alpha,
            ),
            scheduler,
            fullscreen_enabled: config.fullscreen_warning,
            base_threshold: config.base_threshold_dbm,
            hysteresis_db: config.hysteresis_db,
            tick_interval: Duration::from_secs(1),
            watch_config: false,
            events,
            sink_gone: false,
        }
    }

    /// Re-read the config file on every tick so `set-threshold` and the
    /// toggle subcommands can control a running agent from another process.
    pub fn watch_config_file(mut self, enabled: bool) -> Self {
        self.watch_config = enabled;
        self
    }

    /// Override the ticker cadence (tests use a faster clock).
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Run until `Command::Exit` arrives or the command channel closes.
    ///
    /// A scan-backend disconnect is not an error: the observation receiver is
    /// parked and the silence rule drives the state to LOST on its own.
    pub fn run(mut self, observations: Receiver<Observation>, commands: Receiver<Command>) {
        tracing::info!(
            device = self.matcher.target(),
            far = self.tracker.thresholds().far(),
            near = self.tracker.thresholds().near(),
            "monitor started"
        );

        let ticker = tick(self.tick_interval);
        let mut observations = observations;

        loop {
            select! {
                recv(observations) -> msg => match msg {
                    Ok(obs) => self.handle_observation(obs),
                    Err(_) => {
                        tracing::warn!("scan backend disconnected; waiting out the loss timeout");
                        observations = never();
                    }
                },
                recv(commands) -> msg => match msg {
                    Ok(Command::Exit) => break,
                    Ok(cmd) => self.handle_command(cmd),
                    // Controller dropped: shut down rather than run unsupervised.
                    Err(_) => break,
                },
                recv(ticker) -> _ => self.handle_tick(Instant::now()),
            }
        }

        tracing::info!("monitor stopped");
    }

    fn handle_observation(&mut self, obs: Observation) {
        if !self.matcher.matches(&obs) {
            return;
        }

        let transition = self.tracker.observe(obs.rssi, obs.at);
        let smoothed = self.tracker.smoothed().unwrap_or(obs.rssi);

        tracing::debug!(
            name = obs.name.as_deref().unwrap_or(""),
            addr = %obs.address,
            raw = obs.rssi,
            smoothed,
            "observation accepted"
        );

        self.send(UiEvent::Status {
            summary: format!("RSSI: {smoothed:.1} dBm"),
        });

        if let Some(tr) = transition {
            self.emit_transition(tr);
        }
    }

    fn handle_tick(&mut self, now: Instant) {
        if let Some(tr) = self.tracker.tick(now) {
            self.emit_transition(tr);
        }

        if let Some(alert) = self.scheduler.poll(self.tracker.state(), now) {
            self.send(UiEvent::PeriodicAlert {
                state: alert.state,
                audible: alert.audible,
            });
        }

        if self.watch_config {
            self.poll_config_file();
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SetBaseThreshold(base) => {
                if self.apply_base_threshold(base) {
                    self.persist(|config, monitor| {
                        config.base_threshold_dbm = monitor.base_threshold;
                    });
                }
            }
            Command::ToggleAlerts => {
                let enabled = !self.scheduler.enabled();
                self.scheduler.set_enabled(enabled);
                tracing::info!(enabled, "periodic alerts toggled");
                self.persist(|config, _| config.alerts_enabled = enabled);
            }
            Command::ToggleFullscreen => {
                self.fullscreen_enabled = !self.fullscreen_enabled;
                tracing::info!(enabled = self.fullscreen_enabled, "full-screen warning toggled");
                self.persist(|config, monitor| {
                    config.fullscreen_warning = monitor.fullscreen_enabled;
                });
            }
            // Exit is consumed by run() before dispatch.
            Command::Exit => {}
        }
    }

    /// Apply a new base threshold. Both derived thresholds change in one
    /// swap, so no rule evaluation ever sees near < far.
    fn apply_base_threshold(&mut self, base: i32) -> bool {
        if !THRESHOLD_OPTIONS.contains(&base) {
            tracing::warn!(base, "rejected base threshold outside the menu");
            return false;
        }
        if base == self.base_threshold {
            return false;
        }

        self.base_threshold = base;
        let thresholds = Thresholds::new(base, self.hysteresis_db);
        self.tracker.set_thresholds(thresholds);

        tracing::info!(
            base,
            far = thresholds.far(),
            near = thresholds.near(),
            "thresholds updated"
        );
        self.send(UiEvent::ThresholdsChanged {
            base,
            far: thresholds.far() as i32,
            near: thresholds.near() as i32,
        });
        true
    }

    /// Pick up changes written to the config file by another process.
    fn poll_config_file(&mut self) {
        let Ok(config) = Config::load() else {
            return;
        };

        if config.base_threshold_dbm != self.base_threshold {
            self.apply_base_threshold(config.base_threshold_dbm);
        }
        if config.alerts_enabled != self.scheduler.enabled() {
            self.scheduler.set_enabled(config.alerts_enabled);
            tracing::info!(enabled = config.alerts_enabled, "periodic alerts toggled");
        }
        if config.fullscreen_warning != self.fullscreen_enabled {
            self.fullscreen_enabled = config.fullscreen_warning;
            tracing::info!(
                enabled = self.fullscreen_enabled,
                "full-screen warning toggled"
            );
        }
    }

    fn emit_transition(&mut self, tr: Transition) {
        tracing::info!(to = %tr.to, "presence transition");
        self.send(UiEvent::StateChanged {
            to: tr.to,
            reason: tr.reason,
        });

        match tr.reason {
            TransitionReason::SignalLost => {
                if self.fullscreen_enabled {
                    self.send(UiEvent::ShowWarning);
                }
            }
            // Recovery dismisses the warning only on the NEAR transition; a
            // weak-but-present signal after a loss goes FAR and leaves the
            // warning up.
            TransitionReason::BackNear => self.send(UiEvent::DismissWarning),
            TransitionReason::MovedAway => {}
        }
    }

    /// Mutate and save the on-disk config. Save failures are logged, never
    /// fatal.
    fn persist(&self, update: impl FnOnce(&mut Config, &Self)) {
        let mut config = Config::load_or_default();
        update(&mut config, self);
        if let Err(e) = config.save() {
            tracing::warn!("could not persist config: {e}");
        }
    }

    fn send(&mut self, event: UiEvent) {
        if self.events.send(event).is_err() && !self.sink_gone {
            self.sink_gone = true;
            tracing::warn!("presentation sink disconnected; events are dropped");
        }
    }
}

/// Convenience wrapper: build a monitor from config and run it.
pub fn run(
    config: &Config,
    observations: Receiver<Observation>,
    commands: Receiver<Command>,
    events: Sender<UiEvent>,
) {
    Monitor::new(config, events)
        .watch_config_file(true)
        .run(observations, commands)
}
