//! Presence Agent CLI
//!
//! Background BLE proximity monitor with debounced presence alerts.

use clap::{Parser, Subcommand};
use crossbeam_channel::{bounded, unbounded, Sender};
use presence_agent::{
    config::{Config, THRESHOLD_OPTIONS},
    monitor::{self, Command},
    scanner::ReplayScanner,
    sink::{spawn_sink, ConsoleSink},
    VERSION,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "presence-agent")]
#[command(version = VERSION)]
#[command(about = "Background BLE proximity monitor with debounced presence alerts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring the tracked device
    Start {
        /// Tracked device: name fragment or hardware address
        #[arg(long)]
        target: Option<String>,

        /// Advertisement trace to replay (radio backends are external)
        #[arg(long)]
        replay: PathBuf,
    },

    /// Set the base RSSI threshold (takes effect on a running agent)
    SetThreshold {
        /// Base threshold in dBm, one of the fixed menu values
        dbm: i32,
    },

    /// Toggle periodic alerts on or off
    ToggleAlerts,

    /// Toggle the full-screen warning on signal loss
    ToggleFullscreen,

    /// Show current configuration and derived thresholds
    Status,

    /// Show raw configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { target, replay } => cmd_start(target, replay),
        Commands::SetThreshold { dbm } => cmd_set_threshold(dbm),
        Commands::ToggleAlerts => cmd_toggle(ToggleKind::Alerts),
        Commands::ToggleFullscreen => cmd_toggle(ToggleKind::Fullscreen),
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
    }
}

fn cmd_start(target: Option<String>, replay: PathBuf) {
    println!("Presence Agent v{VERSION}");
    println!();

    let mut config = Config::load_or_default();
    if let Some(target) = target {
        config.target = target;
        // Remember the target for the control subcommands and the next run.
        if let Err(e) = config.save() {
            eprintln!("Warning: could not save config: {e}");
        }
    }

    if config.target.trim().is_empty() {
        eprintln!("Error: no tracked device configured.");
        eprintln!("Pass --target <name-or-address> (e.g. --target holy-iot).");
        std::process::exit(1);
    }

    let thresholds = config.thresholds();
    println!("  Target: {}", config.target);
    println!(
        "  Thresholds: base {} dBm (FAR below {}, NEAR above {})",
        config.base_threshold_dbm,
        thresholds.far(),
        thresholds.near()
    );
    println!("  Loss timeout: {}s", config.loss_timeout_secs);
    println!(
        "  Periodic alerts: {} (every {}s, audible every {}s)",
        if config.alerts_enabled { "enabled" } else { "disabled" },
        config.alert_interval_secs,
        config.audible_interval_secs
    );
    println!("  Replay trace: {}", replay.display());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let mut scanner = match ReplayScanner::from_file(&replay) {
        Ok(scanner) => scanner,
        Err(e) => {
            eprintln!("Error loading replay trace: {e}");
            std::process::exit(1);
        }
    };

    let (commands_tx, commands_rx) = unbounded();
    let (events_tx, events_rx) = bounded(1_024);

    // Presentation runs on its own thread; the monitor never touches it.
    let sink_handle = spawn_sink(events_rx, ConsoleSink::new());

    ctrlc_handler(commands_tx.clone());

    if let Err(e) = scanner.start() {
        eprintln!("Error starting scanner: {e}");
        std::process::exit(1);
    }

    let observations = scanner.receiver().clone();
    monitor::run(&config, observations, commands_rx, events_tx);

    println!();
    println!("Stopping...");
    scanner.stop();
    let _ = sink_handle.join();
}

fn cmd_set_threshold(dbm: i32) {
    if !THRESHOLD_OPTIONS.contains(&dbm) {
        eprintln!("Error: {dbm} dBm is not a selectable threshold.");
        eprintln!("Options: {THRESHOLD_OPTIONS:?}");
        std::process::exit(1);
    }

    let mut config = Config::load_or_default();
    config.base_threshold_dbm = dbm;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }

    let thresholds = config.thresholds();
    println!(
        "Base threshold set to {dbm} dBm (FAR below {}, NEAR above {}).",
        thresholds.far(),
        thresholds.near()
    );
    println!("A running agent picks this up within a second.");
}

enum ToggleKind {
    Alerts,
    Fullscreen,
}

fn cmd_toggle(kind: ToggleKind) {
    let mut config = Config::load_or_default();
    let (name, now_enabled) = match kind {
        ToggleKind::Alerts => {
            config.alerts_enabled = !config.alerts_enabled;
            ("Periodic alerts", config.alerts_enabled)
        }
        ToggleKind::Fullscreen => {
            config.fullscreen_warning = !config.fullscreen_warning;
            ("Full-screen warning", config.fullscreen_warning)
        }
    };

    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!(
        "{name}: {}.",
        if now_enabled { "enabled" } else { "disabled" }
    );
}

fn cmd_status() {
    let config = Config::load_or_default();
    let thresholds = config.thresholds();

    println!("Presence Agent Status");
    println!("=====================");
    println!();
    println!(
        "Target: {}",
        if config.target.is_empty() {
            "(not configured)"
        } else {
            &config.target
        }
    );
    println!("Base threshold: {} dBm", config.base_threshold_dbm);
    println!("  FAR below:  {} dBm", thresholds.far());
    println!("  NEAR above: {} dBm", thresholds.near());
    println!("Hysteresis gap: {} dB", config.hysteresis_db);
    println!("Smoothing alpha: {}", config.smoothing_alpha);
    println!("Loss timeout: {}s", config.loss_timeout_secs);
    println!(
        "Periodic alerts: {} (every {}s, audible every {}s)",
        if config.alerts_enabled { "enabled" } else { "disabled" },
        config.alert_interval_secs,
        config.audible_interval_secs
    );
    println!(
        "Full-screen warning: {}",
        if config.fullscreen_warning { "enabled" } else { "disabled" }
    );
    println!();
    println!("Threshold menu: {THRESHOLD_OPTIONS:?}");
}

fn cmd_config() {
    let config = Config::load_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(commands: Sender<Command>) {
    ctrlc::set_handler(move || {
        let _ = commands.send(Command::Exit);
    })
    .expect("Error setting Ctrl+C handler");
}
