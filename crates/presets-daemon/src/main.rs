//! Display Presets host entry point.
//!
//! Wires the infrastructure adapters into a [`PresetService`] and dispatches
//! one CLI subcommand through the command bridge.  Every command prints its
//! [`CommandResult`] as JSON on stdout; failures also set a non-zero exit
//! status.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()              -- TOML config, CLI/env overrides
//!  └─ PresetService::new()       -- JSON repository + shortcut registry
//!  └─ AppState::new()            -- hardware provider + plan executor
//!  └─ reload + refresh live state
//!  └─ dispatch subcommand
//!       └─ watch: event printer + Ctrl-C flag + run_watch()
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use presets_daemon::application::apply_preset::HardwareStateProvider;
use presets_daemon::application::preset_service::PresetService;
use presets_daemon::infrastructure::command_bridge::{self as bridge, AppState, CommandResult};
use presets_daemon::infrastructure::hardware::{
    FileHardwareProvider, PlanFileExecutor, PlanTarget, StaticHardwareProvider,
};
use presets_daemon::infrastructure::monitor::{run_watch, WatchSettings};
use presets_daemon::infrastructure::shortcuts::InMemoryShortcutRegistry;
use presets_daemon::infrastructure::storage::config::{config_file_path, load_config};
use presets_daemon::infrastructure::storage::presets_file::JsonPresetRepository;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Save, list and re-apply multi-monitor arrangements.
#[derive(Debug, Parser)]
#[command(
    name = "display-presets",
    about = "Named multi-monitor display presets",
    version
)]
struct Cli {
    /// Config file; defaults to the platform config directory.
    #[arg(long, env = "DISPLAY_PRESETS_CONFIG")]
    config: Option<PathBuf>,

    /// Presets file; overrides the config file setting.
    #[arg(short, long, env = "DISPLAY_PRESETS_FILE")]
    presets_file: Option<PathBuf>,

    /// JSON list of live outputs written by the hardware tool.
    #[arg(long, env = "DISPLAY_PRESETS_HARDWARE_STATE")]
    hardware_state: Option<PathBuf>,

    /// Where `apply` writes the mutation plan; stderr when omitted.
    #[arg(long, env = "DISPLAY_PRESETS_PLAN_OUTPUT")]
    plan_output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// List every preset with availability and currency.
    List,
    /// Show one preset including its outputs.
    Show { id: String },
    /// Check whether a preset with this name exists.
    Exists { name: String },
    /// Capture the current hardware state under NAME.
    Save {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Delete a preset.
    Delete { id: String },
    /// Rename a preset.
    Rename { id: String, name: String },
    /// Change a preset's description.
    Describe { id: String, description: String },
    /// Set a preset's shortcut, e.g. "Meta+1"; omit COMBO to clear it.
    Shortcut { id: String, combo: Option<String> },
    /// Apply a preset to the connected outputs.
    Apply { id: String },
    /// Watch the presets file and hardware state, printing events.
    Watch,
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_result<T: Serialize>(result: CommandResult<T>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&result).context("failed to encode result")?;
    println!("{json}");
    match result.error {
        Some(e) if !result.success => anyhow::bail!(e),
        _ => Ok(()),
    }
}

/// The plan never goes to stdout, which carries exactly one result document.
fn plan_target(plan_output: Option<PathBuf>) -> PlanTarget {
    match plan_output {
        Some(path) => PlanTarget::File(path),
        None => PlanTarget::Stderr,
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => config_file_path().context("no --config given")?,
    };
    let config = load_config(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.daemon.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let presets_file = cli
        .presets_file
        .clone()
        .unwrap_or_else(|| config.presets_file(&config_path));
    let hardware_state = cli
        .hardware_state
        .clone()
        .or_else(|| config.monitor.hardware_state_file.clone());

    info!(
        presets = %presets_file.display(),
        hardware = ?hardware_state,
        "display presets starting"
    );

    // ── Wiring ────────────────────────────────────────────────────────────────
    let (service, mut events) = PresetService::new(
        Box::new(JsonPresetRepository::new(&presets_file)),
        Box::new(InMemoryShortcutRegistry::new()),
    );
    let hardware: Arc<dyn HardwareStateProvider> = match &hardware_state {
        Some(path) => Arc::new(FileHardwareProvider::new(path)),
        None => Arc::new(StaticHardwareProvider::unconfigured()),
    };
    let target = plan_target(cli.plan_output.clone());
    let state = AppState::new(service, hardware, Arc::new(PlanFileExecutor::new(target)));

    if let Some(e) = bridge::reload_presets(Arc::clone(&state)).await.error {
        anyhow::bail!("failed to load presets: {e}");
    }
    if hardware_state.is_some() {
        if let Some(e) = bridge::refresh_live_state(Arc::clone(&state)).await.error {
            warn!("starting without live state: {e}");
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────
    let outcome = match cli.command {
        Command::List => print_result(bridge::list_presets(Arc::clone(&state)).await),
        Command::Show { id } => print_result(bridge::get_preset(Arc::clone(&state), id).await),
        Command::Exists { name } => {
            print_result(bridge::preset_exists(Arc::clone(&state), name).await)
        }
        Command::Save { name, description } => {
            print_result(bridge::save_preset(Arc::clone(&state), name, description).await)
        }
        Command::Delete { id } => print_result(bridge::delete_preset(Arc::clone(&state), id).await),
        Command::Rename { id, name } => {
            print_result(bridge::rename_preset(Arc::clone(&state), id, name).await)
        }
        Command::Describe { id, description } => {
            print_result(bridge::set_description(Arc::clone(&state), id, description).await)
        }
        Command::Shortcut { id, combo } => {
            print_result(bridge::set_shortcut(Arc::clone(&state), id, combo).await)
        }
        Command::Apply { id } => print_result(bridge::apply_preset(Arc::clone(&state), id).await),
        Command::Watch => {
            // ── Event printer ─────────────────────────────────────────────────
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{line}"),
                        Err(e) => error!("failed to encode event: {e}"),
                    }
                }
            });

            // ── Ctrl-C handler ────────────────────────────────────────────────
            let running = Arc::new(AtomicBool::new(true));
            let running_clone = Arc::clone(&running);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("shutdown signal received");
                        running_clone.store(false, Ordering::Relaxed);
                    }
                    Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
                }
            });

            let settings = WatchSettings {
                presets_file,
                hardware_state_file: hardware_state,
                debounce: config.monitor.debounce(),
                poll_interval: config.monitor.poll_interval(),
            };
            run_watch(Arc::clone(&state), settings, running).await;
            Ok(())
        }
    };

    state.service.lock().await.release_shortcuts();
    info!("display presets stopped");
    outcome
}

// ── Tests ─────────────────────────────────────────────────────────────────────
