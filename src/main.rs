//! Pomodoro Ambient CLI - focus timer with procedural ambient sound
//!
//! This tool helps you stay focused using the Pomodoro Technique:
//! - 25 minutes of focused work
//! - 5 minutes of short break
//! - 15 minutes of long break after 4 focus sessions
//!
//! while playing synthesized noise or looped ambient recordings.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use pomodoro_ambient::catalog::{default_catalog, filter_by_category};
use pomodoro_ambient::cli::{run_session, Cli, Commands, Display, RunArgs, SessionOptions};
use pomodoro_ambient::config::{default_assets_dir, default_settings_path, load_settings};
use pomodoro_ambient::sound::{acquire, play_effect, synthesize, ContextState, Effect};
use pomodoro_ambient::types::{NoiseKind, TimerSettings};
use pomodoro_ambient::ConfigError;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let settings_path = cli.config.clone().or_else(default_settings_path);
    let assets_dir = cli.assets.clone().unwrap_or_else(default_assets_dir);

    match cli.command {
        Some(Commands::Run(args)) => {
            run(args, settings_path, assets_dir).await?;
        }
        Some(Commands::Tracks { category }) => {
            let catalog = default_catalog(&assets_dir);
            let tracks: Vec<_> = match category {
                Some(category) => filter_by_category(&catalog, category.into()),
                None => catalog.iter().collect(),
            };
            Display::show_tracks(&tracks);
        }
        Some(Commands::Noise { kind }) => {
            play_noise(kind.into()).await?;
        }
        Some(Commands::Effect { effect }) => {
            play_single_effect(effect.into()).await?;
        }
        Some(Commands::Config) => {
            let settings = read_settings(settings_path.as_ref())?;
            let output = serde_json::json!({
                "path": settings_path,
                "assets": assets_dir,
                "settings": settings,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Loads settings, falling back to defaults without a config directory.
fn read_settings(path: Option<&PathBuf>) -> Result<TimerSettings, ConfigError> {
    match path {
        Some(path) => load_settings(path),
        None => Ok(TimerSettings::default()),
    }
}

/// Runs the interactive timer session.
async fn run(args: RunArgs, settings_path: Option<PathBuf>, assets_dir: PathBuf) -> Result<()> {
    let settings = args.apply_to(read_settings(settings_path.as_ref())?);
    settings.validate().map_err(ConfigError::Invalid)?;

    run_session(SessionOptions {
        settings,
        settings_path,
        catalog: default_catalog(&assets_dir),
        initial_track: args.track,
    })
    .await
}

/// Plays synthesized noise until Ctrl-C.
async fn play_noise(kind: NoiseKind) -> Result<()> {
    acquire().unlock();
    let mut source = synthesize(kind)
        .map_err(|e| anyhow::anyhow!("{}ノイズを再生できません: {} ({})", kind, e, e.suggestion()))?;
    source.start();

    println!("{}ノイズを再生中 (Ctrl-Cで停止)", kind);
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    source.stop();
    Ok(())
}

/// Plays one effect and waits for it to finish.
async fn play_single_effect(effect: Effect) -> Result<()> {
    let context = acquire();
    if context.state() == ContextState::Suspended {
        anyhow::bail!("オーディオデバイスが利用できません");
    }

    play_effect(effect);
    // The sink is detached; keep the process alive until it drains.
    tokio::time::sleep(tokio::time::Duration::from_secs_f32(effect.seconds() + 0.1)).await;
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
