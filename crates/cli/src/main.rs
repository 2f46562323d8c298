//! GroupWarden CLI — the main entry point.
//!
//! Commands:
//! - `daemon`   — Poll and reconcile until interrupted
//! - `once`     — Run a single reconciliation pass
//! - `status`   — Show the effective configuration
//! - `doctor`   — Diagnose configuration and connectivity
//! - `onboard`  — Write a default config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "groupwarden",
    about = "GroupWarden — keeps every Mealie user in a group of their own",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config.toml (defaults to ~/.groupwarden/config.toml)
    #[arg(short, long, global = true, env = "GROUPWARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// Exit on the first failed tick instead of logging and continuing
    #[arg(long, global = true)]
    fail_fast: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the server and reconcile groups until interrupted
    Daemon,

    /// Run one reconciliation pass and exit
    Once {
        /// Print the tick report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Status,

    /// Diagnose configuration and server connectivity
    Doctor,

    /// Write a default configuration file
    Onboard,
}

fn init_tracing(logging: &groupwarden_config::LoggingConfig, verbose: bool) {
    let filter = if verbose { "debug" } else { logging.level.as_str() };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let loaded = groupwarden_config::AppConfig::load_with_path(cli.config.as_deref());
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging, cli.verbose);

    if let Commands::Onboard = cli.command {
        return commands::onboard::run(cli.config.as_deref()).await;
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(groupwarden_config::AppConfig::config_path);
    if !config_path.exists() {
        tracing::info!(
            path = %config_path.display(),
            "No config file found, using defaults and environment"
        );
    }

    if let Commands::Doctor = cli.command {
        return commands::doctor::run(loaded).await;
    }

    let mut config = loaded.map_err(|e| format!("Failed to load config: {e}"))?;
    if cli.fail_fast {
        config.poll.fail_fast = true;
    }

    match cli.command {
        Commands::Daemon => commands::daemon::run(config).await?,
        Commands::Once { json } => commands::once::run(config, json).await?,
        Commands::Status => commands::status::run(&config, cli.config.as_deref())?,
        Commands::Doctor | Commands::Onboard => {}
    }

    Ok(())
}
