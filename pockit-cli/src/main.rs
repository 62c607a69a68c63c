mod render;
mod session;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pockit_core::config::Config;
use pockit_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use pockit_core::metrics::init_metrics;
use pockit_core::shield::{
    ChannelNotifier, ImpulseShield, ToggleOutcome, TracingNotifier, SHIELD_STATE_KEY,
};
use pockit_core::store;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pockit")]
#[command(author, version, about = "Impulse Shield: lock savings behind a cooling-off period", long_about = None)]
struct Args {
    /// Override the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the locked funds and cooldown
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Request unlock when locked, lock when unlocked
    Toggle,
    /// Interactive session with a live countdown
    Run,
    /// Forget the persisted shield state
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(data_dir) = args.data_dir {
        config.store.data_dir = data_dir;
    }

    let mut log_config = LogConfig::from_settings(&config.logging);
    if let Some(level) = &args.log_level {
        log_config.level = level.parse::<LogLevel>()?;
    }
    if args.json_logs {
        log_config = log_config.json_format(true);
    }
    init_logging_with_config(log_config)?;

    if config.metrics.enabled {
        init_metrics();
    }

    let store = store::open(&config.store).context("opening store")?;
    info!(command = ?args.command, "pockit started");

    match args.command {
        Command::Status { json } => {
            let shield = ImpulseShield::from_config(&config.shield, store, Arc::new(TracingNotifier))?;
            let snapshot = shield.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("{}", render::snapshot(&snapshot));
            }
        }
        Command::Toggle => {
            let (notifier, mut notifications) = ChannelNotifier::new();
            let mut shield =
                ImpulseShield::from_config(&config.shield, store, Arc::new(notifier))?;
            let outcome = shield.toggle();
            while let Ok(notification) = notifications.try_recv() {
                println!("{}", render::notification(&notification));
            }
            if let ToggleOutcome::Rejected { .. } = outcome {
                info!("unlock refused, cooldown still active");
            }
        }
        Command::Run => {
            let (notifier, notifications) = ChannelNotifier::new();
            let shield = ImpulseShield::from_config(&config.shield, store, Arc::new(notifier))?;
            session::run(&config, shield, notifications).await?;
        }
        Command::Reset => {
            store.remove(SHIELD_STATE_KEY)?;
            println!("Shield state cleared");
        }
    }

    info!("pockit finished");
    Ok(())
}
