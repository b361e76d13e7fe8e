//! farmctl: remote control of a farming worker over Telegram.
//!
//! # Architecture Overview
//!
//! ```text
//!   Telegram ──▶ channel ──▶ routing ──▶ security gate ──▶ handler
//!      ▲                                                   │
//!      │                        ┌──────────────────────────┼──────────────┐
//!      │                        ▼                          ▼              ▼
//!      │                  ConfigStore                 ProxyStore     WorkerHandle
//!      │                 (config.json)               (proxy.txt)         │
//!      │                                                  │              │
//!      │                                            LiveProxies ◀── worker activity
//!      │                                                                 │
//!      └────────────────────────── reply ◀───────────────────────────────┘
//!
//!   lifecycle: orchestrator supervises channel + worker, ordered shutdown
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use farmctl::channel::TelegramChannel;
use farmctl::config::{self, validation::validate_settings, ControlSettings, Credentials, SettingsError};
use farmctl::lifecycle::{self, signals, StartupError};
use farmctl::observability::{logging, metrics};
use farmctl::worker::ProcessWorker;

#[derive(Parser, Debug)]
#[command(name = "farmctl")]
#[command(about = "Telegram control bot for the farming worker", long_about = None)]
struct Cli {
    /// TOML settings file.
    #[arg(short, long, env = "FARMCTL_SETTINGS")]
    settings: Option<PathBuf>,

    /// Worker configuration file (JSON object).
    #[arg(long, env = "FARMCTL_CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// Proxy list file, one URI per line.
    #[arg(long, env = "FARMCTL_PROXY_FILE")]
    proxy_file: Option<PathBuf>,

    /// Seconds to wait before starting the worker.
    #[arg(long, env = "FARMCTL_STARTUP_DELAY")]
    startup_delay_secs: Option<u64>,

    /// Program that performs the farming work.
    #[arg(long, env = "FARMCTL_WORKER_COMMAND")]
    worker_command: Option<String>,

    /// Argument for the worker program (repeatable).
    #[arg(long = "worker-arg", allow_hyphen_values = true)]
    worker_args: Vec<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "FARMCTL_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn settings(&self) -> Result<ControlSettings, SettingsError> {
        let mut settings = match &self.settings {
            Some(path) => config::load_settings(path)?,
            None => ControlSettings::default(),
        };

        if let Some(path) = &self.config_file {
            settings.storage.config_path = path.clone();
        }
        if let Some(path) = &self.proxy_file {
            settings.storage.proxy_path = path.clone();
        }
        if let Some(secs) = self.startup_delay_secs {
            settings.worker.startup_delay_secs = secs;
        }
        if let Some(command) = &self.worker_command {
            settings.worker.command = Some(command.clone());
        }
        if !self.worker_args.is_empty() {
            settings.worker.args = self.worker_args.clone();
        }
        if let Some(level) = &self.log_level {
            settings.observability.log_level = level.clone();
        }

        validate_settings(&settings).map_err(SettingsError::Validation)?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = cli.settings();
    let level = settings
        .as_ref()
        .map(|s| s.observability.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    logging::init(&level);

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    if let Err(e) = run(settings).await {
        tracing::error!(error = %e, "Startup failed");
        return Err(e.into());
    }
    Ok(())
}

async fn run(settings: Result<ControlSettings, SettingsError>) -> Result<(), StartupError> {
    let settings = settings?;

    tracing::info!(
        config_path = %settings.storage.config_path.display(),
        proxy_path = %settings.storage.proxy_path.display(),
        startup_delay_secs = settings.worker.startup_delay_secs,
        worker_command = ?settings.worker.command,
        "farmctl v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let credentials = Credentials::from_env()?;

    if settings.observability.metrics_enabled {
        if let Ok(addr) = settings.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let channel = Arc::new(TelegramChannel::new(
        &credentials.bot_token,
        &settings.telegram,
    )?);
    let worker = Arc::new(ProcessWorker::new(
        settings.worker.command.clone(),
        settings.worker.args.clone(),
        settings.storage.config_path.clone(),
        settings.storage.proxy_path.clone(),
    ));

    let orchestrator = lifecycle::assemble(&settings, credentials.admins, channel, worker).await;
    orchestrator.run(signals::wait_for_stop()).await;
    Ok(())
}
