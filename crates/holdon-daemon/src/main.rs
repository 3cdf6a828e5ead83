//! holdon-daemon - Distraction-blocker engine daemon.
//!
//! Hosts the blocking-decision engine behind a Unix domain socket. The
//! browser shim forwards navigation starts, resolution messages from the
//! friction screen, and tab closures; the CLI uses the same socket for
//! status and debugging.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use holdon_core::config::{self, HoldonConfig};
use holdon_daemon::server::Server;
use holdon_daemon::state::DaemonStateHandle;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// holdon daemon - navigation interception engine
#[derive(Parser, Debug)]
#[command(name = "holdon-daemon")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults are used if it does not exist)
    #[arg(short, long, default_value = "holdon.toml")]
    config: PathBuf,

    /// Path to the Unix socket (overrides config)
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Directory for durable state files (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone())),
        )
        .init();

    let mut config = if args.config.exists() {
        HoldonConfig::from_file(&args.config)
            .with_context(|| format!("loading config from {}", args.config.display()))?
    } else {
        info!(path = %args.config.display(), "no config file, using defaults");
        HoldonConfig::default()
    };
    if let Some(socket) = args.socket {
        config.daemon.socket = socket;
    }
    if let Some(data_dir) = args.data_dir {
        config.daemon.data_dir = data_dir;
    }
    config.validate().context("validating config")?;

    let home = config::resolve_holdon_home();
    let socket_path = config::normalize_path(&config.daemon.socket, &home);
    let data_dir = config::normalize_path(&config.daemon.data_dir, &home);
    let pid_file = config::normalize_path(&config.daemon.pid_file, &home);

    info!(
        socket = %socket_path.display(),
        data_dir = %data_dir.display(),
        blocked_domains = config.blocked().len(),
        "starting holdon daemon"
    );

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    if let Err(e) = std::fs::write(&pid_file, std::process::id().to_string()) {
        warn!(error = %e, "failed to write pid file");
    }

    let state = Arc::new(DaemonStateHandle::new(&config, data_dir));

    // Signal handling: either signal requests the same graceful shutdown
    // the IPC Shutdown message does.
    {
        let state = state.clone();
        let mut sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
        let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => info!("SIGINT received"),
                _ = sigterm.recv() => info!("SIGTERM received"),
            }
            state.request_shutdown();
        });
    }

    let server = Server::bind(&socket_path, state.clone())
        .with_context(|| format!("binding {}", socket_path.display()))?;
    server.run().await;

    if let Err(e) = std::fs::remove_file(&pid_file) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(error = %e, "failed to remove pid file");
        }
    }
    info!("holdon daemon stopped");
    Ok(())
}
