#![cfg_attr(test, allow(clippy::unwrap_used))]

//! holdon - Distraction-blocker operator CLI.
//!
//! Talks to the holdon daemon over its Unix socket: inspect the temporary
//! whitelist and access journal, fetch decision traces, grant manual
//! exemptions, and stop the daemon.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use holdon_core::config::{self, HoldonConfig};
use tracing_subscriber::EnvFilter;

mod client;
mod commands;

use client::DaemonClient;

/// holdon - distraction blocker control
#[derive(Parser, Debug)]
#[command(name = "holdon")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "holdon.toml")]
    config: PathBuf,

    /// Path to the daemon's Unix socket
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the daemon is up
    Ping,

    /// Show daemon status
    Status,

    /// List temporary exemptions
    #[command(alias = "wl")]
    Whitelist,

    /// Show the access journal
    Logs,

    /// Show granted minutes for today
    Usage,

    /// Print the decision trace for one navigation
    Trace {
        /// Correlation (log) id from a navigation decision
        log_id: String,
    },

    /// Grant a temporary exemption by hand
    Allow {
        /// Domain to exempt (normalized, e.g. reddit.com)
        domain: String,
        /// Duration in minutes
        minutes: u32,
    },

    /// Record a deny decision for an intercepted tab
    Block {
        /// Tab showing the friction screen
        tab_id: u32,
        /// Journal entry to resolve as blocked
        #[arg(long)]
        log_id: Option<String>,
    },

    /// Stop the daemon (graceful shutdown)
    Kill,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone())),
        )
        .init();

    let config = if cli.config.exists() {
        HoldonConfig::from_file(&cli.config)
            .with_context(|| format!("loading config from {}", cli.config.display()))?
    } else {
        HoldonConfig::default()
    };

    let home = config::resolve_holdon_home();
    let socket_path = cli
        .socket
        .unwrap_or_else(|| config::normalize_path(&config.daemon.socket, &home));
    let client = DaemonClient::new(&socket_path);

    match cli.command {
        Commands::Ping => commands::ping(&client),
        Commands::Status => commands::status(&client),
        Commands::Whitelist => commands::whitelist(&client),
        Commands::Logs => commands::logs(&client),
        Commands::Usage => commands::usage(&client),
        Commands::Trace { log_id } => commands::trace(&client, log_id),
        Commands::Allow { domain, minutes } => commands::allow(&client, domain, minutes),
        Commands::Block { tab_id, log_id } => commands::block(&client, tab_id, log_id),
        Commands::Kill => commands::kill(&client),
    }
}
