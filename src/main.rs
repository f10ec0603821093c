//! multi-caddy
//!
//! Aggregates per-tenant Caddyfile fragments into one configuration and
//! keeps a single Caddy process reloaded as tenants change.
//!
//! # Architecture Overview
//!
//! ```text
//!   tenant dirs ──▶ synthesis ──▶ aggregate ──▶ reload ──▶ caddy
//!   (Caddyfile)     (RuleSet)     (caddy.txt)   (signal,    (one child)
//!        ▲                                       log)
//!        │                                        │
//!        └──── watch (notify) ◀── watch set ──────┘
//!
//!   Cross-cutting: config (TOML + --remap), observability (tracing,
//!   metrics), lifecycle (signals, shutdown), admin API (axum)
//! ```

use std::path::PathBuf;

use clap::Parser;

use multi_caddy::config::{ObservabilityConfig, RuleConfig};
use multi_caddy::lifecycle::signals::spawn_signal_handler;
use multi_caddy::lifecycle::startup::{build_config, parse_remap};
use multi_caddy::observability::{logging, metrics};
use multi_caddy::{Daemon, Shutdown};

#[derive(Parser)]
#[command(name = "multi-caddy")]
#[command(about = "Serve many tenants' Caddyfiles from one Caddy process", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rewrite rule GLOB,PATTERN[,DEFAULT]; may be repeated
    #[arg(short, long, value_parser = parse_remap)]
    remap: Vec<RuleConfig>,

    /// Print the aggregate once and exit without starting the server
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match build_config(cli.config.as_deref(), cli.remap) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Configuration rejected");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        rules = config.rules.len(),
        aggregate = %config.output.aggregate_path.display(),
        "multi-caddy starting"
    );

    let metrics_address = config
        .observability
        .metrics_enabled
        .then(|| config.observability.metrics_address.clone());

    let daemon = Daemon::new(config)?;

    if cli.check {
        print!("{}", daemon.render());
        return Ok(());
    }

    if let Some(address) = metrics_address {
        match address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    daemon.run(&shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
