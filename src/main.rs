//! Trippe gateway - registration email proxy
//!
//! Accepts registration-email requests from the booking frontend, maps them
//! onto the ZeptoMail template, and relays the vendor's answer.
//!
//! Module structure:
//! - `domain/` - Request/response DTOs and booking rules
//! - `io/` - HTTP server and vendor clients
//! - `services/` - Dispatch, aggregation, location acquisition
//! - `infra/` - Config, logging, metrics

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use trippe_gateway::infra::config::{ENV_ZEPTO_API_KEY, ENV_ZEPTO_TEMPLATE_KEY};
use trippe_gateway::infra::logging::init_tracing;
use trippe_gateway::infra::{Config, Metrics};
use trippe_gateway::io::{start_api_server, ApiState, ZeptoMailClient};
use trippe_gateway::services::EmailDispatcher;

/// Trippe gateway - ZeptoMail registration email proxy
#[derive(Parser, Debug)]
#[command(name = "trippe-gateway", version, about)]
struct Args {
    /// Path to TOML configuration file (default: $CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing("info", args.json_logs);

    info!(git_hash = env!("GIT_HASH"), "trippe-gateway starting");

    let config = Config::load(args.config.as_deref());
    let api_key = config
        .zepto_api_key()
        .with_context(|| format!("{ENV_ZEPTO_API_KEY} is not set"))?
        .to_string();
    let template_key = config
        .zepto_template_key()
        .with_context(|| format!("{ENV_ZEPTO_TEMPLATE_KEY} is not set"))?
        .to_string();
    let addr = config.bind_addr()?;

    info!(
        config_file = %config.config_file(),
        addr = %addr,
        zepto_api_url = %config.zepto_api_url(),
        from_address = %config.from_address(),
        cors_allow_origin = %config.cors_allow_origin(),
        max_body_bytes = %config.max_body_bytes(),
        "config_loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let metrics = Arc::new(Metrics::new());

    let mailer = ZeptoMailClient::new(config.zepto_api_url(), &api_key);
    let dispatcher =
        EmailDispatcher::new(mailer, config.from_address(), config.from_name(), &template_key);
    let state = Arc::new(ApiState::new(
        dispatcher,
        metrics.clone(),
        config.service_name(),
        config.cors_allow_origin(),
        config.max_body_bytes(),
    ));

    // Periodic metrics log line
    let metrics_interval = config.metrics_interval_secs();
    if metrics_interval > 0 {
        let reporter = metrics.clone();
        let mut reporter_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => reporter.report().log(),
                    _ = reporter_shutdown.changed() => break,
                }
            }
        });
    }

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = start_api_server(addr, state, shutdown_rx).await {
        error!(error = %e, "api_server_error");
        return Err(anyhow::anyhow!(e));
    }

    metrics.report().log();
    info!("trippe-gateway shutdown complete");
    Ok(())
}
