//! Queuebase Gateway Server
//!
//! Entry point for the queuebase-gateway server: loads configuration,
//! registers the built-in jobs and serves the signed job route.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use queuebase_gateway::{build_router, GatewayState};
use queuebase_job_queue::JobRegistry;
use tokio::net::TcpListener;

mod cli;
mod config_helpers;
mod tracing_setup;

use cli::CliArgs;
use config_helpers::{authenticator_from_config, parse_bind_address};
use tracing_setup::install_tracing_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = load_config(args.config_path.as_deref())?;
    queuebase_config::validate_config(&config).context("invalid configuration")?;

    if args.check_config {
        println!("configuration OK");
        return Ok(());
    }

    install_tracing_from_config(&config.logging);

    let registry = queuebase_jobs::register_builtin_jobs(JobRegistry::builder(), &config.jobs)
        .build()
        .context("failed to build job registry")?;
    tracing::info!(jobs = ?registry.names().collect::<Vec<_>>(), "job registry ready");

    let authenticator = authenticator_from_config(&config.auth);
    let state = GatewayState::from_config(registry, authenticator, &config.gateway);

    tracing::info!(
        path = %config.gateway.path,
        body_limit_bytes = config.gateway.body_limit_bytes,
        invocation_timeout_secs = ?config.gateway.invocation_timeout_secs,
        "gateway configured"
    );

    let app = build_router(Arc::new(state), &config.gateway.path);

    let addr = parse_bind_address(&config.server.host, config.server.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Load configuration from file or defaults.
fn load_config(path: Option<&str>) -> anyhow::Result<queuebase_config::Config> {
    queuebase_config::load_config(path).map_err(|e| {
        eprintln!("failed to load configuration: {e}");
        anyhow::anyhow!(e.to_string())
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(%e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
