// ABOUTME: Server binary for the LinkedIn MCP OAuth correlation server
// ABOUTME: Loads configuration, opens the token store, and serves the OAuth endpoints over HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # LinkedIn MCP OAuth Server Binary
//!
//! Starts the authorization server in standard or proxy mode, backed by the
//! in-memory or SQLite token store.

use anyhow::{Context, Result};
use clap::Parser;
use linkedin_mcp_server::{
    config::{OAuthMode, ServerConfig},
    logging,
    oauth2_client::LinkedInOAuthClient,
    oauth2_server::build_provider,
    routes::build_router,
    store::{open_store, spawn_reaper},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "linkedin-mcp-server")]
#[command(about = "LinkedIn MCP OAuth server - correlates MCP authorization with LinkedIn")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Hand LinkedIn tokens to clients instead of issuing local tokens
    #[arg(long)]
    proxy_mode: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if args.proxy_mode {
        config.mode = OAuthMode::Proxy;
    }

    info!("Starting LinkedIn MCP OAuth server");
    info!("{}", config.summary());

    let store = open_store(&config.store.backend)
        .await
        .context("Failed to open token store")?;
    let reaper = spawn_reaper(
        Arc::clone(&store),
        Duration::from_secs(config.store.reaper_interval_secs),
    );

    let client = LinkedInOAuthClient::new(config.linkedin.clone(), &config.http_client)
        .context("Failed to build LinkedIn OAuth client")?;
    let provider = build_provider(config.mode, store, Arc::new(client));
    let app = build_router(provider, &config.server_url);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;
    info!("OAuth server listening on {addr}");
    info!(
        "Authorization server metadata: {}/.well-known/oauth-authorization-server",
        config.server_url
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    reaper.shutdown().await;
    served.context("HTTP server error")?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
