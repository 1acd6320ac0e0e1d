// ABOUTME: Route module organization for the LinkedIn MCP OAuth server
// ABOUTME: Assembles OAuth and health routes into one traced axum router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Health check routes
pub mod health;
/// OAuth 2.0 authorization server routes
pub mod oauth2;

pub use health::HealthRoutes;
pub use oauth2::{OAuth2Routes, OAuthRouteState};

use crate::oauth2_server::CorrelationProvider;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the complete HTTP router around `provider`
pub fn build_router(provider: Arc<dyn CorrelationProvider>, server_url: &str) -> Router {
    let mode = provider.mode();
    Router::new()
        .merge(OAuth2Routes::routes(OAuthRouteState::new(provider, server_url)))
        .merge(HealthRoutes::routes(mode))
        .layer(TraceLayer::new_for_http())
}
