// ABOUTME: Health check route handlers for service monitoring
// ABOUTME: Reports liveness and the active OAuth mode
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Health check routes for load balancers and monitoring

use crate::config::OAuthMode;
use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health check route
    pub fn routes(mode: OAuthMode) -> Router {
        let health_handler = move || async move {
            Json::<Value>(json!({
                "status": "healthy",
                "mode": mode.as_str(),
                "timestamp": Utc::now().to_rfc3339()
            }))
        };

        Router::new().route("/health", get(health_handler))
    }
}
