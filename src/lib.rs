// ABOUTME: Main library entry point for the LinkedIn MCP OAuth correlation server
// ABOUTME: Links MCP client authorization to LinkedIn member authorization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # LinkedIn MCP OAuth Server
//!
//! An OAuth 2.0 authorization server for MCP clients whose users authorize
//! with LinkedIn. A local authorization request is parked under a generated
//! state while the user signs in at LinkedIn; the LinkedIn callback is then
//! correlated back to it and the client receives a single-use local
//! authorization code.
//!
//! ## Modes
//!
//! - **Standard**: the server issues its own access and refresh tokens and
//!   keeps the LinkedIn token linked to the user, refreshing it on demand.
//! - **Proxy**: the LinkedIn token itself is returned to the client and no
//!   local tokens are issued.
//!
//! ## Architecture
//!
//! - **Store**: clients, pending flows, codes, and tokens (`DashMap` or `SQLite`)
//! - **`OAuth2` client**: LinkedIn authorization URL, code exchange, refresh, userinfo
//! - **`OAuth2` server**: the correlation state machine and both provider variants
//! - **Routes**: axum endpoints for registration, authorization, callback, and tokens
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use linkedin_mcp_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("{}", config.summary());
//!     Ok(())
//! }
//! ```

/// Configuration management
pub mod config;

/// Structured logging setup
pub mod logging;

/// Bearer token authentication
pub mod middleware;

/// OAuth 2.0 client for LinkedIn
pub mod oauth2_client;

/// OAuth 2.0 authorization server and correlation providers
pub mod oauth2_server;

/// HTTP routes
pub mod routes;

/// Token and code storage
pub mod store;

/// Random token and HTTP client helpers
pub mod utils;

pub use linkedin_core::{constants, errors, models};
