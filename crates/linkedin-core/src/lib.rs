// ABOUTME: Core types and constants for the LinkedIn MCP OAuth server
// ABOUTME: Foundation crate with the OAuth error taxonomy, persistence models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # LinkedIn Core
//!
//! Foundation crate shared by the server crate and its tests. It changes
//! rarely, which keeps incremental builds of the server crate fast.
//!
//! ## Modules
//!
//! - **errors**: `OAuthError` protocol taxonomy plus the unified `AppError`
//! - **models**: client registrations, pending authorizations, codes and tokens
//! - **constants**: TTLs, LinkedIn endpoints and default scopes

/// OAuth error taxonomy and unified application errors
pub mod errors;

/// Persistence models for the correlation protocol
pub mod models;

/// Application constants organized by domain
pub mod constants;
