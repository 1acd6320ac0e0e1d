// ABOUTME: OAuth 2.0 client for the external identity provider (LinkedIn)
// ABOUTME: Exposes the ExternalOAuthClient trait and its reqwest-backed implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # OAuth 2.0 Client Module
//!
//! The server acts as an OAuth 2.0 client of LinkedIn on behalf of its users.
//! This module handles:
//! - building the LinkedIn authorization URL around a correlation state
//! - exchanging LinkedIn authorization codes and refresh tokens
//! - resolving the member identity through the OpenID userinfo endpoint

/// Core OAuth 2.0 client implementation
pub mod client;

pub use client::{ExternalOAuthClient, ExternalTokenResponse, LinkedInOAuthClient, UserInfo};
