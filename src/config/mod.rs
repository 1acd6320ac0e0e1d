// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Re-exports the environment-driven ServerConfig and its sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Configuration for the LinkedIn MCP OAuth server, read from environment variables.

/// Environment and server configuration
pub mod environment;

pub use environment::{
    HttpClientConfig, LinkedInConfig, OAuthMode, ServerConfig, StoreBackend, StoreConfig,
};
