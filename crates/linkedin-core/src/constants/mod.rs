// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Token lifetimes, LinkedIn endpoints, and service identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Constants grouped by domain.

/// OAuth lifetimes, grant types and LinkedIn endpoint defaults
pub mod oauth;

pub use oauth::*;

/// Service identifiers used in logs and discovery metadata
pub mod service_names {
    /// Service name reported by logging and the health endpoint
    pub const LINKEDIN_MCP_SERVER: &str = "linkedin-mcp-server";
}
