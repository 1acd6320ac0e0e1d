// ABOUTME: Utility module for shared helpers
// ABOUTME: Outbound HTTP client construction and secure random token generation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// HTTP client construction with configured timeouts
pub mod http_client;

/// Cryptographically secure random identifiers
pub mod random;
