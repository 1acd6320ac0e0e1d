// ABOUTME: OAuth-related constants for the correlation protocol and the LinkedIn provider
// ABOUTME: Includes artifact lifetimes, grant type identifiers, and LinkedIn endpoint defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Lifetime of an authorization code, counted from issuance
pub const AUTHORIZATION_CODE_TTL_SECS: i64 = 600;

/// Lifetime of a pending external authorization
pub const PENDING_AUTHORIZATION_TTL_SECS: i64 = 600;

/// Lifetime of a locally issued access token (standard mode)
pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// Lifetime of a locally issued refresh token (standard mode)
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// LinkedIn access tokens last 60 days when the token response omits `expires_in`
pub const DEFAULT_EXTERNAL_TOKEN_EXPIRY_SECS: i64 = 5_184_000;

/// Random bytes behind every generated state, code, token and secret
pub const RANDOM_TOKEN_BYTES: usize = 32;

/// Token type returned by the token endpoint
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Client name recorded when registration metadata omits one
pub const DEFAULT_CLIENT_NAME: &str = "Unknown Client";

/// Scopes advertised for the protected MCP resource
pub const RESOURCE_SCOPES: &[&str] = &["linkedin.posts", "linkedin.profile", "linkedin.documents"];

/// Grant type identifiers accepted by the token endpoint
pub mod grant_types {
    /// Authorization code grant
    pub const AUTHORIZATION_CODE: &str = "authorization_code";
    /// Refresh token grant
    pub const REFRESH_TOKEN: &str = "refresh_token";
}

/// PKCE challenge methods (RFC 7636)
pub mod pkce {
    /// SHA-256 challenge method
    pub const S256: &str = "S256";
    /// Plain challenge method
    pub const PLAIN: &str = "plain";
    /// Minimum verifier length
    pub const MIN_VERIFIER_LEN: usize = 43;
    /// Maximum verifier length
    pub const MAX_VERIFIER_LEN: usize = 128;
}

/// LinkedIn provider identifiers and endpoints
pub mod linkedin {
    /// Provider key used for external-token linkage
    pub const PROVIDER_NAME: &str = "linkedin";
    /// Authorization endpoint
    pub const AUTH_URL: &str = "https://www.linkedin.com/oauth/v2/authorization";
    /// Token endpoint (code exchange and refresh)
    pub const TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";
    /// OpenID Connect userinfo endpoint
    pub const USERINFO_URL: &str = "https://api.linkedin.com/v2/userinfo";
    /// Scopes needed to identify the member and publish on their behalf
    pub const DEFAULT_SCOPES: &str = "openid,profile,w_member_social,email";
}
