// ABOUTME: OAuth 2.0 request and response models for the correlation server
// ABOUTME: Implements RFC 7591 registration, authorize outcomes, token exchange, and RFC 8414 metadata
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OAuth 2.0 Client Registration Request (RFC 7591)
///
/// Only `redirect_uris` is required; any other metadata is accepted and ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientRegistrationRequest {
    /// Redirect URIs for the authorization code flow
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    /// Optional client name for display
    #[serde(default)]
    pub client_name: Option<String>,
    /// Remaining client metadata
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// OAuth 2.0 Client Registration Response (RFC 7591)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRegistrationResponse {
    /// Unique client identifier
    pub client_id: String,
    /// Client secret, returned only once
    pub client_secret: String,
    /// Client name
    pub client_name: String,
    /// Redirect URIs registered for this client
    pub redirect_uris: Vec<String>,
    /// Registration time as a Unix timestamp
    pub client_id_issued_at: i64,
    /// Zero: the secret never expires
    pub client_secret_expires_at: i64,
}

/// OAuth 2.0 Authorization Request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    /// Response type; only `code` is supported
    #[serde(default)]
    pub response_type: Option<String>,
    /// Client identifier
    pub client_id: String,
    /// Redirect URI for the response
    pub redirect_uri: String,
    /// Requested scope
    #[serde(default)]
    pub scope: Option<String>,
    /// Client state, echoed back unchanged
    #[serde(default)]
    pub state: Option<String>,
    /// PKCE code challenge (RFC 7636)
    #[serde(default)]
    pub code_challenge: Option<String>,
    /// PKCE code challenge method (`plain` or `S256`)
    #[serde(default)]
    pub code_challenge_method: Option<String>,
}

/// Result of an authorization request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AuthorizeOutcome {
    /// The user already has a valid LinkedIn link; a local code was issued directly
    Issued {
        /// Local authorization code
        code: String,
        /// The caller's original state
        state: Option<String>,
    },
    /// The user must authorize at LinkedIn first
    ExternalRedirect {
        /// LinkedIn authorization URL embedding `state`
        authorization_url: String,
        /// Server-generated correlation state
        state: String,
        /// Always `true`
        requires_external_authorization: bool,
    },
}

/// Result of a completed external callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackOutcome {
    /// Local authorization code for the original client
    pub code: String,
    /// The original client's state (not the correlation state)
    pub state: Option<String>,
    /// The original client's redirect URI
    pub redirect_uri: String,
}

/// OAuth 2.0 Token Request (form-encoded)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Grant type (`authorization_code` or `refresh_token`)
    pub grant_type: String,
    /// Authorization code (for `authorization_code` grant)
    #[serde(default)]
    pub code: Option<String>,
    /// Redirect URI (must match the one bound to the code)
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// Client ID
    pub client_id: String,
    /// Client secret; verified when present
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Requested scope (for `refresh_token` grant)
    #[serde(default)]
    pub scope: Option<String>,
    /// Refresh token (for `refresh_token` grant)
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// PKCE code verifier (RFC 7636)
    #[serde(default)]
    pub code_verifier: Option<String>,
}

/// OAuth 2.0 Token Response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token (local in standard mode, LinkedIn's in proxy mode)
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Expires in seconds
    pub expires_in: i64,
    /// Refresh token, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Scope granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Identity behind a validated bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedToken {
    /// Local user id (the LinkedIn member id)
    pub user_id: String,
    /// LinkedIn access token to call LinkedIn APIs with
    pub external_access_token: String,
}

/// Body of `POST /oauth/token-validate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenValidationResponse {
    /// Whether the token is valid
    pub valid: bool,
    /// User the token belongs to
    pub user_id: String,
}

/// Authorization server metadata (RFC 8414)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationServerMetadata {
    /// Issuer identifier
    pub issuer: String,
    /// Authorization endpoint
    pub authorization_endpoint: String,
    /// Token endpoint
    pub token_endpoint: String,
    /// Dynamic client registration endpoint
    pub registration_endpoint: String,
    /// Supported response types
    pub response_types_supported: Vec<String>,
    /// Supported grant types
    pub grant_types_supported: Vec<String>,
    /// Supported PKCE methods
    pub code_challenge_methods_supported: Vec<String>,
    /// Supported token endpoint client authentication methods
    pub token_endpoint_auth_methods_supported: Vec<String>,
    /// Scopes clients may request
    pub scopes_supported: Vec<String>,
}

/// Protected resource metadata (RFC 9728)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// Resource identifier
    pub resource: String,
    /// Authorization servers that issue tokens for this resource
    pub authorization_servers: Vec<String>,
    /// Scopes the resource understands
    pub scopes_supported: Vec<String>,
    /// How bearer tokens may be presented
    pub bearer_methods_supported: Vec<String>,
}
