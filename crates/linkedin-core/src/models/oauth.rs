// ABOUTME: OAuth persistence models for clients, pending flows, codes, and tokens
// ABOUTME: Used by the TokenStore trait and both correlation provider variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::constants::oauth::AUTHORIZATION_CODE_TTL_SECS;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Registered OAuth client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRegistration {
    /// OAuth client identifier
    pub client_id: String,
    /// Argon2 PHC hash of the client secret
    pub client_secret_hash: String,
    /// Human-readable client name
    pub client_name: String,
    /// Registered redirect URIs, never empty
    pub redirect_uris: Vec<String>,
    /// When this client was registered
    pub created_at: DateTime<Utc>,
}

impl ClientRegistration {
    /// Whether `redirect_uri` matches one of the registered URIs exactly
    #[must_use]
    pub fn allows_redirect(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|uri| uri == redirect_uri)
    }
}

/// Local authorization request waiting for the external provider's callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAuthorization {
    /// Server-generated correlation state sent to the external provider
    pub state: String,
    /// Client that started the flow
    pub client_id: String,
    /// Client redirect URI to return to once the flow completes
    pub redirect_uri: String,
    /// The calling client's own `state`, echoed back on completion
    pub client_state: Option<String>,
    /// Requested scope
    pub scope: Option<String>,
    /// PKCE code challenge (RFC 7636)
    pub code_challenge: Option<String>,
    /// PKCE code challenge method
    pub code_challenge_method: Option<String>,
    /// When the flow was started
    pub created_at: DateTime<Utc>,
    /// When the flow can no longer be completed
    pub expires_at: DateTime<Utc>,
}

impl PendingAuthorization {
    /// Whether the flow has expired at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Single-use local authorization code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    /// The code value
    pub code: String,
    /// User the code was issued for
    pub user_id: String,
    /// Client the code is bound to
    pub client_id: String,
    /// Redirect URI that must match at exchange
    pub redirect_uri: String,
    /// Granted scope
    pub scope: Option<String>,
    /// PKCE code challenge recorded at authorization
    pub code_challenge: Option<String>,
    /// PKCE code challenge method recorded at authorization
    pub code_challenge_method: Option<String>,
    /// Issuance time; the code is valid for `AUTHORIZATION_CODE_TTL_SECS` after it
    pub created_at: DateTime<Utc>,
}

impl AuthorizationCode {
    /// Expiry instant derived from the issuance time
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::seconds(AUTHORIZATION_CODE_TTL_SECS)
    }

    /// Whether the code is older than its lifetime at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Token issued by the external provider and linked to a local user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalToken {
    /// Local user the token is linked to
    pub user_id: String,
    /// Provider key (`linkedin`)
    pub provider: String,
    /// Provider access token
    pub access_token: String,
    /// Provider refresh token, when the provider issued one
    pub refresh_token: Option<String>,
    /// Expiry derived from `expires_in` at link time
    pub expires_at: DateTime<Utc>,
    /// Scope granted by the provider
    pub scope: Option<String>,
    /// Last time the record was written
    pub updated_at: DateTime<Utc>,
}

impl ExternalToken {
    /// Whether the provider token has expired at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Remaining lifetime in whole seconds, zero once expired
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Local access/refresh token pair (standard mode only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Local access token
    pub access_token: String,
    /// Local refresh token
    pub refresh_token: String,
    /// User the pair was issued for
    pub user_id: String,
    /// Client the pair was issued to
    pub client_id: String,
    /// Granted scope
    pub scope: Option<String>,
    /// Access token expiry
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry
    pub refresh_expires_at: DateTime<Utc>,
    /// Issuance time
    pub created_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Whether the access token has expired at `now`
    #[must_use]
    pub fn access_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.access_expires_at
    }

    /// Whether the refresh token has expired at `now`
    #[must_use]
    pub fn refresh_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_expires_at
    }
}
