// ABOUTME: OAuth protocol error taxonomy with RFC 6749 wire codes and HTTP status mapping
// ABOUTME: Every correlation provider operation fails with one of these variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::AppError;
#[cfg(feature = "http-response")]
use axum::{
    response::{IntoResponse, Response},
    Json,
};
#[cfg(feature = "http-response")]
use http::{header, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Longest slice of an upstream response body echoed to clients
pub const MAX_UPSTREAM_DETAIL_CHARS: usize = 200;

/// Errors surfaced by the OAuth correlation protocol
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OAuthError {
    /// Unknown client or failed client authentication
    #[error("Invalid client: {0}")]
    InvalidClient(String),

    /// Redirect URI not registered for the client, or missing at registration
    #[error("Invalid redirect_uri: {0}")]
    InvalidRedirectUri(String),

    /// Malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Callback state is unknown, already used, or expired
    #[error("Invalid or expired state parameter")]
    InvalidState,

    /// Code or refresh token is invalid, expired, reused, or bound elsewhere
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    /// Grant type other than `authorization_code` or `refresh_token`
    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// The external provider rejected a request or returned malformed data
    #[error("External provider error{}: {body}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    ExternalProvider {
        /// HTTP status returned by the provider, when a response was received
        status: Option<u16>,
        /// Response body or transport failure description
        body: String,
    },

    /// Valid local token without a linked external token
    #[error("Insufficient scope: {0}")]
    InsufficientScope(String),

    /// Unknown or expired token, or an external token that could not be refreshed
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for correlation protocol operations
pub type OAuthResult<T> = Result<T, OAuthError>;

impl OAuthError {
    /// Build an external provider error from an HTTP status and response body
    pub fn external(status: Option<u16>, body: impl Into<String>) -> Self {
        Self::ExternalProvider {
            status,
            body: body.into(),
        }
    }

    /// Wire error code (RFC 6749 section 5.2 where one applies)
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidClient(_) => "invalid_client",
            Self::InvalidRedirectUri(_) => "invalid_redirect_uri",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidState => "invalid_state",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::ExternalProvider { .. } => "external_provider_error",
            Self::InsufficientScope(_) => "insufficient_scope",
            Self::InvalidToken(_) => "invalid_token",
            Self::Storage(_) => "server_error",
        }
    }

    /// HTTP status used when the error is returned from an endpoint
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidClient(_) | Self::InvalidToken(_) => 401,
            Self::InsufficientScope(_) => 403,
            Self::ExternalProvider { .. } => 502,
            Self::Storage(_) => 500,
            Self::InvalidRedirectUri(_)
            | Self::InvalidRequest(_)
            | Self::InvalidState
            | Self::InvalidGrant(_)
            | Self::UnsupportedGrantType(_) => 400,
        }
    }

    /// Description sent in `error_description`. Storage details stay in logs;
    /// external provider failures carry the upstream description.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Storage(_) => "Internal server error".to_owned(),
            Self::ExternalProvider { status, body } => {
                let detail = upstream_detail(body);
                match (status, detail.is_empty()) {
                    (Some(s), true) => format!("External provider returned HTTP {s}"),
                    (Some(s), false) => format!("External provider returned HTTP {s}: {detail}"),
                    (None, true) => "External provider request failed".to_owned(),
                    (None, false) => format!("External provider request failed: {detail}"),
                }
            }
            other => other.to_string(),
        }
    }

    /// Convert into the JSON error body
    #[must_use]
    pub fn to_response(&self) -> OAuthErrorResponse {
        OAuthErrorResponse {
            error: self.error_code().to_owned(),
            error_description: Some(self.description()),
        }
    }
}

/// Upstream description from an external provider response body: its
/// `error_description` (or `error`) when the body is a JSON error object,
/// otherwise the raw body truncated to [`MAX_UPSTREAM_DETAIL_CHARS`].
fn upstream_detail(body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        let described = ["error_description", "error", "message"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str));
        if let Some(text) = described {
            return truncate_chars(text.trim());
        }
    }
    truncate_chars(body.trim())
}

fn truncate_chars(text: &str) -> String {
    match text.char_indices().nth(MAX_UPSTREAM_DETAIL_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

impl From<AppError> for OAuthError {
    fn from(error: AppError) -> Self {
        Self::Storage(error.to_string())
    }
}

/// OAuth error response body (RFC 6749 section 5.2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthErrorResponse {
    /// Error code
    pub error: String,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

#[cfg(feature = "http-response")]
impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match &self {
            Self::Storage(detail) => {
                tracing::error!(error = %detail, "OAuth request failed on storage");
            }
            Self::ExternalProvider { status, body } => {
                tracing::warn!(status = ?status, body = %body, "External provider call failed");
            }
            other => tracing::debug!(error = %other, "OAuth request rejected"),
        }

        let body = Json(self.to_response());
        if matches!(self, Self::InvalidToken(_)) {
            let challenge = format!("Bearer error=\"{}\"", self.error_code());
            return (status, [(header::WWW_AUTHENTICATE, challenge)], body).into_response();
        }
        (status, body).into_response()
    }
}
