// ABOUTME: Bearer token authentication for protected HTTP endpoints
// ABOUTME: Resolves Authorization headers to the user and LinkedIn token through the provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::oauth2_server::{CorrelationProvider, ValidatedToken};
use http::header::AUTHORIZATION;
use http::HeaderMap;
use linkedin_core::errors::{OAuthError, OAuthResult};
use std::sync::Arc;
use tracing::{field, Span};

/// Extract the token from an `Authorization: Bearer <token>` header
#[must_use]
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Authenticates requests by validating their bearer token
#[derive(Clone)]
pub struct BearerAuthMiddleware {
    provider: Arc<dyn CorrelationProvider>,
}

impl BearerAuthMiddleware {
    /// Create middleware validating against `provider`
    #[must_use]
    pub fn new(provider: Arc<dyn CorrelationProvider>) -> Self {
        Self { provider }
    }

    /// Authenticate a request from its headers
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` when the header is missing or malformed, or any
    /// error of the provider's token validation
    #[tracing::instrument(skip(self, headers), fields(user_id = field::Empty))]
    pub async fn authenticate_request_with_headers(
        &self,
        headers: &HeaderMap,
    ) -> OAuthResult<ValidatedToken> {
        let token = extract_bearer(headers).ok_or_else(|| {
            OAuthError::InvalidToken("Missing or malformed Authorization header".to_owned())
        })?;
        let validated = self.provider.validate_access_token(token).await?;
        Span::current().record("user_id", validated.user_id.as_str());
        Ok(validated)
    }

    /// Resolve the caller's user id when a valid bearer token is present.
    ///
    /// Used on endpoints where authentication is optional; an invalid token is
    /// treated as anonymous.
    pub async fn optional_user_id(&self, headers: &HeaderMap) -> Option<String> {
        let token = extract_bearer(headers)?;
        match self.provider.validate_access_token(token).await {
            Ok(validated) => Some(validated.user_id),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token on optional auth");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_bearer(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc123"));
        assert_eq!(extract_bearer(&headers), Some("abc123"));

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer(&headers), None);
    }
}
