// ABOUTME: Standard-mode provider issuing local opaque access and refresh tokens
// ABOUTME: Local tokens map to linked LinkedIn tokens, refreshed transparently on validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::correlation::CorrelationCore;
use super::models::{TokenResponse, ValidatedToken};
use super::provider::CorrelationProvider;
use crate::config::OAuthMode;
use crate::logging::AppLogger;
use crate::oauth2_client::ExternalOAuthClient;
use crate::store::TokenStore;
use crate::utils::random::generate_token;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use linkedin_core::constants::oauth::{
    ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_DAYS, TOKEN_TYPE_BEARER,
};
use linkedin_core::errors::{OAuthError, OAuthResult};
use linkedin_core::models::IssuedToken;
use std::collections::HashSet;
use std::sync::Arc;

/// Issues its own tokens; LinkedIn tokens never leave the server
pub struct StandardCorrelationProvider {
    core: CorrelationCore,
}

impl StandardCorrelationProvider {
    /// Create a standard-mode provider
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>, client: Arc<dyn ExternalOAuthClient>) -> Self {
        Self {
            core: CorrelationCore::new(OAuthMode::Standard, store, client),
        }
    }

    async fn mint_token_pair(
        &self,
        user_id: &str,
        client_id: &str,
        scope: Option<String>,
        now: DateTime<Utc>,
    ) -> OAuthResult<TokenResponse> {
        let issued = IssuedToken {
            access_token: generate_token()?,
            refresh_token: generate_token()?,
            user_id: user_id.to_owned(),
            client_id: client_id.to_owned(),
            scope,
            access_expires_at: now + Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            refresh_expires_at: now + Duration::days(REFRESH_TOKEN_TTL_DAYS),
            created_at: now,
        };
        self.core.store().store_issued_token(&issued).await?;

        Ok(TokenResponse {
            access_token: issued.access_token,
            token_type: TOKEN_TYPE_BEARER.to_owned(),
            expires_in: ACCESS_TOKEN_TTL_SECS,
            refresh_token: Some(issued.refresh_token),
            scope: issued.scope,
        })
    }
}

/// Whether every scope in `requested` was part of `granted`
fn is_scope_subset(requested: &str, granted: Option<&str>) -> bool {
    let granted: HashSet<&str> = granted.unwrap_or_default().split_whitespace().collect();
    requested
        .split_whitespace()
        .all(|scope| granted.contains(scope))
}

#[async_trait]
impl CorrelationProvider for StandardCorrelationProvider {
    fn core(&self) -> &CorrelationCore {
        &self.core
    }

    async fn exchange_authorization_code(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> OAuthResult<TokenResponse> {
        let auth_code = self
            .core
            .redeem_code(code, client_id, redirect_uri, code_verifier)
            .await?;

        let response = self
            .mint_token_pair(
                &auth_code.user_id,
                &auth_code.client_id,
                auth_code.scope,
                Utc::now(),
            )
            .await?;

        AppLogger::log_oauth_event(
            "token_issued",
            OAuthMode::Standard.as_str(),
            Some(client_id),
            Some(&auth_code.user_id),
            true,
        );
        Ok(response)
    }

    async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        scope: Option<&str>,
    ) -> OAuthResult<TokenResponse> {
        // Rotation: the presented token is gone whatever happens next
        let issued = self
            .core
            .store()
            .consume_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| OAuthError::InvalidGrant("Invalid refresh token".to_owned()))?;

        let now = Utc::now();
        if issued.client_id != client_id {
            AppLogger::log_security_event(
                "refresh_client_mismatch",
                "Refresh token presented by a different client",
                Some(client_id),
            );
            return Err(OAuthError::InvalidGrant(
                "Refresh token was issued to another client".to_owned(),
            ));
        }
        if issued.refresh_expired(now) {
            return Err(OAuthError::InvalidGrant("Refresh token expired".to_owned()));
        }

        let granted_scope = match scope {
            Some(requested) if !is_scope_subset(requested, issued.scope.as_deref()) => {
                return Err(OAuthError::InvalidGrant(
                    "Requested scope exceeds the original grant".to_owned(),
                ));
            }
            Some(requested) => Some(requested.to_owned()),
            None => issued.scope,
        };

        let response = self
            .mint_token_pair(&issued.user_id, client_id, granted_scope, now)
            .await?;

        AppLogger::log_oauth_event(
            "token_refreshed",
            OAuthMode::Standard.as_str(),
            Some(client_id),
            Some(&issued.user_id),
            true,
        );
        Ok(response)
    }

    async fn validate_access_token(&self, token: &str) -> OAuthResult<ValidatedToken> {
        let now = Utc::now();
        let issued = self
            .core
            .store()
            .get_access_token(token)
            .await?
            .filter(|issued| !issued.access_expired(now))
            .ok_or_else(|| OAuthError::InvalidToken("Invalid or expired token".to_owned()))?;

        let provider = self.core.provider_name();
        let external = self
            .core
            .store()
            .get_external_token(&issued.user_id, provider)
            .await?
            .ok_or_else(|| {
                OAuthError::InsufficientScope("LinkedIn account not linked".to_owned())
            })?;

        if !external.is_expired(now) {
            return Ok(ValidatedToken {
                user_id: issued.user_id,
                external_access_token: external.access_token,
            });
        }

        let Some(external_refresh) = external.refresh_token.as_deref() else {
            return Err(OAuthError::InvalidToken(
                "LinkedIn token expired and no refresh token is available".to_owned(),
            ));
        };

        let refreshed = self
            .core
            .client()
            .refresh_token(external_refresh)
            .await
            .map_err(|e| {
                tracing::warn!(
                    user.id = %issued.user_id,
                    error = %e,
                    "LinkedIn token refresh failed"
                );
                OAuthError::InvalidToken("Failed to refresh LinkedIn token".to_owned())
            })?;

        let updated =
            self.core
                .external_token_from(&issued.user_id, refreshed, Some(&external), Utc::now());
        self.core.store().update_external_token(&updated).await?;

        AppLogger::log_oauth_event(
            "external_token_refreshed",
            OAuthMode::Standard.as_str(),
            Some(&issued.client_id),
            Some(&issued.user_id),
            true,
        );

        Ok(ValidatedToken {
            user_id: issued.user_id,
            external_access_token: updated.access_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_subset() {
        assert!(is_scope_subset("profile", Some("openid profile")));
        assert!(is_scope_subset("", Some("openid")));
        assert!(!is_scope_subset("w_member_social", Some("openid profile")));
        assert!(!is_scope_subset("profile", None));
    }
}
