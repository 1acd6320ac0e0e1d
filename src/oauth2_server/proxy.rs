// ABOUTME: Proxy-mode provider handing LinkedIn's own tokens to the client
// ABOUTME: Keeps no local tokens; validation asks LinkedIn's userinfo endpoint
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
use async_trait::async_trait;
use chrono::Utc;
use linkedin_core::constants::oauth::TOKEN_TYPE_BEARER;
use linkedin_core::errors::{OAuthError, OAuthResult};
use std::sync::Arc;

/// Passes LinkedIn tokens through.
///
/// The external link is left in place at exchange: other outstanding codes for
/// the same member and the authorize fast path read it, and the next callback
/// for that member replaces it.
pub struct ProxyCorrelationProvider {
    core: CorrelationCore,
}

impl ProxyCorrelationProvider {
    /// Create a proxy-mode provider
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>, client: Arc<dyn ExternalOAuthClient>) -> Self {
        Self {
            core: CorrelationCore::new(OAuthMode::Proxy, store, client),
        }
    }
}

#[async_trait]
impl CorrelationProvider for ProxyCorrelationProvider {
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

        let external = self
            .core
            .store()
            .get_external_token(&auth_code.user_id, self.core.provider_name())
            .await?
            .ok_or_else(|| {
                OAuthError::InvalidGrant("No LinkedIn token linked to this code".to_owned())
            })?;

        let now = Utc::now();
        if external.is_expired(now) {
            return Err(OAuthError::InvalidGrant(
                "Linked LinkedIn token has expired".to_owned(),
            ));
        }

        AppLogger::log_oauth_event(
            "token_passthrough",
            OAuthMode::Proxy.as_str(),
            Some(client_id),
            Some(&auth_code.user_id),
            true,
        );

        Ok(TokenResponse {
            expires_in: external.remaining_secs(now),
            access_token: external.access_token,
            token_type: TOKEN_TYPE_BEARER.to_owned(),
            refresh_token: external.refresh_token,
            scope: auth_code.scope.or(external.scope),
        })
    }

    async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        scope: Option<&str>,
    ) -> OAuthResult<TokenResponse> {
        let refreshed = self
            .core
            .client()
            .refresh_token(refresh_token)
            .await
            .map_err(|e| {
                tracing::warn!(client_id = %client_id, error = %e, "LinkedIn refresh failed");
                OAuthError::InvalidGrant("Failed to refresh LinkedIn token".to_owned())
            })?;

        AppLogger::log_oauth_event(
            "token_refreshed",
            OAuthMode::Proxy.as_str(),
            Some(client_id),
            None,
            true,
        );

        let expires_in = refreshed.expires_in_or_default();
        Ok(TokenResponse {
            access_token: refreshed.access_token,
            token_type: TOKEN_TYPE_BEARER.to_owned(),
            expires_in,
            refresh_token: refreshed
                .refresh_token
                .or_else(|| Some(refresh_token.to_owned())),
            scope: scope.map(str::to_owned).or(refreshed.scope),
        })
    }

    async fn validate_access_token(&self, token: &str) -> OAuthResult<ValidatedToken> {
        let user = self.core.client().user_info(token).await.map_err(|e| {
            tracing::debug!(error = %e, "LinkedIn rejected bearer token");
            OAuthError::InvalidToken("Invalid or expired LinkedIn token".to_owned())
        })?;

        Ok(ValidatedToken {
            user_id: user.sub,
            external_access_token: token.to_owned(),
        })
    }
}
