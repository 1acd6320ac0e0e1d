// ABOUTME: Correlation state machine shared by the standard and proxy providers
// ABOUTME: Tracks pending external authorizations and issues single-use local codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::client_registration::ClientRegistrationManager;
use super::models::{AuthorizeOutcome, AuthorizeRequest, CallbackOutcome};
use super::pkce;
use crate::config::OAuthMode;
use crate::logging::AppLogger;
use crate::oauth2_client::{ExternalOAuthClient, ExternalTokenResponse};
use crate::store::TokenStore;
use crate::utils::random::generate_token;
use chrono::{DateTime, Duration, Utc};
use linkedin_core::constants::oauth::PENDING_AUTHORIZATION_TTL_SECS;
use linkedin_core::errors::{OAuthError, OAuthResult};
use linkedin_core::models::{AuthorizationCode, ExternalToken, PendingAuthorization};
use std::sync::Arc;

/// What a code is minted for: the client side of an authorization
struct CodeGrant<'a> {
    client_id: &'a str,
    redirect_uri: &'a str,
    scope: Option<&'a str>,
    code_challenge: Option<&'a str>,
    code_challenge_method: Option<&'a str>,
}

/// Store, external client, and client registry behind every provider variant
pub struct CorrelationCore {
    mode: OAuthMode,
    store: Arc<dyn TokenStore>,
    client: Arc<dyn ExternalOAuthClient>,
    registration: ClientRegistrationManager,
}

impl CorrelationCore {
    /// Build the shared core for a provider running in `mode`
    #[must_use]
    pub fn new(
        mode: OAuthMode,
        store: Arc<dyn TokenStore>,
        client: Arc<dyn ExternalOAuthClient>,
    ) -> Self {
        let registration = ClientRegistrationManager::new(Arc::clone(&store));
        Self {
            mode,
            store,
            client,
            registration,
        }
    }

    /// Mode of the provider owning this core
    #[must_use]
    pub const fn mode(&self) -> OAuthMode {
        self.mode
    }

    /// Backing store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// External identity provider client
    #[must_use]
    pub fn client(&self) -> &Arc<dyn ExternalOAuthClient> {
        &self.client
    }

    /// Client registry
    #[must_use]
    pub const fn registration(&self) -> &ClientRegistrationManager {
        &self.registration
    }

    /// Provider key external tokens are linked under
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.client.provider_name()
    }

    /// Start an authorization.
    ///
    /// When `user_id` is known and already holds an unexpired external token a
    /// code is issued immediately. Otherwise a pending authorization is stored
    /// under a fresh correlation state and the external authorization URL is
    /// returned.
    ///
    /// # Errors
    ///
    /// `InvalidClient` for an unknown client or unregistered redirect URI,
    /// `InvalidRequest` for bad PKCE parameters or response type
    pub async fn authorize(
        &self,
        request: AuthorizeRequest,
        user_id: Option<&str>,
    ) -> OAuthResult<AuthorizeOutcome> {
        if let Some(response_type) = request.response_type.as_deref() {
            if response_type != "code" {
                return Err(OAuthError::InvalidRequest(format!(
                    "Unsupported response_type: {response_type}"
                )));
            }
        }

        self.registration
            .validate_redirect(&request.client_id, &request.redirect_uri)
            .await?;

        let code_challenge_method = pkce::validate_challenge(
            request.code_challenge.as_deref(),
            request.code_challenge_method.as_deref(),
        )?;

        let now = Utc::now();

        if let Some(user_id) = user_id {
            if let Some(token) = self
                .store
                .get_external_token(user_id, self.provider_name())
                .await?
            {
                if !token.is_expired(now) {
                    let grant = CodeGrant {
                        client_id: &request.client_id,
                        redirect_uri: &request.redirect_uri,
                        scope: request.scope.as_deref(),
                        code_challenge: request.code_challenge.as_deref(),
                        code_challenge_method: code_challenge_method.as_deref(),
                    };
                    let code = self.mint_code(user_id, &grant, now).await?;
                    AppLogger::log_oauth_event(
                        "authorize_fast_path",
                        self.mode.as_str(),
                        Some(&request.client_id),
                        Some(user_id),
                        true,
                    );
                    return Ok(AuthorizeOutcome::Issued {
                        code,
                        state: request.state,
                    });
                }
                tracing::debug!(
                    user.id = %user_id,
                    "Linked external token expired; starting external flow"
                );
            }
        }

        let state = generate_token()?;
        let pending = PendingAuthorization {
            state: state.clone(),
            client_id: request.client_id.clone(),
            redirect_uri: request.redirect_uri,
            client_state: request.state,
            scope: request.scope,
            code_challenge: request.code_challenge,
            code_challenge_method,
            created_at: now,
            expires_at: now + Duration::seconds(PENDING_AUTHORIZATION_TTL_SECS),
        };
        self.store.store_pending(&pending).await?;

        AppLogger::log_oauth_event(
            "authorize_pending_external",
            self.mode.as_str(),
            Some(&request.client_id),
            user_id,
            true,
        );

        Ok(AuthorizeOutcome::ExternalRedirect {
            authorization_url: self.client.authorization_url(&state),
            state,
            requires_external_authorization: true,
        })
    }

    /// Complete a pending authorization from the external provider's callback.
    ///
    /// The pending entry is consumed before any external call, so a state can
    /// never be completed twice, and a failed exchange is not retryable.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the state is unknown, consumed, or expired;
    /// `ExternalProvider` when the code exchange or identity lookup fails
    pub async fn handle_external_callback(
        &self,
        code: &str,
        state: &str,
    ) -> OAuthResult<CallbackOutcome> {
        let now = Utc::now();
        let Some(pending) = self.store.consume_pending(state, now).await? else {
            AppLogger::log_security_event(
                "unknown_or_expired_state",
                "External callback carried an unknown, consumed, or expired state",
                None,
            );
            return Err(OAuthError::InvalidState);
        };

        let token_response = self.client.exchange_code(code).await.inspect_err(|e| {
            AppLogger::log_oauth_event(
                "external_code_exchange",
                self.mode.as_str(),
                Some(&pending.client_id),
                None,
                false,
            );
            tracing::warn!(error = %e, "External code exchange failed");
        })?;

        let user = self
            .client
            .user_info(&token_response.access_token)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "External identity lookup failed"))?;

        let now = Utc::now();
        let external = self.external_token_from(&user.sub, token_response, None, now);
        self.store.link_external_token(&external).await?;

        let grant = CodeGrant {
            client_id: &pending.client_id,
            redirect_uri: &pending.redirect_uri,
            scope: pending.scope.as_deref(),
            code_challenge: pending.code_challenge.as_deref(),
            code_challenge_method: pending.code_challenge_method.as_deref(),
        };
        let code = self.mint_code(&user.sub, &grant, now).await?;

        AppLogger::log_oauth_event(
            "external_callback",
            self.mode.as_str(),
            Some(&pending.client_id),
            Some(&user.sub),
            true,
        );

        Ok(CallbackOutcome {
            code,
            state: pending.client_state,
            redirect_uri: pending.redirect_uri,
        })
    }

    /// Abandon a pending authorization after LinkedIn reported an error.
    ///
    /// Returns the consumed entry so the caller can report the error to the
    /// original client.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the state is unknown, consumed, or expired
    pub async fn cancel_external_authorization(
        &self,
        state: &str,
    ) -> OAuthResult<PendingAuthorization> {
        let pending = self
            .store
            .consume_pending(state, Utc::now())
            .await?
            .ok_or(OAuthError::InvalidState)?;
        AppLogger::log_oauth_event(
            "external_authorization_denied",
            self.mode.as_str(),
            Some(&pending.client_id),
            None,
            false,
        );
        Ok(pending)
    }

    /// Consume an authorization code and check it against the token request.
    ///
    /// The code is consumed before the checks run: a code presented with the
    /// wrong client, redirect URI, or verifier is burned as well.
    ///
    /// # Errors
    ///
    /// `InvalidGrant` on any failure
    pub async fn redeem_code(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> OAuthResult<AuthorizationCode> {
        let auth_code = self.store.consume_auth_code(code).await?.ok_or_else(|| {
            OAuthError::InvalidGrant("Invalid or already used authorization code".to_owned())
        })?;

        if auth_code.is_expired(Utc::now()) {
            return Err(OAuthError::InvalidGrant(
                "Authorization code expired".to_owned(),
            ));
        }
        if auth_code.client_id != client_id {
            AppLogger::log_security_event(
                "code_client_mismatch",
                "Authorization code presented by a different client",
                Some(client_id),
            );
            return Err(OAuthError::InvalidGrant(
                "Authorization code was issued to another client".to_owned(),
            ));
        }
        if auth_code.redirect_uri != redirect_uri {
            return Err(OAuthError::InvalidGrant("redirect_uri mismatch".to_owned()));
        }

        pkce::verify(
            auth_code.code_challenge.as_deref(),
            auth_code.code_challenge_method.as_deref(),
            code_verifier,
        )?;

        Ok(auth_code)
    }

    /// Build the linked external token from a provider token response.
    /// A missing refresh token or scope falls back to the `previous` link.
    #[must_use]
    pub fn external_token_from(
        &self,
        user_id: &str,
        response: ExternalTokenResponse,
        previous: Option<&ExternalToken>,
        now: DateTime<Utc>,
    ) -> ExternalToken {
        let expires_in = response.expires_in_or_default();
        ExternalToken {
            user_id: user_id.to_owned(),
            provider: self.provider_name().to_owned(),
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
            expires_at: now + Duration::seconds(expires_in),
            scope: response
                .scope
                .or_else(|| previous.and_then(|p| p.scope.clone())),
            updated_at: now,
        }
    }

    async fn mint_code(
        &self,
        user_id: &str,
        grant: &CodeGrant<'_>,
        now: DateTime<Utc>,
    ) -> OAuthResult<String> {
        let code = generate_token()?;
        let auth_code = AuthorizationCode {
            code: code.clone(),
            user_id: user_id.to_owned(),
            client_id: grant.client_id.to_owned(),
            redirect_uri: grant.redirect_uri.to_owned(),
            scope: grant.scope.map(str::to_owned),
            code_challenge: grant.code_challenge.map(str::to_owned),
            code_challenge_method: grant.code_challenge_method.map(str::to_owned),
            created_at: now,
        };
        self.store.store_auth_code(&auth_code).await?;
        Ok(code)
    }
}
