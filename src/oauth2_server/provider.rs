// ABOUTME: CorrelationProvider trait implemented by the standard and proxy variants
// ABOUTME: Shared flow steps are provided methods over CorrelationCore; token semantics differ per variant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::correlation::CorrelationCore;
use super::models::{
    AuthorizeOutcome, AuthorizeRequest, CallbackOutcome, ClientRegistrationRequest,
    ClientRegistrationResponse, TokenResponse, ValidatedToken,
};
use crate::config::OAuthMode;
use async_trait::async_trait;
use linkedin_core::errors::OAuthResult;
use linkedin_core::models::ClientRegistration;

/// OAuth authorization server that correlates local flows with LinkedIn's
#[async_trait]
pub trait CorrelationProvider: Send + Sync {
    /// Shared state machine
    fn core(&self) -> &CorrelationCore;

    /// Which variant this is
    fn mode(&self) -> OAuthMode {
        self.core().mode()
    }

    /// Register a client (RFC 7591)
    async fn register_client(
        &self,
        request: ClientRegistrationRequest,
    ) -> OAuthResult<ClientRegistrationResponse> {
        self.core().registration().register_client(request).await
    }

    /// Verify a client's secret
    async fn authenticate_client(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> OAuthResult<ClientRegistration> {
        self.core()
            .registration()
            .authenticate(client_id, client_secret)
            .await
    }

    /// Start an authorization; `user_id` is the caller's identity when already known
    async fn authorize(
        &self,
        request: AuthorizeRequest,
        user_id: Option<&str>,
    ) -> OAuthResult<AuthorizeOutcome> {
        self.core().authorize(request, user_id).await
    }

    /// Complete a pending authorization from LinkedIn's callback
    async fn handle_external_callback(
        &self,
        code: &str,
        state: &str,
    ) -> OAuthResult<CallbackOutcome> {
        self.core().handle_external_callback(code, state).await
    }

    /// `authorization_code` grant
    async fn exchange_authorization_code(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> OAuthResult<TokenResponse>;

    /// `refresh_token` grant
    async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        scope: Option<&str>,
    ) -> OAuthResult<TokenResponse>;

    /// Resolve a bearer token to the user and the LinkedIn token to act with
    async fn validate_access_token(&self, token: &str) -> OAuthResult<ValidatedToken>;
}
