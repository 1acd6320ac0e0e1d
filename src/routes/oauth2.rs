// ABOUTME: OAuth 2.0 HTTP endpoints for registration, authorization, callback, and token exchange
// ABOUTME: Thin axum handlers delegating to the configured CorrelationProvider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! OAuth 2.0 authorization server routes
//!
//! Errors are rendered with the OAuth JSON error shape (`error`,
//! `error_description`); successful authorizations answer with `302 Found`.

use crate::middleware::BearerAuthMiddleware;
use crate::oauth2_server::models::{
    AuthorizationServerMetadata, ProtectedResourceMetadata, TokenValidationResponse,
};
use crate::oauth2_server::{
    AuthorizeOutcome, AuthorizeRequest, ClientRegistrationRequest, CorrelationProvider,
    TokenRequest,
};
use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    http::{
        header::{CACHE_CONTROL, LOCATION},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use linkedin_core::constants::oauth::{grant_types, pkce, RESOURCE_SCOPES};
use linkedin_core::errors::{OAuthError, OAuthResult};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

/// Shared state of the OAuth routes
#[derive(Clone)]
pub struct OAuthRouteState {
    /// Provider variant selected at start-up
    pub provider: Arc<dyn CorrelationProvider>,
    /// Bearer authentication against the same provider
    pub auth: BearerAuthMiddleware,
    /// Public base URL of this server, used as issuer
    pub server_url: String,
}

impl OAuthRouteState {
    /// Build route state around `provider`
    #[must_use]
    pub fn new(provider: Arc<dyn CorrelationProvider>, server_url: impl Into<String>) -> Self {
        Self {
            auth: BearerAuthMiddleware::new(Arc::clone(&provider)),
            provider,
            server_url: server_url.into().trim_end_matches('/').to_owned(),
        }
    }
}

/// Query parameters LinkedIn sends to the callback
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// OAuth 2.0 routes handler
pub struct OAuth2Routes;

impl OAuth2Routes {
    /// Create all OAuth 2.0 routes
    pub fn routes(state: OAuthRouteState) -> Router {
        Router::new()
            .route(
                "/.well-known/oauth-authorization-server",
                get(Self::handle_discovery),
            )
            .route(
                "/.well-known/oauth-protected-resource",
                get(Self::handle_protected_resource),
            )
            .route("/oauth/register", post(Self::handle_register))
            .route("/oauth/authorize", get(Self::handle_authorize))
            .route("/oauth/callback", get(Self::handle_callback))
            .route("/oauth/token", post(Self::handle_token))
            .route("/oauth/token-validate", post(Self::handle_token_validate))
            .with_state(state)
    }

    /// Handle GET /.well-known/oauth-authorization-server (RFC 8414)
    async fn handle_discovery(
        State(state): State<OAuthRouteState>,
    ) -> Json<AuthorizationServerMetadata> {
        let base = &state.server_url;
        Json(AuthorizationServerMetadata {
            issuer: base.clone(),
            authorization_endpoint: format!("{base}/oauth/authorize"),
            token_endpoint: format!("{base}/oauth/token"),
            registration_endpoint: format!("{base}/oauth/register"),
            response_types_supported: vec!["code".to_owned()],
            grant_types_supported: vec![
                grant_types::AUTHORIZATION_CODE.to_owned(),
                grant_types::REFRESH_TOKEN.to_owned(),
            ],
            code_challenge_methods_supported: vec![pkce::S256.to_owned(), pkce::PLAIN.to_owned()],
            token_endpoint_auth_methods_supported: vec![
                "client_secret_post".to_owned(),
                "none".to_owned(),
            ],
            scopes_supported: RESOURCE_SCOPES.iter().map(|s| (*s).to_owned()).collect(),
        })
    }

    /// Handle GET /.well-known/oauth-protected-resource (RFC 9728)
    async fn handle_protected_resource(
        State(state): State<OAuthRouteState>,
    ) -> Json<ProtectedResourceMetadata> {
        Json(ProtectedResourceMetadata {
            resource: state.server_url.clone(),
            authorization_servers: vec![state.server_url.clone()],
            scopes_supported: RESOURCE_SCOPES.iter().map(|s| (*s).to_owned()).collect(),
            bearer_methods_supported: vec!["header".to_owned()],
        })
    }

    /// Handle POST /oauth/register (RFC 7591)
    async fn handle_register(
        State(state): State<OAuthRouteState>,
        Json(request): Json<ClientRegistrationRequest>,
    ) -> Result<Response, OAuthError> {
        let response = state.provider.register_client(request).await?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /oauth/authorize
    ///
    /// A valid bearer token identifies the user and enables the fast path.
    async fn handle_authorize(
        State(state): State<OAuthRouteState>,
        headers: HeaderMap,
        query: Result<Query<AuthorizeRequest>, QueryRejection>,
    ) -> Result<Response, OAuthError> {
        let Query(request) = query.map_err(|e| {
            OAuthError::InvalidRequest(format!("Malformed authorization request: {e}"))
        })?;
        let user_id = state.auth.optional_user_id(&headers).await;
        let redirect_uri = request.redirect_uri.clone();

        let user = user_id.as_deref();
        match state.provider.authorize(request, user).await? {
            AuthorizeOutcome::Issued {
                code,
                state: client_state,
            } => {
                let mut params = vec![("code", code.as_str())];
                if let Some(client_state) = client_state.as_deref() {
                    params.push(("state", client_state));
                }
                redirect_with_params(&redirect_uri, &params)
            }
            AuthorizeOutcome::ExternalRedirect {
                authorization_url, ..
            } => found(&authorization_url),
        }
    }

    /// Handle GET /oauth/callback from LinkedIn
    async fn handle_callback(
        State(state): State<OAuthRouteState>,
        Query(query): Query<CallbackQuery>,
    ) -> Result<Response, OAuthError> {
        let correlation_state = query
            .state
            .ok_or_else(|| OAuthError::InvalidRequest("Missing state parameter".to_owned()))?;

        if let Some(error) = query.error {
            let pending = state
                .provider
                .core()
                .cancel_external_authorization(&correlation_state)
                .await?;
            let description = query.error_description.unwrap_or_default();
            tracing::info!(error = %error, "LinkedIn authorization was not granted");

            let mut params = vec![("error", error.as_str())];
            if !description.is_empty() {
                params.push(("error_description", description.as_str()));
            }
            if let Some(client_state) = pending.client_state.as_deref() {
                params.push(("state", client_state));
            }
            return redirect_with_params(&pending.redirect_uri, &params);
        }

        let code = query
            .code
            .ok_or_else(|| OAuthError::InvalidRequest("Missing code parameter".to_owned()))?;

        let outcome = state
            .provider
            .handle_external_callback(&code, &correlation_state)
            .await?;

        let mut params = vec![("code", outcome.code.as_str())];
        if let Some(client_state) = outcome.state.as_deref() {
            params.push(("state", client_state));
        }
        redirect_with_params(&outcome.redirect_uri, &params)
    }

    /// Handle POST /oauth/token
    async fn handle_token(
        State(state): State<OAuthRouteState>,
        form: Result<Form<TokenRequest>, FormRejection>,
    ) -> Result<Response, OAuthError> {
        let Form(request) =
            form.map_err(|e| OAuthError::InvalidRequest(format!("Malformed token request: {e}")))?;

        if let Some(secret) = request.client_secret.as_deref() {
            state
                .provider
                .authenticate_client(&request.client_id, secret)
                .await?;
        }

        let response = match request.grant_type.as_str() {
            grant_types::AUTHORIZATION_CODE => {
                let code = required(request.code.as_deref(), "code")?;
                let redirect_uri = required(request.redirect_uri.as_deref(), "redirect_uri")?;
                // a code without PKCE is only bound to the client by its secret
                if request.client_secret.is_none() && request.code_verifier.is_none() {
                    return Err(OAuthError::InvalidClient(
                        "client_secret is required when no code_verifier is presented".to_owned(),
                    ));
                }
                state
                    .provider
                    .exchange_authorization_code(
                        code,
                        &request.client_id,
                        redirect_uri,
                        request.code_verifier.as_deref(),
                    )
                    .await?
            }
            grant_types::REFRESH_TOKEN => {
                let refresh_token = required(request.refresh_token.as_deref(), "refresh_token")?;
                state
                    .provider
                    .exchange_refresh_token(
                        refresh_token,
                        &request.client_id,
                        request.scope.as_deref(),
                    )
                    .await?
            }
            other => return Err(OAuthError::UnsupportedGrantType(other.to_owned())),
        };

        Ok((
            StatusCode::OK,
            [(CACHE_CONTROL, HeaderValue::from_static("no-store"))],
            Json(response),
        )
            .into_response())
    }

    /// Handle POST /oauth/token-validate
    async fn handle_token_validate(
        State(state): State<OAuthRouteState>,
        headers: HeaderMap,
    ) -> Result<Json<TokenValidationResponse>, OAuthError> {
        let validated = state
            .auth
            .authenticate_request_with_headers(&headers)
            .await?;
        Ok(Json(TokenValidationResponse {
            valid: true,
            user_id: validated.user_id,
        }))
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> OAuthResult<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OAuthError::InvalidRequest(format!("Missing {name} parameter")))
}

fn redirect_with_params(base: &str, params: &[(&str, &str)]) -> Result<Response, OAuthError> {
    let mut url = Url::parse(base)
        .map_err(|e| OAuthError::InvalidRequest(format!("Invalid redirect_uri: {e}")))?;
    url.query_pairs_mut().extend_pairs(params.iter().copied());
    found(url.as_str())
}

fn found(location: &str) -> Result<Response, OAuthError> {
    let location = HeaderValue::from_str(location)
        .map_err(|e| OAuthError::InvalidRequest(format!("Invalid redirect location: {e}")))?;
    Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
}
