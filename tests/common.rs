// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides an in-process LinkedIn stub and provider/client setup helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
//! Shared test utilities for `linkedin_mcp_server`

use async_trait::async_trait;
use dashmap::DashMap;
use linkedin_mcp_server::config::OAuthMode;
use linkedin_mcp_server::errors::{OAuthError, OAuthResult};
use linkedin_mcp_server::oauth2_client::{ExternalOAuthClient, ExternalTokenResponse, UserInfo};
use linkedin_mcp_server::oauth2_server::pkce::s256_challenge;
use linkedin_mcp_server::oauth2_server::{
    build_provider, AuthorizeOutcome, AuthorizeRequest, CallbackOutcome,
    ClientRegistrationRequest, ClientRegistrationResponse, CorrelationProvider,
};
use linkedin_mcp_server::store::{InMemoryTokenStore, TokenStore};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::env;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tracing::Level;

/// Redirect URI every test client registers
pub const REDIRECT_URI: &str = "https://app.example/callback";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// In-process stand-in for LinkedIn's OAuth endpoints
pub struct StubLinkedIn {
    pub exchange_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub userinfo_calls: AtomicUsize,
    pub fail_exchange: AtomicBool,
    pub fail_refresh: AtomicBool,
    pub fail_userinfo: AtomicBool,
    /// Whether token responses carry a refresh token
    pub issue_refresh_tokens: AtomicBool,
    /// `expires_in` of token responses; zero or less omits it
    pub expires_in: AtomicI64,
    // LinkedIn authorization code -> member id
    codes: DashMap<String, String>,
    // access token -> member id
    access_tokens: DashMap<String, String>,
    // refresh token -> member id
    refresh_tokens: DashMap<String, String>,
    counter: AtomicUsize,
}

impl Default for StubLinkedIn {
    fn default() -> Self {
        Self {
            exchange_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            userinfo_calls: AtomicUsize::new(0),
            fail_exchange: AtomicBool::new(false),
            fail_refresh: AtomicBool::new(false),
            fail_userinfo: AtomicBool::new(false),
            issue_refresh_tokens: AtomicBool::new(true),
            expires_in: AtomicI64::new(5_184_000),
            codes: DashMap::new(),
            access_tokens: DashMap::new(),
            refresh_tokens: DashMap::new(),
            counter: AtomicUsize::new(0),
        }
    }
}

impl StubLinkedIn {
    /// Make LinkedIn issue `code` for `member_id` on its consent screen
    pub fn consent(&self, code: &str, member_id: &str) {
        self.codes.insert(code.to_owned(), member_id.to_owned());
    }

    /// Mint a LinkedIn access token for `member_id` outside any flow
    pub fn mint_access_token(&self, member_id: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let token = format!("li-at-{member_id}-{n}");
        self.access_tokens
            .insert(token.clone(), member_id.to_owned());
        token
    }

    /// Mint a LinkedIn refresh token for `member_id`
    pub fn mint_refresh_token(&self, member_id: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let token = format!("li-rt-{member_id}-{n}");
        self.refresh_tokens
            .insert(token.clone(), member_id.to_owned());
        token
    }

    fn token_response(&self, member_id: &str) -> ExternalTokenResponse {
        let expires_in = self.expires_in.load(Ordering::SeqCst);
        ExternalTokenResponse {
            access_token: self.mint_access_token(member_id),
            expires_in: (expires_in > 0).then_some(expires_in),
            refresh_token: self
                .issue_refresh_tokens
                .load(Ordering::SeqCst)
                .then(|| self.mint_refresh_token(member_id)),
            refresh_token_expires_in: None,
            scope: Some("openid,profile,w_member_social,email".to_owned()),
            token_type: Some("Bearer".to_owned()),
        }
    }
}

#[async_trait]
impl ExternalOAuthClient for StubLinkedIn {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://www.linkedin.com/oauth/v2/authorization?response_type=code&state={state}")
    }

    async fn exchange_code(&self, code: &str) -> OAuthResult<ExternalTokenResponse> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exchange.load(Ordering::SeqCst) {
            return Err(OAuthError::external(Some(400), "invalid_request"));
        }
        let member_id = self
            .codes
            .remove(code)
            .map(|(_, member)| member)
            .ok_or_else(|| OAuthError::external(Some(400), "authorization code not found"))?;
        Ok(self.token_response(&member_id))
    }

    async fn refresh_token(&self, refresh_token: &str) -> OAuthResult<ExternalTokenResponse> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(OAuthError::external(Some(400), "refresh token revoked"));
        }
        let member_id = self
            .refresh_tokens
            .get(refresh_token)
            .map(|m| m.value().clone())
            .ok_or_else(|| OAuthError::external(Some(400), "unknown refresh token"))?;
        Ok(self.token_response(&member_id))
    }

    async fn user_info(&self, access_token: &str) -> OAuthResult<UserInfo> {
        self.userinfo_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_userinfo.load(Ordering::SeqCst) {
            return Err(OAuthError::external(Some(500), "userinfo unavailable"));
        }
        let sub = self
            .access_tokens
            .get(access_token)
            .map(|m| m.value().clone())
            .ok_or_else(|| OAuthError::external(Some(401), "invalid access token"))?;
        Ok(UserInfo {
            sub,
            name: Some("Test Member".to_owned()),
            email: None,
            picture: None,
        })
    }
}

/// Provider wired to an in-memory store and a LinkedIn stub
pub struct TestHarness {
    pub provider: Arc<dyn CorrelationProvider>,
    pub store: Arc<InMemoryTokenStore>,
    pub linkedin: Arc<StubLinkedIn>,
}

impl TestHarness {
    pub fn new(mode: OAuthMode) -> Self {
        init_test_logging();
        let store = Arc::new(InMemoryTokenStore::new());
        let linkedin = Arc::new(StubLinkedIn::default());
        let provider = build_provider(
            mode,
            Arc::clone(&store) as Arc<dyn TokenStore>,
            Arc::clone(&linkedin) as Arc<dyn ExternalOAuthClient>,
        );
        Self {
            provider,
            store,
            linkedin,
        }
    }

    /// Register a client with [`REDIRECT_URI`]
    pub async fn register_client(&self) -> ClientRegistrationResponse {
        self.provider
            .register_client(ClientRegistrationRequest {
                redirect_uris: vec![REDIRECT_URI.to_owned()],
                client_name: Some("Test MCP Client".to_owned()),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    /// Start an authorization that has to go through LinkedIn; returns the correlation state
    pub async fn start_external_flow(&self, request: AuthorizeRequest) -> String {
        match self.provider.authorize(request, None).await.unwrap() {
            AuthorizeOutcome::ExternalRedirect { state, .. } => state,
            AuthorizeOutcome::Issued { .. } => panic!("expected an external redirect"),
        }
    }

    /// Run authorize and the LinkedIn callback for `member_id`
    pub async fn complete_external_flow(
        &self,
        request: AuthorizeRequest,
        member_id: &str,
    ) -> CallbackOutcome {
        let state = self.start_external_flow(request).await;
        let linkedin_code = format!("li-code-{state}");
        self.linkedin.consent(&linkedin_code, member_id);
        self.provider
            .handle_external_callback(&linkedin_code, &state)
            .await
            .unwrap()
    }
}

/// Authorization request for `client_id` with a client state and scope
pub fn authorize_request(client_id: &str) -> AuthorizeRequest {
    AuthorizeRequest {
        response_type: Some("code".to_owned()),
        client_id: client_id.to_owned(),
        redirect_uri: REDIRECT_URI.to_owned(),
        scope: Some("linkedin.posts linkedin.profile".to_owned()),
        state: Some("client-state-xyz".to_owned()),
        code_challenge: None,
        code_challenge_method: None,
    }
}

/// A verifier and its S256 challenge, as an MCP client would generate them
#[derive(Debug, Clone)]
pub struct PkcePair {
    /// Secret verifier sent to the token endpoint
    pub verifier: String,
    /// Challenge sent to the authorization endpoint
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh S256 pair with a 64-character verifier
    pub fn generate() -> Self {
        let verifier: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();
        let challenge = s256_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}
