// ABOUTME: LinkedIn OAuth 2.0 client for the external leg of the correlation flow
// ABOUTME: Builds authorization URLs and performs code exchange, refresh, and userinfo lookups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::config::{HttpClientConfig, LinkedInConfig};
use crate::utils::http_client::oauth_client;
use async_trait::async_trait;
use linkedin_core::constants::linkedin;
use linkedin_core::constants::oauth::{grant_types, DEFAULT_EXTERNAL_TOKEN_EXPIRY_SECS};
use linkedin_core::errors::{AppError, AppResult, OAuthError, OAuthResult};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Token response from the external provider's token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTokenResponse {
    /// Provider access token
    pub access_token: String,
    /// Lifetime in seconds; LinkedIn omits it on some grants
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Provider refresh token, only for apps with programmatic refresh enabled
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Refresh token lifetime in seconds
    #[serde(default)]
    pub refresh_token_expires_in: Option<i64>,
    /// Granted scopes (LinkedIn returns them comma-separated)
    #[serde(default)]
    pub scope: Option<String>,
    /// Token type, normally `Bearer`
    #[serde(default)]
    pub token_type: Option<String>,
}

impl ExternalTokenResponse {
    /// Lifetime in seconds, defaulting to LinkedIn's 60-day access token lifetime
    #[must_use]
    pub fn expires_in_or_default(&self) -> i64 {
        self.expires_in
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_EXTERNAL_TOKEN_EXPIRY_SECS)
    }
}

/// OpenID Connect userinfo claims returned by LinkedIn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Stable LinkedIn member identifier, used as the local user id
    pub sub: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Primary email, when the `email` scope was granted
    #[serde(default)]
    pub email: Option<String>,
    /// Profile picture URL
    #[serde(default)]
    pub picture: Option<String>,
}

/// External identity provider operations the correlation provider depends on
///
/// Implementations perform no retries; every transport failure or non-2xx
/// response surfaces as [`OAuthError::ExternalProvider`].
#[async_trait]
pub trait ExternalOAuthClient: Send + Sync {
    /// Provider key under which linked tokens are stored
    fn provider_name(&self) -> &'static str {
        linkedin::PROVIDER_NAME
    }

    /// Authorization URL embedding `state`. Pure, no network.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange a provider authorization code for tokens
    async fn exchange_code(&self, code: &str) -> OAuthResult<ExternalTokenResponse>;

    /// Obtain a new access token with a provider refresh token
    async fn refresh_token(&self, refresh_token: &str) -> OAuthResult<ExternalTokenResponse>;

    /// Resolve the identity behind a provider access token
    async fn user_info(&self, access_token: &str) -> OAuthResult<UserInfo>;
}

/// reqwest-backed LinkedIn client
pub struct LinkedInOAuthClient {
    config: LinkedInConfig,
    auth_url: Url,
    client: Client,
}

impl LinkedInOAuthClient {
    /// Create a client with timeouts from `http`
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization URL is not a valid URL
    pub fn new(config: LinkedInConfig, http: &HttpClientConfig) -> AppResult<Self> {
        Self::with_client(config, oauth_client(http))
    }

    /// Create a client around an existing reqwest client
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization URL is not a valid URL
    pub fn with_client(config: LinkedInConfig, client: Client) -> AppResult<Self> {
        let auth_url = Url::parse(&config.auth_url).map_err(|e| {
            let url = &config.auth_url;
            AppError::config_invalid(format!("Invalid LINKEDIN_AUTH_URL '{url}': {e}"))
        })?;
        Ok(Self {
            config,
            auth_url,
            client,
        })
    }

    /// Get the LinkedIn configuration
    #[must_use]
    pub const fn config(&self) -> &LinkedInConfig {
        &self.config
    }

    async fn post_token_form(&self, params: &[(&str, &str)]) -> OAuthResult<ExternalTokenResponse> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await
            .map_err(transport_error)?;
        read_json(response).await
    }
}

#[async_trait]
impl ExternalOAuthClient for LinkedInOAuthClient {
    fn authorization_url(&self, state: &str) -> String {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("state", state)
            .append_pair("scope", &self.config.scopes.join(" "));
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> OAuthResult<ExternalTokenResponse> {
        debug!("Exchanging LinkedIn authorization code");
        let params = [
            ("grant_type", grant_types::AUTHORIZATION_CODE),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        self.post_token_form(&params).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> OAuthResult<ExternalTokenResponse> {
        debug!("Refreshing LinkedIn access token");
        let params = [
            ("grant_type", grant_types::REFRESH_TOKEN),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        self.post_token_form(&params).await
    }

    async fn user_info(&self, access_token: &str) -> OAuthResult<UserInfo> {
        let response = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;
        read_json(response).await
    }
}

fn transport_error(error: reqwest::Error) -> OAuthError {
    OAuthError::external(error.status().map(|s| s.as_u16()), error.to_string())
}

/// Decode a successful JSON body, or surface the upstream status and body
async fn read_json<T: DeserializeOwned>(response: Response) -> OAuthResult<T> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;
    if !status.is_success() {
        return Err(OAuthError::external(Some(status.as_u16()), body));
    }
    serde_json::from_str(&body).map_err(|e| {
        OAuthError::external(
            Some(status.as_u16()),
            format!("Malformed provider response: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> LinkedInOAuthClient {
        let config = LinkedInConfig::with_credentials(
            "li-client",
            "li-secret",
            "http://localhost:8000/oauth/callback",
        );
        LinkedInOAuthClient::with_client(config, Client::new()).unwrap()
    }

    #[test]
    fn test_authorization_url_embeds_state_and_scopes() {
        let url = Url::parse(&client().authorization_url("corr-state")).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.clone())
        };

        assert_eq!(url.host_str(), Some("www.linkedin.com"));
        assert_eq!(get("response_type").as_deref(), Some("code"));
        assert_eq!(get("client_id").as_deref(), Some("li-client"));
        assert_eq!(get("state").as_deref(), Some("corr-state"));
        assert_eq!(
            get("redirect_uri").as_deref(),
            Some("http://localhost:8000/oauth/callback")
        );
        assert_eq!(
            get("scope").as_deref(),
            Some("openid profile w_member_social email")
        );
    }

    #[test]
    fn test_invalid_auth_url_rejected() {
        let mut config = LinkedInConfig::with_credentials("id", "secret", "http://x/cb");
        config.auth_url = "not a url".to_owned();
        assert!(LinkedInOAuthClient::with_client(config, Client::new()).is_err());
    }

    #[test]
    fn test_expires_in_defaults_to_sixty_days() {
        let token: ExternalTokenResponse =
            serde_json::from_str(r#"{"access_token":"AQX"}"#).unwrap();
        assert_eq!(token.expires_in_or_default(), 5_184_000);

        let token: ExternalTokenResponse =
            serde_json::from_str(r#"{"access_token":"AQX","expires_in":3600}"#).unwrap();
        assert_eq!(token.expires_in_or_default(), 3600);
    }
}
