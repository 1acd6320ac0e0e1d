// ABOUTME: Environment configuration for the OAuth correlation server
// ABOUTME: Parses ports, operating mode, LinkedIn credentials, store backend, and HTTP client timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Environment-based configuration management

use anyhow::{anyhow, Context, Result};
use linkedin_core::constants::linkedin;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use tracing::{info, warn};

/// Which correlation provider variant serves the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OAuthMode {
    /// Local access/refresh tokens, LinkedIn tokens stay server-side
    #[default]
    Standard,
    /// LinkedIn tokens handed to the client, no local tokens issued
    Proxy,
}

impl OAuthMode {
    /// Mode selected by the `OAUTH_PROXY_MODE` flag
    #[must_use]
    pub const fn from_proxy_flag(proxy: bool) -> Self {
        if proxy {
            Self::Proxy
        } else {
            Self::Standard
        }
    }

    /// Label used in logs and the health endpoint
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Proxy => "proxy",
        }
    }
}

impl fmt::Display for OAuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage backend for clients, pending flows, codes, and tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    /// Process-local maps; everything is lost on restart
    Memory,
    /// SQLite database at the given connection URL
    Sqlite {
        /// sqlx connection URL (`sqlite:path.db` or `sqlite::memory:`)
        url: String,
    },
}

impl StoreBackend {
    /// Parse `STORE_BACKEND` together with `DATABASE_URL`
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown backend name
    pub fn parse(backend: &str, database_url: &str) -> Result<Self> {
        match backend.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite {
                url: database_url.to_owned(),
            }),
            other => Err(anyhow!(
                "Invalid STORE_BACKEND value '{other}' (expected 'memory' or 'sqlite')"
            )),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Sqlite { url } => write!(f, "sqlite ({url})"),
        }
    }
}

/// LinkedIn application credentials and endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInConfig {
    /// LinkedIn application client ID
    pub client_id: String,
    /// LinkedIn application client secret
    pub client_secret: String,
    /// Callback registered with LinkedIn, served by `/oauth/callback`
    pub redirect_uri: String,
    /// Scopes requested from LinkedIn
    pub scopes: Vec<String>,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token endpoint
    pub token_url: String,
    /// Userinfo endpoint
    pub userinfo_url: String,
}

impl LinkedInConfig {
    /// Configuration against the public LinkedIn endpoints with default scopes
    #[must_use]
    pub fn with_credentials(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        Self {
            client_id: client_id.to_owned(),
            client_secret: client_secret.to_owned(),
            redirect_uri: redirect_uri.to_owned(),
            scopes: parse_scopes(linkedin::DEFAULT_SCOPES),
            auth_url: linkedin::AUTH_URL.to_owned(),
            token_url: linkedin::TOKEN_URL.to_owned(),
            userinfo_url: linkedin::USERINFO_URL.to_owned(),
        }
    }
}

/// Timeouts for outbound calls to LinkedIn
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Connection establishment timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Selected backend
    pub backend: StoreBackend,
    /// Seconds between expired-artifact sweeps
    pub reaper_interval_secs: u64,
}

/// Server configuration loaded from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Public base URL of this server, used as the OAuth issuer
    pub server_url: String,
    /// Correlation provider variant
    pub mode: OAuthMode,
    /// LinkedIn application settings
    pub linkedin: LinkedInConfig,
    /// Storage settings
    pub store: StoreConfig,
    /// Outbound HTTP client settings
    pub http_client: HttpClientConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a value fails to parse or validation fails
    pub fn from_env() -> Result<Self> {
        let http_port: u16 = env_var_or("HTTP_PORT", "8000")?
            .parse()
            .context("Invalid HTTP_PORT value")?;
        let server_url = env_var_or("OAUTH_SERVER_URL", &format!("http://localhost:{http_port}"))?
            .trim_end_matches('/')
            .to_owned();
        let proxy: bool = env_var_or("OAUTH_PROXY_MODE", "false")?
            .to_lowercase()
            .parse()
            .context("Invalid OAUTH_PROXY_MODE value")?;

        let config = Self {
            http_port,
            mode: OAuthMode::from_proxy_flag(proxy),
            linkedin: LinkedInConfig {
                client_id: env_var_or("LINKEDIN_CLIENT_ID", "")?,
                client_secret: env_var_or("LINKEDIN_CLIENT_SECRET", "")?,
                redirect_uri: env_var_or(
                    "LINKEDIN_REDIRECT_URI",
                    &format!("{server_url}/oauth/callback"),
                )?,
                scopes: parse_scopes(&env_var_or("LINKEDIN_SCOPES", linkedin::DEFAULT_SCOPES)?),
                auth_url: env_var_or("LINKEDIN_AUTH_URL", linkedin::AUTH_URL)?,
                token_url: env_var_or("LINKEDIN_TOKEN_URL", linkedin::TOKEN_URL)?,
                userinfo_url: env_var_or("LINKEDIN_USERINFO_URL", linkedin::USERINFO_URL)?,
            },
            store: StoreConfig {
                backend: StoreBackend::parse(
                    &env_var_or("STORE_BACKEND", "memory")?,
                    &env_var_or("DATABASE_URL", "sqlite:linkedin_oauth.db")?,
                )?,
                reaper_interval_secs: env_var_or("STORE_REAPER_INTERVAL_SECS", "300")?
                    .parse()
                    .context("Invalid STORE_REAPER_INTERVAL_SECS value")?,
            },
            http_client: HttpClientConfig {
                timeout_secs: env_var_or("HTTP_CLIENT_TIMEOUT_SECS", "30")?
                    .parse()
                    .context("Invalid HTTP_CLIENT_TIMEOUT_SECS value")?,
                connect_timeout_secs: env_var_or("HTTP_CLIENT_CONNECT_TIMEOUT_SECS", "10")?
                    .parse()
                    .context("Invalid HTTP_CLIENT_CONNECT_TIMEOUT_SECS value")?,
            },
            server_url,
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error when LinkedIn credentials are missing or a value is out of range
    pub fn validate(&self) -> Result<()> {
        if self.linkedin.client_id.is_empty() || self.linkedin.client_secret.is_empty() {
            return Err(anyhow!(
                "LINKEDIN_CLIENT_ID and LINKEDIN_CLIENT_SECRET must be set"
            ));
        }
        if self.linkedin.scopes.is_empty() {
            return Err(anyhow!("LINKEDIN_SCOPES must name at least one scope"));
        }
        if self.store.reaper_interval_secs == 0 {
            return Err(anyhow!(
                "STORE_REAPER_INTERVAL_SECS must be greater than zero"
            ));
        }
        if self.http_client.timeout_secs == 0 {
            return Err(anyhow!(
                "HTTP_CLIENT_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.linkedin.client_id.starts_with("test_")
            || self.linkedin.client_secret.starts_with("test_")
        {
            warn!("Using test LinkedIn credentials; the LinkedIn leg of the flow will fail");
        }

        Ok(())
    }

    /// Human-readable configuration summary without secrets
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "LinkedIn MCP Server Configuration:\n\
             - HTTP Port: {}\n\
             - OAuth Server URL: {}\n\
             - OAuth Mode: {}\n\
             - LinkedIn Redirect URI: {}\n\
             - LinkedIn Scopes: {}\n\
             - Store: {}\n\
             - Reaper Interval: {}s\n\
             - HTTP Client Timeouts: {}s request, {}s connect",
            self.http_port,
            self.server_url,
            self.mode,
            self.linkedin.redirect_uri,
            self.linkedin.scopes.join(" "),
            self.store.backend,
            self.store.reaper_interval_secs,
            self.http_client.timeout_secs,
            self.http_client.connect_timeout_secs,
        )
    }
}

/// Read an environment variable, falling back to `default` when unset
fn env_var_or(key: &str, default: &str) -> Result<String> {
    match env::var(key) {
        Ok(value) => Ok(value),
        Err(env::VarError::NotPresent) => Ok(default.to_owned()),
        Err(env::VarError::NotUnicode(_)) => Err(anyhow!("{key} is not valid unicode")),
    }
}

/// Parse comma-separated scopes
#[must_use]
pub fn parse_scopes(scopes_str: &str) -> Vec<String> {
    scopes_str
        .split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}
