// ABOUTME: OAuth 2.0 dynamic client registration (RFC 7591) and client authentication
// ABOUTME: Client secrets are returned once and stored only as Argon2 hashes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::models::{ClientRegistrationRequest, ClientRegistrationResponse};
use crate::store::TokenStore;
use crate::utils::random::generate_token;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use linkedin_core::constants::oauth::DEFAULT_CLIENT_NAME;
use linkedin_core::errors::{AppError, OAuthError, OAuthResult};
use linkedin_core::models::ClientRegistration;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// OAuth 2.0 Client Registration Manager
pub struct ClientRegistrationManager {
    store: Arc<dyn TokenStore>,
}

impl ClientRegistrationManager {
    /// Creates a new client registration manager
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Register a new OAuth 2.0 client (RFC 7591)
    ///
    /// # Errors
    /// Returns `InvalidRedirectUri` when no redirect URI is given or one is not
    /// an absolute URL, and `Storage` when the client cannot be persisted
    pub async fn register_client(
        &self,
        request: ClientRegistrationRequest,
    ) -> OAuthResult<ClientRegistrationResponse> {
        Self::validate_redirect_uris(&request.redirect_uris)?;

        let client_id = Uuid::new_v4().to_string();
        let client_secret = generate_token()?;
        let client_secret_hash = Self::hash_client_secret(&client_secret)?;
        let client_name = request
            .client_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_owned());
        let created_at = Utc::now();

        let client = ClientRegistration {
            client_id: client_id.clone(),
            client_secret_hash,
            client_name: client_name.clone(),
            redirect_uris: request.redirect_uris.clone(),
            created_at,
        };

        self.store.store_client(&client).await.map_err(|e| {
            tracing::error!(
                error = %e,
                client_id = %client_id,
                "Failed to store OAuth client registration"
            );
            OAuthError::from(e)
        })?;

        tracing::info!(
            client_id = %client_id,
            redirect_uris = client.redirect_uris.len(),
            "Registered OAuth client"
        );

        Ok(ClientRegistrationResponse {
            client_id,
            client_secret,
            client_name,
            redirect_uris: request.redirect_uris,
            client_id_issued_at: created_at.timestamp(),
            client_secret_expires_at: 0,
        })
    }

    /// Look up a client and check that `redirect_uri` is one of its registered URIs
    ///
    /// # Errors
    /// Returns `InvalidClient` for an unknown client or an unregistered redirect URI
    pub async fn validate_redirect(
        &self,
        client_id: &str,
        redirect_uri: &str,
    ) -> OAuthResult<ClientRegistration> {
        let client = self.get_client(client_id).await?;
        if !client.allows_redirect(redirect_uri) {
            tracing::warn!(client_id = %client_id, "Redirect URI not registered for client");
            return Err(OAuthError::InvalidClient(
                "redirect_uri is not registered for this client".to_owned(),
            ));
        }
        Ok(client)
    }

    /// Authenticate a client by id and secret
    ///
    /// # Errors
    /// Returns `InvalidClient` for an unknown client or a wrong secret
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> OAuthResult<ClientRegistration> {
        let client = self.get_client(client_id).await?;
        Self::verify_client_secret(client_id, client_secret, &client.client_secret_hash)?;
        tracing::debug!(client_id = %client_id, "OAuth client authenticated");
        Ok(client)
    }

    /// Get client by `client_id`
    ///
    /// # Errors
    /// Returns `InvalidClient` when the client is unknown
    pub async fn get_client(&self, client_id: &str) -> OAuthResult<ClientRegistration> {
        self.store
            .get_client(client_id)
            .await?
            .ok_or_else(|| OAuthError::InvalidClient(format!("Unknown client_id: {client_id}")))
    }

    fn validate_redirect_uris(uris: &[String]) -> OAuthResult<()> {
        if uris.is_empty() {
            return Err(OAuthError::InvalidRedirectUri(
                "At least one redirect URI required".to_owned(),
            ));
        }
        for uri in uris {
            if !Self::is_valid_redirect_uri(uri) {
                return Err(OAuthError::InvalidRedirectUri(format!(
                    "Invalid redirect_uri: {uri}"
                )));
            }
        }
        Ok(())
    }

    /// Absolute URI without a fragment (RFC 6749 Section 3.1.2)
    fn is_valid_redirect_uri(uri: &str) -> bool {
        if uri.trim().is_empty() {
            return false;
        }
        Url::parse(uri).is_ok_and(|url| url.fragment().is_none() && !url.cannot_be_a_base())
    }

    fn hash_client_secret(secret: &str) -> OAuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                tracing::error!("Failed to hash client secret: {e}");
                OAuthError::from(AppError::internal("Failed to hash client secret"))
            })
    }

    fn verify_client_secret(
        client_id: &str,
        client_secret: &str,
        client_secret_hash: &str,
    ) -> OAuthResult<()> {
        let parsed_hash = PasswordHash::new(client_secret_hash).map_err(|e| {
            tracing::error!("Failed to parse stored client secret hash: {e}");
            OAuthError::InvalidClient("Client authentication failed".to_owned())
        })?;

        if Argon2::default()
            .verify_password(client_secret.as_bytes(), &parsed_hash)
            .is_err()
        {
            tracing::warn!(client_id = %client_id, "OAuth client secret validation failed");
            return Err(OAuthError::InvalidClient(
                "Client authentication failed".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTokenStore;

    fn manager() -> ClientRegistrationManager {
        ClientRegistrationManager::new(Arc::new(InMemoryTokenStore::new()))
    }

    fn request(uris: &[&str]) -> ClientRegistrationRequest {
        ClientRegistrationRequest {
            redirect_uris: uris.iter().map(|u| (*u).to_owned()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_defaults_client_name() {
        let response = manager()
            .register_client(request(&["https://app.example/cb"]))
            .await
            .unwrap();
        assert_eq!(response.client_name, "Unknown Client");
        assert_eq!(response.client_secret.len(), 43);
    }

    #[tokio::test]
    async fn test_register_requires_redirect_uri() {
        let err = manager().register_client(request(&[])).await.unwrap_err();
        assert_eq!(err.error_code(), "invalid_redirect_uri");
        assert_eq!(err.description(), "At least one redirect URI required");
    }

    #[tokio::test]
    async fn test_register_rejects_relative_and_fragment_uris() {
        let mgr = manager();
        assert!(mgr.register_client(request(&["/cb"])).await.is_err());
        assert!(mgr
            .register_client(request(&["https://app.example/cb#frag"]))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_authenticate_checks_secret() {
        let mgr = manager();
        let response = mgr
            .register_client(request(&["https://app.example/cb"]))
            .await
            .unwrap();
        assert!(mgr
            .authenticate(&response.client_id, &response.client_secret)
            .await
            .is_ok());
        let err = mgr
            .authenticate(&response.client_id, "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_client");
    }
}
