// ABOUTME: In-memory TokenStore backed by sharded DashMaps
// ABOUTME: Consume operations use DashMap::remove so racing callers see exactly one winner
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::TokenStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use linkedin_core::errors::{AppError, AppResult};
use linkedin_core::models::{
    AuthorizationCode, ClientRegistration, ExternalToken, IssuedToken, PendingAuthorization,
};

type ExternalKey = (String, String);

/// Process-local store; one map per record kind, no global lock
#[derive(Default)]
pub struct InMemoryTokenStore {
    clients: DashMap<String, ClientRegistration>,
    pending: DashMap<String, PendingAuthorization>,
    codes: DashMap<String, AuthorizationCode>,
    // keyed by access token
    issued: DashMap<String, IssuedToken>,
    // refresh token -> access token
    refresh_index: DashMap<String, String>,
    external: DashMap<ExternalKey, ExternalToken>,
}

impl InMemoryTokenStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn external_key(user_id: &str, provider: &str) -> ExternalKey {
        (user_id.to_owned(), provider.to_owned())
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn store_client(&self, client: &ClientRegistration) -> AppResult<()> {
        match self.clients.entry(client.client_id.clone()) {
            Entry::Occupied(_) => Err(AppError::already_exists(format!(
                "OAuth client {}",
                client.client_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(client.clone());
                Ok(())
            }
        }
    }

    async fn get_client(&self, client_id: &str) -> AppResult<Option<ClientRegistration>> {
        Ok(self.clients.get(client_id).map(|c| c.value().clone()))
    }

    async fn store_pending(&self, pending: &PendingAuthorization) -> AppResult<()> {
        self.pending.insert(pending.state.clone(), pending.clone());
        Ok(())
    }

    async fn consume_pending(
        &self,
        state: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<PendingAuthorization>> {
        Ok(self
            .pending
            .remove(state)
            .map(|(_, pending)| pending)
            .filter(|pending| !pending.is_expired(now)))
    }

    async fn pending_count(&self) -> AppResult<usize> {
        Ok(self.pending.len())
    }

    async fn store_auth_code(&self, code: &AuthorizationCode) -> AppResult<()> {
        self.codes.insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn consume_auth_code(&self, code: &str) -> AppResult<Option<AuthorizationCode>> {
        Ok(self.codes.remove(code).map(|(_, code)| code))
    }

    async fn auth_code_count(&self) -> AppResult<usize> {
        Ok(self.codes.len())
    }

    async fn store_issued_token(&self, token: &IssuedToken) -> AppResult<()> {
        self.refresh_index
            .insert(token.refresh_token.clone(), token.access_token.clone());
        self.issued
            .insert(token.access_token.clone(), token.clone());
        Ok(())
    }

    async fn get_access_token(&self, access_token: &str) -> AppResult<Option<IssuedToken>> {
        Ok(self.issued.get(access_token).map(|t| t.value().clone()))
    }

    async fn consume_refresh_token(
        &self,
        refresh_token: &str,
    ) -> AppResult<Option<IssuedToken>> {
        let Some((_, access_token)) = self.refresh_index.remove(refresh_token) else {
            return Ok(None);
        };
        Ok(self.issued.remove(&access_token).map(|(_, token)| token))
    }

    async fn issued_token_count(&self) -> AppResult<usize> {
        Ok(self.issued.len())
    }

    async fn link_external_token(&self, token: &ExternalToken) -> AppResult<()> {
        self.external.insert(
            Self::external_key(&token.user_id, &token.provider),
            token.clone(),
        );
        Ok(())
    }

    async fn get_external_token(
        &self,
        user_id: &str,
        provider: &str,
    ) -> AppResult<Option<ExternalToken>> {
        Ok(self
            .external
            .get(&Self::external_key(user_id, provider))
            .map(|t| t.value().clone()))
    }

    async fn update_external_token(&self, token: &ExternalToken) -> AppResult<()> {
        let key = Self::external_key(&token.user_id, &token.provider);
        let Some(mut existing) = self.external.get_mut(&key) else {
            return Err(AppError::not_found(format!(
                "{} token for user {}",
                token.provider, token.user_id
            )));
        };
        *existing = token.clone();
        Ok(())
    }

    async fn remove_external_token(
        &self,
        user_id: &str,
        provider: &str,
    ) -> AppResult<Option<ExternalToken>> {
        Ok(self
            .external
            .remove(&Self::external_key(user_id, provider))
            .map(|(_, token)| token))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let mut removed = 0usize;

        self.pending.retain(|_, pending| {
            let keep = !pending.is_expired(now);
            removed += usize::from(!keep);
            keep
        });
        self.codes.retain(|_, code| {
            let keep = !code.is_expired(now);
            removed += usize::from(!keep);
            keep
        });

        let mut dead_refresh_tokens = Vec::new();
        self.issued.retain(|_, token| {
            let keep = !token.refresh_expired(now);
            if !keep {
                dead_refresh_tokens.push(token.refresh_token.clone());
                removed += 1;
            }
            keep
        });
        for refresh_token in dead_refresh_tokens {
            self.refresh_index.remove(&refresh_token);
        }

        Ok(removed)
    }
}
