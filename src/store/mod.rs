// ABOUTME: Token and code store abstraction with in-memory and SQLite backends
// ABOUTME: Guarantees atomic consume-or-fail for pending states, codes, and refresh tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Token/Code Store
//!
//! One authoritative store holds every artifact of the correlation flow.
//! Every `consume_*` operation is a single atomic remove: when callers race on
//! the same key exactly one of them receives the record and the others get
//! `None`. No operation spans more than one key.
//!
//! Expiry is checked lazily by the callers (and by `consume_pending`);
//! [`spawn_reaper`] only reclaims memory.

/// `DashMap`-backed store
pub mod memory;
/// `sqlx` SQLite-backed store
pub mod sqlite;

pub use memory::InMemoryTokenStore;
pub use sqlite::SqliteTokenStore;

use crate::config::StoreBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linkedin_core::errors::AppResult;
use linkedin_core::models::{
    AuthorizationCode, ClientRegistration, ExternalToken, IssuedToken, PendingAuthorization,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Persistence operations the correlation provider depends on
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a newly registered client
    async fn store_client(&self, client: &ClientRegistration) -> AppResult<()>;

    /// Look up a client by id
    async fn get_client(&self, client_id: &str) -> AppResult<Option<ClientRegistration>>;

    /// Persist a pending external authorization under its state
    async fn store_pending(&self, pending: &PendingAuthorization) -> AppResult<()>;

    /// Atomically remove and return the pending authorization for `state`.
    /// Returns `None` when it is missing, already consumed, or expired at `now`;
    /// an expired entry is removed as well.
    async fn consume_pending(
        &self,
        state: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<PendingAuthorization>>;

    /// Number of stored pending authorizations
    async fn pending_count(&self) -> AppResult<usize>;

    /// Persist an authorization code
    async fn store_auth_code(&self, code: &AuthorizationCode) -> AppResult<()>;

    /// Atomically remove and return an authorization code
    async fn consume_auth_code(&self, code: &str) -> AppResult<Option<AuthorizationCode>>;

    /// Number of stored authorization codes
    async fn auth_code_count(&self) -> AppResult<usize>;

    /// Persist a local access/refresh token pair
    async fn store_issued_token(&self, token: &IssuedToken) -> AppResult<()>;

    /// Look up a local token pair by access token
    async fn get_access_token(&self, access_token: &str) -> AppResult<Option<IssuedToken>>;

    /// Atomically remove and return the pair owning `refresh_token`.
    /// The pair's access token is revoked with it.
    async fn consume_refresh_token(&self, refresh_token: &str)
        -> AppResult<Option<IssuedToken>>;

    /// Number of stored local token pairs
    async fn issued_token_count(&self) -> AppResult<usize>;

    /// Insert or replace the external token for `(user_id, provider)`; last write wins
    async fn link_external_token(&self, token: &ExternalToken) -> AppResult<()>;

    /// Look up the external token for `(user_id, provider)`
    async fn get_external_token(
        &self,
        user_id: &str,
        provider: &str,
    ) -> AppResult<Option<ExternalToken>>;

    /// Fully replace an existing external token
    ///
    /// # Errors
    ///
    /// Returns a not-found error when nothing is linked for `(user_id, provider)`
    async fn update_external_token(&self, token: &ExternalToken) -> AppResult<()>;

    /// Remove and return the external token for `(user_id, provider)`
    async fn remove_external_token(
        &self,
        user_id: &str,
        provider: &str,
    ) -> AppResult<Option<ExternalToken>>;

    /// Delete expired pending flows, codes, and refresh-expired token pairs.
    /// Returns the number of records removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<usize>;
}

/// Open the store selected by configuration
///
/// # Errors
///
/// Returns an error if the SQLite database cannot be opened or migrated
pub async fn open_store(backend: &StoreBackend) -> AppResult<Arc<dyn TokenStore>> {
    match backend {
        StoreBackend::Memory => {
            info!("Using in-memory token store");
            Ok(Arc::new(InMemoryTokenStore::new()))
        }
        StoreBackend::Sqlite { url } => {
            info!(database.url = %url, "Using SQLite token store");
            Ok(Arc::new(SqliteTokenStore::connect(url).await?))
        }
    }
}

/// Shortest period the reaper runs at; smaller requests are raised to it
pub const MIN_REAPER_INTERVAL: Duration = Duration::from_millis(10);

/// Handle to a running reaper task
pub struct ReaperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Signal the reaper to stop and wait for it to finish
    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).await.is_err() {
            debug!("Reaper task already stopped");
        }
        if let Err(e) = self.task.await {
            warn!(error = %e, "Reaper task ended abnormally");
        }
    }
}

/// Spawn a background task that purges expired artifacts every `every`,
/// raised to at least [`MIN_REAPER_INTERVAL`]
#[must_use]
pub fn spawn_reaper(store: Arc<dyn TokenStore>, every: Duration) -> ReaperHandle {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    if every < MIN_REAPER_INTERVAL {
        warn!(
            requested_ms = every.as_millis(),
            minimum_ms = MIN_REAPER_INTERVAL.as_millis(),
            "Reaper interval below minimum; clamping"
        );
    }
    let every = every.max(MIN_REAPER_INTERVAL);

    let task = tokio::spawn(async move {
        let mut ticker = interval(every);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match store.purge_expired(Utc::now()).await {
                        Ok(0) => {}
                        Ok(removed) => debug!(removed, "Reaper purged expired OAuth records"),
                        Err(e) => warn!(error = %e, "Reaper failed to purge expired records"),
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!("Reaper task received shutdown signal");
                    break;
                }
            }
        }
    });

    ReaperHandle { shutdown_tx, task }
}
