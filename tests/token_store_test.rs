// ABOUTME: Integration tests for the TokenStore backends
// ABOUTME: Runs the same consume, upsert, and purge checks against DashMap and SQLite stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{DateTime, Duration, Utc};
use linkedin_mcp_server::errors::ErrorCode;
use linkedin_mcp_server::models::{
    AuthorizationCode, ClientRegistration, ExternalToken, IssuedToken, PendingAuthorization,
};
use linkedin_mcp_server::store::{
    spawn_reaper, InMemoryTokenStore, SqliteTokenStore, TokenStore, MIN_REAPER_INTERVAL,
};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tempfile::TempDir;
use tokio::time::sleep;

fn client(client_id: &str) -> ClientRegistration {
    ClientRegistration {
        client_id: client_id.to_owned(),
        client_secret_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_owned(),
        client_name: "Store Test".to_owned(),
        redirect_uris: vec![
            "https://app.example/cb".to_owned(),
            "http://localhost:3000/cb".to_owned(),
        ],
        created_at: Utc::now(),
    }
}

fn pending(state: &str, expires_at: DateTime<Utc>) -> PendingAuthorization {
    PendingAuthorization {
        state: state.to_owned(),
        client_id: "client".to_owned(),
        redirect_uri: "https://app.example/cb".to_owned(),
        client_state: Some("orig".to_owned()),
        scope: Some("profile".to_owned()),
        code_challenge: Some("c".repeat(43)),
        code_challenge_method: Some("S256".to_owned()),
        created_at: expires_at - Duration::seconds(600),
        expires_at,
    }
}

fn code(value: &str, created_at: DateTime<Utc>) -> AuthorizationCode {
    AuthorizationCode {
        code: value.to_owned(),
        user_id: "member".to_owned(),
        client_id: "client".to_owned(),
        redirect_uri: "https://app.example/cb".to_owned(),
        scope: None,
        code_challenge: None,
        code_challenge_method: None,
        created_at,
    }
}

fn issued(access: &str, refresh: &str, refresh_expires_at: DateTime<Utc>) -> IssuedToken {
    let now = Utc::now();
    IssuedToken {
        access_token: access.to_owned(),
        refresh_token: refresh.to_owned(),
        user_id: "member".to_owned(),
        client_id: "client".to_owned(),
        scope: Some("profile".to_owned()),
        access_expires_at: now + Duration::seconds(3600),
        refresh_expires_at,
        created_at: now,
    }
}

fn external(access: &str) -> ExternalToken {
    let now = Utc::now();
    ExternalToken {
        user_id: "member".to_owned(),
        provider: "linkedin".to_owned(),
        access_token: access.to_owned(),
        refresh_token: Some("li-refresh".to_owned()),
        expires_at: now + Duration::days(60),
        scope: Some("openid profile".to_owned()),
        updated_at: now,
    }
}

async fn sqlite_store() -> (Arc<dyn TokenStore>, TempDir) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("tokens.db").display());
    let store = SqliteTokenStore::connect(&url).await.unwrap();
    (Arc::new(store), dir)
}

async fn check_clients(store: &dyn TokenStore) {
    store.store_client(&client("c1")).await.unwrap();
    let loaded = store.get_client("c1").await.unwrap().unwrap();
    assert_eq!(loaded.redirect_uris.len(), 2);
    assert!(loaded.allows_redirect("http://localhost:3000/cb"));
    assert!(store.get_client("missing").await.unwrap().is_none());
}

async fn check_pending_consumed_once(store: &dyn TokenStore) {
    let now = Utc::now();
    store
        .store_pending(&pending("s1", now + Duration::seconds(600)))
        .await
        .unwrap();
    assert_eq!(store.pending_count().await.unwrap(), 1);

    let first = store.consume_pending("s1", now).await.unwrap().unwrap();
    assert_eq!(first.client_state.as_deref(), Some("orig"));
    assert_eq!(first.code_challenge_method.as_deref(), Some("S256"));
    assert!(store.consume_pending("s1", now).await.unwrap().is_none());
    assert_eq!(store.pending_count().await.unwrap(), 0);
}

async fn check_expired_pending_not_returned(store: &dyn TokenStore) {
    let now = Utc::now();
    store
        .store_pending(&pending("old", now - Duration::seconds(1)))
        .await
        .unwrap();
    assert!(store.consume_pending("old", now).await.unwrap().is_none());
    assert_eq!(store.pending_count().await.unwrap(), 0);
}

async fn check_codes(store: &dyn TokenStore) {
    store
        .store_auth_code(&code("k1", Utc::now()))
        .await
        .unwrap();
    let (a, b) = tokio::join!(store.consume_auth_code("k1"), store.consume_auth_code("k1"));
    let winners = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter(Option::is_some)
        .count();
    assert_eq!(winners, 1);
    assert_eq!(store.auth_code_count().await.unwrap(), 0);
}

async fn check_refresh_consumption_revokes_pair(store: &dyn TokenStore) {
    let later = Utc::now() + Duration::days(30);
    store
        .store_issued_token(&issued("at-1", "rt-1", later))
        .await
        .unwrap();
    assert!(store.get_access_token("at-1").await.unwrap().is_some());

    let consumed = store.consume_refresh_token("rt-1").await.unwrap().unwrap();
    assert_eq!(consumed.access_token, "at-1");
    assert!(store.consume_refresh_token("rt-1").await.unwrap().is_none());
    assert!(store.get_access_token("at-1").await.unwrap().is_none());
    assert_eq!(store.issued_token_count().await.unwrap(), 0);
}

async fn check_external_tokens(store: &dyn TokenStore) {
    let err = store
        .update_external_token(&external("nothing-linked"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    store.link_external_token(&external("li-1")).await.unwrap();
    store.link_external_token(&external("li-2")).await.unwrap();
    let linked = store
        .get_external_token("member", "linkedin")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.access_token, "li-2");

    let mut replacement = external("li-3");
    replacement.refresh_token = None;
    store.update_external_token(&replacement).await.unwrap();
    let linked = store
        .get_external_token("member", "linkedin")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.access_token, "li-3");
    assert!(linked.refresh_token.is_none());

    assert!(store
        .get_external_token("member", "other-provider")
        .await
        .unwrap()
        .is_none());

    let removed = store
        .remove_external_token("member", "linkedin")
        .await
        .unwrap();
    assert_eq!(removed.map(|t| t.access_token).as_deref(), Some("li-3"));
    assert!(store
        .remove_external_token("member", "linkedin")
        .await
        .unwrap()
        .is_none());
}

async fn check_purge(store: &dyn TokenStore) {
    let now = Utc::now();
    store
        .store_pending(&pending("live", now + Duration::seconds(60)))
        .await
        .unwrap();
    store
        .store_pending(&pending("dead", now - Duration::seconds(60)))
        .await
        .unwrap();
    store.store_auth_code(&code("fresh", now)).await.unwrap();
    store
        .store_auth_code(&code("stale", now - Duration::seconds(700)))
        .await
        .unwrap();
    store
        .store_issued_token(&issued("at-live", "rt-live", now + Duration::days(1)))
        .await
        .unwrap();
    store
        .store_issued_token(&issued("at-dead", "rt-dead", now - Duration::days(1)))
        .await
        .unwrap();
    store
        .link_external_token(&external("li-kept"))
        .await
        .unwrap();

    assert_eq!(store.purge_expired(now).await.unwrap(), 3);
    assert_eq!(store.pending_count().await.unwrap(), 1);
    assert_eq!(store.auth_code_count().await.unwrap(), 1);
    assert_eq!(store.issued_token_count().await.unwrap(), 1);
    assert!(store
        .consume_refresh_token("rt-dead")
        .await
        .unwrap()
        .is_none());
    assert!(store
        .get_external_token("member", "linkedin")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_memory_store_contract() {
    let store = InMemoryTokenStore::new();
    check_clients(&store).await;
    check_pending_consumed_once(&store).await;
    check_expired_pending_not_returned(&store).await;
    check_codes(&store).await;
    check_refresh_consumption_revokes_pair(&store).await;
    check_external_tokens(&store).await;
}

#[tokio::test]
async fn test_memory_store_purge() {
    check_purge(&InMemoryTokenStore::new()).await;
}

#[tokio::test]
async fn test_memory_store_rejects_duplicate_client() {
    let store = InMemoryTokenStore::new();
    store.store_client(&client("dup")).await.unwrap();
    let err = store.store_client(&client("dup")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);
}

#[tokio::test]
async fn test_sqlite_store_contract() {
    let (store, _dir) = sqlite_store().await;
    check_clients(store.as_ref()).await;
    check_pending_consumed_once(store.as_ref()).await;
    check_expired_pending_not_returned(store.as_ref()).await;
    check_codes(store.as_ref()).await;
    check_refresh_consumption_revokes_pair(store.as_ref()).await;
    check_external_tokens(store.as_ref()).await;
}

#[tokio::test]
async fn test_sqlite_store_purge() {
    let (store, _dir) = sqlite_store().await;
    check_purge(store.as_ref()).await;
}

#[tokio::test]
async fn test_sqlite_store_survives_reconnect() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("tokens.db").display());

    let store = SqliteTokenStore::connect(&url).await.unwrap();
    store.store_client(&client("persisted")).await.unwrap();
    store.link_external_token(&external("li-9")).await.unwrap();
    store.pool().close().await;

    let reopened = SqliteTokenStore::connect(&url).await.unwrap();
    assert!(reopened.get_client("persisted").await.unwrap().is_some());
    assert_eq!(
        reopened
            .get_external_token("member", "linkedin")
            .await
            .unwrap()
            .unwrap()
            .access_token,
        "li-9"
    );
}

#[tokio::test]
async fn test_sqlite_in_memory_url() {
    let store = SqliteTokenStore::connect("sqlite::memory:").await.unwrap();
    check_pending_consumed_once(&store).await;
}

#[tokio::test]
async fn test_reaper_purges_and_stops() {
    let store = Arc::new(InMemoryTokenStore::new());
    let now = Utc::now();
    store
        .store_pending(&pending("dead", now - Duration::seconds(1)))
        .await
        .unwrap();

    let reaper = spawn_reaper(
        Arc::clone(&store) as Arc<dyn TokenStore>,
        StdDuration::from_millis(10),
    );
    sleep(StdDuration::from_millis(50)).await;
    reaper.shutdown().await;

    assert_eq!(store.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_reaper_with_zero_interval_runs_at_minimum() {
    let store = Arc::new(InMemoryTokenStore::new());
    let now = Utc::now();
    store
        .store_pending(&pending("dead", now - Duration::seconds(1)))
        .await
        .unwrap();

    let reaper = spawn_reaper(Arc::clone(&store) as Arc<dyn TokenStore>, StdDuration::ZERO);
    sleep(MIN_REAPER_INTERVAL * 5).await;
    reaper.shutdown().await;

    assert_eq!(store.pending_count().await.unwrap(), 0);
}
