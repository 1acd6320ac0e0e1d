// ABOUTME: SQLite TokenStore built on an sqlx connection pool
// ABOUTME: Consume operations are single DELETE ... RETURNING statements
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::TokenStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use linkedin_core::constants::oauth::AUTHORIZATION_CODE_TTL_SECS;
use linkedin_core::errors::{AppError, AppResult};
use linkedin_core::models::{
    AuthorizationCode, ClientRegistration, ExternalToken, IssuedToken, PendingAuthorization,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

const PENDING_COLUMNS: &str = "state, client_id, redirect_uri, client_state, scope, \
     code_challenge, code_challenge_method, created_at, expires_at";
const CODE_COLUMNS: &str = "code, user_id, client_id, redirect_uri, scope, \
     code_challenge, code_challenge_method, created_at";
const ISSUED_COLUMNS: &str = "access_token, refresh_token, user_id, client_id, scope, \
     access_expires_at, refresh_expires_at, created_at";
const EXTERNAL_COLUMNS: &str =
    "user_id, provider, access_token, refresh_token, expires_at, scope, updated_at";

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteTokenStore {
    pool: SqlitePool,
}

impl SqliteTokenStore {
    /// Connect to `database_url`, creating the file and schema if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the database cannot be opened,
    /// or schema creation fails
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::config_invalid(format!("Invalid DATABASE_URL '{database_url}': {e}"))
            })?
            .create_if_missing(true);

        // Every connection to `:memory:` opens a separate database
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes
    ///
    /// # Errors
    ///
    /// Returns an error if any schema statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth_clients (
                client_id TEXT PRIMARY KEY,
                client_secret_hash TEXT NOT NULL,
                client_name TEXT NOT NULL,
                redirect_uris TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS pending_authorizations (
                state TEXT PRIMARY KEY,
                client_id TEXT NOT NULL,
                redirect_uri TEXT NOT NULL,
                client_state TEXT,
                scope TEXT,
                code_challenge TEXT,
                code_challenge_method TEXT,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS authorization_codes (
                code TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                client_id TEXT NOT NULL,
                redirect_uri TEXT NOT NULL,
                scope TEXT,
                code_challenge TEXT,
                code_challenge_method TEXT,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS issued_tokens (
                access_token TEXT PRIMARY KEY,
                refresh_token TEXT NOT NULL UNIQUE,
                user_id TEXT NOT NULL,
                client_id TEXT NOT NULL,
                scope TEXT,
                access_expires_at TEXT NOT NULL,
                refresh_expires_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS external_tokens (
                user_id TEXT NOT NULL,
                provider TEXT NOT NULL,
                access_token TEXT NOT NULL,
                refresh_token TEXT,
                expires_at TEXT NOT NULL,
                scope TEXT,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, provider)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_pending_expires ON pending_authorizations(expires_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_codes_expires ON authorization_codes(expires_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_client(row: &SqliteRow) -> AppResult<ClientRegistration> {
        let redirect_uris: String = row.try_get("redirect_uris")?;
        Ok(ClientRegistration {
            client_id: row.try_get("client_id")?,
            client_secret_hash: row.try_get("client_secret_hash")?,
            client_name: row.try_get("client_name")?,
            redirect_uris: serde_json::from_str(&redirect_uris)?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_pending(row: &SqliteRow) -> AppResult<PendingAuthorization> {
        Ok(PendingAuthorization {
            state: row.try_get("state")?,
            client_id: row.try_get("client_id")?,
            redirect_uri: row.try_get("redirect_uri")?,
            client_state: row.try_get("client_state")?,
            scope: row.try_get("scope")?,
            code_challenge: row.try_get("code_challenge")?,
            code_challenge_method: row.try_get("code_challenge_method")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }

    fn row_to_code(row: &SqliteRow) -> AppResult<AuthorizationCode> {
        Ok(AuthorizationCode {
            code: row.try_get("code")?,
            user_id: row.try_get("user_id")?,
            client_id: row.try_get("client_id")?,
            redirect_uri: row.try_get("redirect_uri")?,
            scope: row.try_get("scope")?,
            code_challenge: row.try_get("code_challenge")?,
            code_challenge_method: row.try_get("code_challenge_method")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_issued(row: &SqliteRow) -> AppResult<IssuedToken> {
        Ok(IssuedToken {
            access_token: row.try_get("access_token")?,
            refresh_token: row.try_get("refresh_token")?,
            user_id: row.try_get("user_id")?,
            client_id: row.try_get("client_id")?,
            scope: row.try_get("scope")?,
            access_expires_at: row.try_get("access_expires_at")?,
            refresh_expires_at: row.try_get("refresh_expires_at")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_external(row: &SqliteRow) -> AppResult<ExternalToken> {
        Ok(ExternalToken {
            user_id: row.try_get("user_id")?,
            provider: row.try_get("provider")?,
            access_token: row.try_get("access_token")?,
            refresh_token: row.try_get("refresh_token")?,
            expires_at: row.try_get("expires_at")?,
            scope: row.try_get("scope")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn count(&self, table: &str) -> AppResult<usize> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn store_client(&self, client: &ClientRegistration) -> AppResult<()> {
        let redirect_uris = serde_json::to_string(&client.redirect_uris)?;
        sqlx::query(
            r"
            INSERT INTO oauth_clients (client_id, client_secret_hash, client_name, redirect_uris, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(&client.client_id)
        .bind(&client.client_secret_hash)
        .bind(&client.client_name)
        .bind(redirect_uris)
        .bind(client.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_client(&self, client_id: &str) -> AppResult<Option<ClientRegistration>> {
        let row = sqlx::query(
            r"
            SELECT client_id, client_secret_hash, client_name, redirect_uris, created_at
            FROM oauth_clients
            WHERE client_id = $1
            ",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_client).transpose()
    }

    async fn store_pending(&self, pending: &PendingAuthorization) -> AppResult<()> {
        sqlx::query(&format!(
            "INSERT INTO pending_authorizations ({PENDING_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(&pending.state)
        .bind(&pending.client_id)
        .bind(&pending.redirect_uri)
        .bind(&pending.client_state)
        .bind(&pending.scope)
        .bind(&pending.code_challenge)
        .bind(&pending.code_challenge_method)
        .bind(pending.created_at)
        .bind(pending.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_pending(
        &self,
        state: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<PendingAuthorization>> {
        let row = sqlx::query(&format!(
            "DELETE FROM pending_authorizations WHERE state = $1 RETURNING {PENDING_COLUMNS}"
        ))
        .bind(state)
        .fetch_optional(&self.pool)
        .await?;

        let pending = row.as_ref().map(Self::row_to_pending).transpose()?;
        Ok(pending.filter(|p| !p.is_expired(now)))
    }

    async fn pending_count(&self) -> AppResult<usize> {
        self.count("pending_authorizations").await
    }

    async fn store_auth_code(&self, code: &AuthorizationCode) -> AppResult<()> {
        sqlx::query(&format!(
            "INSERT INTO authorization_codes ({CODE_COLUMNS}, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(&code.code)
        .bind(&code.user_id)
        .bind(&code.client_id)
        .bind(&code.redirect_uri)
        .bind(&code.scope)
        .bind(&code.code_challenge)
        .bind(&code.code_challenge_method)
        .bind(code.created_at)
        .bind(code.created_at + Duration::seconds(AUTHORIZATION_CODE_TTL_SECS))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_auth_code(&self, code: &str) -> AppResult<Option<AuthorizationCode>> {
        let row = sqlx::query(&format!(
            "DELETE FROM authorization_codes WHERE code = $1 RETURNING {CODE_COLUMNS}"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_code).transpose()
    }

    async fn auth_code_count(&self) -> AppResult<usize> {
        self.count("authorization_codes").await
    }

    async fn store_issued_token(&self, token: &IssuedToken) -> AppResult<()> {
        sqlx::query(&format!(
            "INSERT INTO issued_tokens ({ISSUED_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(&token.user_id)
        .bind(&token.client_id)
        .bind(&token.scope)
        .bind(token.access_expires_at)
        .bind(token.refresh_expires_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_access_token(&self, access_token: &str) -> AppResult<Option<IssuedToken>> {
        let row = sqlx::query(&format!(
            "SELECT {ISSUED_COLUMNS} FROM issued_tokens WHERE access_token = $1"
        ))
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_issued).transpose()
    }

    async fn consume_refresh_token(
        &self,
        refresh_token: &str,
    ) -> AppResult<Option<IssuedToken>> {
        let row = sqlx::query(&format!(
            "DELETE FROM issued_tokens WHERE refresh_token = $1 RETURNING {ISSUED_COLUMNS}"
        ))
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_issued).transpose()
    }

    async fn issued_token_count(&self) -> AppResult<usize> {
        self.count("issued_tokens").await
    }

    async fn link_external_token(&self, token: &ExternalToken) -> AppResult<()> {
        sqlx::query(&format!(
            "INSERT INTO external_tokens ({EXTERNAL_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id, provider) DO UPDATE SET \
                 access_token = excluded.access_token, \
                 refresh_token = excluded.refresh_token, \
                 expires_at = excluded.expires_at, \
                 scope = excluded.scope, \
                 updated_at = excluded.updated_at"
        ))
        .bind(&token.user_id)
        .bind(&token.provider)
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(token.expires_at)
        .bind(&token.scope)
        .bind(token.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_external_token(
        &self,
        user_id: &str,
        provider: &str,
    ) -> AppResult<Option<ExternalToken>> {
        let row = sqlx::query(&format!(
            "SELECT {EXTERNAL_COLUMNS} FROM external_tokens WHERE user_id = $1 AND provider = $2"
        ))
        .bind(user_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_external).transpose()
    }

    async fn update_external_token(&self, token: &ExternalToken) -> AppResult<()> {
        let result = sqlx::query(
            r"
            UPDATE external_tokens
            SET access_token = $1, refresh_token = $2, expires_at = $3, scope = $4, updated_at = $5
            WHERE user_id = $6 AND provider = $7
            ",
        )
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(token.expires_at)
        .bind(&token.scope)
        .bind(token.updated_at)
        .bind(&token.user_id)
        .bind(&token.provider)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "{} token for user {}",
                token.provider, token.user_id
            )));
        }
        Ok(())
    }

    async fn remove_external_token(
        &self,
        user_id: &str,
        provider: &str,
    ) -> AppResult<Option<ExternalToken>> {
        let row = sqlx::query(&format!(
            "DELETE FROM external_tokens WHERE user_id = $1 AND provider = $2 \
             RETURNING {EXTERNAL_COLUMNS}"
        ))
        .bind(user_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_external).transpose()
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let pending = sqlx::query("DELETE FROM pending_authorizations WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();
        let codes = sqlx::query("DELETE FROM authorization_codes WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();
        let tokens = sqlx::query("DELETE FROM issued_tokens WHERE refresh_expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(usize::try_from(pending + codes + tokens).unwrap_or(usize::MAX))
    }
}
