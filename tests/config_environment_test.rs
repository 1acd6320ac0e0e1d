// ABOUTME: Tests for environment-driven server configuration
// ABOUTME: Runs serially because every case mutates process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use linkedin_mcp_server::config::{OAuthMode, ServerConfig, StoreBackend};
use serial_test::serial;
use std::env;

const MANAGED_VARS: &[&str] = &[
    "HTTP_PORT",
    "OAUTH_SERVER_URL",
    "OAUTH_PROXY_MODE",
    "LINKEDIN_CLIENT_ID",
    "LINKEDIN_CLIENT_SECRET",
    "LINKEDIN_REDIRECT_URI",
    "LINKEDIN_SCOPES",
    "STORE_BACKEND",
    "DATABASE_URL",
    "STORE_REAPER_INTERVAL_SECS",
    "HTTP_CLIENT_TIMEOUT_SECS",
];

fn reset_env() {
    for key in MANAGED_VARS {
        env::remove_var(key);
    }
    env::set_var("LINKEDIN_CLIENT_ID", "li-app");
    env::set_var("LINKEDIN_CLIENT_SECRET", "li-app-secret");
}

#[test]
#[serial]
fn test_defaults() {
    reset_env();
    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.http_port, 8000);
    assert_eq!(config.server_url, "http://localhost:8000");
    assert_eq!(config.mode, OAuthMode::Standard);
    assert_eq!(
        config.linkedin.redirect_uri,
        "http://localhost:8000/oauth/callback"
    );
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.store.reaper_interval_secs, 300);
    assert_eq!(config.http_client.timeout_secs, 30);
}

#[test]
#[serial]
fn test_proxy_flag_is_case_insensitive() {
    reset_env();
    env::set_var("OAUTH_PROXY_MODE", "TRUE");
    assert_eq!(ServerConfig::from_env().unwrap().mode, OAuthMode::Proxy);

    env::set_var("OAUTH_PROXY_MODE", "false");
    assert_eq!(ServerConfig::from_env().unwrap().mode, OAuthMode::Standard);

    env::set_var("OAUTH_PROXY_MODE", "sometimes");
    assert!(ServerConfig::from_env().is_err());
}

#[test]
#[serial]
fn test_missing_linkedin_credentials() {
    reset_env();
    env::remove_var("LINKEDIN_CLIENT_SECRET");
    let err = ServerConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("LINKEDIN_CLIENT_SECRET"));
}

#[test]
#[serial]
fn test_sqlite_backend_and_server_url() {
    reset_env();
    env::set_var("STORE_BACKEND", "sqlite");
    env::set_var("DATABASE_URL", "sqlite:/tmp/linkedin-test.db");
    env::set_var("HTTP_PORT", "9100");
    env::set_var("OAUTH_SERVER_URL", "https://mcp.example.com/");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(
        config.store.backend,
        StoreBackend::Sqlite {
            url: "sqlite:/tmp/linkedin-test.db".to_owned()
        }
    );
    assert_eq!(config.http_port, 9100);
    assert_eq!(config.server_url, "https://mcp.example.com");
    assert_eq!(
        config.linkedin.redirect_uri,
        "https://mcp.example.com/oauth/callback"
    );
    assert!(config
        .summary()
        .contains("sqlite (sqlite:/tmp/linkedin-test.db)"));
    assert!(!config.summary().contains("li-app-secret"));
}

#[test]
#[serial]
fn test_invalid_values_are_rejected() {
    reset_env();
    env::set_var("HTTP_PORT", "not-a-port");
    assert!(ServerConfig::from_env().is_err());

    reset_env();
    env::set_var("STORE_BACKEND", "redis");
    assert!(ServerConfig::from_env().is_err());

    reset_env();
    env::set_var("STORE_REAPER_INTERVAL_SECS", "0");
    assert!(ServerConfig::from_env().is_err());

    reset_env();
    env::set_var("LINKEDIN_SCOPES", " , ");
    assert!(ServerConfig::from_env().is_err());
}
