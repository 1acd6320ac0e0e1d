// ABOUTME: OAuth 2.0 authorization server correlating local flows with LinkedIn authorization
// ABOUTME: Provides RFC 7591 client registration, PKCE, and the standard and proxy provider variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Correlation Provider
//!
//! An authorization request either completes immediately (the user already
//! holds a valid LinkedIn link) or parks as a pending authorization keyed by a
//! server-generated state until LinkedIn calls back. Either way the client ends
//! up with a single-use local authorization code.
//!
//! What the code is exchanged for depends on the variant:
//! - [`StandardCorrelationProvider`] issues local opaque tokens
//! - [`ProxyCorrelationProvider`] hands out LinkedIn's own tokens

/// RFC 7591 dynamic client registration implementation
pub mod client_registration;
/// Flow steps shared by both variants
pub mod correlation;
/// OAuth 2.0 data models and types
pub mod models;
/// PKCE (RFC 7636) helpers
pub mod pkce;
/// `CorrelationProvider` trait
pub mod provider;
/// Proxy-mode variant
pub mod proxy;
/// Standard-mode variant
pub mod standard;

pub use client_registration::ClientRegistrationManager;
pub use correlation::CorrelationCore;
pub use models::{
    AuthorizeOutcome, AuthorizeRequest, CallbackOutcome, ClientRegistrationRequest,
    ClientRegistrationResponse, TokenRequest, TokenResponse, ValidatedToken,
};
pub use provider::CorrelationProvider;
pub use proxy::ProxyCorrelationProvider;
pub use standard::StandardCorrelationProvider;

use crate::config::OAuthMode;
use crate::oauth2_client::ExternalOAuthClient;
use crate::store::TokenStore;
use std::sync::Arc;

/// Build the provider variant selected by `mode`
#[must_use]
pub fn build_provider(
    mode: OAuthMode,
    store: Arc<dyn TokenStore>,
    client: Arc<dyn ExternalOAuthClient>,
) -> Arc<dyn CorrelationProvider> {
    match mode {
        OAuthMode::Standard => Arc::new(StandardCorrelationProvider::new(store, client)),
        OAuthMode::Proxy => Arc::new(ProxyCorrelationProvider::new(store, client)),
    }
}
