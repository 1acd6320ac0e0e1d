// ABOUTME: Core data models for the OAuth correlation protocol
// ABOUTME: Re-exports persistence types shared by the store backends and the provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

// OAuth persistence types: clients, pending flows, codes, local and external tokens
mod oauth;
pub use oauth::{
    AuthorizationCode, ClientRegistration, ExternalToken, IssuedToken, PendingAuthorization,
};
