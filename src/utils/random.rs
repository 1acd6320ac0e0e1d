// ABOUTME: Secure random token generation backed by the system RNG
// ABOUTME: Used for correlation states, authorization codes, tokens, and client secrets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use linkedin_core::constants::oauth::RANDOM_TOKEN_BYTES;
use linkedin_core::errors::{AppError, AppResult};
use ring::rand::{SecureRandom, SystemRandom};

/// Generate `length` random bytes encoded as base64url without padding
///
/// # Errors
///
/// Returns an error if the system RNG fails. The server cannot issue
/// credentials safely without it, so callers must not fall back.
pub fn generate_random_string(length: usize) -> AppResult<String> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; length];

    rng.fill(&mut bytes).map_err(|e| {
        tracing::error!("CRITICAL: SystemRandom failed - cannot generate secure random bytes: {e}");
        AppError::internal("System RNG failure - server cannot operate securely")
    })?;

    Ok(URL_SAFE_NO_PAD.encode(&bytes))
}

/// Generate an opaque 256-bit token
///
/// # Errors
///
/// Returns an error if the system RNG fails
pub fn generate_token() -> AppResult<String> {
    generate_random_string(RANDOM_TOKEN_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length_and_alphabet() {
        let token = generate_token().unwrap();
        // 32 bytes -> 43 base64url characters without padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_ne!(a, b);
    }
}
