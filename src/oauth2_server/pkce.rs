// ABOUTME: PKCE (RFC 7636) challenge validation and verifier checking
// ABOUTME: S256 hashes the verifier with SHA-256; comparison is constant-time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use base64::{engine::general_purpose, Engine as _};
use linkedin_core::constants::oauth::pkce::{MAX_VERIFIER_LEN, MIN_VERIFIER_LEN, PLAIN, S256};
use linkedin_core::errors::{OAuthError, OAuthResult};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Validate the PKCE parameters of an authorization request.
///
/// Returns the effective method to record with the challenge. RFC 7636 makes
/// `plain` the default when a challenge is sent without a method.
///
/// # Errors
///
/// Returns `InvalidRequest` for a method without a challenge, an unknown
/// method, or a challenge of the wrong length
pub fn validate_challenge(
    code_challenge: Option<&str>,
    code_challenge_method: Option<&str>,
) -> OAuthResult<Option<String>> {
    let Some(challenge) = code_challenge else {
        if code_challenge_method.is_some() {
            return Err(OAuthError::InvalidRequest(
                "code_challenge_method supplied without code_challenge".to_owned(),
            ));
        }
        return Ok(None);
    };

    let method = code_challenge_method.unwrap_or(PLAIN);
    if method != S256 && method != PLAIN {
        return Err(OAuthError::InvalidRequest(format!(
            "Unsupported code_challenge_method: {method}"
        )));
    }

    if !(MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&challenge.len()) {
        return Err(OAuthError::InvalidRequest(format!(
            "code_challenge must be between {MIN_VERIFIER_LEN} and {MAX_VERIFIER_LEN} characters"
        )));
    }

    Ok(Some(method.to_owned()))
}

/// Compute the S256 challenge for `verifier`
#[must_use]
pub fn s256_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    general_purpose::URL_SAFE_NO_PAD.encode(hash)
}

/// Check a token request's verifier against the challenge recorded with the code.
///
/// A challenge requires a verifier; a verifier without a recorded challenge is
/// rejected as well.
///
/// # Errors
///
/// Returns `InvalidGrant` when verification fails
pub fn verify(
    code_challenge: Option<&str>,
    code_challenge_method: Option<&str>,
    code_verifier: Option<&str>,
) -> OAuthResult<()> {
    let Some(challenge) = code_challenge else {
        if code_verifier.is_some() {
            return Err(OAuthError::InvalidGrant(
                "code_verifier provided but no code_challenge was issued".to_owned(),
            ));
        }
        return Ok(());
    };

    let verifier = code_verifier
        .ok_or_else(|| OAuthError::InvalidGrant("code_verifier is required (PKCE)".to_owned()))?;

    if !(MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&verifier.len()) {
        return Err(OAuthError::InvalidGrant(format!(
            "code_verifier must be between {MIN_VERIFIER_LEN} and {MAX_VERIFIER_LEN} characters"
        )));
    }

    if !verifier
        .chars()
        .all(|c| matches!(c, 'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' | '_' | '~'))
    {
        return Err(OAuthError::InvalidGrant(
            "code_verifier contains invalid characters".to_owned(),
        ));
    }

    let computed = match code_challenge_method.unwrap_or(PLAIN) {
        S256 => s256_challenge(verifier),
        PLAIN => verifier.to_owned(),
        other => {
            return Err(OAuthError::InvalidGrant(format!(
                "Unsupported code_challenge_method: {other}"
            )))
        }
    };

    if bool::from(computed.as_bytes().ct_eq(challenge.as_bytes())) {
        Ok(())
    } else {
        tracing::warn!("PKCE verification failed: code_verifier does not match code_challenge");
        Err(OAuthError::InvalidGrant("Invalid code_verifier".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    /// A client-side 64-character verifier and its S256 challenge
    struct PkcePair {
        verifier: String,
        challenge: String,
    }

    impl PkcePair {
        fn generate() -> Self {
            let verifier: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(64)
                .map(char::from)
                .collect();
            let challenge = s256_challenge(&verifier);
            Self {
                verifier,
                challenge,
            }
        }
    }

    #[test]
    fn test_s256_matches_rfc7636_appendix_b() {
        assert_eq!(
            s256_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_generated_pair_verifies() {
        let pair = PkcePair::generate();
        assert!(verify(Some(&pair.challenge), Some(S256), Some(&pair.verifier)).is_ok());
    }

    #[test]
    fn test_wrong_verifier_rejected() {
        let pair = PkcePair::generate();
        let other = PkcePair::generate();
        let err = verify(Some(&pair.challenge), Some(S256), Some(&other.verifier)).unwrap_err();
        assert!(matches!(err, OAuthError::InvalidGrant(_)));
    }

    #[test]
    fn test_plain_compares_verbatim() {
        let verifier = "a".repeat(50);
        assert!(verify(Some(&verifier), Some(PLAIN), Some(&verifier)).is_ok());
        assert!(verify(Some(&verifier), None, Some(&"b".repeat(50))).is_err());
    }

    #[test]
    fn test_missing_verifier_and_unexpected_verifier() {
        let pair = PkcePair::generate();
        assert!(verify(Some(&pair.challenge), Some(S256), None).is_err());
        assert!(verify(None, None, Some(&pair.verifier)).is_err());
        assert!(verify(None, None, None).is_ok());
    }

    #[test]
    fn test_challenge_validation() {
        let challenge = "x".repeat(43);
        assert_eq!(
            validate_challenge(Some(&challenge), None).unwrap(),
            Some(PLAIN.to_owned())
        );
        assert_eq!(
            validate_challenge(Some(&challenge), Some(S256)).unwrap(),
            Some(S256.to_owned())
        );
        assert!(validate_challenge(Some(&challenge), Some("S512")).is_err());
        assert!(validate_challenge(Some("short"), Some(S256)).is_err());
        assert!(validate_challenge(None, Some(S256)).is_err());
        assert_eq!(validate_challenge(None, None).unwrap(), None);
    }
}
