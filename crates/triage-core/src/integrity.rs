//! Keyed integrity digests over canonical audit text.
//!
//! HMAC-SHA256, hex-encoded. Verification goes through the MAC's own
//! constant-time comparison.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors from signing or verifying.
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// Signing was attempted with an empty secret.
    #[error("audit secret must not be empty")]
    EmptySecret,

    /// The MAC rejected the key.
    #[error("invalid audit key: {0}")]
    InvalidKey(String),
}

/// The configured signing secret.
///
/// Construction fails for an empty string, so holding an `AuditSecret`
/// means the audit layer is enabled. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AuditSecret(String);

impl AuditSecret {
    /// Wrap a configured secret. Returns `None` for an empty value, which
    /// callers treat as "audit disabled".
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuditSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuditSecret([REDACTED])")
    }
}

fn keyed_mac(secret: &str, canonical: &str) -> Result<HmacSha256, IntegrityError> {
    if secret.is_empty() {
        return Err(IntegrityError::EmptySecret);
    }
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| IntegrityError::InvalidKey(e.to_string()))?;
    mac.update(canonical.as_bytes());
    Ok(mac)
}

/// Compute the hex digest of `canonical` under `secret`.
///
/// # Errors
///
/// Returns [`IntegrityError::EmptySecret`] if `secret` is empty.
pub fn sign(secret: &str, canonical: &str) -> Result<String, IntegrityError> {
    let mac = keyed_mac(secret, canonical)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Recompute the digest of `canonical` and compare it to `expected`.
///
/// A malformed `expected` (not hex, wrong length) verifies as `false`.
///
/// # Errors
///
/// Returns [`IntegrityError::EmptySecret`] if `secret` is empty.
pub fn verify(secret: &str, canonical: &str, expected: &str) -> Result<bool, IntegrityError> {
    let mac = keyed_mac(secret, canonical)?;
    let Ok(expected_bytes) = hex::decode(expected) else {
        return Ok(false);
    };
    Ok(mac.verify_slice(&expected_bytes).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sign_produces_64_hex_chars() {
        let sig = sign("test-secret", "{\"a\":1}").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn sign_is_deterministic() {
        assert_eq!(
            sign("s", "payload").unwrap(),
            sign("s", "payload").unwrap()
        );
    }

    #[test]
    fn known_vector() {
        // RFC 4231 test case 2
        let sig = sign("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(sign("", "x"), Err(IntegrityError::EmptySecret)));
        assert!(matches!(
            verify("", "x", "00"),
            Err(IntegrityError::EmptySecret)
        ));
    }

    #[test]
    fn empty_canonical_text_is_signable() {
        assert!(sign("s", "").is_ok());
    }

    #[test]
    fn verify_roundtrip() {
        let sig = sign("s", "payload").unwrap();
        assert!(verify("s", "payload", &sig).unwrap());
    }

    #[test]
    fn verify_rejects_tampered_text() {
        let sig = sign("s", "payload").unwrap();
        assert!(!verify("s", "payloaD", &sig).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let sig = sign("s1", "payload").unwrap();
        assert!(!verify("s2", "payload", &sig).unwrap());
    }

    #[test]
    fn verify_rejects_malformed_digest() {
        assert!(!verify("s", "payload", "not-hex").unwrap());
        assert!(!verify("s", "payload", "abcd").unwrap());
    }

    #[test]
    fn audit_secret_rejects_empty_and_redacts() {
        assert!(AuditSecret::new("").is_none());
        let secret = AuditSecret::new("hunter2").unwrap();
        assert_eq!(secret.expose(), "hunter2");
        assert!(!format!("{secret:?}").contains("hunter2"));
    }

    proptest! {
        #[test]
        fn prop_roundtrip(secret in "[ -~]{1,64}", payload in ".{0,256}") {
            let sig = sign(&secret, &payload).unwrap();
            prop_assert!(verify(&secret, &payload, &sig).unwrap());
        }

        #[test]
        fn prop_any_text_change_changes_digest(
            secret in "[ -~]{1,32}",
            payload in "[a-z]{1,64}",
            idx in any::<usize>(),
        ) {
            let mut bytes = payload.clone().into_bytes();
            let i = idx % bytes.len();
            bytes[i] = if bytes[i] == b'z' { b'a' } else { bytes[i] + 1 };
            let altered = String::from_utf8(bytes).unwrap();
            prop_assert_ne!(sign(&secret, &payload).unwrap(), sign(&secret, &altered).unwrap());
        }
    }
}
