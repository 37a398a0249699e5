//! HMAC-SHA256 signing payloads.
//!
//! Two payloads exist and are intentionally not unified:
//!
//! - attestation: `aggregate_hash|timestamp|max_severity_gap`
//! - lockfile:    `aggregate_hash|timestamp`
//!
//! The lockfile signature does not cover the severity gap. Field order and
//! the `|` separator are part of the external format; any verifier has to
//! rebuild the exact same string.

use hmac::{Hmac, Mac};
use nod_core::SigningSecret;
use sha2::Sha256;

use crate::error::{AttestError, Result};

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: &str = "|";

/// Payload signed for an attestation.
///
/// The gap renders through `serde_json::Number`: integers and plain floats
/// (`3`, `3.0`, `0.25`) match Python's `str()`, but exponent forms do not
/// (`1e-7` here, `1e-07` in Python), so such gaps sign differently.
pub fn attestation_payload(
    aggregate_hash: &str,
    timestamp: &str,
    max_severity_gap: &serde_json::Number,
) -> String {
    [aggregate_hash, timestamp, max_severity_gap.to_string().as_str()].join(SEPARATOR)
}

/// Payload signed for a lockfile. Narrower than [`attestation_payload`].
pub fn lock_payload(aggregate_hash: &str, timestamp: &str) -> String {
    [aggregate_hash, timestamp].join(SEPARATOR)
}

/// Lowercase hex HMAC-SHA256 of `payload`.
pub fn sign(secret: &SigningSecret, payload: &str) -> Result<String> {
    let mut mac = new_mac(secret)?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature against `payload` in constant time.
///
/// Malformed or uppercase hex is a mismatch, never an error.
pub fn verify(secret: &SigningSecret, payload: &str, signature_hex: &str) -> bool {
    if signature_hex.bytes().any(|b| b.is_ascii_uppercase()) {
        return false;
    }
    let Ok(provided) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = new_mac(secret) else {
        return false;
    };
    mac.update(payload.as_bytes());
    mac.verify_slice(&provided).is_ok()
}

fn new_mac(secret: &SigningSecret) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AttestError::InvalidKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SigningSecret {
        SigningSecret::new(s).unwrap()
    }

    #[test]
    fn payload_formats() {
        let gap = serde_json::Number::from(4);
        assert_eq!(
            attestation_payload("abc", "2026-01-01T00:00:00Z", &gap),
            "abc|2026-01-01T00:00:00Z|4"
        );
        assert_eq!(
            lock_payload("abc", "2026-01-01T00:00:00Z"),
            "abc|2026-01-01T00:00:00Z"
        );
    }

    #[test]
    fn gap_rendering() {
        let render = |json: &str| {
            let gap: serde_json::Number = serde_json::from_str(json).unwrap();
            attestation_payload("h", "t", &gap)
        };
        assert_eq!(render("3"), "h|t|3");
        assert_eq!(render("3.0"), "h|t|3.0");
        assert_eq!(render("0.25"), "h|t|0.25");
        assert_eq!(render("1e-7"), "h|t|1e-7");
    }

    #[test]
    fn verify_rejects_uppercase_hex() {
        let key = secret("k");
        let sig = sign(&key, "payload").unwrap();
        let upper = sig.to_ascii_uppercase();
        assert_ne!(sig, upper);
        assert!(!verify(&key, "payload", &upper));
    }

    #[test]
    fn known_hmac_vector() {
        // RFC 4231 test case 2.
        let sig = sign(&secret("Jefe"), "what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn verify_accepts_own_signature() {
        let key = secret("k");
        let sig = sign(&key, "payload").unwrap();
        assert!(verify(&key, "payload", &sig));
    }

    #[test]
    fn verify_rejects_flipped_and_malformed() {
        let key = secret("k");
        let sig = sign(&key, "payload").unwrap();

        let mut flipped = sig.clone().into_bytes();
        flipped[0] = if flipped[0] == b'0' { b'1' } else { b'0' };
        let flipped = String::from_utf8(flipped).unwrap();

        assert!(!verify(&key, "payload", &flipped));
        assert!(!verify(&key, "payload", "not-hex"));
        assert!(!verify(&key, "payload", &sig[..10]));
        assert!(!verify(&secret("other"), "payload", &sig));
    }
}
