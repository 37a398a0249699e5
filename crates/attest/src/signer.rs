use nod_core::SigningSecret;
use tracing::debug;

use crate::attestation::Attestation;
use crate::error::Result;
use crate::signature::{attestation_payload, sign};

/// Signs audit attestations with an optional secret.
#[derive(Debug, Clone)]
pub struct AttestationSigner {
    secret: Option<SigningSecret>,
}

impl AttestationSigner {
    pub fn new(secret: Option<SigningSecret>) -> Self {
        Self { secret }
    }

    /// Return a copy of `attestation` with its signing fields set.
    ///
    /// Without a secret the result is `signed = false` with no signature;
    /// any signature the input carried is dropped.
    pub fn sign(&self, attestation: Attestation) -> Result<Attestation> {
        let mut signed = attestation;

        match &self.secret {
            Some(secret) => {
                let payload = attestation_payload(
                    &signed.aggregate_hash,
                    &signed.timestamp,
                    &signed.max_severity_gap,
                );
                signed.signature = Some(sign(secret, &payload)?);
                signed.signed = true;
                debug!(aggregate_hash = %signed.aggregate_hash, "attestation signed");
            }
            None => {
                signed.signature = None;
                signed.signed = false;
                debug!("no signing secret configured, attestation left unsigned");
            }
        }

        Ok(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attestation(hash: &str, ts: &str, gap: i64) -> Attestation {
        Attestation::new(hash, ts, gap, vec!["src/model.py".to_string()])
    }

    fn signer(secret: &str) -> AttestationSigner {
        AttestationSigner::new(SigningSecret::new(secret))
    }

    fn signature_of(signer: &AttestationSigner, a: Attestation) -> String {
        signer.sign(a).unwrap().signature.unwrap()
    }

    #[test]
    fn unsigned_without_secret() {
        let signed = AttestationSigner::new(None)
            .sign(attestation("h", "t", 1))
            .unwrap();
        assert!(!signed.signed);
        assert!(signed.signature.is_none());
    }

    #[test]
    fn stale_signature_is_cleared_without_secret() {
        let mut input = attestation("h", "t", 1);
        input.signed = true;
        input.signature = Some("deadbeef".to_string());

        let signed = AttestationSigner::new(None).sign(input).unwrap();
        assert!(!signed.signed);
        assert!(signed.signature.is_none());
    }

    #[test]
    fn signs_with_secret() {
        let signed = signer("s").sign(attestation("h", "t", 1)).unwrap();
        assert!(signed.signed);
        let sig = signed.signature.unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn signature_covers_hash_timestamp_and_gap() {
        let s = signer("s");
        let base = signature_of(&s, attestation("h", "t", 1));

        assert_eq!(base, signature_of(&s, attestation("h", "t", 1)));
        assert_ne!(base, signature_of(&s, attestation("h2", "t", 1)));
        assert_ne!(base, signature_of(&s, attestation("h", "t2", 1)));
        assert_ne!(base, signature_of(&s, attestation("h", "t", 2)));
        assert_ne!(base, signature_of(&signer("s2"), attestation("h", "t", 1)));
    }

    #[test]
    fn signature_matches_payload_hmac() {
        let key = SigningSecret::new("s").unwrap();
        let expected = sign(&key, "abc|2026-10-17T00:00:00Z|3").unwrap();
        let signed = AttestationSigner::new(Some(key))
            .sign(attestation("abc", "2026-10-17T00:00:00Z", 3))
            .unwrap();
        assert_eq!(signed.signature.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn input_is_not_mutated() {
        let original = attestation("h", "t", 1);
        let signed = signer("s").sign(original.clone()).unwrap();
        assert!(!original.signed);
        assert_ne!(original, signed);
        assert_eq!(signed.files_audited, original.files_audited);
    }
}
