use std::fmt;

/// Key material for HMAC signing of attestations and lockfiles.
///
/// The value never appears in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    /// Wrap a secret. Returns `None` for an empty value, which counts as
    /// "no secret configured".
    pub fn new(secret: impl Into<Vec<u8>>) -> Option<Self> {
        let bytes = secret.into();
        if bytes.is_empty() {
            None
        } else {
            Some(Self(bytes))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}
