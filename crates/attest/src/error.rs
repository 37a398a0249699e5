use std::path::PathBuf;

/// Errors from signing and freezing.
///
/// Verification never errors; see [`crate::Verification`].
#[derive(Debug, thiserror::Error)]
pub enum AttestError {
    #[error("failed to write lockfile {}: {error}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid signing key")]
    InvalidKey,
}

/// Result alias for attestation operations.
pub type Result<T> = std::result::Result<T, AttestError>;
