use std::path::PathBuf;

/// Errors that abort a policy load.
///
/// Every variant is fatal to the whole multi-source load; oversized directory
/// entries are reported through [`crate::LoadStatus::Skipped`] instead.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("rule source not found: {0}")]
    SourceNotFound(String),

    #[error("invalid rule source '{origin}': {reason}")]
    InvalidSource { origin: String, reason: String },

    #[error("rule source {origin} too large ({size} bytes, limit {limit})")]
    SourceTooLarge { origin: String, size: u64, limit: u64 },

    #[error("rule sources exceed total size limit at {origin} ({total} bytes, limit {limit})")]
    TotalSizeExceeded { origin: String, total: u64, limit: u64 },

    #[error("failed to fetch {origin}: {error}")]
    Transport {
        origin: String,
        #[source]
        error: reqwest::Error,
    },

    #[error("failed to parse {origin}: {error}")]
    Parse {
        origin: String,
        #[source]
        error: serde_yaml::Error,
    },

    #[error("IO error on {}: {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

/// Result alias for policy loading.
pub type Result<T> = std::result::Result<T, PolicyError>;
