use serde::{Deserialize, Serialize};

/// Result summary of one audit run, as produced by the rule engine.
///
/// Fields this crate does not interpret are carried through untouched in
/// `extra`, so a signed attestation serialises back to the engine's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attestation {
    /// Content digest of the audited state.
    pub aggregate_hash: String,
    /// When the audit ran, as written by the engine.
    pub timestamp: String,
    /// Kept as the engine wrote it so the signing payload renders it verbatim.
    pub max_severity_gap: serde_json::Number,
    #[serde(default)]
    pub files_audited: Vec<String>,
    #[serde(default)]
    pub signed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Attestation {
    pub fn new(
        aggregate_hash: impl Into<String>,
        timestamp: impl Into<String>,
        max_severity_gap: impl Into<serde_json::Number>,
        files_audited: Vec<String>,
    ) -> Self {
        Self {
            aggregate_hash: aggregate_hash.into(),
            timestamp: timestamp.into(),
            max_severity_gap: max_severity_gap.into(),
            files_audited,
            signed: false,
            signature: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Parse an attestation from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
