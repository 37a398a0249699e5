//! Lockfile freeze and verification.
//!
//! A lockfile records one trusted baseline: the policy version, the audited
//! state's aggregate hash, the audited files and the freeze time. With a
//! signing secret configured it also carries an HMAC over
//! `aggregate_hash|timestamp`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use nod_core::config::DEFAULT_LOCKFILE;
use nod_core::SigningSecret;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::attestation::Attestation;
use crate::error::{AttestError, Result};
use crate::signature::{self, lock_payload};

/// Persisted baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockState {
    pub version: String,
    pub aggregate_hash: String,
    pub files: Vec<String>,
    /// Freeze time, ISO-8601 UTC with a trailing `Z`.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Outcome of [`LockManager::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Passed {
        /// Whether a lockfile signature was checked on the way.
        signature_checked: bool,
    },
    Failed(VerifyFailure),
}

impl Verification {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    pub fn failure(&self) -> Option<&VerifyFailure> {
        match self {
            Self::Passed { .. } => None,
            Self::Failed(reason) => Some(reason),
        }
    }
}

/// The decisive reason a verification failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyFailure {
    #[error("lockfile not found: {}", .0.display())]
    LockfileMissing(PathBuf),

    #[error("lockfile {} unreadable: {reason}", path.display())]
    LockfileUnreadable { path: PathBuf, reason: String },

    #[error("lockfile is unsigned while a signing secret is configured")]
    LockfileUnsigned,

    #[error("lockfile signature mismatch (tampering detected)")]
    SignatureMismatch,

    #[error("compliance drift detected: lockfile has {expected}, current audit has {actual}")]
    DriftDetected { expected: String, actual: String },
}

/// Freezes attested state to a lockfile and verifies new attestations
/// against it.
#[derive(Debug, Clone)]
pub struct LockManager {
    secret: Option<SigningSecret>,
}

impl LockManager {
    pub fn new(secret: Option<SigningSecret>) -> Self {
        Self { secret }
    }

    /// Write a new baseline to `path`, replacing whatever was there.
    ///
    /// The lock timestamp is the freeze time, not the attestation's own.
    pub fn freeze(
        &self,
        policy_version: &str,
        attestation: &Attestation,
        path: &Path,
    ) -> Result<LockState> {
        self.freeze_at(policy_version, attestation, path, Utc::now())
    }

    fn freeze_at(
        &self,
        policy_version: &str,
        attestation: &Attestation,
        path: &Path,
        now: DateTime<Utc>,
    ) -> Result<LockState> {
        let timestamp = format_timestamp(now);
        let signature = self
            .secret
            .as_ref()
            .map(|secret| {
                signature::sign(
                    secret,
                    &lock_payload(&attestation.aggregate_hash, &timestamp),
                )
            })
            .transpose()?;

        let lock = LockState {
            version: policy_version.to_string(),
            aggregate_hash: attestation.aggregate_hash.clone(),
            files: attestation.files_audited.clone(),
            timestamp,
            signature,
        };

        write_lockfile(path, &lock)?;
        info!(
            path = %path.display(),
            signed = lock.signature.is_some(),
            "baseline frozen"
        );
        Ok(lock)
    }

    /// Check `current` against the baseline at `path`.
    ///
    /// Checks run in a fixed order and stop at the first failure: lockfile
    /// present, lockfile parses, signature (only with a secret), then drift.
    pub fn verify(&self, current: &Attestation, path: &Path) -> Verification {
        let verification = self.check(current, path);
        match &verification {
            Verification::Passed { signature_checked } => {
                info!(
                    path = %path.display(),
                    signature_checked,
                    "verification passed, no drift"
                );
            }
            Verification::Failed(reason) => {
                warn!(path = %path.display(), reason = %reason, "verification failed");
            }
        }
        verification
    }

    fn check(&self, current: &Attestation, path: &Path) -> Verification {
        if !path.exists() {
            return Verification::Failed(VerifyFailure::LockfileMissing(path.to_path_buf()));
        }

        let lock = match read_lockfile(path) {
            Ok(lock) => lock,
            Err(reason) => {
                return Verification::Failed(VerifyFailure::LockfileUnreadable {
                    path: path.to_path_buf(),
                    reason,
                })
            }
        };

        let mut signature_checked = false;
        if let Some(secret) = &self.secret {
            let Some(stored) = lock.signature.as_deref().filter(|s| !s.is_empty()) else {
                return Verification::Failed(VerifyFailure::LockfileUnsigned);
            };
            let payload = lock_payload(&lock.aggregate_hash, &lock.timestamp);
            if !signature::verify(secret, &payload, stored) {
                return Verification::Failed(VerifyFailure::SignatureMismatch);
            }
            signature_checked = true;
        }

        if current.aggregate_hash != lock.aggregate_hash {
            return Verification::Failed(VerifyFailure::DriftDetected {
                expected: lock.aggregate_hash,
                actual: current.aggregate_hash.clone(),
            });
        }

        Verification::Passed { signature_checked }
    }
}

fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn read_lockfile(path: &Path) -> std::result::Result<LockState, String> {
    let contents = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&contents).map_err(|e| e.to_string())
}

/// Write via a temporary sibling and rename over the target.
fn write_lockfile(path: &Path, lock: &LockState) -> Result<()> {
    let write_failure = |error| AttestError::WriteFailure {
        path: path.to_path_buf(),
        error,
    };

    let mut json = serde_json::to_string_pretty(lock)?;
    json.push('\n');

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_LOCKFILE.to_string());
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

    fs::write(&tmp_path, json).map_err(write_failure)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_failure(e));
    }
    Ok(())
}
