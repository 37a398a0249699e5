//! Tamper-evident attestations and lockfiles.
//!
//! - [`AttestationSigner`] adds an HMAC-SHA256 signature to an audit result
//! - [`LockManager`] freezes an attested state to a lockfile and later checks
//!   a new attestation against it for tampering and drift

pub mod attestation;
pub mod error;
pub mod lock;
pub mod signature;
pub mod signer;

pub use attestation::Attestation;
pub use error::{AttestError, Result};
pub use lock::{LockManager, LockState, Verification, VerifyFailure};
pub use signer::AttestationSigner;
