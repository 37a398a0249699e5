//! Policy document types.
//!
//! A policy document is a YAML mapping with a `profiles` key:
//!
//! ```yaml
//! profiles:
//!   baseline:
//!     NOD-001: { severity: high }
//!     NOD-002: { severity: low }
//! ```
//!
//! Rule configurations are opaque to this crate and kept as YAML values.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{PolicyError, Result};

/// A single rule's configuration, opaque to the loader.
pub type RuleConfig = serde_yaml::Value;

/// Rule configurations of one profile, keyed by rule key.
pub type Profile = IndexMap<String, RuleConfig>;

/// Version tag carried by every merged policy.
pub const MERGED_VERSION: &str = "combined";

/// One parsed rule document from a single source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PolicyDocument {
    #[serde(default, deserialize_with = "profiles_or_empty")]
    pub profiles: IndexMap<String, Profile>,
}

impl PolicyDocument {
    /// Parse raw document bytes.
    ///
    /// Returns `Ok(None)` for an empty (null) document. Anything that is not a
    /// mapping with an optional `profiles` mapping is a parse error.
    pub fn parse(bytes: &[u8], origin: &str) -> Result<Option<Self>> {
        let parse_err = |error| PolicyError::Parse {
            origin: origin.to_string(),
            error,
        };

        let value: serde_yaml::Value = serde_yaml::from_slice(bytes).map_err(parse_err)?;
        if value.is_null() {
            return Ok(None);
        }
        serde_yaml::from_value(value).map(Some).map_err(parse_err)
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// `profiles:` and `profiles: { p: }` are both accepted as empty.
fn profiles_or_empty<'de, D>(deserializer: D) -> std::result::Result<IndexMap<String, Profile>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<IndexMap<String, Option<Profile>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, profile)| (name, profile.unwrap_or_default()))
        .collect())
}

/// The result of folding every loaded document together.
///
/// Mutated only by [`MergedPolicy::merge`] while loading; read-only afterward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedPolicy {
    version: String,
    profiles: IndexMap<String, Profile>,
}

impl MergedPolicy {
    pub fn new() -> Self {
        Self {
            version: MERGED_VERSION.to_string(),
            profiles: IndexMap::new(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn profiles(&self) -> &IndexMap<String, Profile> {
        &self.profiles
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Look up one rule's configuration within a profile.
    pub fn rule(&self, profile: &str, key: &str) -> Option<&RuleConfig> {
        self.profiles.get(profile)?.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub(crate) fn profiles_mut(&mut self) -> &mut IndexMap<String, Profile> {
        &mut self.profiles
    }
}

impl Default for MergedPolicy {
    fn default() -> Self {
        Self::new()
    }
}
