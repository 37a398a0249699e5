//! Last-source-wins merging of policy documents.

use crate::schema::{MergedPolicy, PolicyDocument};

impl MergedPolicy {
    /// Fold one document into the accumulator.
    ///
    /// New profiles are inserted whole. For a profile already present, rule
    /// keys from `document` overwrite matching keys and every other existing
    /// key is kept, so a later source only has to name the rules it changes.
    /// `None` and documents without profiles leave the accumulator untouched.
    pub fn merge(&mut self, document: Option<PolicyDocument>) {
        let Some(document) = document else {
            return;
        };

        let profiles = self.profiles_mut();
        for (name, rules) in document.profiles {
            match profiles.get_mut(&name) {
                Some(existing) => existing.extend(rules),
                None => {
                    profiles.insert(name, rules);
                }
            }
        }
    }
}

/// Merge documents in order, lowest priority first.
pub fn merge_all<I>(documents: I) -> MergedPolicy
where
    I: IntoIterator<Item = PolicyDocument>,
{
    let mut merged = MergedPolicy::new();
    for document in documents {
        merged.merge(Some(document));
    }
    merged
}
