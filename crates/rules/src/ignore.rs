//! Ignore-list loading.
//!
//! The ignore file holds one rule id or pattern per line. Loading never
//! fails: a missing, oversized or unreadable file means nothing is ignored.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

/// Ignore files above this size (1 MiB) are disregarded.
pub const MAX_IGNORE_FILE_SIZE: u64 = 1024 * 1024;

/// Ignored rule ids and patterns, in file order, duplicates kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    entries: Vec<String>,
}

impl IgnoreList {
    /// Load an ignore file, degrading to an empty list on any problem.
    pub fn load(path: &Path) -> Self {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(_) => {
                debug!(path = %path.display(), "no ignore file");
                return Self::default();
            }
        };

        if metadata.len() > MAX_IGNORE_FILE_SIZE {
            warn!(
                path = %path.display(),
                size = metadata.len(),
                limit = MAX_IGNORE_FILE_SIZE,
                "ignore file over size limit, ignoring nothing"
            );
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read ignore file");
                Self::default()
            }
        }
    }

    /// Keep every non-blank line, trimmed, unless it starts with `#`.
    ///
    /// Only a `#` in the first column marks a comment; an indented `# x`
    /// is kept as the entry `# x`. `\n`, `\r\n` and bare `\r` all end a line.
    pub fn parse(contents: &str) -> Self {
        let entries = contents
            .split(['\n', '\r'])
            .filter(|raw| !raw.starts_with('#'))
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `rule_id` equals an entry or matches a trailing-`*` prefix entry.
    pub fn is_ignored(&self, rule_id: &str) -> bool {
        self.entries.iter().any(|entry| match entry.strip_suffix('*') {
            Some(prefix) => rule_id.starts_with(prefix),
            None => entry == rule_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let list = IgnoreList::load(&dir.path().join(".nodignore"));
        assert!(list.is_empty());
    }

    #[test]
    fn keeps_order_and_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".nodignore");
        fs::write(
            &path,
            "# waived until Q3\nNOD-002\n\n   \n  NOD-001  \nNOD-002\n   # indented entry\nSEC-*\n",
        )
        .unwrap();

        let list = IgnoreList::load(&path);
        assert_eq!(
            list.entries(),
            ["NOD-002", "NOD-001", "NOD-002", "# indented entry", "SEC-*"]
        );
    }

    #[test]
    fn only_first_column_hash_is_a_comment() {
        let list = IgnoreList::parse("  # waived\nNOD-1\n# dropped\n");
        assert_eq!(list.entries(), ["# waived", "NOD-1"]);
    }

    #[test]
    fn all_line_endings_split_entries() {
        assert_eq!(IgnoreList::parse("NOD-1\rNOD-2\r").entries(), ["NOD-1", "NOD-2"]);
        assert_eq!(
            IgnoreList::parse("NOD-1\r\n#c\r\nNOD-2\r\n").entries(),
            ["NOD-1", "NOD-2"]
        );
    }

    #[test]
    fn oversized_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".nodignore");
        let line = "NOD-001\n";
        let repeats = (MAX_IGNORE_FILE_SIZE as usize / line.len()) + 1;
        fs::write(&path, line.repeat(repeats)).unwrap();

        assert!(IgnoreList::load(&path).is_empty());
    }

    #[test]
    fn directory_path_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(IgnoreList::load(dir.path()).is_empty());
    }

    #[test]
    fn exact_and_prefix_matching() {
        let list = IgnoreList::parse("NOD-001\nSEC-*\n");
        assert!(list.is_ignored("NOD-001"));
        assert!(!list.is_ignored("NOD-0011"));
        assert!(list.is_ignored("SEC-42"));
        assert!(!list.is_ignored("NOD-002"));
    }
}
