//! Rule source classification and default source resolution.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PolicyError, Result};

/// Base URL that `registry:<name>` aliases expand against.
pub const REGISTRY_BASE_URL: &str = "https://raw.githubusercontent.com/mraml/nod-rules/main/library/";

const REGISTRY_PREFIX: &str = "registry:";

/// Directory checked first in the working directory when no source is given.
pub const LOCAL_DEFAULTS_DIR: &str = "defaults";

/// File checked last in the working directory when no source is given.
pub const LOCAL_RULES_FILE: &str = "rules.yaml";

/// A classified rule source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// `registry:<name>`, already expanded to its registry URL.
    Registry { name: String, url: String },
    /// An `http://` or `https://` URL.
    Remote(String),
    /// A local directory of `.yaml` / `.yml` documents.
    Directory(PathBuf),
    /// A single local document.
    File(PathBuf),
}

impl RuleSource {
    /// Classify a source string.
    ///
    /// Registry aliases and URLs are recognised by prefix; anything else must
    /// name an existing directory or file.
    pub fn classify(raw: &str) -> Result<Self> {
        if let Some(name) = raw.strip_prefix(REGISTRY_PREFIX) {
            if name.is_empty() {
                return Err(PolicyError::InvalidSource {
                    origin: raw.to_string(),
                    reason: "empty registry name".to_string(),
                });
            }
            return Ok(Self::Registry {
                name: name.to_string(),
                url: registry_url(name),
            });
        }

        if is_url(raw) {
            return Ok(Self::Remote(raw.to_string()));
        }

        let path = Path::new(raw);
        if path.is_dir() {
            Ok(Self::Directory(path.to_path_buf()))
        } else if path.exists() {
            Ok(Self::File(path.to_path_buf()))
        } else {
            Err(PolicyError::SourceNotFound(raw.to_string()))
        }
    }

    /// The URL to fetch, for registry and remote sources.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Registry { url, .. } | Self::Remote(url) => Some(url),
            Self::Directory(_) | Self::File(_) => None,
        }
    }
}

fn is_url(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

/// Expand a registry name to its document URL, defaulting the `.yaml` suffix.
pub fn registry_url(name: &str) -> String {
    if name.ends_with(".yaml") || name.ends_with(".yml") {
        format!("{REGISTRY_BASE_URL}{name}")
    } else {
        format!("{REGISTRY_BASE_URL}{name}.yaml")
    }
}

/// Decide which sources to load.
///
/// A non-empty `explicit` list is returned unchanged. Otherwise the first
/// existing candidate wins: `<cwd>/defaults/`, the bundled rules directory,
/// then `<cwd>/rules.yaml`. An empty result means "no policy", not an error.
pub fn resolve_default_sources(
    explicit: &[String],
    cwd: &Path,
    bundled_dir: Option<&Path>,
) -> Vec<String> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }

    let local_defaults = cwd.join(LOCAL_DEFAULTS_DIR);
    if local_defaults.is_dir() {
        debug!(path = %local_defaults.display(), "using local defaults directory");
        return vec![local_defaults.display().to_string()];
    }

    if let Some(bundled) = bundled_dir.filter(|dir| dir.is_dir()) {
        debug!(path = %bundled.display(), "using bundled rules directory");
        return vec![bundled.display().to_string()];
    }

    let rules_file = cwd.join(LOCAL_RULES_FILE);
    if rules_file.exists() {
        debug!(path = %rules_file.display(), "using local rules file");
        return vec![rules_file.display().to_string()];
    }

    debug!("no rule source found");
    Vec::new()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn registry_alias_gets_yaml_suffix() {
        let source = RuleSource::classify("registry:owasp-top10").unwrap();
        assert_eq!(
            source,
            RuleSource::Registry {
                name: "owasp-top10".to_string(),
                url: format!("{REGISTRY_BASE_URL}owasp-top10.yaml"),
            }
        );
    }

    #[test]
    fn registry_alias_keeps_existing_suffix() {
        assert_eq!(registry_url("eu-ai-act.yml"), format!("{REGISTRY_BASE_URL}eu-ai-act.yml"));
        assert_eq!(registry_url("eu-ai-act.yaml"), format!("{REGISTRY_BASE_URL}eu-ai-act.yaml"));
    }

    #[test]
    fn empty_registry_name_is_rejected() {
        let err = RuleSource::classify("registry:").unwrap_err();
        assert!(matches!(err, PolicyError::InvalidSource { .. }));
    }

    #[test]
    fn urls_are_remote() {
        let source = RuleSource::classify("https://example.com/rules.yaml").unwrap();
        assert_eq!(source.url(), Some("https://example.com/rules.yaml"));
        assert!(matches!(
            RuleSource::classify("http://example.com/r.yml").unwrap(),
            RuleSource::Remote(_)
        ));
    }

    #[test]
    fn local_paths_are_classified_by_kind() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("rules.yaml");
        fs::write(&file, "profiles: {}\n").unwrap();

        assert_eq!(
            RuleSource::classify(dir.path().to_str().unwrap()).unwrap(),
            RuleSource::Directory(dir.path().to_path_buf())
        );
        assert_eq!(
            RuleSource::classify(file.to_str().unwrap()).unwrap(),
            RuleSource::File(file.clone())
        );
    }

    #[test]
    fn missing_path_is_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = RuleSource::classify(missing.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, PolicyError::SourceNotFound(_)));
    }

    #[test]
    fn explicit_sources_are_returned_unchanged() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("defaults")).unwrap();

        let explicit = vec!["b.yaml".to_string(), "a.yaml".to_string()];
        assert_eq!(resolve_default_sources(&explicit, dir.path(), None), explicit);
    }

    #[test]
    fn local_defaults_dir_wins() {
        let cwd = TempDir::new().unwrap();
        let bundled = TempDir::new().unwrap();
        fs::create_dir(cwd.path().join("defaults")).unwrap();
        fs::write(cwd.path().join("rules.yaml"), "").unwrap();

        let sources = resolve_default_sources(&[], cwd.path(), Some(bundled.path()));
        assert_eq!(sources, vec![cwd.path().join("defaults").display().to_string()]);
    }

    #[test]
    fn bundled_dir_before_rules_file() {
        let cwd = TempDir::new().unwrap();
        let bundled = TempDir::new().unwrap();
        fs::write(cwd.path().join("rules.yaml"), "").unwrap();

        let sources = resolve_default_sources(&[], cwd.path(), Some(bundled.path()));
        assert_eq!(sources, vec![bundled.path().display().to_string()]);
    }

    #[test]
    fn rules_file_is_last_resort() {
        let cwd = TempDir::new().unwrap();
        fs::write(cwd.path().join("rules.yaml"), "").unwrap();
        let missing_bundle = cwd.path().join("not-shipped");

        let sources = resolve_default_sources(&[], cwd.path(), Some(&missing_bundle));
        assert_eq!(sources, vec![cwd.path().join("rules.yaml").display().to_string()]);
    }

    #[test]
    fn nothing_found_is_empty() {
        let cwd = TempDir::new().unwrap();
        assert!(resolve_default_sources(&[], cwd.path(), None).is_empty());
    }
}
