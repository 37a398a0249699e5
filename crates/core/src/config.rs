use std::env;
use std::path::PathBuf;

use crate::secret::SigningSecret;

/// Environment variable holding the HMAC signing secret.
pub const SECRET_ENV: &str = "NOD_SECRET_KEY";

/// Default lockfile name, relative to the working directory.
pub const DEFAULT_LOCKFILE: &str = "nod.lock";

/// Default ignore-list file name, relative to the working directory.
pub const DEFAULT_IGNORE_FILE: &str = ".nodignore";

/// Directory name of the rules shipped next to the executable.
const BUNDLED_RULES_DIR_NAME: &str = "defaults";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    /// Signing secret; `None` disables signing and signature verification.
    pub secret: Option<SigningSecret>,
    /// Lockfile used by freeze / verify.
    pub lockfile: PathBuf,
    /// File of ignored rule ids and patterns.
    pub ignore_file: PathBuf,
    /// Rules shipped with the tool, consulted when no source is given.
    pub bundled_rules_dir: Option<PathBuf>,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let opt = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            secret: opt(SECRET_ENV).and_then(SigningSecret::new),
            lockfile: opt("NOD_LOCKFILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCKFILE)),
            ignore_file: opt("NOD_IGNORE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IGNORE_FILE)),
            bundled_rules_dir: opt("NOD_BUNDLED_RULES_DIR")
                .map(PathBuf::from)
                .or_else(default_bundled_rules_dir),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  signing:     {}",
            if self.secret.is_some() { "configured" } else { "not configured" }
        );
        tracing::info!("  lockfile:    {}", self.lockfile.display());
        tracing::info!("  ignore_file: {}", self.ignore_file.display());
        tracing::info!(
            "  bundled:     {}",
            self.bundled_rules_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        );
    }
}

/// `defaults/` beside the running executable.
fn default_bundled_rules_dir() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    Some(exe.parent()?.join(BUNDLED_RULES_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]);
        assert!(config.secret.is_none());
        assert_eq!(config.lockfile, PathBuf::from("nod.lock"));
        assert_eq!(config.ignore_file, PathBuf::from(".nodignore"));
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("NOD_SECRET_KEY", "s3cret"),
            ("NOD_LOCKFILE", "ci/state.lock"),
            ("NOD_IGNORE_FILE", "ci/ignore"),
            ("NOD_BUNDLED_RULES_DIR", "/opt/nod/defaults"),
        ]);
        assert_eq!(config.secret.unwrap().as_bytes(), b"s3cret");
        assert_eq!(config.lockfile, PathBuf::from("ci/state.lock"));
        assert_eq!(config.ignore_file, PathBuf::from("ci/ignore"));
        assert_eq!(
            config.bundled_rules_dir,
            Some(PathBuf::from("/opt/nod/defaults"))
        );
    }

    #[test]
    fn empty_secret_counts_as_unset() {
        let config = config_from(&[("NOD_SECRET_KEY", "")]);
        assert!(config.secret.is_none());
    }
}
