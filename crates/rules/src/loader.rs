//! Multi-source policy loader.
//!
//! Sources are classified, fetched and merged strictly in the order given,
//! so later sources override earlier ones. Every failure is fatal to the
//! whole load except oversized entries of a directory source, which are
//! skipped with a warning.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{PolicyError, Result};
use crate::fetch::{HttpFetcher, RemoteFetcher};
use crate::schema::{MergedPolicy, PolicyDocument};
use crate::source::RuleSource;

/// Per-document size ceiling (5 MiB).
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Ceiling on the sum of all loaded documents (20 MiB).
pub const MAX_TOTAL_SIZE: u64 = 20 * 1024 * 1024;

/// Size ceilings applied while loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    /// Largest single document, local or remote.
    pub per_file: u64,
    /// Largest sum of every document actually parsed.
    pub total: u64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            per_file: MAX_FILE_SIZE,
            total: MAX_TOTAL_SIZE,
        }
    }
}

// ── Load result types ───────────────────────────────────────────────

/// Outcome of loading a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    /// File path or URL the document came from.
    pub origin: String,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single document load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Document was parsed and merged.
    Loaded { bytes: u64 },
    /// Directory entry was skipped (oversized, not a regular file).
    Skipped { reason: String },
}

/// Everything a successful load produced.
#[derive(Debug)]
pub struct LoadReport {
    pub policy: MergedPolicy,
    pub results: Vec<LoadResult>,
    /// Sum of the sizes of every merged document.
    pub total_bytes: u64,
}

impl LoadReport {
    pub fn loaded_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, LoadStatus::Loaded { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.results.len() - self.loaded_count()
    }
}

// ── Policy loader ───────────────────────────────────────────────────

/// Loads and merges rule documents from registry aliases, URLs, directories
/// and files.
pub struct PolicyLoader<F = HttpFetcher> {
    fetcher: F,
    limits: SizeLimits,
}

impl PolicyLoader<HttpFetcher> {
    /// Loader with the HTTPS fetcher and default size limits.
    pub fn new() -> Result<Self> {
        Ok(Self::with_fetcher(HttpFetcher::new()?))
    }
}

impl<F: RemoteFetcher> PolicyLoader<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            limits: SizeLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SizeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> SizeLimits {
        self.limits
    }

    /// Load every source in order and return the merged policy.
    ///
    /// Each document is merged as soon as it is read. The first fatal
    /// condition aborts the load and no partial policy is returned.
    pub async fn load(&self, sources: &[String]) -> Result<LoadReport> {
        let mut run = LoadRun::new(self.limits);

        for raw in sources {
            match RuleSource::classify(raw)? {
                RuleSource::Registry { name, url } => {
                    info!(registry = %name, url = %url, "fetching from registry");
                    self.load_remote(&url, &mut run).await?;
                }
                RuleSource::Remote(url) => self.load_remote(&url, &mut run).await?,
                RuleSource::Directory(dir) => self.load_directory(&dir, &mut run)?,
                RuleSource::File(path) => self.load_file(&path, &mut run)?,
            }
        }

        Ok(run.finish())
    }

    async fn load_remote(&self, url: &str, run: &mut LoadRun) -> Result<()> {
        let body = self.fetcher.fetch(url, self.limits.per_file).await?;
        run.accept(url, body)
    }

    /// Load the `.yaml` / `.yml` entries of a directory in lexicographic
    /// order. Oversized entries are skipped, not fatal.
    fn load_directory(&self, dir: &Path, run: &mut LoadRun) -> Result<()> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error(dir))? {
            let path = entry.map_err(io_error(dir))?.path();
            if is_yaml(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let origin = path.display().to_string();
            let metadata = fs::metadata(&path).map_err(io_error(&path))?;

            if !metadata.is_file() {
                run.skip(origin, "not a regular file".to_string());
                continue;
            }

            let size = metadata.len();
            if size > self.limits.per_file {
                warn!(
                    path = %origin,
                    size,
                    limit = self.limits.per_file,
                    "skipping rule file over size limit"
                );
                run.skip(
                    origin,
                    format!("size {size} exceeds limit {}", self.limits.per_file),
                );
                continue;
            }

            let bytes = fs::read(&path).map_err(io_error(&path))?;
            run.accept(&origin, bytes)?;
        }

        Ok(())
    }

    /// Load one explicitly named file. Oversize is fatal here.
    fn load_file(&self, path: &Path, run: &mut LoadRun) -> Result<()> {
        let origin = path.display().to_string();
        let size = fs::metadata(path).map_err(io_error(path))?.len();
        if size > self.limits.per_file {
            return Err(PolicyError::SourceTooLarge {
                origin,
                size,
                limit: self.limits.per_file,
            });
        }

        let bytes = fs::read(path).map_err(io_error(path))?;
        run.accept(&origin, bytes)
    }
}

/// The accumulator owned by one `load` call.
struct LoadRun {
    limits: SizeLimits,
    policy: MergedPolicy,
    results: Vec<LoadResult>,
    total_bytes: u64,
}

impl LoadRun {
    fn new(limits: SizeLimits) -> Self {
        Self {
            limits,
            policy: MergedPolicy::new(),
            results: Vec::new(),
            total_bytes: 0,
        }
    }

    /// Count, parse and merge one document.
    fn accept(&mut self, origin: &str, bytes: Vec<u8>) -> Result<()> {
        let size = bytes.len() as u64;
        let total = self.total_bytes + size;
        if total > self.limits.total {
            return Err(PolicyError::TotalSizeExceeded {
                origin: origin.to_string(),
                total,
                limit: self.limits.total,
            });
        }

        let document = PolicyDocument::parse(&bytes, origin)?;
        self.policy.merge(document);
        self.total_bytes = total;

        info!(source = %origin, bytes = size, "loaded rules");
        self.results.push(LoadResult {
            origin: origin.to_string(),
            status: LoadStatus::Loaded { bytes: size },
        });
        Ok(())
    }

    fn skip(&mut self, origin: String, reason: String) {
        self.results.push(LoadResult {
            origin,
            status: LoadStatus::Skipped { reason },
        });
    }

    fn finish(self) -> LoadReport {
        LoadReport {
            policy: self.policy,
            results: self.results,
            total_bytes: self.total_bytes,
        }
    }
}

/// Matches on the file-name suffix, so a file named just `.yaml` counts.
fn is_yaml(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(".yaml") || n.ends_with(".yml"))
        .unwrap_or(false)
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> PolicyError + '_ {
    move |error| PolicyError::Io {
        path: path.to_path_buf(),
        error,
    }
}
