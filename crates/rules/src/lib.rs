//! Compliance policy loading.
//!
//! This crate provides:
//! - Default source resolution when no rule source is given
//! - Source classification (registry alias, remote URL, directory, file)
//! - Sequential fetch-and-merge with per-file and aggregate size ceilings
//! - Last-source-wins profile merging
//! - Ignore-list loading

pub mod error;
pub mod fetch;
pub mod ignore;
pub mod loader;
pub mod merge;
pub mod schema;
pub mod source;

pub use error::{PolicyError, Result};
pub use fetch::{HttpFetcher, RemoteFetcher};
pub use ignore::IgnoreList;
pub use loader::{LoadReport, LoadResult, LoadStatus, PolicyLoader, SizeLimits};
pub use schema::{MergedPolicy, PolicyDocument};
pub use source::{resolve_default_sources, RuleSource};
