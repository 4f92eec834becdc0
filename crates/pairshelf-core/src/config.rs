//! Shelf configuration and per-scan request types.
//!
//! [`ShelfConfig`] is the ambient configuration handed in by the surrounding
//! application (extension whitelists, ignore lists, cache bounds). It is
//! deserializable so hosts can load it from their own settings store; this
//! crate never persists it. [`ScanRequest`] carries the per-invocation knobs.

use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How archives are matched to previews within a base-name group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PairStrategy {
    /// First archive and first preview in sorted listing order.
    #[default]
    FirstMatch,
    /// Rank preview candidates and pick the closest match.
    BestMatch,
}

/// Ambient configuration consumed from the surrounding system.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ShelfConfig {
    /// File extensions treated as archives (matched case-insensitively,
    /// without the leading dot).
    #[builder(default = "default_archive_extensions()")]
    #[serde(default = "default_archive_extensions")]
    pub archive_extensions: Vec<String>,

    /// File extensions treated as previews, in priority order. The order
    /// feeds the `best_match` ranking.
    #[builder(default = "default_preview_extensions()")]
    #[serde(default = "default_preview_extensions")]
    pub preview_extensions: Vec<String>,

    /// Directory/file names skipped outright.
    #[builder(default = "default_ignored_names()")]
    #[serde(default = "default_ignored_names")]
    pub ignored_names: Vec<String>,

    /// Name prefixes skipped outright (e.g. AppleDouble `._` litter).
    #[builder(default = "default_ignored_prefixes()")]
    #[serde(default = "default_ignored_prefixes")]
    pub ignored_prefixes: Vec<String>,

    /// Marker file name that elevates a directory to a special folder.
    #[builder(default = "default_special_marker()")]
    #[serde(default = "default_special_marker")]
    pub special_marker: String,

    /// Maximum number of directories kept in the scan-result cache.
    #[builder(default = "64")]
    #[serde(default = "default_scan_cache_entries")]
    pub scan_cache_entries: usize,

    /// Age past which a cached scan result counts as absent.
    #[builder(default = "Duration::from_secs(300)")]
    #[serde(default = "default_scan_cache_ttl", with = "duration_secs")]
    pub scan_cache_ttl: Duration,

    /// Capacity of the per-scan visited-directory set before the oldest
    /// half is trimmed.
    #[builder(default = "65_536")]
    #[serde(default = "default_visited_capacity")]
    pub visited_capacity: usize,

    /// Estimated retained bytes at which the walker starts reclaiming.
    #[builder(default = "64 * 1024 * 1024")]
    #[serde(default = "default_memory_soft_limit")]
    pub memory_soft_limit: u64,

    /// Estimated retained bytes at which the scan aborts.
    #[builder(default = "256 * 1024 * 1024")]
    #[serde(default = "default_memory_hard_limit")]
    pub memory_hard_limit: u64,
}

fn default_archive_extensions() -> Vec<String> {
    vec!["zip".into(), "rar".into(), "7z".into()]
}

fn default_preview_extensions() -> Vec<String> {
    vec![
        "jpg".into(),
        "jpeg".into(),
        "png".into(),
        "webp".into(),
        "gif".into(),
        "bmp".into(),
    ]
}

fn default_ignored_names() -> Vec<String> {
    vec![
        ".git".into(),
        ".svn".into(),
        "node_modules".into(),
        "__MACOSX".into(),
        ".Trash".into(),
        "$RECYCLE.BIN".into(),
        "System Volume Information".into(),
    ]
}

fn default_ignored_prefixes() -> Vec<String> {
    vec!["._".into()]
}

fn default_special_marker() -> String {
    ".gallery".into()
}

fn default_scan_cache_entries() -> usize {
    64
}

fn default_scan_cache_ttl() -> Duration {
    Duration::from_secs(300)
}

fn default_visited_capacity() -> usize {
    65_536
}

fn default_memory_soft_limit() -> u64 {
    64 * 1024 * 1024
}

fn default_memory_hard_limit() -> u64 {
    256 * 1024 * 1024
}

/// Serialize the cache TTL as whole seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

impl ShelfConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(exts) = &self.archive_extensions {
            if exts.is_empty() {
                return Err("At least one archive extension is required".to_string());
            }
        }
        if let Some(exts) = &self.preview_extensions {
            if exts.is_empty() {
                return Err("At least one preview extension is required".to_string());
            }
        }
        if let (Some(soft), Some(hard)) = (self.memory_soft_limit, self.memory_hard_limit) {
            if soft > hard {
                return Err("Memory soft limit must not exceed the hard limit".to_string());
            }
        }
        Ok(())
    }
}

impl ShelfConfig {
    /// Create a new config builder.
    pub fn builder() -> ShelfConfigBuilder {
        ShelfConfigBuilder::default()
    }
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            archive_extensions: default_archive_extensions(),
            preview_extensions: default_preview_extensions(),
            ignored_names: default_ignored_names(),
            ignored_prefixes: default_ignored_prefixes(),
            special_marker: default_special_marker(),
            scan_cache_entries: default_scan_cache_entries(),
            scan_cache_ttl: default_scan_cache_ttl(),
            visited_capacity: default_visited_capacity(),
            memory_soft_limit: default_memory_soft_limit(),
            memory_hard_limit: default_memory_hard_limit(),
        }
    }
}

/// Parameters for one scan invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Directory to scan.
    pub root: PathBuf,

    /// Recursion limit. `None` is unlimited, `Some(0)` scans only the root.
    pub max_depth: Option<u32>,

    /// Pairing strategy.
    pub strategy: PairStrategy,

    /// Skip the scan-result cache on read and on write.
    pub force_refresh: bool,
}

impl ScanRequest {
    /// Request a full-depth scan with default strategy.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: None,
            strategy: PairStrategy::default(),
            force_refresh: false,
        }
    }

    /// Limit recursion depth.
    pub fn with_max_depth(mut self, depth: impl Into<Option<u32>>) -> Self {
        self.max_depth = depth.into();
        self
    }

    /// Select the pairing strategy.
    pub fn with_strategy(mut self, strategy: PairStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Bypass the scan-result cache for this invocation.
    pub fn with_force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_wire_names() {
        use std::str::FromStr;

        assert_eq!(
            PairStrategy::from_str("first_match").unwrap(),
            PairStrategy::FirstMatch
        );
        assert_eq!(
            PairStrategy::from_str("best_match").unwrap(),
            PairStrategy::BestMatch
        );
        assert!(PairStrategy::from_str("newest_match").is_err());
        assert_eq!(PairStrategy::BestMatch.to_string(), "best_match");
    }

    #[test]
    fn builder_defaults() {
        let config = ShelfConfig::builder().build().unwrap();
        assert!(config.archive_extensions.contains(&"zip".to_string()));
        assert_eq!(config.special_marker, ".gallery");
        assert_eq!(config.scan_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn builder_rejects_empty_whitelist() {
        let err = ShelfConfig::builder()
            .archive_extensions(Vec::<String>::new())
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn builder_rejects_inverted_memory_limits() {
        let err = ShelfConfig::builder()
            .memory_soft_limit(100u64)
            .memory_hard_limit(50u64)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn request_chainers() {
        let req = ScanRequest::new("/assets")
            .with_max_depth(2)
            .with_strategy(PairStrategy::BestMatch)
            .with_force_refresh(true);
        assert_eq!(req.max_depth, Some(2));
        assert_eq!(req.strategy, PairStrategy::BestMatch);
        assert!(req.force_refresh);
    }
}
