//! Thumbnail subsystem configuration.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::key::RenderOptions;

/// Bounds and render settings for the thumbnail cache and loader.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ThumbConfig {
    /// Maximum number of cached thumbnails.
    #[builder(default = "512")]
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Maximum total bytes retained by the cache.
    #[builder(default = "128 * 1024 * 1024")]
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Render worker count. Small and fixed; decode work is CPU-bound.
    #[builder(default = "3")]
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Queued requests beyond this fail fast instead of piling up.
    #[builder(default = "256")]
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,

    /// Per-request decode/resize budget.
    #[builder(default = "Duration::from_secs(10)")]
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// Render options, fingerprinted into every cache key.
    #[builder(default)]
    #[serde(default)]
    pub render: RenderOptions,
}

fn default_max_entries() -> usize {
    512
}

fn default_max_bytes() -> u64 {
    128 * 1024 * 1024
}

fn default_workers() -> usize {
    3
}

fn default_queue_depth() -> usize {
    256
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Serialize the timeout as whole seconds.
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

impl ThumbConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(workers) = self.workers {
            if workers == 0 || workers > 16 {
                return Err("Worker count must be between 1 and 16".to_string());
            }
        }
        if self.queue_depth == Some(0) {
            return Err("Queue depth must be at least 1".to_string());
        }
        if self.max_bytes == Some(0) {
            return Err("Byte bound must be positive".to_string());
        }
        if let Some(render) = &self.render {
            if render.quality == 0 || render.quality > 100 {
                return Err("Render quality must be between 1 and 100".to_string());
            }
        }
        Ok(())
    }
}

impl ThumbConfig {
    /// Create a new config builder.
    pub fn builder() -> ThumbConfigBuilder {
        ThumbConfigBuilder::default()
    }
}

impl Default for ThumbConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_bytes: default_max_bytes(),
            workers: default_workers(),
            queue_depth: default_queue_depth(),
            timeout: default_timeout(),
            render: RenderOptions::default(),
        }
    }
}
