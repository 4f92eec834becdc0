//! Combined configuration for a full gallery stack.

use serde::{Deserialize, Serialize};

use pairshelf_core::ShelfConfig;
use pairshelf_thumbs::ThumbConfig;

/// Everything a [`ShelfRegistry`](crate::ShelfRegistry) needs: scanning
/// and pairing settings plus thumbnail bounds and render options.
///
/// Both halves default independently, so hosts can deserialize a partial
/// document and take the rest as defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GalleryConfig {
    /// Scanner, pairing, and scan-cache settings.
    #[serde(default)]
    pub shelf: ShelfConfig,

    /// Thumbnail cache, worker pool, and render settings.
    #[serde(default)]
    pub thumbs: ThumbConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: GalleryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.shelf.special_marker, ".gallery");
        assert_eq!(config.thumbs.max_entries, 512);
    }

    #[test]
    fn partial_document_overrides_one_half() {
        let config: GalleryConfig =
            serde_json::from_str(r#"{"thumbs": {"max_entries": 32}}"#).unwrap();
        assert_eq!(config.thumbs.max_entries, 32);
        assert!(config.shelf.archive_extensions.contains(&"zip".to_string()));
    }
}
