//! File pair and special folder types.

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// An archive matched to its preview within one directory.
///
/// Immutable once constructed; identity is the case-normalized stem shared
/// by both files. The preview is optional: an archive with no matching
/// image still forms a displayable entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePair {
    /// Path to the archive file.
    pub archive: PathBuf,
    /// Path to the matched preview image, if any.
    pub preview: Option<PathBuf>,
    /// Lowercased file stem shared by archive and preview.
    pub base_name: CompactString,
}

impl FilePair {
    /// Create a pair from an archive and an optional preview.
    pub fn new(archive: PathBuf, preview: Option<PathBuf>) -> Self {
        let base_name = normalized_stem(&archive);
        Self {
            archive,
            preview,
            base_name,
        }
    }

    /// Whether this pair has a preview image.
    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }
}

/// A directory elevated to a first-class gallery entry by marker-file
/// convention, rather than shown as a plain folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialFolder {
    /// Directory path.
    pub path: PathBuf,
    /// Directory name.
    pub name: CompactString,
    /// Gallery preview image for the folder, if one was found.
    pub preview: Option<PathBuf>,
}

impl SpecialFolder {
    /// Create a special folder entry.
    pub fn new(path: PathBuf, preview: Option<PathBuf>) -> Self {
        let name = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_default();
        Self {
            path,
            name,
            preview,
        }
    }
}

/// Lowercased stem of a file name, the pairing identity within a directory.
pub fn normalized_stem(path: &Path) -> CompactString {
    path.file_stem()
        .map(|s| CompactString::new(s.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Lowercased extension of a file name, without the dot.
pub fn normalized_extension(path: &Path) -> Option<CompactString> {
    path.extension()
        .map(|e| CompactString::new(e.to_string_lossy().to_lowercase()))
}
