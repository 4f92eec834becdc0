//! Archive/preview pairing.
//!
//! Operates on one directory's listing at a time: files are classified by
//! extension whitelist, grouped by case-normalized stem, and each group is
//! resolved into at most one [`FilePair`] plus unpaired leftovers. All
//! collections are sorted before pairing, so identical inputs produce
//! identical output regardless of the order the file system returned them.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use itertools::Itertools;

use pairshelf_core::{
    FilePair, PairStrategy, ShelfConfig, normalized_extension, normalized_stem,
};

/// A file's role from the extension whitelists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Primary asset file.
    Archive,
    /// Image counterpart.
    Preview,
}

/// Compiled extension whitelists.
///
/// Built once per walker from the shelf configuration so classification is
/// a single hash lookup per file. Preview extensions keep their configured
/// position, which `best_match` uses as a preference order.
#[derive(Debug, Clone)]
pub struct Classifier {
    archives: HashSet<CompactString>,
    preview_rank: HashMap<CompactString, usize>,
}

impl Classifier {
    /// Compile whitelists from the configuration.
    pub fn new(config: &ShelfConfig) -> Self {
        let archives = config
            .archive_extensions
            .iter()
            .map(|e| CompactString::new(e.to_lowercase()))
            .collect();
        let preview_rank = config
            .preview_extensions
            .iter()
            .enumerate()
            .map(|(rank, e)| (CompactString::new(e.to_lowercase()), rank))
            .collect();
        Self {
            archives,
            preview_rank,
        }
    }

    /// Classify a path by extension; `None` means the file is irrelevant.
    pub fn classify(&self, path: &Path) -> Option<FileKind> {
        let ext = normalized_extension(path)?;
        if self.archives.contains(&ext) {
            Some(FileKind::Archive)
        } else if self.preview_rank.contains_key(&ext) {
            Some(FileKind::Preview)
        } else {
            None
        }
    }

    /// Position of a preview extension in the configured priority order.
    fn rank(&self, path: &Path) -> usize {
        normalized_extension(path)
            .and_then(|ext| self.preview_rank.get(&ext).copied())
            .unwrap_or(usize::MAX)
    }
}

/// Candidate files sharing one normalized stem.
#[derive(Debug, Default, Clone)]
pub struct StemGroup {
    /// Archive candidates.
    pub archives: Vec<PathBuf>,
    /// Preview candidates.
    pub previews: Vec<PathBuf>,
}

/// Output of pairing one directory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Pairing {
    /// Matched pairs, one per stem that had both kinds.
    pub pairs: Vec<FilePair>,
    /// Archives left without a preview.
    pub unpaired_archives: Vec<PathBuf>,
    /// Previews left without an archive.
    pub unpaired_previews: Vec<PathBuf>,
}

/// Group classified files by normalized stem.
///
/// `BTreeMap` keeps stem iteration order deterministic without a second
/// sort pass.
pub fn group_by_stem(
    files: impl IntoIterator<Item = (PathBuf, FileKind)>,
) -> BTreeMap<CompactString, StemGroup> {
    let mut groups: BTreeMap<CompactString, StemGroup> = BTreeMap::new();
    for (path, kind) in files {
        let group = groups.entry(normalized_stem(&path)).or_default();
        match kind {
            FileKind::Archive => group.archives.push(path),
            FileKind::Preview => group.previews.push(path),
        }
    }
    groups
}

/// Resolve stem groups into pairs and leftovers.
pub fn pair(
    groups: BTreeMap<CompactString, StemGroup>,
    strategy: PairStrategy,
    classifier: &Classifier,
) -> Pairing {
    let mut out = Pairing::default();

    for (_, mut group) in groups {
        group.archives.sort();
        group.previews.sort();

        if group.archives.is_empty() {
            out.unpaired_previews.append(&mut group.previews);
            continue;
        }
        if group.previews.is_empty() {
            out.unpaired_archives.append(&mut group.archives);
            continue;
        }

        let mut archives = group.archives.into_iter();
        let Some(archive) = archives.next() else {
            continue;
        };
        let preview_idx = match strategy {
            PairStrategy::FirstMatch => 0,
            PairStrategy::BestMatch => best_preview(&archive, &group.previews, classifier),
        };
        let preview = group.previews.swap_remove(preview_idx);

        out.pairs.push(FilePair::new(archive, Some(preview)));
        out.unpaired_archives.extend(archives);
        group.previews.sort();
        out.unpaired_previews.append(&mut group.previews);
    }

    out
}

/// Pick the preview closest to the archive's name.
///
/// Ranking: exact-case stem match beats a case-folded one, then the
/// configured extension priority, then the shorter file name, then
/// lexicographic order.
fn best_preview(archive: &Path, previews: &[PathBuf], classifier: &Classifier) -> usize {
    let archive_stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    previews
        .iter()
        .position_min_by_key(|preview| {
            let stem = preview
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let case_mismatch = stem != archive_stem;
            let name_len = preview
                .file_name()
                .map(|n| n.len())
                .unwrap_or(usize::MAX);
            (
                case_mismatch,
                classifier.rank(preview),
                name_len,
                preview.to_path_buf(),
            )
        })
        .unwrap_or(0)
}
