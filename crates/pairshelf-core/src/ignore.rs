//! Name-based skip rules.
//!
//! Compiled once per scan from [`ShelfConfig`](crate::ShelfConfig) lists so
//! the walker pays one hash lookup plus a short prefix sweep per entry, not
//! a per-pattern string scan.

use std::collections::HashSet;

use compact_str::CompactString;

/// Static predicate deciding whether a directory or file name is skipped.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    names: HashSet<CompactString>,
    prefixes: Vec<CompactString>,
}

impl IgnoreRules {
    /// Compile rules from exact names and prefixes.
    pub fn new<N, P>(names: N, prefixes: P) -> Self
    where
        N: IntoIterator,
        N::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| CompactString::new(n.as_ref()))
                .collect(),
            prefixes: prefixes
                .into_iter()
                .map(|p| CompactString::new(p.as_ref()))
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Whether a name should be skipped.
    pub fn is_ignored(&self, name: &str) -> bool {
        if self.names.contains(name) {
            return true;
        }
        self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    /// Number of exact-name rules.
    pub fn len(&self) -> usize {
        self.names.len() + self.prefixes.len()
    }

    /// Whether no rules are configured.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.prefixes.is_empty()
    }
}
