//! Error and warning types for scanning operations.
//!
//! The split matters: [`ScanError`] aborts a whole scan, [`ScanWarning`]
//! records a subtree that was skipped while the scan carried on. A scan that
//! only collected warnings is still a successful scan.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Root path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Permission denied for the root path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Root path exists but is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// I/O error that could not be recovered locally.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Caller-requested cancellation. Distinct from failure: the caller
    /// asked for it and partial state has been discarded.
    #[error("Scan interrupted by caller")]
    Interrupted,

    /// The session's estimated memory footprint stayed above the hard
    /// limit even after reclamation.
    #[error("Memory budget exceeded: ~{estimated} bytes retained, limit {limit}")]
    ResourceExhausted { estimated: u64, limit: u64 },

    /// Invalid request or configuration, detected before any I/O.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl ScanError {
    /// Classify an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Whether this error means the caller cancelled rather than failed.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

/// Kind of recoverable scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A subpath vanished between listing and visiting it.
    NotFound,
    /// Permission denied on a subtree.
    PermissionDenied,
    /// Transient read error on a subtree.
    ReadError,
    /// A directory was reached twice within one scan (symlink cycle or
    /// duplicate mount).
    LoopDetected,
}

/// Non-fatal condition recorded while a scan continued past it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the condition occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// A subtree skipped because permission was denied.
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Permission denied: {}", path.display()),
            path,
            kind: WarningKind::PermissionDenied,
        }
    }

    /// A subtree skipped because it vanished mid-scan.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Vanished during scan: {}", path.display()),
            path,
            kind: WarningKind::NotFound,
        }
    }

    /// A subtree skipped after a read error.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        Self {
            message: format!("Read error at {}: {error}", path.display()),
            path,
            kind: WarningKind::ReadError,
        }
    }

    /// A directory skipped because it was already visited in this scan.
    pub fn loop_detected(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Cycle detected, subtree skipped: {}", path.display()),
            path,
            kind: WarningKind::LoopDetected,
        }
    }

    /// Classify an I/O error into the matching warning kind.
    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::read_error(path, error),
        }
    }
}
