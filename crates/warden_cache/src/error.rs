//! Error types for cache operations.

use std::path::PathBuf;

use crate::manifest::ManifestKind;

/// Errors that can occur during cache operations.
///
/// Validation is fail-safe: a missing, empty, or malformed manifest is a
/// cache miss, not an error. Only the conditions below cross the crate
/// boundary as failures.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while preparing or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An existing manifest could not be read.
    ///
    /// The cache is unusable for this build; the caller should build
    /// normally and leave the cache alone.
    #[error("failed to read {kind} manifest at {path}: {source}")]
    ManifestRead {
        /// Which manifest failed.
        kind: ManifestKind,
        /// The manifest file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cached binary could not be copied over the build output.
    #[error("failed to restore cached binary {from} to {to}: {source}")]
    Restore {
        /// The cached binary.
        from: PathBuf,
        /// The build output path.
        to: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The freshly built binary could not be copied into the cache.
    #[error("failed to store {from} in cache as {to}: {source}")]
    Store {
        /// The build output path.
        from: PathBuf,
        /// The cached binary path.
        to: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cache tree could not be deleted.
    #[error("failed to clear cache directory {path}: {source}")]
    Clear {
        /// The cache root that was being removed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
