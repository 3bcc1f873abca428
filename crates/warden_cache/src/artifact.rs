//! Copying the built binary into and out of a cache directory.
//!
//! The cached copy lives next to the manifests as
//! `cached-exe[-<target>][-<subtarget>].bin`, so builds for different targets
//! over the same file set do not overwrite each other's binaries.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CacheError;

/// Returns the cached binary's file name for a target and subtarget.
pub fn cached_binary_name(target: Option<&str>, subtarget: Option<&str>) -> String {
    let mut name = String::from("cached-exe");
    for part in [target, subtarget].into_iter().flatten() {
        name.push('-');
        name.push_str(part);
    }
    name.push_str(".bin");
    name
}

/// Deletes every `cached-exe*.bin` in `cache_dir`. Returns how many were removed.
///
/// The manifests in a cache directory are shared by all targets, so once they
/// are rewritten no binary in the directory matches them any more. A missing
/// directory holds no binaries.
pub fn remove_cached_binaries(cache_dir: &Path) -> Result<usize, CacheError> {
    let io_err = |source: io::Error| CacheError::Io {
        path: cache_dir.to_path_buf(),
        source,
    };
    let entries = match fs::read_dir(cache_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(io_err(e)),
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry.map_err(io_err)?.path();
        let is_binary = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("cached-exe") && name.ends_with(".bin"));
        if is_binary && path.is_file() {
            fs::remove_file(&path).map_err(|source| CacheError::Io {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "removed stale cached binary");
            removed += 1;
        }
    }
    Ok(removed)
}

/// The cached binary of one cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCopy {
    cached: PathBuf,
}

impl ArtifactCopy {
    /// Points at the cached binary inside `cache_dir`.
    pub fn new(cache_dir: &Path, target: Option<&str>, subtarget: Option<&str>) -> Self {
        Self {
            cached: cache_dir.join(cached_binary_name(target, subtarget)),
        }
    }

    /// Path of the cached binary.
    pub fn cached_path(&self) -> &Path {
        &self.cached
    }

    /// Returns `true` if a cached binary is present.
    pub fn is_cached(&self) -> bool {
        self.cached.is_file()
    }

    /// Copies the cached binary over the build output. Returns bytes copied.
    pub fn restore(&self, output: &Path) -> Result<u64, CacheError> {
        let bytes = fs::copy(&self.cached, output).map_err(|e| CacheError::Restore {
            from: self.cached.clone(),
            to: output.to_path_buf(),
            source: e,
        })?;
        debug!(
            from = %self.cached.display(),
            to = %output.display(),
            bytes,
            "restored cached binary"
        );
        Ok(bytes)
    }

    /// Copies a freshly built output into the cache. Returns bytes copied.
    pub fn store(&self, output: &Path) -> Result<u64, CacheError> {
        let bytes = fs::copy(output, &self.cached).map_err(|e| CacheError::Store {
            from: output.to_path_buf(),
            to: self.cached.clone(),
            source: e,
        })?;
        debug!(
            from = %output.display(),
            to = %self.cached.display(),
            bytes,
            "stored binary in cache"
        );
        Ok(bytes)
    }
}
