//! Cache directory layout.
//!
//! ```text
//! <output dir>/.odin-cache/<16-hex-digit fingerprint>/
//!     files.manifest
//!     args.manifest
//!     env.manifest
//!     cached-exe[-<target>][-<subtarget>].bin
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use warden_common::Fingerprint;

use crate::error::CacheError;
use crate::manifest::ManifestKind;
use crate::platform;

/// Name of the cache root directory.
pub const CACHE_DIR_NAME: &str = ".odin-cache";

/// Paths of the three manifests inside one cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestPaths {
    /// `files.manifest`.
    pub files: PathBuf,
    /// `args.manifest`.
    pub args: PathBuf,
    /// `env.manifest`.
    pub env: PathBuf,
}

impl ManifestPaths {
    /// Returns the manifest paths for a cache directory.
    pub fn in_dir(cache_dir: &Path) -> Self {
        Self {
            files: cache_dir.join(ManifestKind::Files.file_name()),
            args: cache_dir.join(ManifestKind::Args.file_name()),
            env: cache_dir.join(ManifestKind::Env.file_name()),
        }
    }

    /// Returns the path of one manifest.
    pub fn get(&self, kind: ManifestKind) -> &Path {
        match kind {
            ManifestKind::Files => &self.files,
            ManifestKind::Args => &self.args,
            ManifestKind::Env => &self.env,
        }
    }
}

/// Whether [`CacheLayout::resolve`] found or made the fingerprint directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryState {
    /// The directory was already there.
    Existing,
    /// The directory was just created, so it holds nothing to compare against.
    Created,
}

/// Locates the `.odin-cache` root and its per-fingerprint directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// Uses `<base_dir>/.odin-cache` as the cache root.
    pub fn new(base_dir: &Path) -> Self {
        Self {
            root: base_dir.join(CACHE_DIR_NAME),
        }
    }

    /// Places the cache root next to the build output.
    pub fn for_output(output: &Path) -> Self {
        match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Self::new(parent),
            _ => Self::new(Path::new(".")),
        }
    }

    /// The `.odin-cache` directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory for a fingerprint. Does not touch the filesystem.
    pub fn entry_dir(&self, fingerprint: Fingerprint) -> PathBuf {
        self.root.join(fingerprint.to_string())
    }

    /// Ensures the cache root and the fingerprint directory exist.
    ///
    /// Idempotent: a second call returns the same path and reports
    /// [`DirectoryState::Existing`].
    pub fn resolve(
        &self,
        fingerprint: Fingerprint,
    ) -> Result<(PathBuf, DirectoryState), CacheError> {
        fs::create_dir_all(&self.root).map_err(|e| CacheError::Io {
            path: self.root.clone(),
            source: e,
        })?;
        let dir = self.entry_dir(fingerprint);
        match fs::create_dir(&dir) {
            Ok(()) => Ok((dir, DirectoryState::Created)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => {
                Ok((dir, DirectoryState::Existing))
            }
            Err(e) => Err(CacheError::Io {
                path: dir,
                source: e,
            }),
        }
    }

    /// Deletes the whole cache root.
    ///
    /// Returns `false` if there was nothing to delete.
    pub fn clear(&self) -> Result<bool, CacheError> {
        if !self.root.exists() {
            return Ok(false);
        }
        platform::delete_tree(&self.root).map_err(|e| CacheError::Clear {
            path: self.root.clone(),
            source: e,
        })?;
        Ok(true)
    }
}

/// Deletes `<base_dir>/.odin-cache`. A missing cache counts as success.
pub fn clear_cache(base_dir: &Path) -> Result<bool, CacheError> {
    CacheLayout::new(base_dir).clear()
}
