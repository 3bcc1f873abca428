//! Cache validation: decide whether the previous build's binary can be reused.
//!
//! [`Validator::validate`] fingerprints the input file set, resolves the
//! cache directory, and compares the stored manifests against the current
//! files, arguments and environment. The first mismatch ends the comparison
//! and refreshes all three manifests; a full match copies the cached binary
//! over the build output.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use warden_common::Fingerprint;

use crate::artifact::{self, ArtifactCopy};
use crate::error::CacheError;
use crate::inputs::{last_write_time, ArgumentList, EnvironmentList, InputFileSet};
use crate::layout::{CacheLayout, DirectoryState, ManifestPaths};
use crate::manifest::{self, ManifestKind, ReadError};

/// Everything the current build is keyed on.
#[derive(Debug, Clone, Default)]
pub struct CacheInputs {
    /// Sorted input files.
    pub files: InputFileSet,
    /// Trimmed command-line arguments.
    pub args: ArgumentList,
    /// Sorted environment, volatile variable removed.
    pub env: EnvironmentList,
}

impl CacheInputs {
    /// Bundles the three input lists.
    pub fn new(files: InputFileSet, args: ArgumentList, env: EnvironmentList) -> Self {
        Self { files, args, env }
    }
}

/// Why a validation did not reuse the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MissReason {
    /// Caching is turned off in configuration.
    CacheDisabled,
    /// The fingerprint directory did not exist yet.
    DirectoryCreated,
    /// The cache directory could not be created.
    DirectoryUnusable {
        /// The underlying error.
        detail: String,
    },
    /// One of the manifests is absent.
    ManifestMissing {
        /// Which manifest.
        kind: ManifestKind,
    },
    /// A manifest exists but could not be parsed.
    ManifestMalformed {
        /// Which manifest.
        kind: ManifestKind,
        /// The parse error.
        detail: String,
    },
    /// The number of recorded files differs from the current file count.
    FileCountMismatch {
        /// Files in the manifest.
        recorded: usize,
        /// Files in the current build.
        current: usize,
    },
    /// The file at some position is not the one recorded there.
    PathMismatch {
        /// Position in sorted order.
        index: usize,
        /// Path in the manifest.
        recorded: String,
        /// Path in the current build.
        current: String,
    },
    /// A file's last-write time differs from the recorded one.
    TimestampMismatch {
        /// The file.
        path: String,
        /// Time in the manifest.
        recorded: u64,
        /// Live time, `None` if it could not be read.
        current: Option<u64>,
    },
    /// The argument list differs.
    ArgsMismatch {
        /// First position that differs.
        index: usize,
    },
    /// The environment differs.
    EnvMismatch {
        /// First position that differs.
        index: usize,
    },
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheDisabled => write!(f, "cache disabled"),
            Self::DirectoryCreated => write!(f, "no cache entry for this file set"),
            Self::DirectoryUnusable { detail } => write!(f, "cache directory unusable: {detail}"),
            Self::ManifestMissing { kind } => write!(f, "{kind} manifest missing"),
            Self::ManifestMalformed { kind, detail } => {
                write!(f, "{kind} manifest malformed: {detail}")
            }
            Self::FileCountMismatch { recorded, current } => {
                write!(f, "file count changed from {recorded} to {current}")
            }
            Self::PathMismatch { index, current, .. } => {
                write!(f, "file #{index} changed to {current}")
            }
            Self::TimestampMismatch { path, .. } => write!(f, "{path} was modified"),
            Self::ArgsMismatch { index } => write!(f, "arguments differ at position {index}"),
            Self::EnvMismatch { index } => write!(f, "environment differs at position {index}"),
        }
    }
}

/// The outcome of one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// The cached binary was copied over the output; skip the build.
    Hit,
    /// The inputs changed (or there was no cache); build normally.
    Miss(MissReason),
    /// The inputs matched but the cached binary could not be restored.
    /// The cache directory was left as it is.
    RestoreFailed,
}

/// Result of [`Validator::validate`], passed on to later build stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheOutcome {
    /// What the caller should do.
    pub decision: Decision,
    /// Fingerprint of the input file set.
    pub fingerprint: Fingerprint,
    /// The fingerprint directory.
    pub cache_dir: PathBuf,
    /// Manifest paths inside [`cache_dir`](Self::cache_dir).
    pub manifests: ManifestPaths,
    /// Whether fresh manifests were written during this pass.
    pub manifests_written: bool,
}

impl CacheOutcome {
    /// Returns `true` if the cached binary was reused.
    pub fn is_hit(&self) -> bool {
        self.decision == Decision::Hit
    }

    /// Returns `true` if the caller has to run the build.
    pub fn should_build(&self) -> bool {
        !self.is_hit()
    }

    /// Returns `true` if the built binary should be stored in the cache afterwards.
    pub fn should_store(&self) -> bool {
        match &self.decision {
            Decision::Hit => false,
            Decision::Miss(_) => self.manifests_written,
            Decision::RestoreFailed => true,
        }
    }
}

/// Decides cache reuse for one build output.
#[derive(Debug, Clone)]
pub struct Validator {
    layout: CacheLayout,
    output: PathBuf,
    target: Option<String>,
    subtarget: Option<String>,
    enabled: bool,
}

impl Validator {
    /// Creates a validator for the given build output, caching next to it.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        let output = output.into();
        Self {
            layout: CacheLayout::for_output(&output),
            output,
            target: None,
            subtarget: None,
            enabled: true,
        }
    }

    /// Sets the target and subtarget names used for the cached binary.
    pub fn with_target(mut self, target: Option<String>, subtarget: Option<String>) -> Self {
        self.target = target;
        self.subtarget = subtarget;
        self
    }

    /// Turns caching on or off.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The cache layout in use.
    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// The build output path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// The cached binary for a cache directory.
    pub fn artifact(&self, cache_dir: &Path) -> ArtifactCopy {
        ArtifactCopy::new(cache_dir, self.target.as_deref(), self.subtarget.as_deref())
    }

    /// The fingerprint directory for a file set, without touching the disk.
    pub fn entry_dir(&self, files: &InputFileSet) -> PathBuf {
        self.layout.entry_dir(files.fingerprint())
    }

    /// Copies the freshly built output into the cache directory for `files`.
    pub fn store(&self, files: &InputFileSet) -> Result<u64, CacheError> {
        self.artifact(&self.entry_dir(files)).store(&self.output)
    }

    /// Runs one validation pass.
    ///
    /// Every mismatch, missing manifest or malformed record is a miss: the
    /// cached binaries are deleted and the manifests rewritten. The only error
    /// is an existing manifest that cannot be read; in that case nothing is
    /// written and the caller should build without the cache.
    pub fn validate(&self, inputs: &CacheInputs) -> Result<CacheOutcome, CacheError> {
        let fingerprint = inputs.files.fingerprint();
        let cache_dir = self.layout.entry_dir(fingerprint);
        let manifests = ManifestPaths::in_dir(&cache_dir);
        let mut outcome = CacheOutcome {
            decision: Decision::Miss(MissReason::CacheDisabled),
            fingerprint,
            cache_dir,
            manifests,
            manifests_written: false,
        };

        if !self.enabled {
            debug!(%fingerprint, "cache disabled");
            return Ok(outcome);
        }

        let mismatch = match self.layout.resolve(fingerprint) {
            Ok((_, DirectoryState::Created)) => Some(MissReason::DirectoryCreated),
            Ok((_, DirectoryState::Existing)) => compare(inputs, &outcome.manifests)?,
            Err(e) => {
                warn!(error = %e, "cache directory unusable");
                Some(MissReason::DirectoryUnusable {
                    detail: e.to_string(),
                })
            }
        };

        match mismatch {
            None => {
                outcome.decision = match self.artifact(&outcome.cache_dir).restore(&self.output) {
                    Ok(_) => {
                        info!(
                            %fingerprint,
                            output = %self.output.display(),
                            "reusing cached build"
                        );
                        Decision::Hit
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            "inputs unchanged but cached binary could not be restored"
                        );
                        Decision::RestoreFailed
                    }
                };
            }
            Some(reason) => {
                debug!(%fingerprint, %reason, "cache miss");
                let refreshed = artifact::remove_cached_binaries(&outcome.cache_dir)
                    .and_then(|_| write_manifests(inputs, &outcome.manifests));
                outcome.manifests_written = match refreshed {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(error = %e, "failed to refresh cache directory");
                        false
                    }
                };
                outcome.decision = Decision::Miss(reason);
            }
        }
        Ok(outcome)
    }
}

/// Compares all three manifests against the current inputs.
///
/// `Ok(None)` means everything matched.
fn compare(
    inputs: &CacheInputs,
    manifests: &ManifestPaths,
) -> Result<Option<MissReason>, CacheError> {
    for kind in ManifestKind::ALL {
        if !manifests.get(kind).exists() {
            return Ok(Some(MissReason::ManifestMissing { kind }));
        }
    }

    let Some(records) = load_records(ManifestKind::Files, &manifests.files)? else {
        return Ok(Some(MissReason::ManifestMissing {
            kind: ManifestKind::Files,
        }));
    };
    if let Some(reason) = compare_files(&records, &inputs.files) {
        return Ok(Some(reason));
    }

    let Some(records) = load_records(ManifestKind::Args, &manifests.args)? else {
        return Ok(Some(MissReason::ManifestMissing {
            kind: ManifestKind::Args,
        }));
    };
    if let Some(index) = first_difference(&records, inputs.args.as_slice()) {
        return Ok(Some(MissReason::ArgsMismatch { index }));
    }

    let Some(records) = load_records(ManifestKind::Env, &manifests.env)? else {
        return Ok(Some(MissReason::ManifestMissing {
            kind: ManifestKind::Env,
        }));
    };
    if let Some(index) = first_difference(&records, inputs.env.as_slice()) {
        return Ok(Some(MissReason::EnvMismatch { index }));
    }

    Ok(None)
}

/// Reads a manifest's records. `Ok(None)` if it vanished since the existence check.
fn load_records(kind: ManifestKind, path: &Path) -> Result<Option<Vec<String>>, CacheError> {
    match manifest::read_records(path) {
        Ok(records) => Ok(Some(records)),
        Err(ReadError::Empty) => Ok(Some(Vec::new())),
        Err(ReadError::NotFound) => Ok(None),
        Err(ReadError::Read(source)) => Err(CacheError::ManifestRead {
            kind,
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn compare_files(records: &[String], files: &InputFileSet) -> Option<MissReason> {
    let entries = match manifest::parse_file_records(records) {
        Ok(entries) => entries,
        Err(e) => {
            return Some(MissReason::ManifestMalformed {
                kind: ManifestKind::Files,
                detail: e.to_string(),
            })
        }
    };
    if entries.len() != files.len() {
        return Some(MissReason::FileCountMismatch {
            recorded: entries.len(),
            current: files.len(),
        });
    }
    for (index, (entry, path)) in entries.iter().zip(files.paths()).enumerate() {
        if entry.path != *path {
            return Some(MissReason::PathMismatch {
                index,
                recorded: entry.path.clone(),
                current: path.clone(),
            });
        }
        let current = last_write_time(Path::new(path));
        if current != Some(entry.timestamp) {
            return Some(MissReason::TimestampMismatch {
                path: path.clone(),
                recorded: entry.timestamp,
                current,
            });
        }
    }
    None
}

/// Position of the first differing record, or the shorter length if one list
/// is a prefix of the other. `None` if both are equal.
fn first_difference(recorded: &[String], current: &[String]) -> Option<usize> {
    recorded
        .iter()
        .zip(current)
        .position(|(r, c)| r != c)
        .or_else(|| (recorded.len() != current.len()).then(|| recorded.len().min(current.len())))
}

fn write_manifests(inputs: &CacheInputs, manifests: &ManifestPaths) -> Result<(), CacheError> {
    manifest::write_file_manifest(&manifests.files, &inputs.files.snapshot()).map_err(|source| {
        CacheError::Io {
            path: manifests.files.clone(),
            source,
        }
    })?;
    manifest::write_records(&manifests.args, inputs.args.as_slice()).map_err(|source| {
        CacheError::Io {
            path: manifests.args.clone(),
            source,
        }
    })?;
    manifest::write_records(&manifests.env, inputs.env.as_slice()).map_err(|source| {
        CacheError::Io {
            path: manifests.env.clone(),
            source,
        }
    })
}
