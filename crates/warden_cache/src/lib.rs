//! Incremental build cache validation.
//!
//! Decides whether a previously built binary can be reused instead of
//! running a full compilation. The cache is keyed on the set of input files
//! (fingerprinted into a directory name under `.odin-cache/`) and validated
//! against three manifests recording each file's last-write time, the
//! command-line arguments, and the process environment of the build that
//! produced the cached binary.
//!
//! ```no_run
//! use warden_cache::{ArgumentList, CacheInputs, EnvironmentList, InputFileSet, Validator};
//!
//! let inputs = CacheInputs::new(
//!     InputFileSet::from_paths(["/project/main.odin"]),
//!     ArgumentList::new(["build", "."]),
//!     EnvironmentList::capture("CURR_DATE_TIME"),
//! );
//! let validator = Validator::new("/project/main");
//! let outcome = validator.validate(&inputs)?;
//! if outcome.should_build() {
//!     // run the compiler ...
//! }
//! if outcome.should_store() {
//!     validator.store(&inputs.files)?;
//! }
//! # Ok::<(), warden_cache::CacheError>(())
//! ```

#![warn(missing_docs)]

pub mod artifact;
pub mod error;
pub mod inputs;
pub mod layout;
pub mod manifest;
pub mod platform;
pub mod validator;

pub use artifact::{cached_binary_name, remove_cached_binaries, ArtifactCopy};
pub use error::CacheError;
pub use inputs::{last_write_time, ArgumentList, EnvironmentList, InputFileSet, LoadedFile};
pub use layout::{clear_cache, CacheLayout, DirectoryState, ManifestPaths, CACHE_DIR_NAME};
pub use manifest::{FileEntry, ManifestKind};
pub use validator::{CacheInputs, CacheOutcome, Decision, MissReason, Validator};
pub use warden_common::Fingerprint;
