//! The inputs a cached build is keyed on.
//!
//! Collects the current input file set, argument list, and environment into
//! the normalized shapes the manifests store: files sorted by path, arguments
//! trimmed in their original order, environment trimmed and sorted with the
//! volatile variable removed.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::debug;
use warden_common::Fingerprint;

use crate::manifest::FileEntry;
use crate::platform;

/// A file the front end loaded on the side (e.g. through `#load`).
///
/// Only files that existed when they were loaded take part in validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    /// Absolute path of the loaded file.
    pub path: PathBuf,
    /// Whether the file existed when the front end loaded it.
    pub exists: bool,
}

impl LoadedFile {
    /// Creates a loaded-file record.
    pub fn new(path: impl Into<PathBuf>, exists: bool) -> Self {
        Self {
            path: path.into(),
            exists,
        }
    }
}

/// The sorted set of files contributing to the current build.
///
/// Duplicates are kept; they change the fingerprint but not correctness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputFileSet {
    paths: Vec<String>,
}

impl InputFileSet {
    /// Combines the front end's primary files with the existing loaded files
    /// and sorts the result lexicographically.
    pub fn collect<P, L>(primary: P, loaded: L) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<Path>,
        L: IntoIterator<Item = LoadedFile>,
    {
        let mut paths: Vec<String> = primary
            .into_iter()
            .map(|p| path_string(p.as_ref()))
            .collect();
        paths.extend(
            loaded
                .into_iter()
                .filter(|f| f.exists)
                .map(|f| path_string(&f.path)),
        );
        paths.sort();
        Self { paths }
    }

    /// Builds a set from primary files only.
    pub fn from_paths<P>(primary: P) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<Path>,
    {
        Self::collect(primary, std::iter::empty::<LoadedFile>())
    }

    /// The sorted paths.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Number of paths, duplicates included.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if there are no input files.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Folds every path, in sorted order, through one running CRC-64.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self.paths.iter().map(String::as_bytes))
    }

    /// Reads the live last-write time of every file.
    ///
    /// A file whose time cannot be read is recorded as `0`, which can never
    /// match a live timestamp again.
    pub fn snapshot(&self) -> Vec<FileEntry> {
        self.paths
            .iter()
            .map(|p| FileEntry::new(last_write_time(Path::new(p)).unwrap_or(0), p.as_str()))
            .collect()
    }
}

/// Returns a file's modification time in nanoseconds since the Unix epoch.
///
/// `None` if the file cannot be inspected or its time predates the epoch.
pub fn last_write_time(path: &Path) -> Option<u64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let nanos = modified.duration_since(UNIX_EPOCH).ok()?.as_nanos();
    u64::try_from(nanos).ok()
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Command-line arguments of the current invocation, trimmed, in original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentList(Vec<String>);

impl ArgumentList {
    /// Trims every argument and keeps their order.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(args.into_iter().map(|a| a.as_ref().trim().to_string()).collect())
    }

    /// The arguments.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// `NAME=VALUE` strings from the process environment, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentList(Vec<String>);

impl EnvironmentList {
    /// Normalizes raw `NAME=VALUE` entries: drops the excluded variable,
    /// trims the rest, and sorts them.
    ///
    /// Entries that still contain a line break after trimming (exported shell
    /// functions, for example) are dropped, since a manifest record cannot
    /// hold them.
    pub fn from_vars<I, S>(vars: I, excluded: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefix = format!("{excluded}=");
        let mut entries: Vec<String> = vars
            .into_iter()
            .filter(|v| !v.as_ref().starts_with(&prefix))
            .map(|v| v.as_ref().trim().to_string())
            .filter(|v| {
                let single_line = !v.contains(['\n', '\r']);
                if !single_line {
                    let name = v.split_once('=').map_or(v.as_str(), |(name, _)| name);
                    debug!(name, "skipping multi-line environment variable");
                }
                single_line
            })
            .collect();
        entries.sort();
        Self(entries)
    }

    /// Captures the current process environment.
    pub fn capture(excluded: &str) -> Self {
        Self::from_vars(platform::current_environment(), excluded)
    }

    /// The sorted entries.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};

    #[test]
    fn collect_sorts_and_includes_existing_loaded_files() {
        let set = InputFileSet::collect(
            ["/p/main.odin", "/p/a.odin"],
            [
                LoadedFile::new("/p/data.txt", true),
                LoadedFile::new("/p/missing.txt", false),
            ],
        );
        assert_eq!(set.paths(), ["/p/a.odin", "/p/data.txt", "/p/main.odin"]);
    }

    #[test]
    fn collect_keeps_duplicates() {
        let set = InputFileSet::collect(["/p/a.odin"], [LoadedFile::new("/p/a.odin", true)]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn fingerprint_independent_of_discovery_order() {
        let a = InputFileSet::from_paths(["/p/b.odin", "/p/a.odin", "/p/c.odin"]);
        let b = InputFileSet::from_paths(["/p/c.odin", "/p/a.odin", "/p/b.odin"]);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_file_set() {
        let a = InputFileSet::from_paths(["/p/a.odin"]);
        let b = InputFileSet::from_paths(["/p/a.odin", "/p/b.odin"]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_folds_sorted_paths() {
        let set = InputFileSet::from_paths(["/p/b.odin", "/p/a.odin"]);
        assert_eq!(set.fingerprint(), Fingerprint::of(["/p/a.odin", "/p/b.odin"]));
    }

    #[test]
    fn last_write_time_reads_pinned_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.odin");
        let file = File::create(&path).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(100)).unwrap();
        assert_eq!(last_write_time(&path), Some(100_000_000_000));
    }

    #[test]
    fn last_write_time_missing_file() {
        assert_eq!(last_write_time(Path::new("/nonexistent/a.odin")), None);
    }

    #[test]
    fn snapshot_records_zero_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.odin");
        fs::write(&present, "package a").unwrap();
        File::options()
            .write(true)
            .open(&present)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(7))
            .unwrap();
        let missing = dir.path().join("b.odin");

        let set = InputFileSet::from_paths([&present, &missing]);
        let entries = set.snapshot();
        assert_eq!(entries[0].timestamp, 7_000_000_000);
        assert_eq!(entries[1].timestamp, 0);
        assert_eq!(entries[1].path, missing.to_string_lossy());
    }

    #[test]
    fn arguments_trimmed_in_order() {
        let args = ArgumentList::new([" build ", ".", "-debug\t"]);
        assert_eq!(args.as_slice(), ["build", ".", "-debug"]);
    }

    #[test]
    fn environment_sorted_and_excludes_volatile_variable() {
        let env = EnvironmentList::from_vars(
            ["PATH=/bin", "CURR_DATE_TIME=2024-01-01", "FOO=1 "],
            "CURR_DATE_TIME",
        );
        assert_eq!(env.as_slice(), ["FOO=1", "PATH=/bin"]);
    }

    #[test]
    fn environment_exclusion_matches_whole_name() {
        let env = EnvironmentList::from_vars(
            ["CURR_DATE_TIME_X=1", "CURR_DATE_TIME="],
            "CURR_DATE_TIME",
        );
        assert_eq!(env.as_slice(), ["CURR_DATE_TIME_X=1"]);
    }

    #[test]
    fn environment_drops_multi_line_values() {
        let env = EnvironmentList::from_vars(
            ["BASH_FUNC_f%%=() {  echo hi\n}", "A=1", "B=x\r\ny", "C=2\n"],
            "CURR_DATE_TIME",
        );
        assert_eq!(env.as_slice(), ["A=1", "C=2"]);
    }

    #[test]
    fn environment_order_independent() {
        let a = EnvironmentList::from_vars(["B=2", "A=1"], "CURR_DATE_TIME");
        let b = EnvironmentList::from_vars(["A=1", "B=2"], "CURR_DATE_TIME");
        assert_eq!(a, b);
    }
}
