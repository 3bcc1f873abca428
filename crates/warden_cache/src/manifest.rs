//! Line-oriented manifests recording the inputs of a cached build.
//!
//! A cache directory holds three manifests: `files.manifest` (one
//! `"<timestamp> <path>"` record per input file), `args.manifest` (one
//! argument per line) and `env.manifest` (one `NAME=VALUE` per line). All
//! three are UTF-8, LF-terminated, and unescaped; records never contain a
//! newline.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::Path;

use serde::Serialize;

/// File name of the input file manifest.
pub const FILES_MANIFEST: &str = "files.manifest";

/// File name of the argument manifest.
pub const ARGS_MANIFEST: &str = "args.manifest";

/// File name of the environment manifest.
pub const ENV_MANIFEST: &str = "env.manifest";

/// The three manifests kept per cache directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    /// Input files with their last-write times.
    Files,
    /// Command-line arguments.
    Args,
    /// Process environment.
    Env,
}

impl ManifestKind {
    /// All kinds, in the order validation checks them.
    pub const ALL: [ManifestKind; 3] = [Self::Files, Self::Args, Self::Env];

    /// Returns the manifest's file name inside a cache directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Files => FILES_MANIFEST,
            Self::Args => ARGS_MANIFEST,
            Self::Env => ENV_MANIFEST,
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Files => "files",
            Self::Args => "args",
            Self::Env => "env",
        })
    }
}

/// Why a manifest could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The manifest file does not exist.
    #[error("manifest not found")]
    NotFound,
    /// The manifest file exists but has no content.
    #[error("manifest is empty")]
    Empty,
    /// Any other I/O failure.
    #[error("failed to read manifest: {0}")]
    Read(io::Error),
}

/// A file manifest record that could not be parsed.
///
/// Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The record has no space between timestamp and path.
    #[error("line {line}: missing separator between timestamp and path")]
    MissingSeparator {
        /// Offending line.
        line: usize,
    },
    /// The timestamp is not a decimal `u64`.
    #[error("line {line}: invalid timestamp '{value}'")]
    BadTimestamp {
        /// Offending line.
        line: usize,
        /// The text that failed to parse.
        value: String,
    },
}

/// One record of `files.manifest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Last-write time of the file when the cache entry was written.
    pub timestamp: u64,
    /// Absolute path of the file.
    pub path: String,
}

impl FileEntry {
    /// Creates a new entry.
    pub fn new(timestamp: u64, path: impl Into<String>) -> Self {
        Self {
            timestamp,
            path: path.into(),
        }
    }

    fn to_record(&self) -> String {
        format!("{} {}", self.timestamp, self.path)
    }
}

/// Reads a manifest and returns its records, trimmed, in file order.
pub fn read_records(path: &Path) -> Result<Vec<String>, ReadError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ReadError::NotFound,
        _ => ReadError::Read(e),
    })?;
    if bytes.is_empty() {
        return Err(ReadError::Empty);
    }
    let text = String::from_utf8_lossy(&bytes);
    Ok(split_records(&text))
}

/// Splits manifest text into trimmed records.
///
/// The final line terminator is optional. Blank lines in the middle are kept
/// as empty records so that record positions stay meaningful.
pub fn split_records(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n').map(|line| line.trim().to_string()).collect()
}

/// Parses `files.manifest` records.
///
/// Each record is split at its first space into a decimal timestamp and a
/// path; both halves are trimmed.
pub fn parse_file_records(records: &[String]) -> Result<Vec<FileEntry>, ParseError> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let line = i + 1;
            let (timestamp, path) = record
                .split_once(' ')
                .ok_or(ParseError::MissingSeparator { line })?;
            let timestamp = timestamp.trim();
            let timestamp = timestamp
                .parse::<u64>()
                .map_err(|_| ParseError::BadTimestamp {
                    line,
                    value: timestamp.to_string(),
                })?;
            Ok(FileEntry::new(timestamp, path.trim()))
        })
        .collect()
}

/// Replaces a manifest with the given records, one trimmed record per line.
///
/// Any existing file is removed first so a shorter manifest never keeps
/// trailing records from a previous one.
pub fn write_records<I, S>(path: &Path, records: I) -> io::Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    let mut out = BufWriter::new(File::create(path)?);
    for record in records {
        writeln!(out, "{}", record.as_ref().trim())?;
    }
    out.flush()
}

/// Replaces `files.manifest` with the given entries.
pub fn write_file_manifest(path: &Path, entries: &[FileEntry]) -> io::Result<()> {
    write_records(path, entries.iter().map(FileEntry::to_record))
}

/// Reads and parses `files.manifest`.
///
/// An empty manifest yields no entries.
pub fn read_file_manifest(path: &Path) -> Result<Result<Vec<FileEntry>, ParseError>, ReadError> {
    let records = match read_records(path) {
        Ok(records) => records,
        Err(ReadError::Empty) => Vec::new(),
        Err(e) => return Err(e),
    };
    Ok(parse_file_records(&records))
}
