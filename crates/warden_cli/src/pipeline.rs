//! Shared helpers for the `check` and `store` commands.
//!
//! Config loading, source file discovery, and turning CLI input flags into
//! the cache inputs and validator both commands need.

use std::path::{Path, PathBuf};

use warden_cache::{ArgumentList, CacheInputs, EnvironmentList, InputFileSet, LoadedFile, Validator};
use warden_config::WardenConfig;

use crate::{GlobalArgs, InputArgs};

/// Loads the configuration selected by the global CLI args.
///
/// If `--config` is specified, uses that path (file → loaded directly,
/// dir → `warden.toml` inside it). Otherwise looks in the current directory.
pub fn load_config(global: &GlobalArgs) -> Result<WardenConfig, Box<dyn std::error::Error>> {
    let config = match global.config {
        Some(ref config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_dir() {
                warden_config::load_config(&p)?
            } else {
                warden_config::load_config_file(&p)?
            }
        }
        None => warden_config::load_config(&std::env::current_dir()?)?,
    };
    Ok(config)
}

/// Discovers source files with one of the given extensions under `dir` (recursive).
///
/// Returns the files sorted by path.
pub fn discover_source_files(
    dir: &Path,
    extensions: &[String],
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    walk_dir(dir, extensions, &mut files)?;
    files.sort();
    Ok(files)
}

/// Recursively walks a directory collecting source files.
fn walk_dir(
    dir: &Path,
    extensions: &[String],
    files: &mut Vec<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk_dir(&path, extensions, files)?;
        } else if has_extension(&path, extensions) {
            files.push(path);
        }
    }
    Ok(())
}

/// Returns `true` if the file's extension is one of `extensions`.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

/// Collects the cache inputs described by the CLI flags.
///
/// Every file path is made absolute so manifests do not depend on the
/// working directory.
pub fn collect_inputs(
    args: &InputArgs,
    config: &WardenConfig,
) -> Result<CacheInputs, Box<dyn std::error::Error>> {
    let mut primary = Vec::new();
    for dir in &args.src {
        for file in discover_source_files(dir, &config.sources.extensions)? {
            primary.push(std::path::absolute(file)?);
        }
    }
    for file in &args.file {
        primary.push(std::path::absolute(file)?);
    }

    let mut loaded = Vec::with_capacity(args.loaded.len());
    for file in &args.loaded {
        let path = std::path::absolute(file)?;
        let exists = path.is_file();
        loaded.push(LoadedFile::new(path, exists));
    }

    tracing::debug!(
        primary = primary.len(),
        loaded = loaded.len(),
        "collected input files"
    );

    Ok(CacheInputs::new(
        InputFileSet::collect(primary, loaded),
        ArgumentList::new(&args.args),
        EnvironmentList::capture(&config.cache.excluded_env),
    ))
}

/// Builds the validator for the output named on the command line.
///
/// `--target`/`--subtarget` take precedence over the `[target]` section.
pub fn build_validator(args: &InputArgs, config: &WardenConfig) -> Validator {
    let target = args.target.clone().or_else(|| config.target.name.clone());
    let subtarget = args
        .subtarget
        .clone()
        .or_else(|| config.target.subtarget.clone());
    Validator::new(&args.output)
        .with_target(target, subtarget)
        .with_enabled(config.cache.enabled)
}
