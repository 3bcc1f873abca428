//! `warden check`: validate the cache for one build.
//!
//! 1. Load config
//! 2. Collect input files, arguments and environment
//! 3. Run the validator (restores the cached binary on a hit)
//! 4. Report the decision

use warden_cache::{CacheOutcome, Decision};

use crate::pipeline::{build_validator, collect_inputs, load_config};
use crate::{CheckArgs, GlobalArgs, ReportFormat};

/// Exit status when the cached binary was restored.
pub const EXIT_HIT: i32 = 0;

/// Exit status when the caller has to build.
pub const EXIT_BUILD_NEEDED: i32 = 3;

/// Runs the `warden check` command.
///
/// Returns 0 on a hit and 3 when a build is needed. A manifest that exists
/// but cannot be read is an error (exit status 1).
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config(global)?;
    let inputs = collect_inputs(&args.inputs, &config)?;
    let validator = build_validator(&args.inputs, &config);

    let outcome = validator.validate(&inputs)?;

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                println!("{}", describe(&outcome));
            }
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(exit_code(&outcome))
}

/// One-line summary of a decision.
pub fn describe(outcome: &CacheOutcome) -> String {
    match &outcome.decision {
        Decision::Hit => "hit".to_string(),
        Decision::Miss(reason) => format!("miss: {reason}"),
        Decision::RestoreFailed => "restore-failed".to_string(),
    }
}

fn exit_code(outcome: &CacheOutcome) -> i32 {
    if outcome.should_build() {
        EXIT_BUILD_NEEDED
    } else {
        EXIT_HIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use warden_cache::{Fingerprint, ManifestPaths, MissReason};

    fn outcome(decision: Decision) -> CacheOutcome {
        let cache_dir = PathBuf::from("/out/.odin-cache/0000000000000001");
        CacheOutcome {
            decision,
            fingerprint: Fingerprint::from_raw(1),
            manifests: ManifestPaths::in_dir(&cache_dir),
            cache_dir,
            manifests_written: true,
        }
    }

    #[test]
    fn describe_decisions() {
        assert_eq!(describe(&outcome(Decision::Hit)), "hit");
        assert_eq!(
            describe(&outcome(Decision::Miss(MissReason::DirectoryCreated))),
            "miss: no cache entry for this file set"
        );
        assert_eq!(describe(&outcome(Decision::RestoreFailed)), "restore-failed");
    }

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(&outcome(Decision::Hit)), EXIT_HIT);
        assert_eq!(
            exit_code(&outcome(Decision::Miss(MissReason::CacheDisabled))),
            EXIT_BUILD_NEEDED
        );
        assert_eq!(exit_code(&outcome(Decision::RestoreFailed)), EXIT_BUILD_NEEDED);
    }
}
