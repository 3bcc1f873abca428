//! `warden store`: copy a freshly built binary into the cache.

use tracing::debug;

use crate::pipeline::{build_validator, collect_inputs, load_config};
use crate::{GlobalArgs, StoreArgs};

/// Runs the `warden store` command.
///
/// The cache directory must already exist, which `warden check` ensures on
/// a miss. Does nothing when the cache is disabled.
pub fn run(args: &StoreArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config(global)?;
    if !config.cache.enabled {
        debug!("cache disabled, nothing stored");
        return Ok(0);
    }

    let inputs = collect_inputs(&args.inputs, &config)?;
    let validator = build_validator(&args.inputs, &config);
    let cache_dir = validator.entry_dir(&inputs.files);
    if !cache_dir.is_dir() {
        return Err(format!(
            "no cache directory {} (run `warden check` first)",
            cache_dir.display()
        )
        .into());
    }

    let bytes = validator.store(&inputs.files)?;
    if !global.quiet {
        eprintln!(
            "   Stored {} ({bytes} bytes) in {}",
            args.inputs.output.display(),
            cache_dir.display()
        );
    }
    Ok(0)
}
