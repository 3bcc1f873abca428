//! `warden clear-cache`: delete `./.odin-cache`.

use warden_cache::CACHE_DIR_NAME;

use crate::GlobalArgs;

/// Runs the `warden clear-cache` command.
///
/// Exit status 0 when the cache is gone afterwards (including when there was
/// none); a failed deletion is an error.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let removed = warden_cache::clear_cache(&cwd)?;
    if !global.quiet {
        if removed {
            eprintln!("   Removed {}", cwd.join(CACHE_DIR_NAME).display());
        } else {
            eprintln!("   No {CACHE_DIR_NAME} to remove");
        }
    }
    Ok(0)
}
