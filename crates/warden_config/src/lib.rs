//! Parsing and validation of `warden.toml` configuration files.
//!
//! The file is optional. When present it can disable the cache, rename the
//! excluded environment variable, name the target for cached binaries, and
//! choose which file extensions source discovery collects.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use types::*;
