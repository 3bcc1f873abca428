//! Errors raised while loading `warden.toml`.

/// Why a `warden.toml` could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but reading it failed.
    #[error("cannot read warden.toml: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid TOML or does not match the expected schema.
    #[error("invalid warden.toml: {0}")]
    ParseError(String),

    /// The file parsed, but a setting has an unusable value.
    #[error("invalid setting in warden.toml: {0}")]
    ValidationError(String),
}
