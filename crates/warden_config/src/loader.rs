//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::WardenConfig;
use std::path::Path;

/// File name looked up in the project directory.
pub const CONFIG_FILE: &str = "warden.toml";

/// Loads and validates `warden.toml` from a project directory.
///
/// A missing file is not an error: the defaults are returned instead.
pub fn load_config(project_dir: &Path) -> Result<WardenConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    if !config_path.is_file() {
        return Ok(WardenConfig::default());
    }
    load_config_file(&config_path)
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<WardenConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `warden.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<WardenConfig, ConfigError> {
    let config: WardenConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates values that the type system alone cannot check.
fn validate_config(config: &WardenConfig) -> Result<(), ConfigError> {
    let excluded = &config.cache.excluded_env;
    if excluded.is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.excluded_env must not be empty".to_string(),
        ));
    }
    if excluded.contains('=') {
        return Err(ConfigError::ValidationError(format!(
            "cache.excluded_env '{excluded}' must be a variable name, not NAME=VALUE"
        )));
    }
    for ext in &config.sources.extensions {
        if ext.is_empty() || ext.starts_with('.') {
            return Err(ConfigError::ValidationError(format!(
                "sources.extensions entry '{ext}' must be non-empty and written without a leading dot"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.excluded_env, "CURR_DATE_TIME");
        assert!(config.target.name.is_none());
        assert!(config.target.subtarget.is_none());
        assert_eq!(config.sources.extensions, vec!["odin"]);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[cache]
enabled = false
excluded_env = "BUILD_STAMP"

[target]
name = "linux_amd64"
subtarget = "android"

[sources]
extensions = ["odin", "glsl"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.excluded_env, "BUILD_STAMP");
        assert_eq!(config.target.name.as_deref(), Some("linux_amd64"));
        assert_eq!(config.target.subtarget.as_deref(), Some("android"));
        assert_eq!(config.sources.extensions, vec!["odin", "glsl"]);
    }

    #[test]
    fn empty_excluded_env_rejected() {
        let err = load_config_from_str("[cache]\nexcluded_env = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn excluded_env_with_value_rejected() {
        let err = load_config_from_str("[cache]\nexcluded_env = \"A=1\"\n").unwrap_err();
        assert!(err.to_string().contains("NAME=VALUE"));
    }

    #[test]
    fn dotted_extension_rejected() {
        let err = load_config_from_str("[sources]\nextensions = [\".odin\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = load_config_from_str("[cache\nenabled = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = load_config_from_str("[cache]\nenabled = \"yes\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.cache.enabled);
    }

    #[test]
    fn load_from_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[target]\nname = \"windows_amd64\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.target.name.as_deref(), Some("windows_amd64"));
    }

    #[test]
    fn io_error_from_nonexistent_file() {
        let err = load_config_file(Path::new("/nonexistent/dir/warden.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
