//! Configuration types deserialized from `warden.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// Name of the environment variable excluded from cache validation by default.
pub const DEFAULT_EXCLUDED_ENV: &str = "CURR_DATE_TIME";

/// The top-level configuration parsed from `warden.toml`.
///
/// Every section is optional; a missing file behaves like an empty one.
#[derive(Debug, Default, Deserialize)]
pub struct WardenConfig {
    /// Cache validation settings.
    #[serde(default)]
    pub cache: CacheSettings,
    /// Target naming used for the cached binary file name.
    #[serde(default)]
    pub target: TargetSettings,
    /// Source discovery settings for `--src` directories.
    #[serde(default)]
    pub sources: SourceSettings,
}

/// Settings for the `[cache]` section.
#[derive(Debug, Deserialize)]
pub struct CacheSettings {
    /// When `false`, every check reports a miss without touching the cache.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// The one environment variable whose value never affects cache validity.
    #[serde(default = "default_excluded_env")]
    pub excluded_env: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            excluded_env: default_excluded_env(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_excluded_env() -> String {
    DEFAULT_EXCLUDED_ENV.to_string()
}

/// Settings for the `[target]` section.
#[derive(Debug, Default, Deserialize)]
pub struct TargetSettings {
    /// Target metrics name (e.g. `"linux_amd64"`).
    pub name: Option<String>,
    /// Subtarget name (e.g. `"android"`).
    pub subtarget: Option<String>,
}

/// Settings for the `[sources]` section.
#[derive(Debug, Deserialize)]
pub struct SourceSettings {
    /// File extensions (without the leading dot) collected from `--src` directories.
    ///
    /// Accepts either a single string or a list of strings.
    #[serde(
        default = "default_extensions",
        deserialize_with = "deserialize_string_or_vec"
    )]
    pub extensions: Vec<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["odin".to_string()]
}

/// Deserializes a field that can be either a single string or a list of strings.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
