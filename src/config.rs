/// Resolver configuration.
///
/// Configuration lives in a small TOML file:
///
/// ```toml
/// [php]
/// version = "8.0"
///
/// [cache]
/// capacity = 8
///
/// [resolver]
/// report_drift = true
/// ```
///
/// Every section and key is optional.  Unknown keys are rejected so typos
/// surface instead of being silently ignored.
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::version::PhpVersion;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub php: PhpConfig,
    pub cache: CacheConfig,
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhpConfig {
    /// Default target version when the caller does not pass one.
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of resolved maps to keep; unbounded when absent.
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Log drift at `warn` (true) or `debug` (false).
    pub report_drift: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { report_drift: true }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        // Reject a bad version at load time rather than at first resolve.
        config.target_version()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// The configured default target version, if any.
    pub fn target_version(&self) -> Result<Option<PhpVersion>, ConfigError> {
        match &self.php.version {
            Some(raw) => Ok(Some(PhpVersion::parse(raw)?)),
            None => Ok(None),
        }
    }
}
