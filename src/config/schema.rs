//! Configuration schema for Glacier
//!
//! Configuration is stored at `~/.config/glacier/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache settings
    pub cache: CacheConfig,

    /// Script evaluation limits
    pub eval: EvalConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache and freeze manifests unless --no-cache is passed (default: true)
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Limits applied to each script evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Heap limit per evaluation in bytes
    pub memory_limit_bytes: usize,

    /// Stack limit per evaluation in bytes
    pub max_stack_size_bytes: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            memory_limit_bytes: 16 * 1024 * 1024,
            max_stack_size_bytes: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("[eval]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.general.log_format, "text");
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [eval]
            memory_limit_bytes = 1048576
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.eval.memory_limit_bytes, 1_048_576);
        assert_eq!(config.eval.max_stack_size_bytes, 1024 * 1024); // default preserved
    }
}
