use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MaskError, Result};
use crate::rules::MaskingRules;

/// User-configurable settings for the masking middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskingConfig {
    /// Largest response body buffered for masking (default: 1 MiB).
    /// Larger or unbounded bodies are streamed through untouched.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Rule set handed to the masker verbatim
    #[serde(default)]
    pub rules: MaskingRules,
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            rules: MaskingRules::default(),
        }
    }
}

impl MaskingConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MaskingConfig = toml::from_str(content)?;
        if config.max_body_bytes == 0 {
            return Err(MaskError::Config(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MaskError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` if it exists, otherwise return the default config.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
