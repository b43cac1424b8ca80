use crate::codec::{EncodingMask, Position};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const APP_NAME: &str = "tokpack";
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding [`CodecConfig::default_mask`]
pub const MASK_ENV: &str = "TOKPACK_MASK";

/// Codec configuration stored in the app config directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Fields the encoder may emit, e.g. "all" or "offset|parent"
    #[serde(default = "default_mask")]
    pub default_mask: String,

    /// Colored terminal output
    #[serde(default = "default_color")]
    pub color: bool,

    /// Start position used when none is given on the command line
    #[serde(default)]
    pub start_position: Position,
}

fn default_mask() -> String {
    EncodingMask::ALL.to_string()
}

fn default_color() -> bool {
    true
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            default_mask: default_mask(),
            color: default_color(),
            start_position: 0,
        }
    }
}

impl CodecConfig {
    /// Load config from the app config directory, or return default if not found
    pub fn load() -> Result<Self> {
        let Ok(config_path) = get_config_path() else {
            log::warn!("no config directory available, using default configuration");
            return Ok(Self::default());
        };

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
            let config: CodecConfig = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            log::debug!("loaded config from {}", config_path.display());
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the app config directory
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = get_config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .context("Failed to write config file")?;
        Ok(config_path)
    }

    /// The encoding mask in effect: `TOKPACK_MASK` if set, else `default_mask`
    pub fn effective_mask(&self) -> Result<EncodingMask> {
        match std::env::var(MASK_ENV) {
            Ok(value) => value
                .parse::<EncodingMask>()
                .with_context(|| format!("Invalid {} value '{}'", MASK_ENV, value)),
            Err(_) => self
                .default_mask
                .parse::<EncodingMask>()
                .with_context(|| format!("Invalid default_mask '{}' in config", self.default_mask)),
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join(APP_NAME).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_config_default() {
        let config = CodecConfig::default();
        assert_eq!(config.default_mask, "payload|offset|real_offset|parent");
        assert!(config.color);
        assert_eq!(config.start_position, 0);
    }

    #[test]
    fn test_codec_config_serialization() {
        let config = CodecConfig {
            default_mask: "offset|parent".to_string(),
            color: false,
            start_position: 12,
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: CodecConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.default_mask, "offset|parent");
        assert!(!parsed.color);
        assert_eq!(parsed.start_position, 12);
    }

    #[test]
    fn test_codec_config_partial_json() {
        // Should use defaults for missing fields
        let json = r#"{"default_mask": "none"}"#;
        let config: CodecConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.default_mask, "none");
        assert!(config.color);
        assert_eq!(config.start_position, 0);
    }

    #[test]
    fn test_codec_config_empty_json() {
        let config: CodecConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.default_mask, CodecConfig::default().default_mask);
    }

    #[test]
    fn test_config_path_layout() {
        if let Ok(path) = get_config_path() {
            assert!(path.ends_with("tokpack/config.json"));
        }
    }
}
