use std::path::Path;

use serde::{Deserialize, Serialize};

/// Server configuration loaded from an optional TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum size of a single upload (in bytes)
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,

    /// Include dot-files in directory listings
    #[serde(default = "default_show_hidden")]
    pub show_hidden: bool,
}

fn default_max_upload_size() -> u64 {
    100 * 1024 * 1024 // 100 MB
}

fn default_show_hidden() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_upload_size: default_max_upload_size(),
            show_hidden: default_show_hidden(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Whether a listing entry should be shown
    pub fn is_listed(&self, name: &str) -> bool {
        self.show_hidden || !name.starts_with('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.max_upload_size, 100 * 1024 * 1024);
        assert!(config.show_hidden);
    }

    #[test]
    fn test_partial_file_overrides() {
        let config: Config = toml::from_str("max_upload_size = 16\nshow_hidden = false\n").unwrap();
        assert_eq!(config.max_upload_size, 16);
        assert!(!config.is_listed(".env"));
        assert!(config.is_listed("notes.txt"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dirshare.toml");
        std::fs::write(&path, "max_upload_size = 2048\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.max_upload_size, 2048);
        assert!(config.show_hidden);
    }
}
