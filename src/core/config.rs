use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::core::constants::{DEFAULT_HOST, DEFAULT_MODEL};

/// On-disk configuration, read from `config.toml` under the platform config
/// directory. Every field is optional; missing values fall back to the
/// defaults in [`crate::core::constants`].
#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Base URL of the Ollama daemon (e.g., "http://localhost:11434").
    pub host: Option<String>,
    /// Model selected at startup and used as the fallback when the daemon's
    /// model list cannot be retrieved.
    pub default_model: Option<String>,
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn std::error::Error>> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let proj_dirs = ProjectDirs::from("org", "permacommons", "ollaterm")
            .ok_or("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn default_model(&self) -> &str {
        self.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.host(), DEFAULT_HOST);
        assert_eq!(config.default_model(), DEFAULT_MODEL);
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            host: Some("http://10.0.0.5:11434".to_string()),
            default_model: Some("mistral".to_string()),
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.host(), "http://10.0.0.5:11434");
        assert_eq!(loaded.default_model(), "mistral");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_model = \"qwen2.5\"\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.host(), DEFAULT_HOST);
        assert_eq!(config.default_model(), "qwen2.5");
    }
}
