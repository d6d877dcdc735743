use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Backend origin baked in at compile time, if any
pub const BUILD_TIME_API_URL: Option<&str> = option_env!("PORTFOLIO_API_URL");

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api_url: Option<String>,
    pub plain_text: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Backend origin for this run; `cli_override` is the --api-url flag or its env var
    pub fn base_url(&self, cli_override: Option<&str>) -> String {
        let runtime = cli_override.or(self.api_url.as_deref());
        resolve_base_url(BUILD_TIME_API_URL, runtime)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("portfolio-cli").join("config.json"))
    }
}

/// Build-time setting first, then a runtime override, then the default origin.
pub fn resolve_base_url(build_time: Option<&str>, runtime: Option<&str>) -> String {
    [build_time, runtime]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_API_URL)
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_priority() {
        assert_eq!(
            resolve_base_url(Some("https://built.example"), Some("https://runtime.example")),
            "https://built.example"
        );
        assert_eq!(
            resolve_base_url(None, Some("https://runtime.example/")),
            "https://runtime.example"
        );
        assert_eq!(resolve_base_url(None, None), DEFAULT_API_URL);
        assert_eq!(resolve_base_url(Some("  "), None), DEFAULT_API_URL);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            api_url: Some("https://api.example".to_string()),
            plain_text: Some(true),
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_url": "https://partial.example"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url.as_deref(), Some("https://partial.example"));
        assert_eq!(config.plain_text, None);
    }
}
