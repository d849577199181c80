use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://localhost:4000/api";

/// Client configuration: where the ExpenseFlow API lives and the bearer
/// token identifying the user. Stored as JSON in the platform config dir;
/// environment variables override the file. Obtaining a token is the web
/// client's job, not ours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Config {
    #[serde(default = "default_base_url")]
    pub(crate) base_url: String,
    #[serde(default)]
    pub(crate) token: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: default_base_url(),
            token: String::new(),
        }
    }
}

impl Config {
    pub(crate) fn load() -> Result<Config> {
        let path = config_path()?;
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid config file: {}", path.display()))?
        } else {
            // Write a template so the user has something to fill in.
            let config = Config::default();
            config.save(&path)?;
            config
        };

        if let Ok(url) = std::env::var("EXPENSEFLOW_API_URL") {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        if let Ok(token) = std::env::var("EXPENSEFLOW_TOKEN") {
            if !token.is_empty() {
                config.token = token;
            }
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        if config.token.trim().is_empty() {
            anyhow::bail!(
                "No API token configured. Set EXPENSEFLOW_TOKEN or add it to {}",
                path.display()
            );
        }
        Ok(config)
    }

    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }
        let raw = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

fn config_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "expenseflow", "ExpenseFlow")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(proj_dirs.config_dir().join("config.json"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            base_url: "https://api.example.com".into(),
            token: "tok_123".into(),
        };
        config.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let loaded: Config = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded.base_url, "https://api.example.com");
        assert_eq!(loaded.token, "tok_123");
    }

    #[test]
    fn test_config_defaults_for_missing_fields() {
        let loaded: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(loaded.base_url, DEFAULT_BASE_URL);
        assert!(loaded.token.is_empty());
    }
}
