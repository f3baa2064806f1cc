use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VimtodoConfig {
    /// Base URL of the vimtodo-api server, e.g. "http://localhost:8080"
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Filter for the log file, in `RUST_LOG` syntax. `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log file location. Defaults to `vimtodo.log` next to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for VimtodoConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Cannot determine config directory")?
        .join("vimtodo"))
}

impl VimtodoConfig {
    pub fn config_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.toml"))
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("vimtodo.log")),
        }
    }

    /// Load config from disk. Returns default config if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Path to the config file, writing the defaults there first if it is missing.
    pub fn ensure_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: VimtodoConfig = toml::from_str(r#"api_url = "https://todo.example.com""#).unwrap();
        assert_eq!(config.api_url, "https://todo.example.com");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn saved_config_loads_back() {
        let path = std::env::temp_dir()
            .join(format!("vimtodo-config-{}", std::process::id()))
            .join("config.toml");
        let config = VimtodoConfig {
            api_url: "http://127.0.0.1:9000".to_string(),
            log_level: "debug,reqwest=warn".to_string(),
            log_file: None,
        };

        config.save_to(&path).unwrap();
        assert_eq!(VimtodoConfig::load_from(&path).unwrap(), config);

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
        assert_eq!(
            VimtodoConfig::load_from(&path).unwrap(),
            VimtodoConfig::default()
        );
    }
}
