//! Configuration file support for Gymdesk.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/gymdesk/config.toml`.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub view: ViewConfig,

    #[serde(default)]
    pub data: DataConfig,
}

/// Remote document store endpoint configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Schedule view configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Local data storage configuration (login state lives here)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:3000".into()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_page_size() -> usize {
    6
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("gymdesk")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("gymdesk").join("config.toml")
    }

    /// Path of the login state file under the data directory
    pub fn login_state_path(&self) -> PathBuf {
        self.data.data_dir.join("login.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store.base_url, "http://localhost:3000");
        assert_eq!(config.store.timeout_secs, 15);
        assert_eq!(config.view.page_size, 6);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[store]
base_url = "https://gym.example.com/api"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.base_url, "https://gym.example.com/api");
        assert_eq!(config.store.timeout_secs, 15); // default
        assert_eq!(config.view.page_size, 6); // default
    }

    #[test]
    fn test_login_state_path_under_data_dir() {
        let mut config = Config::default();
        config.data.data_dir = PathBuf::from("/tmp/gymdesk-test");
        assert_eq!(
            config.login_state_path(),
            PathBuf::from("/tmp/gymdesk-test/login.json")
        );
    }
}
