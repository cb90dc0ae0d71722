//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/qeta/config.toml)
//! 3. Environment variables (QETA_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "QETA";

const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_TREND_GRAVITY: f64 = 1.8;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite db)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// User reference used by the CLI when `--user` is not given
    #[serde(default)]
    pub default_user: Option<String>,

    /// Question listing page size when no limit is requested
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound for any requested page size
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Age exponent of the trend ranking; higher values favor recent questions
    #[serde(default = "default_trend_gravity")]
    pub trend_gravity: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_user: None,
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            trend_gravity: DEFAULT_TREND_GRAVITY,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (QETA_DATA_DIR, QETA_USER, QETA_PAGE_SIZE, ...)
    /// 2. Config file (~/.config/qeta/config.toml or QETA_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_USER", ENV_PREFIX)) {
            self.default_user = if val.is_empty() { None } else { Some(val) };
        }

        // Unparseable numbers keep the current value
        if let Some(val) = env_parse(&format!("{}_PAGE_SIZE", ENV_PREFIX)) {
            self.page_size = val;
        }
        if let Some(val) = env_parse(&format!("{}_MAX_PAGE_SIZE", ENV_PREFIX)) {
            self.max_page_size = val;
        }
        if let Some(val) = env_parse(&format!("{}_TREND_GRAVITY", ENV_PREFIX)) {
            self.trend_gravity = val;
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with QETA_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("qeta")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("qeta.db")
    }

    /// Resolve a requested page size against the configured defaults
    pub fn page_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.page_size)
            .min(self.max_page_size)
            .max(1)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("qeta")
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u32 {
    DEFAULT_MAX_PAGE_SIZE
}

fn default_trend_gravity() -> f64 {
    DEFAULT_TREND_GRAVITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "QETA_DATA_DIR",
        "QETA_USER",
        "QETA_PAGE_SIZE",
        "QETA_MAX_PAGE_SIZE",
        "QETA_TREND_GRAVITY",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.default_user.is_none());
        assert_eq!(config.page_size, 10);
        assert_eq!(config.max_page_size, 100);
        assert!(config.data_dir.ends_with("qeta"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config::default();
        assert!(config.sqlite_path().ends_with("qeta.db"));
    }

    #[test]
    fn test_page_limit() {
        let config = Config::default();
        assert_eq!(config.page_limit(None), 10);
        assert_eq!(config.page_limit(Some(25)), 25);
        assert_eq!(config.page_limit(Some(5000)), 100);
        assert_eq!(config.page_limit(Some(0)), 1);
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("QETA_DATA_DIR", "/tmp/qeta-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/qeta-test"));
    }

    #[test]
    fn test_env_override_user() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("QETA_USER", "user:default/alice");
        config.apply_env_overrides();
        assert_eq!(config.default_user.as_deref(), Some("user:default/alice"));

        // Empty string clears it
        env::set_var("QETA_USER", "");
        config.apply_env_overrides();
        assert!(config.default_user.is_none());
    }

    #[test]
    fn test_env_override_numbers() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("QETA_PAGE_SIZE", "25");
        env::set_var("QETA_TREND_GRAVITY", "1.2");
        config.apply_env_overrides();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.trend_gravity, 1.2);

        env::set_var("QETA_PAGE_SIZE", "lots");
        config.apply_env_overrides();
        assert_eq!(config.page_size, 25);
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/qeta"),
            default_user: Some("user:default/bob".to_string()),
            page_size: 20,
            max_page_size: 50,
            trend_gravity: 1.5,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("default_user"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            page_size = 15
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.page_size, 15);
        assert_eq!(config.max_page_size, 100);
        assert_eq!(config.trend_gravity, 1.8);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("QETA_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.default_user.is_none());
        assert!(config.data_dir.exists());
    }
}
