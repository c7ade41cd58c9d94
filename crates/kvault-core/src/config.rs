//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/kvault/config.toml)
//! 3. Environment variables (KVAULT_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "KVAULT";

/// File name of the primary record store inside `data_dir`
pub const RECORDS_FILE: &str = "knowledge_data.csv";

/// File name of the id high-water mark inside `data_dir`
pub const STATE_FILE: &str = "knowledge_state.toml";

/// Largest number of items a single fetcher may request
pub const MAX_FETCH_LIMIT: u32 = 20;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the record file and its backups
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// YouTube Data API key; YouTube fetching is skipped without one
    #[serde(default)]
    pub youtube_api_key: Option<String>,

    /// Items requested from each content source per fetch
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,

    /// Timeout for a single fetch request, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            youtube_api_key: None,
            fetch_limit: default_fetch_limit(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (KVAULT_DATA_DIR, KVAULT_YOUTUBE_API_KEY, KVAULT_FETCH_LIMIT)
    /// 2. Config file (~/.config/kvault/config.toml or KVAULT_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring an explicit path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
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
        // KVAULT_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // KVAULT_YOUTUBE_API_KEY
        if let Ok(val) = std::env::var(format!("{}_YOUTUBE_API_KEY", ENV_PREFIX)) {
            self.youtube_api_key = if val.is_empty() { None } else { Some(val) };
        }

        // KVAULT_FETCH_LIMIT
        if let Ok(val) = std::env::var(format!("{}_FETCH_LIMIT", ENV_PREFIX)) {
            if let Ok(limit) = val.trim().parse() {
                self.fetch_limit = limit;
            }
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

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with KVAULT_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kvault")
            .join("config.toml")
    }

    /// Get the path to the primary record file
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join(RECORDS_FILE)
    }

    /// Get the path to the file remembering the highest id handed out
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    /// Get the directory backups are written to
    pub fn backup_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Per-source fetch limit, clamped to 1..=20
    pub fn effective_fetch_limit(&self) -> u32 {
        self.fetch_limit.clamp(1, MAX_FETCH_LIMIT)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kvault")
}

fn default_fetch_limit() -> u32 {
    6
}

fn default_fetch_timeout_secs() -> u64 {
    10
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
            // Clear all the vars
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
        "KVAULT_DATA_DIR",
        "KVAULT_YOUTUBE_API_KEY",
        "KVAULT_FETCH_LIMIT",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.youtube_api_key.is_none());
        assert_eq!(config.fetch_limit, 6);
        assert_eq!(config.fetch_timeout_secs, 10);
        assert!(config.data_dir.ends_with("kvault"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config {
            data_dir: PathBuf::from("/data/kvault"),
            ..Config::default()
        };

        assert_eq!(
            config.records_path(),
            PathBuf::from("/data/kvault/knowledge_data.csv")
        );
        assert_eq!(
            config.state_path(),
            PathBuf::from("/data/kvault/knowledge_state.toml")
        );
        assert_eq!(config.backup_dir(), Path::new("/data/kvault"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("KVAULT_DATA_DIR", "/tmp/kvault-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/kvault-test"));
    }

    #[test]
    fn test_env_override_youtube_key() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        assert!(config.youtube_api_key.is_none());

        env::set_var("KVAULT_YOUTUBE_API_KEY", "abc123");
        config.apply_env_overrides();
        assert_eq!(config.youtube_api_key, Some("abc123".to_string()));

        // Empty string clears it
        env::set_var("KVAULT_YOUTUBE_API_KEY", "");
        config.apply_env_overrides();
        assert!(config.youtube_api_key.is_none());
    }

    #[test]
    fn test_env_override_fetch_limit() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("KVAULT_FETCH_LIMIT", "12");
        config.apply_env_overrides();
        assert_eq!(config.fetch_limit, 12);

        // Unparseable values are ignored
        env::set_var("KVAULT_FETCH_LIMIT", "lots");
        config.apply_env_overrides();
        assert_eq!(config.fetch_limit, 12);
    }

    #[test]
    fn test_effective_fetch_limit_is_clamped() {
        let mut config = Config::default();
        config.fetch_limit = 0;
        assert_eq!(config.effective_fetch_limit(), 1);
        config.fetch_limit = 500;
        assert_eq!(config.effective_fetch_limit(), 20);
        config.fetch_limit = 8;
        assert_eq!(config.effective_fetch_limit(), 8);
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/kvault"),
            youtube_api_key: Some("key".to_string()),
            fetch_limit: 4,
            fetch_timeout_secs: 3,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("youtube_api_key"));
        assert!(toml_str.contains("fetch_limit"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.youtube_api_key, config.youtube_api_key);
        assert_eq!(parsed.fetch_limit, config.fetch_limit);
        assert_eq!(parsed.fetch_timeout_secs, config.fetch_timeout_secs);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            fetch_limit = 9
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.fetch_limit, 9);
        assert_eq!(config.fetch_timeout_secs, 10);
        assert!(config.youtube_api_key.is_none());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("KVAULT_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert!(config.youtube_api_key.is_none());
        assert_eq!(config.fetch_limit, 6);
        assert!(config.data_dir.exists());
    }

    #[test]
    fn test_save_to_path_round_trip() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            youtube_api_key: None,
            fetch_limit: 3,
            fetch_timeout_secs: 5,
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert_eq!(loaded.fetch_limit, 3);
        assert_eq!(loaded.fetch_timeout_secs, 5);
    }
}
