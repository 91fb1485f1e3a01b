use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use roster_core::remote::{RemoteConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use roster_core::sync::{SyncOptions, DEFAULT_PAGE_SIZE};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Base URL of the student API
    pub api_url: ConfigValue<String>,
    /// Per-request time budget in seconds
    pub timeout_secs: ConfigValue<u64>,
    /// Records per page
    pub page_size: ConfigValue<u32>,
    /// Path to the SQLite cache
    pub cache_path: ConfigValue<PathBuf>,
    /// Minimum visible loading time in milliseconds
    pub min_loading_ms: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    api_url: Option<String>,
    timeout_secs: Option<u64>,
    page_size: Option<u32>,
    cache_path: Option<PathBuf>,
    min_loading_ms: Option<u64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut api_url = ConfigValue::new(DEFAULT_BASE_URL.to_string(), ConfigSource::Default);
        let mut timeout_secs = ConfigValue::new(DEFAULT_TIMEOUT.as_secs(), ConfigSource::Default);
        let mut page_size = ConfigValue::new(DEFAULT_PAGE_SIZE, ConfigSource::Default);
        let mut cache_path = ConfigValue::new(
            Self::default_data_dir().join("cache.db"),
            ConfigSource::Default,
        );
        let mut min_loading_ms = ConfigValue::new(0, ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.api_url {
                api_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(secs) = file_config.timeout_secs {
                timeout_secs = ConfigValue::new(secs, ConfigSource::File);
            }
            if let Some(size) = file_config.page_size {
                page_size = ConfigValue::new(size, ConfigSource::File);
            }
            if let Some(cache) = file_config.cache_path {
                // Resolve relative paths against config file's directory
                let resolved = if cache.is_relative() {
                    path.parent().map(|p| p.join(&cache)).unwrap_or(cache)
                } else {
                    cache
                };
                cache_path = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(ms) = file_config.min_loading_ms {
                min_loading_ms = ConfigValue::new(ms, ConfigSource::File);
            }
        }

        if let Ok(url) = std::env::var("ROSTER_API_URL") {
            api_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Some(secs) = parse_env("ROSTER_TIMEOUT_SECS")? {
            timeout_secs = ConfigValue::new(secs, ConfigSource::Environment);
        }
        if let Some(size) = parse_env("ROSTER_PAGE_SIZE")? {
            page_size = ConfigValue::new(size, ConfigSource::Environment);
        }
        if let Ok(cache) = std::env::var("ROSTER_CACHE_PATH") {
            cache_path = ConfigValue::new(PathBuf::from(cache), ConfigSource::Environment);
        }
        if let Some(ms) = parse_env("ROSTER_MIN_LOADING_MS")? {
            min_loading_ms = ConfigValue::new(ms, ConfigSource::Environment);
        }

        if page_size.value == 0 {
            return Err(ConfigError::InvalidValue(
                "page_size".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            timeout_secs,
            page_size,
            cache_path,
            min_loading_ms,
            config_file,
        })
    }

    pub fn remote(&self) -> RemoteConfig {
        RemoteConfig {
            base_url: self.api_url.value.clone(),
            timeout: Duration::from_secs(self.timeout_secs.value),
        }
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            page_size: self.page_size.value,
            min_loading_delay: Duration::from_millis(self.min_loading_ms.value),
        }
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/roster/
    /// - macOS: ~/Library/Application Support/roster/
    /// - Windows: %APPDATA%/roster/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("roster")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/roster/
    /// - macOS: ~/Library/Application Support/roster/
    /// - Windows: %APPDATA%/roster/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("roster")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw)),
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {}: {}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.api_url.value, "https://localhost:8443/api/v1");
        assert_eq!(config.api_url.source, ConfigSource::Default);
        assert_eq!(config.timeout_secs.value, 30);
        assert_eq!(config.page_size.value, 20);
        assert!(config.cache_path.value.ends_with("roster/cache.db"));
        assert_eq!(config.min_loading_ms.value, 0);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "api_url: http://10.0.2.2:8080/api/v1").unwrap();
        writeln!(file, "timeout_secs: 5").unwrap();
        writeln!(file, "page_size: 50").unwrap();
        writeln!(file, "cache_path: /custom/cache.db").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.api_url.value, "http://10.0.2.2:8080/api/v1");
        assert_eq!(config.api_url.source, ConfigSource::File);
        assert_eq!(config.timeout_secs.value, 5);
        assert_eq!(config.page_size.value, 50);
        assert_eq!(config.cache_path.value, PathBuf::from("/custom/cache.db"));
        assert_eq!(config.cache_path.source, ConfigSource::File);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_cache_path_resolves_against_config_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "cache_path: data/cache.db").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(
            config.cache_path.value,
            temp_dir.path().join("data/cache.db")
        );
    }

    #[test]
    fn test_remote_and_sync_options() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "timeout_secs: 7").unwrap();
        writeln!(file, "min_loading_ms: 250").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.remote().timeout, Duration::from_secs(7));
        assert_eq!(
            config.sync_options().min_loading_delay,
            Duration::from_millis(250)
        );
        assert_eq!(config.sync_options().page_size, 20);
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "api_url: http://fromfile").unwrap();

        std::env::set_var("ROSTER_API_URL", "http://fromenv");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.api_url.value, "http://fromenv");
        assert_eq!(config.api_url.source, ConfigSource::Environment);

        std::env::remove_var("ROSTER_API_URL");
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "page_size: 0").unwrap();

        let err = Config::load(Some(config_path)).unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
