//! Configuration loading for vedrd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.vedrfolnir/config.toml` (user)
//! 3. `/etc/vedrfolnir/config.toml` (system)
//!
//! The API key is loaded separately with mandatory permission checks:
//! 1. `~/.vedrfolnir/secrets.toml` (user, must be 0600)
//! 2. `/etc/vedrfolnir/secrets.toml` (system, must be 0600)
//! 3. `OPENWEATHERMAP_API_KEY` environment variable

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Result, VedrfolnirError};

/// Environment variable consulted when no secrets file provides a key.
const API_KEY_ENV_VAR: &str = "OPENWEATHERMAP_API_KEY";

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8080).
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            limits: LimitsConfig::default(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

/// Resource limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum concurrent requests (default: 50).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
        }
    }
}

fn default_max_concurrent() -> usize {
    50
}

/// Cache tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// How long cached reports stay valid (default: 10).
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,
    /// How often expired entries are swept (default: 5).
    #[serde(default = "default_sweep_minutes")]
    pub sweep_interval_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
            sweep_interval_minutes: default_sweep_minutes(),
        }
    }
}

fn default_ttl_minutes() -> u64 {
    10
}

fn default_sweep_minutes() -> u64 {
    5
}

/// Upstream API configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamConfig {
    /// Override the OpenWeatherMap base URL (proxies, testing).
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Secrets configuration (API key).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub openweathermap: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.vedrfolnir/config.toml`
    /// 3. `/etc/vedrfolnir/config.toml`
    ///
    /// Returns defaults when no file exists anywhere (the daemon can run
    /// entirely on defaults plus the API key env var).
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::resolve_config_path(explicit_path)? else {
            return Ok(Config::default());
        };
        let content = fs::read_to_string(&path).map_err(|e| {
            VedrfolnirError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            VedrfolnirError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path. `Ok(None)` means "use defaults".
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(VedrfolnirError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".vedrfolnir").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/vedrfolnir/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (the key may come from
    /// the environment instead).
    pub fn load() -> Result<Self> {
        // Try user secrets first
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".vedrfolnir").join("secrets.toml");
            if user_secrets.exists() {
                Self::check_permissions(&user_secrets)?;
                return Self::load_from_file(&user_secrets);
            }
        }

        // Try system secrets
        let system_secrets = PathBuf::from("/etc/vedrfolnir/secrets.toml");
        if system_secrets.exists() {
            Self::check_permissions(&system_secrets)?;
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            VedrfolnirError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            VedrfolnirError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            VedrfolnirError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(VedrfolnirError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        // Permission check not available on non-Unix platforms
        Ok(())
    }

    /// Get the API key, falling back to the environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.openweathermap
            .as_ref()
            .map(|s| s.api_key.clone())
            .or_else(|| std::env::var(API_KEY_ENV_VAR).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.address, "127.0.0.1:8080");
        assert_eq!(config.server.limits.max_concurrent_requests, 50);
        assert_eq!(config.cache.ttl_minutes, 10);
        assert_eq!(config.cache.sweep_interval_minutes, 5);
        assert!(config.upstream.base_url.is_none());
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [server]
            address = "0.0.0.0:8080"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.address, "0.0.0.0:8080");
        // Defaults preserved
        assert_eq!(config.server.limits.max_concurrent_requests, 50);
        assert_eq!(config.cache.ttl_minutes, 10);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [server]
            address = "127.0.0.1:9000"

            [server.limits]
            max_concurrent_requests = 200

            [cache]
            ttl_minutes = 30
            sweep_interval_minutes = 2

            [upstream]
            base_url = "http://localhost:9999/data/2.5"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.address, "127.0.0.1:9000");
        assert_eq!(config.server.limits.max_concurrent_requests, 200);
        assert_eq!(config.cache.ttl_minutes, 30);
        assert_eq!(config.cache.sweep_interval_minutes, 2);
        assert_eq!(
            config.upstream.base_url.as_deref(),
            Some("http://localhost:9999/data/2.5")
        );
    }

    #[test]
    fn parse_secrets() {
        let toml = r#"
            [openweathermap]
            api_key = "test-key-123"
        "#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(
            secrets.openweathermap.as_ref().unwrap().api_key,
            "test-key-123"
        );
    }

    #[test]
    fn api_key_from_secrets() {
        let secrets = Secrets {
            openweathermap: Some(ApiKeySecret {
                api_key: "from-file".to_string(),
            }),
        };
        assert_eq!(secrets.api_key(), Some("from-file".to_string()));
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nttl_minutes = 42").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.cache.ttl_minutes, 42);
    }
}
