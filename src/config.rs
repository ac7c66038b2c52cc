use crate::constants::{
    API_URL_ENV, CONFIG_PATH_ENV, DEFAULT_API_BASE_URL, DEFAULT_CACHE_TTL_MS, DEFAULT_CONFIG_PATH, DEFAULT_TOKEN_ENV,
};
use crate::error::{ClientError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Token used when `token_env` is unset.
    pub token: Option<String>,
    /// Environment variable read on every request for a fresh token.
    pub token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            token: None,
            token_env: DEFAULT_TOKEN_ENV.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_ms: DEFAULT_CACHE_TTL_MS }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Persisted local state (report mirror, download history).
    pub state_dir: PathBuf,
    /// Bundled fallback documents.
    pub assets_dir: PathBuf,
    pub download_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".esg-reports"),
            assets_dir: PathBuf::from("assets"),
            download_dir: PathBuf::from("."),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Load `$ESG_CONFIG` or `config.toml`; defaults when the default file is absent.
    /// Environment overrides are applied last.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_path(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_path(Path::new(DEFAULT_CONFIG_PATH))?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("Failed to read config file '{}': {}", path.display(), e)))?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClientError::Config(format!("api.base_url must be an http(s) URL, got '{}'", base)));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache.ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_the_service_contract() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.cache_ttl(), Duration::from_millis(60_000));
        assert_eq!(config.api.token_env, "ESG_API_TOKEN");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[api]
base_url = "https://esg.example.com"

[storage]
download_dir = "reports"
"#,
        )
        .unwrap();

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.api.base_url, "https://esg.example.com");
        assert_eq!(config.api.token_env, "ESG_API_TOKEN");
        assert_eq!(config.cache.ttl_ms, 60_000);
        assert_eq!(config.storage.download_dir, PathBuf::from("reports"));
        assert_eq!(config.storage.assets_dir, PathBuf::from("assets"));
    }

    #[test]
    fn malformed_file_is_a_toml_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cache]\nttl_ms = \"soon\"\n").unwrap();
        assert!(matches!(Config::from_path(&path), Err(ClientError::Toml(_))));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(Config::from_path(&dir.path().join("nope.toml")), Err(ClientError::Config(_))));
    }

    #[test]
    fn env_url_overrides_the_file() {
        let mut config = Config::default();
        std::env::set_var(API_URL_ENV, "https://staging.esg.example.com");
        config.apply_env_overrides();
        std::env::remove_var(API_URL_ENV);
        assert_eq!(config.api.base_url, "https://staging.esg.example.com");
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let mut config = Config::default();
        config.api.base_url = "localhost:8000".into();
        assert!(config.validate().is_err());
    }
}
