//! Application configuration management.
//!
//! Handles loading, saving, and accessing the configuration for the flow
//! server, the local document store, the hosted text model, and push
//! delivery. Configuration is persisted as TOML on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{StError, StResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Flow server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Document store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Hosted text model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Push delivery settings.
    #[serde(default)]
    pub push: PushConfig,

    /// Per-flow tuning.
    #[serde(default)]
    pub flows: FlowsConfig,

    /// Account conventions.
    #[serde(default)]
    pub accounts: AccountsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Flow server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on flow routes. Generated on first `serve` if empty.
    #[serde(default)]
    pub auth_token: String,
}

/// Local document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite file. If empty, uses the default location.
    #[serde(default)]
    pub path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Run integrity check on startup.
    #[serde(default = "default_true")]
    pub integrity_check_on_startup: bool,

    /// Refuse every write with a permission error.
    #[serde(default)]
    pub read_only: bool,
}

/// Hosted text model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the Generative Language API.
    #[serde(default = "default_model_api_base")]
    pub api_base: String,

    /// API key sent in the `x-goog-api-key` header.
    #[serde(default)]
    pub api_key: String,

    /// Model identifier.
    #[serde(default = "default_model_name")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in milliseconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_ms: u64,
}

/// Push delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Firebase project used for the FCM HTTP v1 API.
    #[serde(default)]
    pub fcm_project_id: String,

    /// OAuth2 bearer token for the FCM HTTP v1 API.
    #[serde(default)]
    pub fcm_access_token: String,

    /// FCM API base URL.
    #[serde(default = "default_fcm_api_base")]
    pub fcm_api_base: String,

    /// Pre-minted `Authorization` header value for browser push endpoints
    /// (e.g. `vapid t=<jwt>, k=<public key>`).
    #[serde(default)]
    pub vapid_authorization: String,

    /// Time-to-live for browser pushes, in seconds.
    #[serde(default = "default_push_ttl")]
    pub ttl_secs: u32,

    /// Request timeout in milliseconds.
    #[serde(default = "default_push_timeout")]
    pub timeout_ms: u64,
}

/// Per-flow tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowsConfig {
    /// Fixed delay before the single translation retry, in milliseconds.
    #[serde(default = "default_translation_retry_delay")]
    pub translation_retry_delay_ms: u64,
}

/// Account conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Domain appended to usernames to build sign-in emails.
    #[serde(default = "default_email_domain")]
    pub email_domain: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

// Default value functions for serde

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    constants::DEFAULT_SERVER_PORT
}

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    4
}

fn default_model_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model_name() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_model_timeout() -> u64 {
    30_000
}

fn default_fcm_api_base() -> String {
    "https://fcm.googleapis.com/v1".to_string()
}

fn default_push_ttl() -> u32 {
    86_400 // 1 day
}

fn default_push_timeout() -> u64 {
    10_000
}

fn default_translation_retry_delay() -> u64 {
    constants::DEFAULT_TRANSLATION_RETRY_DELAY_MS
}

fn default_email_domain() -> String {
    constants::DEFAULT_EMAIL_DOMAIN.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            auth_token: String::new(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            wal_mode: true,
            pool_size: default_pool_size(),
            integrity_check_on_startup: true,
            read_only: false,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: default_model_api_base(),
            api_key: String::new(),
            model: default_model_name(),
            temperature: default_temperature(),
            timeout_ms: default_model_timeout(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            fcm_project_id: String::new(),
            fcm_access_token: String::new(),
            fcm_api_base: default_fcm_api_base(),
            vapid_authorization: String::new(),
            ttl_secs: default_push_ttl(),
            timeout_ms: default_push_timeout(),
        }
    }
}

impl Default for FlowsConfig {
    fn default() -> Self {
        Self {
            translation_retry_delay_ms: default_translation_retry_delay(),
        }
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            email_domain: default_email_domain(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> StResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> StResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file path.
    pub fn save_default(&self) -> StResult<()> {
        let path = Self::default_config_path()?;
        self.save_to_file(&path)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> StResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| StError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> StResult<PathBuf> {
        Ok(Platform::config_dir()?.join("config.toml"))
    }

    /// Get the effective store path, using the configured path or the default.
    pub fn effective_store_path(&self) -> StResult<PathBuf> {
        if self.store.path.is_empty() {
            Ok(Platform::data_dir()?.join("securetalk.db"))
        } else {
            Ok(PathBuf::from(&self.store.path))
        }
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> StResult<PathBuf> {
        if self.logging.directory.is_empty() {
            Ok(Platform::data_dir()?.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Whether the hosted text model can be called.
    pub fn is_model_configured(&self) -> bool {
        !self.model.api_key.is_empty() && !self.model.model.is_empty()
    }

    /// Whether mobile-push tokens can be delivered.
    pub fn is_fcm_configured(&self) -> bool {
        !self.push.fcm_project_id.is_empty() && !self.push.fcm_access_token.is_empty()
    }

    /// The socket address string the flow server binds.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }
}

/// Thread-safe configuration holder for shared access across flows.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Clone the current configuration out of the lock.
    pub async fn snapshot(&self) -> AppConfig {
        self.inner.read().await.clone()
    }

    /// Save the current configuration to disk.
    pub async fn save(&self) -> StResult<()> {
        let config = self.inner.read().await;
        config.save_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3400);
        assert_eq!(config.flows.translation_retry_delay_ms, 2_000);
        assert_eq!(config.accounts.email_domain, "securetalk.app");
        assert!(config.store.wal_mode);
        assert!(!config.store.read_only);
        assert!(!config.is_model_configured());
        assert!(!config.is_fcm_configured());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [model]
            api_key = "k"

            [flows]
            translation_retry_delay_ms = 0
            "#,
        )
        .unwrap();
        assert!(config.is_model_configured());
        assert_eq!(config.model.model, "gemini-2.0-flash");
        assert_eq!(config.flows.translation_retry_delay_ms, 0);
        assert_eq!(config.server.bind_address, "127.0.0.1");
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.server.port = 9000;
        config.push.fcm_project_id = "proj".into();
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 9000);
        assert_eq!(loaded.push.fcm_project_id, "proj");
    }

    #[test]
    fn test_effective_store_path_override() {
        let mut config = AppConfig::default();
        config.store.path = "/tmp/st.db".into();
        assert_eq!(config.effective_store_path().unwrap(), PathBuf::from("/tmp/st.db"));
    }

    #[tokio::test]
    async fn test_config_handle_write() {
        let handle = ConfigHandle::new(AppConfig::default());
        handle.write().await.server.port = 1234;
        assert_eq!(handle.snapshot().await.server.port, 1234);
        assert_eq!(handle.read().await.server_addr(), "127.0.0.1:1234");
    }
}
