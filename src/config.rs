//! Configuration module for the portal.

use serde::Deserialize;
use std::path::Path;

use crate::{PortalError, Result};

/// Portal information.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Name shown on the landing document.
    #[serde(default = "default_portal_name")]
    pub name: String,
}

fn default_portal_name() -> String {
    "Cloud Storage Portal".to_string()
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            name: default_portal_name(),
        }
    }
}

/// Metadata database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/portal.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Which blob store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files in a directory on local disk.
    Local,
    /// Process memory, lost on restart.
    Memory,
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Blob store implementation.
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,
    /// Directory holding blobs for the local backend.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Base URL under which `/blobs/{key}` is reachable by clients.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Maximum number of entries returned by a listing.
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Local
}

fn default_storage_path() -> String {
    "data/uploads".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080/".to_string()
}

fn default_max_upload_size() -> u64 {
    10
}

fn default_list_limit() -> usize {
    100
}

impl StorageConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: default_storage_path(),
            public_base_url: default_public_base_url(),
            max_upload_size_mb: default_max_upload_size(),
            list_limit: default_list_limit(),
        }
    }
}

/// Password hashing cost configuration (Argon2id).
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Memory cost in KiB.
    #[serde(default = "default_hash_memory")]
    pub hash_memory_kib: u32,
    /// Number of iterations.
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
    /// Degree of parallelism.
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,
}

fn default_hash_memory() -> u32 {
    65536 // 64 MB
}

fn default_hash_iterations() -> u32 {
    3
}

fn default_hash_parallelism() -> u32 {
    4
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            hash_memory_kib: default_hash_memory(),
            hash_iterations: default_hash_iterations(),
            hash_parallelism: default_hash_parallelism(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/portal.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the Web API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Secret used to sign access grants (must be set).
    #[serde(default)]
    pub jwt_secret: String,
    /// Access grant lifetime in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            jwt_secret: String::new(),
            access_token_expiry_secs: default_access_token_expiry(),
        }
    }
}

/// Orphan reconciliation job configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    /// Interval between scans in seconds (0 = disabled).
    #[serde(default)]
    pub interval_secs: u64,
    /// Delete orphans instead of only reporting them.
    #[serde(default)]
    pub repair: bool,
    /// Minimum age in seconds before a blob without a record counts as an orphan.
    #[serde(default = "default_reconcile_grace")]
    pub grace_secs: u64,
}

fn default_reconcile_grace() -> u64 {
    300 // 5 minutes
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_secs: 0,
            repair: false,
            grace_secs: default_reconcile_grace(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Portal information.
    #[serde(default)]
    pub portal: PortalConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Password hashing configuration.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Reconciliation job configuration.
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(PortalError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| PortalError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `PORTAL_JWT_SECRET`: Override the access grant signing secret
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("PORTAL_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.web.jwt_secret = jwt_secret;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the JWT secret is not set
    /// - the public base URL is not an absolute http(s) URL
    /// - the upload size or list limit is zero
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(PortalError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via PORTAL_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }

        let base = url::Url::parse(&self.storage.public_base_url).map_err(|e| {
            PortalError::Config(format!(
                "invalid public_base_url '{}': {e}",
                self.storage.public_base_url
            ))
        })?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(PortalError::Config(format!(
                "public_base_url must use http or https, got '{}'",
                base.scheme()
            )));
        }

        if self.storage.max_upload_size_mb == 0 {
            return Err(PortalError::Config(
                "max_upload_size_mb must be greater than 0".to_string(),
            ));
        }
        if self.storage.list_limit == 0 {
            return Err(PortalError::Config(
                "list_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
