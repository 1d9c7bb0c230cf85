//! Configuration management
//!
//! This module provides YAML-based configuration management with support for:
//! - Environment variable overrides
//! - Multiple configuration file locations
//! - Default values for all settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::validation::parse_bool;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// TLS/HTTPS configuration (if not set, server runs HTTP)
    #[serde(default)]
    pub tls: Option<TlsConfig>,
    /// Honor `x-forwarded-proto`/`x-forwarded-host` when building page links.
    /// Only enable behind a reverse proxy that overwrites these headers.
    #[serde(default)]
    pub trust_proxy: bool,
}

/// TLS/HTTPS configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to TLS certificate file (PEM format)
    pub cert_file: PathBuf,
    /// Path to TLS private key file (PEM format)
    pub key_file: PathBuf,
    /// Minimum TLS version (1.2 or 1.3)
    #[serde(default = "default_min_tls_version")]
    pub min_version: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_min_tls_version() -> String {
    "1.2".to_string()
}

/// API key authentication
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AuthConfig {
    /// Value every `/api/v1` request must present in `x-api-key`
    #[serde(default)]
    pub api_key: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// How long SQLite waits on a locked database before failing
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_busy_timeout() -> u64 {
    5
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Log output target (console, file or both)
    #[serde(default = "default_log_target")]
    pub target: LogTarget,
    /// Directory for log files (used when target is "file" or "both")
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Log file name prefix
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
    /// Enable daily log rotation
    #[serde(default = "default_log_rotation")]
    pub daily_rotation: bool,
}

/// Log output target
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Console,
    File,
    Both,
}

impl LogTarget {
    /// Combine the console/file switches into a target.
    ///
    /// Returns `None` when both are off; the caller keeps its current target
    /// so the service is never left without output.
    pub fn from_switches(console: bool, file: bool) -> Option<Self> {
        match (console, file) {
            (true, true) => Some(LogTarget::Both),
            (true, false) => Some(LogTarget::Console),
            (false, true) => Some(LogTarget::File),
            (false, false) => None,
        }
    }

    pub fn writes_console(&self) -> bool {
        matches!(self, LogTarget::Console | LogTarget::Both)
    }

    pub fn writes_file(&self) -> bool {
        matches!(self, LogTarget::File | LogTarget::Both)
    }
}

/// Log line format
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl LogFormat {
    fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_target() -> LogTarget {
    LogTarget::Console
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_prefix() -> String {
    "audit-service".to_string()
}

fn default_log_rotation() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: default_log_target(),
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            daily_rotation: default_log_rotation(),
        }
    }
}

/// Audit record handling
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    /// When false, ingestion validates and logs records without storing them
    #[serde(default = "default_persist_enabled")]
    pub persist_enabled: bool,
    /// Upper bound applied to the requested `pageSize`
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_persist_enabled() -> bool {
    true
}

fn default_max_page_size() -> u32 {
    1000
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            persist_enabled: default_persist_enabled(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                tls: None,
                trust_proxy: false,
            },
            auth: AuthConfig::default(),
            database: DatabaseConfig {
                url: "sqlite://./data/audit.db".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
                busy_timeout_secs: default_busy_timeout(),
            },
            logging: LoggingConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values
    /// 2. Configuration file (YAML)
    /// 3. Environment variables
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path = std::env::var("AUDIT_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(Self::find_config_file);

        let mut config = match config_path {
            Some(ref path) if path.exists() => {
                eprintln!("[CONFIG] Loading configuration from: {:?}", path);
                Self::from_file(path)?
            }
            Some(ref path) => {
                eprintln!("[CONFIG] Config file not found: {:?}, using defaults", path);
                AppConfig::default()
            }
            None => {
                eprintln!("[CONFIG] No config file found, using defaults");
                AppConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_norway::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("config.yaml"),
            PathBuf::from("config/config.yaml"),
            PathBuf::from("/etc/audit-service/config.yaml"),
            dirs::config_dir()
                .map(|p| p.join("audit-service/config.yaml"))
                .unwrap_or_default(),
        ];

        paths.into_iter().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any variable source
    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(host) = var("AUDIT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("AUDIT_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(trust) = var("AUDIT_TRUST_PROXY").and_then(|v| parse_bool(&v)) {
            self.server.trust_proxy = trust;
        }
        if let (Some(cert), Some(key)) = (var("AUDIT_TLS_CERT"), var("AUDIT_TLS_KEY")) {
            let min_version = self
                .server
                .tls
                .as_ref()
                .map(|tls| tls.min_version.clone())
                .unwrap_or_else(default_min_tls_version);
            self.server.tls = Some(TlsConfig {
                cert_file: PathBuf::from(cert),
                key_file: PathBuf::from(key),
                min_version,
            });
        }

        // Auth overrides
        if let Some(key) = var("AUDIT_API_KEY") {
            self.auth.api_key = key;
        }

        // Database overrides
        if let Some(url) = var("DATABASE_URL") {
            self.database.url = url;
        }

        // Logging overrides
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Some(format) = var("AUDIT_LOG_FORMAT") {
            self.logging.format = LogFormat::from_name(&format);
        }
        let console = var("CONSOLELOG_ENABLED").and_then(|v| parse_bool(&v));
        let file = var("FILELOG_ENABLED").and_then(|v| parse_bool(&v));
        if console.is_some() || file.is_some() {
            let console = console.unwrap_or_else(|| self.logging.target.writes_console());
            let file = file.unwrap_or_else(|| self.logging.target.writes_file());
            if let Some(target) = LogTarget::from_switches(console, file) {
                self.logging.target = target;
            }
        }
        if let Some(name) = var("SERVICE_NAME") {
            self.logging.log_prefix = name;
        }

        // Audit overrides
        if let Some(enabled) = var("AUDIT_PERSIST_ENABLED").and_then(|v| parse_bool(&v)) {
            self.audit.persist_enabled = enabled;
        }
        if let Some(size) = var("AUDIT_MAX_PAGE_SIZE").and_then(|v| v.parse().ok()) {
            self.audit.max_page_size = size;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.api_key.trim().is_empty() {
            anyhow::bail!("API key must be set (auth.api_key or AUDIT_API_KEY)");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.audit.max_page_size == 0 {
            anyhow::bail!("audit.max_page_size must be at least 1");
        }

        if let Some(ref tls) = self.server.tls {
            if !tls.cert_file.exists() {
                anyhow::bail!("TLS certificate file not found: {:?}", tls.cert_file);
            }
            if !tls.key_file.exists() {
                anyhow::bail!("TLS key file not found: {:?}", tls.key_file);
            }
            if tls.min_version != "1.2" && tls.min_version != "1.3" {
                anyhow::bail!(
                    "Invalid TLS minimum version: {}. Must be '1.2' or '1.3'",
                    tls.min_version
                );
            }
        }

        Ok(())
    }
}
