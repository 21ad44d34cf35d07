use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::i18n::Locale;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub locale: LocaleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin used to build public survey links (e.g. `https://surveys.example.com`)
    pub public_origin: String,
}

/// Which identity backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProviderKind {
    /// Hosted auth service over HTTP
    Http,
    /// Process-local accounts, for development and tests
    #[default]
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub provider: IdentityProviderKind,
    /// Base URL of the hosted auth service
    #[serde(default)]
    pub base_url: String,
    /// Name of the environment variable holding the service API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Upper bound for each remote call (default: 15)
    #[serde(default = "default_identity_timeout")]
    pub timeout_secs: u64,
    /// Where the hosted service sends users after email confirmation
    #[serde(default)]
    pub email_redirect_path: Option<String>,
}

fn default_api_key_env() -> String {
    "SURVEYOR_IDENTITY_API_KEY".to_string()
}

fn default_identity_timeout() -> u64 {
    15
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory for the file backend
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Locale used when a request does not ask for one
    #[serde(default)]
    pub default: Locale,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default: Locale::En,
        }
    }
}

/// Limits for in-memory wizard, respondent and sign-in sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Wizard and response sessions untouched for this long are dropped
    #[serde(default = "default_idle_minutes")]
    pub idle_minutes: u64,

    /// Sign-in tokens unused for this long expire
    #[serde(default = "default_auth_idle_minutes")]
    pub auth_idle_minutes: u64,

    /// Most sessions of one kind kept at once; the least recently used goes
    #[serde(default = "default_max_sessions")]
    pub max_per_kind: usize,

    #[serde(default = "default_sweep_secs")]
    pub sweep_secs: u64,
}

fn default_idle_minutes() -> u64 {
    60
}

fn default_auth_idle_minutes() -> u64 {
    12 * 60
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_sweep_secs() -> u64 {
    60
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_minutes: default_idle_minutes(),
            auth_idle_minutes: default_auth_idle_minutes(),
            max_per_kind: default_max_sessions(),
            sweep_secs: default_sweep_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to a file under `dir` instead of stderr
    #[serde(default)]
    pub to_file: bool,

    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    ".surveyor/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
            dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from("surveyor.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the service runs without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/surveyor/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("surveyor").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with SURVEYOR_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("SURVEYOR")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Get absolute path to the logs directory
    pub fn logs_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.logging.dir);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Public link for a published survey id
    pub fn survey_link(&self, survey_id: &str) -> String {
        crate::survey::publish::survey_link(&self.server.public_origin, survey_id)
    }

    /// Absolute URL the identity backend links to from confirmation emails
    pub fn email_redirect_url(&self) -> Option<String> {
        self.identity.email_redirect_path.as_ref().map(|path| {
            format!(
                "{}/{}",
                self.server.public_origin.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 7080,
                public_origin: "http://localhost:7080".to_string(),
            },
            identity: IdentityConfig {
                provider: IdentityProviderKind::Memory,
                base_url: String::new(),
                api_key_env: default_api_key_env(),
                timeout_secs: default_identity_timeout(),
                email_redirect_path: Some("/auth/callback".to_string()),
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                path: ".surveyor/data".to_string(),
            },
            locale: LocaleConfig::default(),
            logging: LoggingConfig::default(),
            sessions: SessionsConfig::default(),
        }
    }
}
