//! Centralized configuration for product-cli.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than on the first store call.

use std::env;
use std::fmt;

/// Storage backend provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost when the process exits)
    Memory,
    /// DynamoDB table named by TABLE_NAME
    Dynamo,
}

impl StorageProvider {
    fn from_str(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("memory") {
            Some(Self::Memory)
        } else if s.eq_ignore_ascii_case("dynamo") {
            Some(Self::Dynamo)
        } else {
            None
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage provider (default: dynamo)
    pub storage_provider: StorageProvider,
    /// Product table name (required for dynamo storage)
    pub table_name: Option<String>,
    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_vars<F: Fn(&str) -> Option<String>>(var: F) -> Result<Self, ConfigError> {
        let provider = var("STORAGE_PROVIDER").unwrap_or_else(|| "dynamo".into());
        let storage_provider = StorageProvider::from_str(&provider).ok_or_else(|| ConfigError {
            field: "STORAGE_PROVIDER",
            message: format!("Unknown value '{}'; expected memory or dynamo", provider),
        })?;

        let table_name = var("TABLE_NAME").filter(|s| !s.trim().is_empty());
        if storage_provider == StorageProvider::Dynamo && table_name.is_none() {
            return Err(ConfigError {
                field: "TABLE_NAME",
                message: "Required when STORAGE_PROVIDER=dynamo".into(),
            });
        }

        let log_format = LogFormat::from_str(&var("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        Ok(Self {
            storage_provider,
            table_name,
            log_format,
        })
    }

    /// Log warnings about configurations that lose data.
    pub fn warn_if_ephemeral(&self) {
        if self.storage_provider == StorageProvider::Memory {
            tracing::warn!(
                "STORAGE_PROVIDER=memory: products are kept in process memory and are \
                 gone when this command exits."
            );
        }
    }
}
