// ⚙️ Configuration + runtime context
// The deployment environment is passed explicitly into validation, never read
// from globals inside the validator.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG_PATH: &str = "payouts.toml";
pub const ENV_VAR_ENVIRONMENT: &str = "PAYOUTS_ENV";
pub const ENV_VAR_DATABASE: &str = "PAYOUTS_DB";

// ============================================================================
// ENVIRONMENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

// ============================================================================
// RUNTIME CONTEXT
// ============================================================================

/// What the validator needs to know about the deployment it runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeContext {
    pub environment: Environment,
}

impl RuntimeContext {
    pub fn new(environment: Environment) -> Self {
        RuntimeContext { environment }
    }

    pub fn production() -> Self {
        Self::new(Environment::Production)
    }

    pub fn development() -> Self {
        Self::new(Environment::Development)
    }

    /// Only a live production deployment enforces production-only checks
    pub fn is_live_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

// ============================================================================
// APP CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_server_addr")]
    pub server_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database_path() -> String {
    "payouts.db".to_string()
}

fn default_server_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            environment: Environment::default(),
            database_path: default_database_path(),
            server_addr: default_server_addr(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().display().to_string();
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: path_str.clone(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path_str,
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from `path` when it exists, otherwise defaults; then apply env overrides
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = if path.as_ref().exists() {
            let config = Self::from_file(path.as_ref())?;
            tracing::info!(path = %path.as_ref().display(), "config loaded");
            config
        } else {
            tracing::debug!(path = %path.as_ref().display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_overrides(
            std::env::var(ENV_VAR_ENVIRONMENT).ok(),
            std::env::var(ENV_VAR_DATABASE).ok(),
        )?;
        Ok(config)
    }

    fn apply_overrides(
        &mut self,
        environment: Option<String>,
        database_path: Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(env) = environment {
            self.environment = env.parse()?;
        }
        if let Some(db) = database_path {
            self.database_path = db;
        }
        Ok(())
    }

    pub fn runtime_context(&self) -> RuntimeContext {
        RuntimeContext::new(self.environment)
    }
}
