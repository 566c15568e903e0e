mod cache;
mod directory;
mod dispatch;
mod email;
mod observability;
mod server;
mod sessions;
mod tutor;
mod whatsapp;

pub use cache::*;
pub use directory::*;
pub use dispatch::*;
pub use email::*;
pub use observability::*;
pub use server::*;
pub use sessions::*;
pub use tutor::*;
pub use whatsapp::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub tutor: TutorConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl ConfigError {
    pub fn error(field: &str, message: &str) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn warning(field: &str, message: &str) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        self.server.check(&mut errors);
        self.observability.check(&mut errors);

        if self.dispatch.chunk_size == 0 {
            errors.push(ConfigError::error(
                "dispatch.chunk_size",
                "chunk_size must be greater than 0",
            ));
        }

        if self.whatsapp.default_country_code.is_empty()
            || !self
                .whatsapp
                .default_country_code
                .chars()
                .all(|c| c.is_ascii_digit())
        {
            errors.push(ConfigError::error(
                "whatsapp.default_country_code",
                "must be a non-empty digit string (e.g. \"91\")",
            ));
        }

        if self.directory.timezone.parse::<chrono_tz::Tz>().is_err() {
            errors.push(ConfigError::error(
                "directory.timezone",
                "not a recognised IANA timezone",
            ));
        }

        if self.sessions.max_entries == 0 {
            errors.push(ConfigError::error(
                "sessions.max_entries",
                "max_entries must be greater than 0",
            ));
        }

        if self.cache.memory_max_entries == 0 {
            errors.push(ConfigError::warning(
                "cache.memory_max_entries",
                "0 disables in-process caching entirely",
            ));
        }

        errors
    }
}
