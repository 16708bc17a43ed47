//! Service configuration.
//!
//! Loaded once at startup from a JSON file and shared read-only afterwards.
//! Every field has a default, so a partial file only overrides what it names.

mod validation;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use accessledger_smtp::types::Address;
use accessledger_smtp::{Envelope, Lenient, ReplyPolicy, Strict};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

pub(crate) use validation::is_valid_email;
pub use validation::{ValidationError, ValidationResult, validate_config};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// URL routes.
    pub paths: PathsConfig,
    /// HTTP listener.
    pub server: ServerConfig,
    /// Audit mail relay.
    pub smtp: SmtpConfig,
    /// Served filesystem.
    pub system: SystemConfig,
    /// Audit buffering.
    pub audit: AuditConfig,
}

impl Config {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::parse_and_validate(&json, path)
    }

    /// Load a configuration file, falling back to defaults when it does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, is
    /// malformed, or fails validation.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::parse_and_validate(&json, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "configuration file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(Error::Config(format!(
                "failed to open configuration file {}: {e}",
                path.display()
            ))),
        }
    }

    fn parse_and_validate(json: &str, path: &Path) -> Result<Self> {
        let config = Self::from_json(json).map_err(|e| {
            Error::Config(format!(
                "failed to decode configuration file {}: {e}",
                path.display()
            ))
        })?;

        validate_config(&config).map_err(Error::Invalid)?;
        Ok(config)
    }
}

/// URL routes of the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathsConfig {
    /// Prefix of the file API.
    pub api: String,
    /// Route returning the caller's permissions.
    pub user: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            api: "/api".to_string(),
            user: "/user".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Listen address; `:port` binds every interface.
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ":80".to_string(),
        }
    }
}

impl ServerConfig {
    /// Address suitable for binding a socket.
    #[must_use]
    pub fn bind_address(&self) -> String {
        if self.address.starts_with(':') {
            format!("0.0.0.0{}", self.address)
        } else {
            self.address.clone()
        }
    }
}

/// Mail relay settings for audit delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmtpConfig {
    /// Relay `host:port`.
    pub server: String,
    /// Identity announced with `HELO`.
    pub identity: String,
    /// Envelope sender and `From` header.
    pub from: String,
    /// Envelope recipient and `To` header.
    pub to: String,
    /// Reject relay replies outside the expected code class.
    pub strict_replies: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: "localhost:25".to_string(),
            identity: "sender.server.com".to_string(),
            from: "sender@server.com".to_string(),
            to: "recipient@server.com".to_string(),
            strict_replies: false,
        }
    }
}

impl SmtpConfig {
    /// Build the delivery envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if either address is invalid.
    pub fn envelope(&self) -> Result<Envelope> {
        Ok(Envelope::new(
            self.identity.as_str(),
            Address::new(self.from.as_str())?,
            Address::new(self.to.as_str())?,
        ))
    }

    /// Reply policy selected by `strict_replies`.
    #[must_use]
    pub fn reply_policy(&self) -> Arc<dyn ReplyPolicy> {
        if self.strict_replies {
            Arc::new(Strict)
        } else {
            Arc::new(Lenient)
        }
    }
}

/// Served filesystem settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemConfig {
    /// Directory that request paths are resolved against.
    pub root: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            root: "/data".to_string(),
        }
    }
}

/// Audit buffering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditConfig {
    /// Quiet period after the last access before a batch is flushed.
    pub idle_window_secs: u64,
    /// Events a buffering task may hold unread before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            idle_window_secs: 15 * 60,
            queue_capacity: 64,
        }
    }
}

impl AuditConfig {
    /// The idle window as a duration.
    #[must_use]
    pub const fn idle_window(&self) -> Duration {
        Duration::from_secs(self.idle_window_secs)
    }
}
