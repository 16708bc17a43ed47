//! In-memory permission table keyed by email.

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use super::model::Permissions;
use crate::config::is_valid_email;
use crate::identity::{Identity, User};
use crate::{Error, Result};

/// Permission sets for every known identity.
///
/// Loaded once before serving traffic and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    users: HashMap<String, Permissions>,
}

impl PermissionTable {
    /// Build a table from already parsed entries.
    ///
    /// # Errors
    ///
    /// Returns an error if an email is malformed or a pattern is not an
    /// absolute path.
    pub fn new(users: HashMap<String, Permissions>) -> Result<Self> {
        for (email, permissions) in &users {
            if !is_valid_email(email) {
                return Err(Error::Config(format!(
                    "invalid email '{email}' in permission table"
                )));
            }

            for pattern in &permissions.paths {
                if pattern.is_empty() {
                    warn!("user '{email}' has an empty path pattern; it never matches");
                } else if !pattern.starts_with('/') {
                    return Err(Error::Config(format!(
                        "user '{email}': pattern '{pattern}' must start with '/'"
                    )));
                }
            }

            if permissions.grants_nothing() {
                warn!("user '{email}' is granted no paths");
            }
        }

        Ok(Self { users })
    }

    /// Parse a table from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let users: HashMap<String, Permissions> = serde_json::from_str(json)?;
        Self::new(users)
    }

    /// Load the table from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to open users file {}: {e}",
                path.display()
            ))
        })?;

        Self::from_json(&json).map_err(|e| {
            Error::Config(format!(
                "failed to decode users file {}: {e}",
                path.display()
            ))
        })
    }

    /// Look up the permission set for an email.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Forbidden`] for unknown emails.
    pub fn get(&self, email: &str) -> Result<&Permissions> {
        self.users
            .get(email)
            .ok_or_else(|| Error::Forbidden(email.to_string()))
    }

    /// Enrich an identity with its permission set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Forbidden`] for unknown emails.
    pub fn enrich(&self, identity: Identity) -> Result<User> {
        let permissions = self.get(&identity.email)?.clone();
        Ok(User {
            identity,
            permissions,
        })
    }

    /// Number of known identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns true if no identity is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
