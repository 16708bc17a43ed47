//! Identity asserted by the upstream proxy.

use serde::{Deserialize, Serialize};

use crate::permissions::Permissions;

/// Identity fields supplied with every request.
///
/// These are trusted as already verified; nothing here checks them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Given name.
    pub given_name: String,
    /// Family name.
    pub family_name: String,
    /// Email address, the key into the permission table.
    pub email: String,
    /// Picture URL.
    pub picture: String,
}

impl Identity {
    /// Create an identity with only an email set.
    #[must_use]
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }
}

/// An identity enriched with its permission set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Asserted identity.
    #[serde(flatten)]
    pub identity: Identity,
    /// Permissions from the permission table.
    pub permissions: Permissions,
}

impl User {
    /// Returns the user's email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.identity.email
    }
}
