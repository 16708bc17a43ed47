//! Permission set model.

use serde::{Deserialize, Serialize};

/// Wildcard marker that may end a path pattern.
pub const WILDCARD: char = '*';

/// Authorization and visibility rules bound to one identity.
///
/// The policy is allow-only: patterns grant access, nothing denies it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Permissions {
    /// Authorized for every path.
    pub admin: bool,
    /// May list entries whose name starts with `.`.
    pub can_show_hidden: bool,
    /// May list entries that are not world-readable.
    pub can_show_protected: bool,
    /// Ordered path patterns; first match wins.
    pub paths: Vec<String>,
    /// Accesses are not audited.
    pub ignore_access: bool,
}

impl Permissions {
    /// Create an admin permission set.
    #[must_use]
    pub fn admin() -> Self {
        Self {
            admin: true,
            ..Self::default()
        }
    }

    /// Create a permission set granting the given patterns.
    #[must_use]
    pub fn with_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Returns true if this set can never authorize anything.
    #[must_use]
    pub fn grants_nothing(&self) -> bool {
        !self.admin && self.paths.iter().all(String::is_empty)
    }
}
