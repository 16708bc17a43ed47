//! Entry visibility and path authorization.
//!
//! Both decisions are pure and independent. An entry may only be disclosed
//! when it is visible *and* its path is authorized; the gate applies them to
//! the requested path and again to every child of a directory listing.

use std::fs::Metadata;

use crate::permissions::{Permissions, WILDCARD};

/// "Other" read bit of a unix mode.
#[cfg(unix)]
const OTHER_READ: u32 = 0o004;

/// What the policy needs to know about a filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    /// File name (last path component).
    pub name: String,
    /// Entry is a directory.
    pub is_dir: bool,
    /// The "other" read bit is set.
    pub world_readable: bool,
}

impl EntryDescriptor {
    /// Create a descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, is_dir: bool, world_readable: bool) -> Self {
        Self {
            name: name.into(),
            is_dir,
            world_readable,
        }
    }

    /// Derive a descriptor from filesystem metadata.
    #[must_use]
    pub fn from_metadata(name: impl Into<String>, metadata: &Metadata) -> Self {
        Self::new(name, metadata.is_dir(), world_readable(metadata))
    }
}

#[cfg(unix)]
fn world_readable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & OTHER_READ != 0
}

// No "other" bit to inspect.
#[cfg(not(unix))]
fn world_readable(_metadata: &Metadata) -> bool {
    true
}

/// Listing flags requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingOptions {
    /// Caller asked to see dot-entries.
    pub show_hidden: bool,
    /// Caller asked to see entries that are not world-readable.
    pub show_protected: bool,
}

impl ListingOptions {
    /// Parse the flags from a raw query string.
    ///
    /// Flags are bare `&`-separated tokens: `?showHidden&showProtected`.
    #[must_use]
    pub fn from_query(query: Option<&str>) -> Self {
        let mut options = Self::default();
        for token in query.unwrap_or_default().split('&') {
            match token {
                "showHidden" => options.show_hidden = true,
                "showProtected" => options.show_protected = true,
                _ => {}
            }
        }
        options
    }
}

/// Decides whether an entry may appear at all.
///
/// A dot-entry needs `show_hidden` requested and `can_show_hidden` granted;
/// an entry that is not world-readable needs `show_protected` requested and
/// `can_show_protected` granted. Both checks apply.
#[must_use]
pub fn is_visible(
    permissions: &Permissions,
    entry: &EntryDescriptor,
    options: ListingOptions,
) -> bool {
    if entry.name.starts_with('.') && !(options.show_hidden && permissions.can_show_hidden) {
        return false;
    }

    if !entry.world_readable && !(options.show_protected && permissions.can_show_protected) {
        return false;
    }

    true
}

/// Decides whether `path` may be accessed.
///
/// Admins may access everything. Otherwise the first pattern matching by
/// the ancestor-directory, wildcard or exact rule grants access.
#[must_use]
pub fn is_authorized(permissions: &Permissions, path: &str, is_dir: bool) -> bool {
    if permissions.admin {
        return true;
    }

    permissions
        .paths
        .iter()
        .any(|pattern| pattern_matches(pattern, path, is_dir))
}

fn pattern_matches(pattern: &str, path: &str, is_dir: bool) -> bool {
    if pattern.is_empty() {
        return false;
    }

    if is_dir && is_ancestor(path, pattern) {
        return true;
    }

    if let Some(prefix) = pattern.strip_suffix(WILDCARD) {
        if path.starts_with(prefix) {
            return true;
        }
    }

    pattern == path
}

/// `dir` is `pattern` itself or one of its parent directories.
///
/// The match must end on a component boundary so that `/docs` is not
/// treated as an ancestor of `/docsx/file`.
fn is_ancestor(dir: &str, pattern: &str) -> bool {
    let Some(rest) = pattern.strip_prefix(dir) else {
        return false;
    };

    rest.is_empty() || dir.ends_with('/') || rest.starts_with('/')
}

/// Joins a request path and a child name the way listings address children.
#[must_use]
pub fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    format!("{dir}/{name}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn perms(paths: &[&str]) -> Permissions {
        Permissions::with_paths(paths.iter().copied())
    }

    mod authorization {
        use super::*;

        #[test]
        fn exact_match() {
            let p = perms(&["/public/readme.txt"]);
            assert!(is_authorized(&p, "/public/readme.txt", false));
            assert!(!is_authorized(&p, "/public/readme.txt.bak", false));
        }

        #[test]
        fn wildcard_prefix_match() {
            let p = perms(&["/docs/*"]);
            assert!(is_authorized(&p, "/docs/secret.txt", false));
            assert!(is_authorized(&p, "/docs/nested/deep.txt", false));
        }

        #[test]
        fn wildcard_is_not_a_substring_match() {
            let p = perms(&["/docs/*"]);
            assert!(!is_authorized(&p, "/docsx/file", false));
            assert!(!is_authorized(&p, "/other/docs/file", false));
        }

        #[test]
        fn ancestor_of_deeper_pattern() {
            let p = perms(&["/docs/private/report.txt"]);
            assert!(is_authorized(&p, "/docs", true));
            assert!(is_authorized(&p, "/docs/private", true));
            assert!(is_authorized(&p, "/docs/", true));
            assert!(is_authorized(&p, "/", true));
        }

        #[test]
        fn ancestor_rule_needs_directory() {
            let p = perms(&["/docs/private/report.txt"]);
            assert!(!is_authorized(&p, "/docs", false));
        }

        #[test]
        fn sibling_with_common_prefix_denied() {
            let p = perms(&["/docsx/file.txt"]);
            assert!(!is_authorized(&p, "/docs", true));
            assert!(!is_authorized(&p, "/docs", false));

            let p = perms(&["/docs/private/report.txt"]);
            assert!(!is_authorized(&p, "/docs/priv", true));
            assert!(!is_authorized(&p, "/docs/public", true));
        }

        #[test]
        fn first_matching_pattern_wins() {
            let p = perms(&["/nope", "/docs/*", "/never"]);
            assert!(is_authorized(&p, "/docs/a", false));
        }

        #[test]
        fn empty_pattern_never_matches() {
            let p = perms(&[""]);
            assert!(!is_authorized(&p, "", false));
            assert!(!is_authorized(&p, "", true));
            assert!(!is_authorized(&p, "/", true));
        }

        #[test]
        fn no_patterns_grants_nothing() {
            let p = Permissions::default();
            assert!(!is_authorized(&p, "/", true));
            assert!(!is_authorized(&p, "/file", false));
        }

        proptest! {
            #[test]
            fn admin_is_authorized_everywhere(path in ".*", is_dir in any::<bool>()) {
                prop_assert!(is_authorized(&Permissions::admin(), &path, is_dir));
            }

            #[test]
            fn patternless_user_is_authorized_nowhere(path in ".*", is_dir in any::<bool>()) {
                prop_assert!(!is_authorized(&Permissions::default(), &path, is_dir));
            }

            #[test]
            fn wildcard_covers_everything_below(suffix in "[a-z/._-]{0,24}") {
                let p = perms(&["/docs/*"]);
                let path = format!("/docs/{suffix}");
                prop_assert!(is_authorized(&p, &path, false));
            }
        }
    }

    mod visibility {
        use super::*;

        fn visible(
            can_show_hidden: bool,
            can_show_protected: bool,
            entry: &EntryDescriptor,
            show_hidden: bool,
            show_protected: bool,
        ) -> bool {
            let p = Permissions {
                can_show_hidden,
                can_show_protected,
                ..Permissions::default()
            };
            let options = ListingOptions {
                show_hidden,
                show_protected,
            };
            is_visible(&p, entry, options)
        }

        #[test]
        fn plain_entry_is_visible() {
            let entry = EntryDescriptor::new("readme.txt", false, true);
            assert!(visible(false, false, &entry, false, false));
        }

        #[test]
        fn hidden_entry_needs_flag_and_permission() {
            let entry = EntryDescriptor::new(".secret", false, true);
            assert!(visible(true, false, &entry, true, false));
            assert!(!visible(true, false, &entry, false, false));
            assert!(!visible(false, false, &entry, true, false));
            assert!(!visible(false, false, &entry, false, false));
        }

        #[test]
        fn protected_entry_needs_flag_and_permission() {
            let entry = EntryDescriptor::new("payroll.csv", false, false);
            assert!(visible(false, true, &entry, false, true));
            assert!(!visible(false, true, &entry, false, false));
            assert!(!visible(false, false, &entry, false, true));
        }

        #[test]
        fn hidden_and_protected_needs_both() {
            let entry = EntryDescriptor::new(".vault", true, false);
            assert!(visible(true, true, &entry, true, true));
            assert!(!visible(true, true, &entry, true, false));
            assert!(!visible(true, true, &entry, false, true));
            assert!(!visible(true, false, &entry, true, true));
            assert!(!visible(false, true, &entry, true, true));
        }

        #[test]
        fn empty_name_is_not_hidden() {
            let entry = EntryDescriptor::new("", true, true);
            assert!(visible(false, false, &entry, false, false));
        }

        #[cfg(unix)]
        #[test]
        fn from_metadata_reads_other_bit() {
            use std::os::unix::fs::PermissionsExt;

            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("private.txt");
            std::fs::write(&path, b"x").unwrap();

            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();
            let entry =
                EntryDescriptor::from_metadata("private.txt", &std::fs::metadata(&path).unwrap());
            assert!(!entry.world_readable);
            assert!(!entry.is_dir);

            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
            let entry =
                EntryDescriptor::from_metadata("private.txt", &std::fs::metadata(&path).unwrap());
            assert!(entry.world_readable);
        }
    }

    #[test]
    fn listing_options_from_query() {
        assert_eq!(ListingOptions::from_query(None), ListingOptions::default());
        let options = ListingOptions::from_query(Some("showHidden&showProtected"));
        assert!(options.show_hidden && options.show_protected);
        let options = ListingOptions::from_query(Some("showHidden=false&x"));
        assert!(!options.show_hidden && !options.show_protected);
    }

    #[test]
    fn join_path_children() {
        assert_eq!(join_path("/", "docs"), "/docs");
        assert_eq!(join_path("/docs", "a.txt"), "/docs/a.txt");
        assert_eq!(join_path("/docs/", "a.txt"), "/docs/a.txt");
    }
}
