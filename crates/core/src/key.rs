//! Stable node identity derived from lockfile paths
//!
//! Lockfile entries are keyed by install path (`node_modules/a/node_modules/b`),
//! so the same package at the same version can appear under many paths. The
//! graph instead keys nodes by `<name>-<version>`, which collapses every copy
//! of a (name, version) pair into one node regardless of nesting depth.
//!
//! All key construction goes through this module; nothing else in the crate
//! concatenates names and versions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between nested install directories in a lockfile path.
const NODE_MODULES: &str = "node_modules/";

/// Identity of a node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGraphKey(String);

impl DependencyGraphKey {
    /// Build a key from a lockfile path (or bare package name) and an
    /// optional version.
    ///
    /// The version suffix is omitted when `version` is `None` or empty.
    ///
    /// # Example
    /// ```
    /// use bomtastic_core::key::DependencyGraphKey;
    ///
    /// let key = DependencyGraphKey::new("node_modules/a/node_modules/b", Some("1.2.0"));
    /// assert_eq!(key.as_str(), "b-1.2.0");
    /// ```
    pub fn new(path: &str, version: Option<&str>) -> Self {
        let name = package_name(path);
        match version {
            Some(version) if !version.is_empty() => Self(format!("{name}-{version}")),
            _ => Self(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyGraphKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DependencyGraphKey {
    /// Wrap an already-normalized key verbatim.
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Bare package name at the end of a lockfile path.
///
/// Scoped names keep their scope: `node_modules/@scope/pkg` → `@scope/pkg`.
/// Paths without any `node_modules/` segment (workspace links, the root
/// project name) are returned unchanged.
pub fn package_name(path: &str) -> &str {
    match path.rfind(NODE_MODULES) {
        Some(pos) => &path[pos + NODE_MODULES.len()..],
        None => path,
    }
}

/// Reduce a declared version range to the characters that can appear in a
/// resolved version (`0-9` and `.`).
///
/// `^1.2.3` and `~1.2.3` both become `1.2.3`. Compound ranges are not
/// interpreted; their digits are simply concatenated.
pub fn strip_version_range(range: &str) -> String {
    range
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}
