//! Re-keys the lockfile's path-keyed package map by graph identity
//!
//! After this step every later phase works with a single key space
//! ([`DependencyGraphKey`]) instead of juggling install paths and node keys.

use indexmap::IndexMap;

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::key::{self, DependencyGraphKey};
use crate::lockfile::{PackageEntry, PackageLock};

/// A lockfile entry tagged with its bare package name.
#[derive(Debug, Clone)]
pub struct Package<'a> {
    pub name: String,
    /// True only if every lockfile entry collapsed into this key was dev.
    pub dev: bool,
    pub entry: &'a PackageEntry,
}

/// The package map keyed by [`DependencyGraphKey`], in lockfile order.
#[derive(Debug, Clone)]
pub struct PreprocessedPackages<'a> {
    pub root: DependencyGraphKey,
    pub packages: IndexMap<DependencyGraphKey, Package<'a>>,
}

impl<'a> PreprocessedPackages<'a> {
    pub fn get(&self, key: &DependencyGraphKey) -> Option<&Package<'a>> {
        self.packages.get(key)
    }
}

/// Key of the project's own node.
///
/// # Errors
///
/// Returns [`Error::MissingRootField`] if the lockfile has no top-level
/// `name` or `version`.
pub fn root_key(lock: &PackageLock) -> Result<DependencyGraphKey> {
    let name = lock
        .name
        .as_deref()
        .ok_or(Error::MissingRootField { field: "name" })?;
    let version = lock
        .version
        .as_deref()
        .ok_or(Error::MissingRootField { field: "version" })?;
    Ok(DependencyGraphKey::new(name, Some(version)))
}

/// Re-key every lockfile entry.
///
/// The root entry (empty path) is stored under the root key; every other
/// entry under `<name>-<version>`. Nothing is dropped. When several install
/// paths collapse into one key the last entry's declarations win, keeping
/// the key's first position, and the dev flag is the conjunction of all of
/// them.
pub fn preprocess<'a>(
    lock: &'a PackageLock,
    diagnostics: &dyn Diagnostics,
) -> Result<PreprocessedPackages<'a>> {
    let root = root_key(lock)?;
    let root_name = lock.name.clone().unwrap_or_default();

    let mut packages: IndexMap<DependencyGraphKey, Package<'a>> = IndexMap::new();
    for (path, entry) in &lock.packages {
        let (key, name) = if path.is_empty() {
            (root.clone(), root_name.clone())
        } else {
            (
                DependencyGraphKey::new(path, entry.version.as_deref()),
                key::package_name(path).to_string(),
            )
        };

        match packages.get_mut(&key) {
            Some(existing) => {
                diagnostics.trace(format_args!("{path} collapses into existing key {key}"));
                existing.dev &= entry.dev;
                existing.entry = entry;
            }
            None => {
                packages.insert(
                    key,
                    Package {
                        name,
                        dev: entry.dev,
                        entry,
                    },
                );
            }
        }
    }

    Ok(PreprocessedPackages { root, packages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SilentDiagnostics;
    use std::path::Path;

    fn lock(json: &str) -> PackageLock {
        PackageLock::from_json(json, Path::new("test")).unwrap()
    }

    #[test]
    fn test_root_entry_is_rekeyed() {
        let lock = lock(
            r#"{ "name": "app", "version": "1.0.0", "packages": {
                "": { "version": "1.0.0" },
                "node_modules/left": { "version": "1.0.0" }
            } }"#,
        );

        let pre = preprocess(&lock, &SilentDiagnostics).unwrap();

        assert_eq!(pre.root.as_str(), "app-1.0.0");
        let keys: Vec<&str> = pre.packages.keys().map(DependencyGraphKey::as_str).collect();
        assert_eq!(keys, vec!["app-1.0.0", "left-1.0.0"]);
        assert_eq!(pre.packages[&pre.root].name, "app");
        assert_eq!(pre.packages[&DependencyGraphKey::from("left-1.0.0")].name, "left");
    }

    #[test]
    fn test_nested_paths_collapse_and_dev_requires_all() {
        let lock = lock(
            r#"{ "name": "app", "version": "1.0.0", "packages": {
                "": { "version": "1.0.0" },
                "node_modules/a/node_modules/b": { "version": "2.0.0", "dev": true },
                "node_modules/c/node_modules/b": { "version": "2.0.0" },
                "node_modules/d": { "version": "1.0.0", "dev": true },
                "node_modules/e/node_modules/d": { "version": "1.0.0", "dev": true }
            } }"#,
        );

        let pre = preprocess(&lock, &SilentDiagnostics).unwrap();

        assert_eq!(pre.packages.len(), 3);
        assert!(!pre.packages[&DependencyGraphKey::from("b-2.0.0")].dev);
        assert!(pre.packages[&DependencyGraphKey::from("d-1.0.0")].dev);
    }

    #[test]
    fn test_collapsed_paths_take_last_declarations() {
        let lock = lock(
            r#"{ "name": "app", "version": "1.0.0", "packages": {
                "": { "version": "1.0.0" },
                "node_modules/b": { "version": "2.0.0", "dependencies": { "old": "1.0.0" } },
                "node_modules/x": { "version": "1.0.0" },
                "node_modules/c/node_modules/b": { "version": "2.0.0", "dependencies": { "new": "1.0.0" } }
            } }"#,
        );

        let pre = preprocess(&lock, &SilentDiagnostics).unwrap();

        let keys: Vec<&str> = pre.packages.keys().map(DependencyGraphKey::as_str).collect();
        assert_eq!(keys, vec!["app-1.0.0", "b-2.0.0", "x-1.0.0"]);
        let b = &pre.packages[&DependencyGraphKey::from("b-2.0.0")];
        assert_eq!(b.entry.dependencies.keys().collect::<Vec<_>>(), vec!["new"]);
    }

    #[test]
    fn test_dev_entries_are_kept() {
        let lock = lock(
            r#"{ "name": "app", "version": "1.0.0", "packages": {
                "": { "version": "1.0.0" },
                "node_modules/jest": { "version": "29.7.0", "dev": true }
            } }"#,
        );

        let pre = preprocess(&lock, &SilentDiagnostics).unwrap();
        assert!(pre.get(&DependencyGraphKey::from("jest-29.7.0")).is_some());
    }

    #[test]
    fn test_missing_root_name_fails() {
        let lock = lock(r#"{ "version": "1.0.0", "packages": {} }"#);

        let err = preprocess(&lock, &SilentDiagnostics).unwrap_err();
        assert!(matches!(err, Error::MissingRootField { field: "name" }));
    }

    #[test]
    fn test_missing_root_version_fails() {
        let lock = lock(r#"{ "name": "app", "packages": {} }"#);

        let err = root_key(&lock).unwrap_err();
        assert!(matches!(err, Error::MissingRootField { field: "version" }));
    }
}
