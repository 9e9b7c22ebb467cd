//! `package-lock.json` model and the file-read collaborator
//!
//! Only the fields the analysis needs are modelled; everything else in a
//! package entry (`resolved`, `integrity`, `engines`, ...) is ignored on parse.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Lockfile read when no path is configured.
pub const DEFAULT_LOCKFILE_PATH: &str = "package-lock.json";

/// A parsed lockfile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageLock {
    pub name: Option<String>,
    pub version: Option<String>,
    pub lockfile_version: Option<u32>,
    /// Entries keyed by install path, in file order. The root project is
    /// keyed by the empty string.
    #[serde(default)]
    pub packages: IndexMap<String, PackageEntry>,
}

/// One entry of the lockfile's `packages` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageEntry {
    pub version: Option<String>,
    #[serde(default)]
    pub dev: bool,
    #[serde(default)]
    pub dependencies: IndexMap<String, DependencySpec>,
    #[serde(default)]
    pub peer_dependencies: IndexMap<String, DependencySpec>,
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, DependencySpec>,
    #[serde(default)]
    pub optional_dependencies: IndexMap<String, DependencySpec>,
}

/// A dependency declaration: either a bare version range or an embedded
/// record carrying a `version` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    /// `"left": "^1.0.0"`
    VersionOnly(String),
    /// `"left": { "version": "1.0.0", "resolved": "...", ... }`
    VersionedRecord(DependencyRecord),
}

/// Object form of a dependency declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub version: Option<String>,
    /// Everything else on the record (`resolved`, `integrity`, ...).
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl DependencySpec {
    /// The declared version or range, if any.
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::VersionOnly(range) => Some(range),
            Self::VersionedRecord(record) => record.version.as_deref(),
        }
    }
}

impl PackageEntry {
    /// Merge the declaration maps that contribute edges.
    ///
    /// Order is `dependencies`, `peerDependencies`, then `devDependencies`
    /// when `include_dev` is set. A later map overrides the declaration of a name
    /// already declared but the name keeps its first position.
    pub fn declared_dependencies(&self, include_dev: bool) -> IndexMap<&str, &DependencySpec> {
        let mut merged = IndexMap::new();
        let mut sources = vec![&self.dependencies, &self.peer_dependencies];
        if include_dev {
            sources.push(&self.dev_dependencies);
        }
        for source in sources {
            for (name, spec) in source {
                merged.insert(name.as_str(), spec);
            }
        }
        merged
    }
}

impl PackageLock {
    /// Parse a lockfile from a JSON string.
    ///
    /// `origin` is only used to label errors.
    pub fn from_json(json: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| Error::ParseLockfile {
            path: origin.to_path_buf(),
            source,
        })
    }
}

/// Resolve the lockfile path, falling back to [`DEFAULT_LOCKFILE_PATH`].
pub fn lockfile_path(path: Option<&Path>) -> PathBuf {
    path.map_or_else(|| PathBuf::from(DEFAULT_LOCKFILE_PATH), Path::to_path_buf)
}

/// Read and parse a lockfile.
///
/// # Errors
///
/// Returns [`Error::ReadLockfile`] if the file cannot be read and
/// [`Error::ParseLockfile`] if it is not a valid lockfile.
pub fn read_lockfile(path: Option<&Path>) -> Result<PackageLock> {
    let path = lockfile_path(path);
    let json = std::fs::read_to_string(&path).map_err(|source| Error::ReadLockfile {
        path: path.clone(),
        source,
    })?;
    PackageLock::from_json(&json, &path)
}
