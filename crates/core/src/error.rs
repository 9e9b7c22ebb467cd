//! Error types for lockfile analysis

use std::path::PathBuf;

use crate::key::DependencyGraphKey;

/// Result type for lockfile analysis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an analysis.
///
/// Recoverable conditions (unresolved children, cycles) never surface here;
/// they are reported through [`crate::diagnostics::Diagnostics`] instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The lockfile could not be read from disk.
    #[error("failed to read lockfile {path}")]
    ReadLockfile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The lockfile is not valid JSON or does not have the expected shape.
    #[error("failed to parse lockfile {path}")]
    ParseLockfile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The lockfile's top-level `name` or `version` is absent.
    #[error("lockfile is missing the root package {field}")]
    MissingRootField {
        /// Name of the absent field (`name` or `version`).
        field: &'static str,
    },

    /// A key the analysis expected to find has no node in the graph.
    #[error("key {key} is not in the dependency graph")]
    MissingNode { key: DependencyGraphKey },

    /// The BOM could not be serialized.
    #[error("failed to serialize BOM")]
    SerializeBom {
        #[source]
        source: serde_json::Error,
    },

    /// The BOM could not be written to disk.
    #[error("failed to write BOM to {path}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
