//! BOM assembly and the analysis entry points
//!
//! [`analyze`] runs the whole pipeline: read the lockfile, preprocess, build
//! the graph, annotate subgraph sizes, detect multi-version packages and
//! optionally write the BOM to disk.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::builder::GraphBuilder;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::{Error, Result};
use crate::graph::{DependencyGraph, NodeSnapshot};
use crate::key::DependencyGraphKey;
use crate::lockfile::{self, PackageLock};
use crate::preprocess;
use crate::subgraph::{self, SubgraphCounting};

/// BOM written when no output path is configured.
pub const DEFAULT_OUTPUT_PATH: &str = "bom.json";

/// Options for a single analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeOptions {
    /// Lockfile to read; `package-lock.json` when unset.
    pub package_lock_file_path: Option<PathBuf>,
    /// Where the BOM is written; `bom.json` when unset.
    pub output_file_path: Option<PathBuf>,
    /// Write the BOM to `output_file_path`.
    pub save_to_file: bool,
    /// Leave dev packages and dev declarations out of the graph.
    pub ignore_dev: bool,
    /// Embed the full graph in the BOM.
    pub include_graph: bool,
    pub subgraph_counting: SubgraphCounting,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            package_lock_file_path: None,
            output_file_path: None,
            save_to_file: false,
            ignore_dev: true,
            include_graph: true,
            subgraph_counting: SubgraphCounting::default(),
        }
    }
}

/// Software bill of materials summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bom {
    pub name: String,
    pub version: String,
    /// Direct dependencies of the project.
    pub top_level_dependencies: usize,
    /// Subgraph size of the project's node.
    pub total_dependencies: usize,
    /// Package names present at more than one version.
    pub dependencies_with_multiple_versions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_graph: Option<IndexMap<DependencyGraphKey, NodeSnapshot>>,
}

/// The analyzed graph together with its BOM.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub root: DependencyGraphKey,
    pub graph: DependencyGraph,
    pub bom: Bom,
}

/// Read, analyze and optionally save, logging through `tracing`.
///
/// # Errors
///
/// Propagates lockfile read/parse errors, a missing root node, and write
/// errors when `save_to_file` is set.
pub fn analyze(options: &AnalyzeOptions) -> Result<Bom> {
    analyze_with(options, &TracingDiagnostics)
}

/// Like [`analyze`], reporting through the given diagnostics sink.
pub fn analyze_with(options: &AnalyzeOptions, diagnostics: &dyn Diagnostics) -> Result<Bom> {
    diagnostics.trace(format_args!("Reading package lock file..."));
    let lock = lockfile::read_lockfile(options.package_lock_file_path.as_deref())?;

    let analysis = analyze_lockfile(&lock, options, diagnostics)?;

    if options.save_to_file {
        let path = write_bom(&analysis.bom, options.output_file_path.as_deref())?;
        diagnostics.trace(format_args!("Wrote BOM to {}", path.display()));
    }

    Ok(analysis.bom)
}

/// Analyze an already-parsed lockfile. Performs no I/O.
pub fn analyze_lockfile(
    lock: &PackageLock,
    options: &AnalyzeOptions,
    diagnostics: &dyn Diagnostics,
) -> Result<Analysis> {
    diagnostics.trace(format_args!("Preprocessing package list..."));
    let packages = preprocess::preprocess(lock, diagnostics)?;

    let built = GraphBuilder::new(diagnostics)
        .ignore_dev(options.ignore_dev)
        .build(&packages);
    let root = built.root;
    let mut graph = built.graph;

    let total_dependencies = subgraph::annotate_subgraph_sizes(
        &mut graph,
        &root,
        options.subgraph_counting,
        diagnostics,
    )?;
    let top_level_dependencies = graph.child_count(&root);

    let bom = Bom {
        name: lock.name.clone().unwrap_or_default(),
        version: lock.version.clone().unwrap_or_default(),
        top_level_dependencies,
        total_dependencies,
        dependencies_with_multiple_versions: built.versions.multiple_versions(),
        dependency_graph: options.include_graph.then(|| graph.snapshot()),
    };

    Ok(Analysis { root, graph, bom })
}

/// Resolve the output path, falling back to [`DEFAULT_OUTPUT_PATH`].
pub fn output_path(path: Option<&Path>) -> PathBuf {
    path.map_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH), Path::to_path_buf)
}

/// Write the BOM as pretty-printed JSON and return the path written.
///
/// # Errors
///
/// Returns [`Error::SerializeBom`] or [`Error::WriteOutput`].
pub fn write_bom(bom: &Bom, path: Option<&Path>) -> Result<PathBuf> {
    let path = output_path(path);
    let json = serde_json::to_string_pretty(bom).map_err(|source| Error::SerializeBom { source })?;
    std::fs::write(&path, json).map_err(|source| Error::WriteOutput {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
