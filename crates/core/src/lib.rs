//! bomtastic Core Library
//!
//! This library turns a resolved npm `package-lock.json` into a dependency
//! graph and a compact software bill of materials: how many packages the
//! project pulls in, how many it depends on directly, and which packages are
//! installed at more than one version.
//!
//! # Example
//!
//! ```no_run
//! use bomtastic_core::{analyze, AnalyzeOptions};
//!
//! # fn main() -> Result<(), bomtastic_core::Error> {
//! let bom = analyze(&AnalyzeOptions::default())?;
//! println!("{} depends on {} packages", bom.name, bom.total_dependencies);
//! # Ok(())
//! # }
//! ```

pub mod bom;
pub mod builder;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod key;
pub mod lockfile;
pub mod preprocess;
pub mod subgraph;
pub mod versions;

// Re-export commonly used types
pub use bom::{analyze, analyze_lockfile, analyze_with, write_bom, Analysis, AnalyzeOptions, Bom};
pub use diagnostics::{Diagnostics, RecordingDiagnostics, SilentDiagnostics, TracingDiagnostics, Warning};
pub use error::{Error, Result};
pub use graph::{DependencyGraph, Node};
pub use key::DependencyGraphKey;
pub use lockfile::PackageLock;
pub use subgraph::SubgraphCounting;
