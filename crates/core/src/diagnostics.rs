//! Logger capability handed to each analysis phase
//!
//! Components never log through global state. They receive a
//! `&dyn Diagnostics` and report through it, so callers decide where
//! messages go: [`TracingDiagnostics`] for the binary,
//! [`SilentDiagnostics`] or [`RecordingDiagnostics`] for tests and embedding.

use std::cell::RefCell;
use std::fmt;

use crate::key::DependencyGraphKey;

/// A recoverable condition the analysis worked around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A declared dependency has no node in the graph. Usually an optional
    /// dependency that was not installed.
    UnresolvedChild {
        parent: DependencyGraphKey,
        child: DependencyGraphKey,
    },
    /// The subgraph walk returned to a node whose size was still being
    /// computed. A size of 1 was used for that occurrence.
    CycleDetected { key: DependencyGraphKey },
    /// A subgraph sum passed `usize::MAX` and was clamped there. Reported
    /// for the first node that hit the ceiling.
    SizeSaturated { key: DependencyGraphKey },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedChild { parent, child } => write!(
                f,
                "Unknown package {child} declared by {parent}; this is probably an optional dependency that is not installed"
            ),
            Self::CycleDetected { key } => write!(
                f,
                "Dependency cycle through {key}; using subgraph size 1 for this occurrence"
            ),
            Self::SizeSaturated { key } => write!(
                f,
                "Subgraph size of {key} exceeds {}; reporting the maximum",
                usize::MAX
            ),
        }
    }
}

/// Sink for verbose trace messages and warnings.
pub trait Diagnostics {
    /// Progress detail, shown only when verbose output is enabled.
    fn trace(&self, message: fmt::Arguments<'_>);

    /// A recoverable condition, always shown.
    fn warn(&self, warning: Warning);
}

/// Forwards to `tracing`: traces at `DEBUG`, warnings at `WARN`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn trace(&self, message: fmt::Arguments<'_>) {
        tracing::debug!("{message}");
    }

    fn warn(&self, warning: Warning) {
        match &warning {
            Warning::UnresolvedChild { parent, child } => {
                tracing::warn!(parent = %parent, child = %child, "{warning}");
            }
            Warning::CycleDetected { key } | Warning::SizeSaturated { key } => {
                tracing::warn!(key = %key, "{warning}");
            }
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentDiagnostics;

impl Diagnostics for SilentDiagnostics {
    fn trace(&self, _message: fmt::Arguments<'_>) {}

    fn warn(&self, _warning: Warning) {}
}

/// Keeps every warning (and optionally every trace line) in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    warnings: RefCell<Vec<Warning>>,
    traces: RefCell<Vec<String>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings recorded so far, in emission order.
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.borrow().clone()
    }

    pub fn traces(&self) -> Vec<String> {
        self.traces.borrow().clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn trace(&self, message: fmt::Arguments<'_>) {
        self.traces.borrow_mut().push(message.to_string());
    }

    fn warn(&self, warning: Warning) {
        self.warnings.borrow_mut().push(warning);
    }
}
