//! Subgraph size annotation
//!
//! Every node reachable from the root gets a `subgraph_size`: itself plus
//! what lies below it. The default [`SubgraphCounting::SumWithReuse`]
//! computes it as `1 + Σ size(child)`, walking depth-first from the root
//! with one visited set for the whole walk and reusing a child's size as
//! soon as it is known.
//!
//! Reuse means a package reachable through several children is counted
//! once per child, so with diamonds the root can report more than the
//! number of distinct packages below it: for `app → {left, right} →
//! shared` the root gets 5, not 4. [`SubgraphCounting::Distinct`] counts
//! distinct reachable nodes instead.
//!
//! The walk uses an explicit stack, so deep or cyclic graphs cannot
//! exhaust the call stack. A child that was visited but has no size yet is
//! still on the stack, meaning the edge closes a cycle; it contributes 1
//! and a [`Warning::CycleDetected`] is reported.
//!
//! Sums grow with the number of paths, not packages, so stacked diamonds
//! can push them past `usize::MAX`. Sums saturate there and the first node
//! to hit the ceiling is reported once as [`Warning::SizeSaturated`].

use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::key::DependencyGraphKey;

/// How `subgraph_size` is computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubgraphCounting {
    /// `1 + Σ size(child)` with first-computed sizes reused
    #[default]
    SumWithReuse,
    /// Number of distinct nodes in the downward closure
    Distinct,
}

/// A node being expanded: its children and the running size
struct Frame {
    key: DependencyGraphKey,
    children: Vec<DependencyGraphKey>,
    next: usize,
    sum: usize,
    saturated: bool,
}

impl Frame {
    fn enter(graph: &DependencyGraph, key: DependencyGraphKey) -> Self {
        let children = graph.children(&key).into_iter().cloned().collect();
        Self {
            key,
            children,
            next: 0,
            sum: 1,
            saturated: false,
        }
    }

    fn add(&mut self, size: usize) {
        match self.sum.checked_add(size) {
            Some(sum) => self.sum = sum,
            None => {
                self.sum = usize::MAX;
                self.saturated = true;
            }
        }
    }
}

/// Annotate every node reachable from `root` and return the root's size
///
/// Sizes already present are kept; a second call returns the root's
/// existing annotation without walking the graph again.
///
/// # Errors
///
/// Returns [`Error::MissingNode`] if `root` or any child key on the walk
/// has no node in the graph.
pub fn annotate_subgraph_sizes(
    graph: &mut DependencyGraph,
    root: &DependencyGraphKey,
    counting: SubgraphCounting,
    diagnostics: &dyn Diagnostics,
) -> Result<usize> {
    let root_node = graph.get(root).ok_or_else(|| Error::MissingNode { key: root.clone() })?;
    if let Some(size) = root_node.subgraph_size {
        return Ok(size);
    }

    match counting {
        SubgraphCounting::SumWithReuse => sum_with_reuse(graph, root, diagnostics),
        SubgraphCounting::Distinct => distinct(graph, root, diagnostics),
    }
}

fn sum_with_reuse(
    graph: &mut DependencyGraph,
    root: &DependencyGraphKey,
    diagnostics: &dyn Diagnostics,
) -> Result<usize> {
    let mut visited: HashSet<DependencyGraphKey> = HashSet::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut saturation_reported = false;

    diagnostics.trace(format_args!("Calculating subgraph size for {root}..."));
    visited.insert(root.clone());
    stack.push(Frame::enter(graph, root.clone()));

    while let Some(frame) = stack.last_mut() {
        if let Some(child) = frame.children.get(frame.next).cloned() {
            frame.next += 1;

            let node = graph.get(&child).ok_or_else(|| Error::MissingNode { key: child.clone() })?;
            match node.subgraph_size {
                Some(size) => frame.add(size),
                None if visited.contains(&child) => {
                    frame.add(1);
                    diagnostics.warn(Warning::CycleDetected { key: child });
                }
                None => {
                    diagnostics.trace(format_args!("Calculating subgraph size for {child}..."));
                    visited.insert(child.clone());
                    stack.push(Frame::enter(graph, child));
                }
            }
            continue;
        }

        let Some(done) = stack.pop() else {
            break;
        };
        if done.saturated && !saturation_reported {
            saturation_reported = true;
            diagnostics.warn(Warning::SizeSaturated { key: done.key.clone() });
        }
        set_size(graph, &done.key, done.sum)?;
        diagnostics.trace(format_args!("{} has subgraph size {}.", done.key, done.sum));

        match stack.last_mut() {
            Some(parent) => parent.add(done.sum),
            None => return Ok(done.sum),
        }
    }

    Err(Error::MissingNode { key: root.clone() })
}

fn distinct(
    graph: &mut DependencyGraph,
    root: &DependencyGraphKey,
    diagnostics: &dyn Diagnostics,
) -> Result<usize> {
    let root_idx = graph
        .index_of(root)
        .ok_or_else(|| Error::MissingNode { key: root.clone() })?;

    let sizes: Vec<(DependencyGraphKey, usize)> = {
        let inner = graph.as_petgraph();
        let mut reachable = Dfs::new(inner, root_idx);
        let mut sizes = Vec::new();
        while let Some(idx) = reachable.next(inner) {
            let mut closure = Dfs::new(inner, idx);
            let mut count = 0;
            while closure.next(inner).is_some() {
                count += 1;
            }
            sizes.push((inner[idx].key.clone(), count));
        }
        sizes
    };

    let mut root_size = 1;
    for (key, size) in sizes {
        set_size(graph, &key, size)?;
        diagnostics.trace(format_args!("{key} has subgraph size {size}."));
        if &key == root {
            root_size = size;
        }
    }
    Ok(root_size)
}

/// Write a size unless one is already present
fn set_size(graph: &mut DependencyGraph, key: &DependencyGraphKey, size: usize) -> Result<()> {
    let node = graph
        .index_of(key)
        .and_then(|idx| graph.node_weight_mut(idx))
        .ok_or_else(|| Error::MissingNode { key: key.clone() })?;
    node.subgraph_size.get_or_insert(size);
    Ok(())
}
