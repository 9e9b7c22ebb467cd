//! Graph data structures for package dependency tracking
//!
//! Uses `petgraph::StableGraph` so node indices stay valid for the whole
//! analysis, paired with a key → index map for O(1) lookups by
//! [`DependencyGraphKey`].

use indexmap::IndexMap;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashMap;

use crate::key::DependencyGraphKey;

/// A package in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Graph identity (`<name>-<version>`)
    pub key: DependencyGraphKey,
    /// Bare package name (e.g., "@babel/core")
    pub name: String,
    /// Versions recorded for this node (a single entry in practice)
    pub versions: Vec<String>,
    /// Whether this node is only needed for development
    pub dev: bool,
    /// Size of the downward closure, set once by the subgraph analysis
    pub subgraph_size: Option<usize>,
}

impl Node {
    pub fn new(key: DependencyGraphKey, name: String, version: Option<String>, dev: bool) -> Self {
        Self {
            key,
            name,
            versions: version.into_iter().collect(),
            dev,
            subgraph_size: None,
        }
    }
}

/// The dependency graph
///
/// Edges point from a package to each package it depends on. Parents and
/// children are reported in edge insertion order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// The underlying stable graph (private to enforce encapsulation)
    inner: StableGraph<Node, ()>,
    /// Key → index cache, avoids linear scans on lookups
    index: HashMap<DependencyGraphKey, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, or return the existing index if its key is already present
    ///
    /// The first node added for a key wins.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        if let Some(&existing) = self.index.get(&node.key) {
            return existing;
        }
        let key = node.key.clone();
        let idx = self.inner.add_node(node);
        self.index.insert(key, idx);
        idx
    }

    /// Link `parent` → `child`
    ///
    /// Returns `None` if the edge already existed; children and parents are sets.
    pub fn add_edge(&mut self, parent: NodeIndex, child: NodeIndex) -> Option<EdgeIndex> {
        if self.inner.find_edge(parent, child).is_some() {
            return None;
        }
        Some(self.inner.add_edge(parent, child, ()))
    }

    /// Look up a node index by key
    pub fn index_of(&self, key: &DependencyGraphKey) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &DependencyGraphKey) -> bool {
        self.index.contains_key(key)
    }

    /// Get a node by key
    pub fn get(&self, key: &DependencyGraphKey) -> Option<&Node> {
        self.index_of(key).and_then(|idx| self.inner.node_weight(idx))
    }

    /// Mutable access, for annotations only; structure is fixed once built
    pub(crate) fn node_weight_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.inner.node_weight_mut(index)
    }

    /// Get the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Get the number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// Iterate over all nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner.node_weights()
    }

    /// Get all node indices in creation order
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    /// Iterate over (parent, child) key pairs for every edge
    pub fn edges(&self) -> impl Iterator<Item = (&DependencyGraphKey, &DependencyGraphKey)> {
        self.inner.edge_indices().filter_map(move |edge| {
            let (parent, child) = self.inner.edge_endpoints(edge)?;
            Some((&self.inner[parent].key, &self.inner[child].key))
        })
    }

    /// Direct dependencies of a node, in declaration order
    pub fn child_indices(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_in_order(index, Direction::Outgoing)
    }

    /// Direct dependents of a node, in the order they were linked
    pub fn parent_indices(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_in_order(index, Direction::Incoming)
    }

    /// Keys of a node's children; empty if the key is unknown
    pub fn children(&self, key: &DependencyGraphKey) -> Vec<&DependencyGraphKey> {
        self.index_of(key)
            .map(|idx| self.keys_of(self.child_indices(idx)))
            .unwrap_or_default()
    }

    /// Keys of a node's parents; empty if the key is unknown
    pub fn parents(&self, key: &DependencyGraphKey) -> Vec<&DependencyGraphKey> {
        self.index_of(key)
            .map(|idx| self.keys_of(self.parent_indices(idx)))
            .unwrap_or_default()
    }

    /// Number of direct dependencies
    pub fn child_count(&self, key: &DependencyGraphKey) -> usize {
        self.index_of(key)
            .map_or(0, |idx| self.inner.edges_directed(idx, Direction::Outgoing).count())
    }

    /// Borrow the underlying petgraph structure for read-only algorithms
    pub fn as_petgraph(&self) -> &StableGraph<Node, ()> {
        &self.inner
    }

    /// Serializable view of every node, keyed by graph key in creation order
    pub fn snapshot(&self) -> IndexMap<DependencyGraphKey, NodeSnapshot> {
        self.node_indices()
            .map(|idx| {
                let node = &self.inner[idx];
                let children: Vec<DependencyGraphKey> =
                    self.keys_of(self.child_indices(idx)).into_iter().cloned().collect();
                let parents: Vec<DependencyGraphKey> =
                    self.keys_of(self.parent_indices(idx)).into_iter().cloned().collect();
                let snapshot = NodeSnapshot {
                    name: node.name.clone(),
                    versions: node.versions.clone(),
                    dev: node.dev,
                    child_count: children.len(),
                    children,
                    parents,
                    subgraph_size: node.subgraph_size,
                };
                (node.key.clone(), snapshot)
            })
            .collect()
    }

    fn neighbors_in_order(&self, index: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        // petgraph walks adjacency lists newest-first; edge ids give insertion order
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .inner
            .edges_directed(index, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (edge.id(), other)
            })
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, other)| other).collect()
    }

    fn keys_of(&self, indices: Vec<NodeIndex>) -> Vec<&DependencyGraphKey> {
        indices.into_iter().map(|idx| &self.inner[idx].key).collect()
    }
}

/// Serialized form of a node inside the BOM's `dependencyGraph`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub name: String,
    pub versions: Vec<String>,
    pub dev: bool,
    pub children: Vec<DependencyGraphKey>,
    pub parents: Vec<DependencyGraphKey>,
    pub child_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subgraph_size: Option<usize>,
}
