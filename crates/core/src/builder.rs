//! Builds the dependency graph from preprocessed lockfile packages
//!
//! Construction runs in two passes over the same package map:
//!
//! 1. **Nodes**: one node per key, skipping dev packages when `ignore_dev`
//!    is set, while recording each kept version in a [`VersionIndex`].
//! 2. **Edges**: every declared dependency is normalized to a child key and
//!    linked if that key has a node. Unresolvable children are reported and
//!    skipped; they are expected for optional packages that were not
//!    installed.
//!
//! The graph is structurally final once [`GraphBuilder::build`] returns.

use crate::diagnostics::{Diagnostics, Warning};
use crate::graph::{DependencyGraph, Node};
use crate::key::{self, DependencyGraphKey};
use crate::lockfile::DependencySpec;
use crate::preprocess::{Package, PreprocessedPackages};
use crate::versions::VersionIndex;

/// Output of graph construction
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub root: DependencyGraphKey,
    pub graph: DependencyGraph,
    pub versions: VersionIndex,
}

/// Two-pass graph builder
pub struct GraphBuilder<'d> {
    ignore_dev: bool,
    diagnostics: &'d dyn Diagnostics,
}

impl<'d> GraphBuilder<'d> {
    /// Create a builder that ignores dev dependencies
    pub fn new(diagnostics: &'d dyn Diagnostics) -> Self {
        Self {
            ignore_dev: true,
            diagnostics,
        }
    }

    /// Whether dev packages and `devDependencies` declarations are left out
    pub fn ignore_dev(mut self, ignore_dev: bool) -> Self {
        self.ignore_dev = ignore_dev;
        self
    }

    pub fn build(&self, packages: &PreprocessedPackages<'_>) -> BuiltGraph {
        let mut graph = DependencyGraph::new();
        let mut versions = VersionIndex::new();

        self.diagnostics.trace(format_args!("Building dependency graph..."));
        for (key, package) in &packages.packages {
            self.add_node(&mut graph, &mut versions, key, package);
        }

        self.diagnostics.trace(format_args!("Analyzing package relationships..."));
        for (key, package) in &packages.packages {
            if self.is_excluded(package) {
                continue;
            }
            self.link_children(&mut graph, packages, key, package);
        }

        BuiltGraph {
            root: packages.root.clone(),
            graph,
            versions,
        }
    }

    fn is_excluded(&self, package: &Package<'_>) -> bool {
        self.ignore_dev && package.dev
    }

    fn add_node(
        &self,
        graph: &mut DependencyGraph,
        versions: &mut VersionIndex,
        key: &DependencyGraphKey,
        package: &Package<'_>,
    ) {
        if self.is_excluded(package) {
            self.diagnostics
                .trace(format_args!("Ignoring {key} because it is a development dependency."));
            return;
        }
        if graph.contains(key) {
            return;
        }

        let version = package.entry.version.clone();
        if let Some(version) = &version {
            versions.record(&package.name, version);
        }
        graph.add_node(Node::new(key.clone(), package.name.clone(), version, package.dev));
        self.diagnostics
            .trace(format_args!("Added {key} to new node in dependency graph..."));
    }

    fn link_children(
        &self,
        graph: &mut DependencyGraph,
        packages: &PreprocessedPackages<'_>,
        key: &DependencyGraphKey,
        package: &Package<'_>,
    ) {
        let Some(parent) = graph.index_of(key) else {
            return;
        };

        let declared = package.entry.declared_dependencies(!self.ignore_dev);
        if declared.is_empty() {
            self.diagnostics
                .trace(format_args!("Found 0 dependencies for {key}."));
            return;
        }

        for (name, spec) in declared {
            let child_key = child_key(name, spec);

            if let Some(child) = graph.index_of(&child_key) {
                graph.add_edge(parent, child);
                self.diagnostics
                    .trace(format_args!("Added {child_key} to child dependencies for {key}..."));
                continue;
            }

            match packages.get(&child_key) {
                Some(child) if self.is_excluded(child) => self.diagnostics.trace(format_args!(
                    "Not adding {child_key} as a child to {key} because it is a development dependency."
                )),
                _ => self.diagnostics.warn(Warning::UnresolvedChild {
                    parent: key.clone(),
                    child: child_key,
                }),
            }
        }

        self.diagnostics.trace(format_args!(
            "{key} has {} dependencies...",
            graph.child_count(key)
        ));
    }
}

/// Key a declared dependency resolves to
///
/// The declared range is reduced to digits and dots, so `^1.2.0` resolves
/// to the node for version `1.2.0`.
pub fn child_key(name: &str, spec: &DependencySpec) -> DependencyGraphKey {
    let version = spec.version().map(key::strip_version_range);
    DependencyGraphKey::new(name, version.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{RecordingDiagnostics, SilentDiagnostics};
    use crate::lockfile::PackageLock;
    use crate::preprocess::preprocess;
    use std::path::Path;

    fn build(json: &str, ignore_dev: bool, diagnostics: &dyn Diagnostics) -> BuiltGraph {
        let lock = PackageLock::from_json(json, Path::new("test")).unwrap();
        let packages = preprocess(&lock, diagnostics).unwrap();
        GraphBuilder::new(diagnostics).ignore_dev(ignore_dev).build(&packages)
    }

    const DIAMOND: &str = r#"{ "name": "app", "version": "1.0.0", "packages": {
        "": { "version": "1.0.0", "dependencies": { "left": "^1.0.0", "right": "^1.0.0" } },
        "node_modules/left": { "version": "1.0.0", "dependencies": { "shared": "^1.0.0" } },
        "node_modules/right": { "version": "1.0.0", "dependencies": { "shared": "^1.0.0" } },
        "node_modules/shared": { "version": "1.0.0" }
    } }"#;

    #[test]
    fn test_diamond_shares_one_node() {
        let built = build(DIAMOND, true, &SilentDiagnostics);
        let graph = &built.graph;

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.child_count(&built.root), 2);

        let shared = DependencyGraphKey::from("shared-1.0.0");
        let parents: Vec<&str> = graph.parents(&shared).into_iter().map(DependencyGraphKey::as_str).collect();
        assert_eq!(parents, vec!["left-1.0.0", "right-1.0.0"]);
    }

    #[test]
    fn test_parent_child_links_are_symmetric() {
        let built = build(DIAMOND, true, &SilentDiagnostics);
        let graph = &built.graph;

        for node in graph.nodes() {
            for child in graph.children(&node.key) {
                assert!(graph.parents(child).contains(&&node.key));
            }
            for parent in graph.parents(&node.key) {
                assert!(graph.children(parent).contains(&&node.key));
            }
        }
    }

    #[test]
    fn test_structured_declaration_uses_version_field() {
        let json = r#"{ "name": "app", "version": "1.0.0", "packages": {
            "": { "version": "1.0.0", "dependencies": { "mustache": { "version": "4.2.0", "resolved": "x" } } },
            "node_modules/mustache": { "version": "4.2.0" }
        } }"#;

        let built = build(json, true, &SilentDiagnostics);
        assert_eq!(built.graph.children(&built.root), vec![&DependencyGraphKey::from("mustache-4.2.0")]);
    }

    #[test]
    fn test_unknown_child_is_skipped_with_warning() {
        let json = r#"{ "name": "app", "version": "1.0.0", "packages": {
            "": { "version": "1.0.0", "dependencies": { "left": "1.0.0", "fsevents": "^2.3.3" } },
            "node_modules/left": { "version": "1.0.0" }
        } }"#;
        let diagnostics = RecordingDiagnostics::new();

        let built = build(json, true, &diagnostics);

        assert_eq!(built.graph.child_count(&built.root), 1);
        assert_eq!(
            diagnostics.warnings(),
            vec![Warning::UnresolvedChild {
                parent: "app-1.0.0".into(),
                child: "fsevents-2.3.3".into(),
            }]
        );
    }

    #[test]
    fn test_ignore_dev_drops_dev_nodes_and_declarations() {
        let json = r#"{ "name": "app", "version": "1.0.0", "packages": {
            "": {
                "version": "1.0.0",
                "dependencies": { "left": "1.0.0" },
                "devDependencies": { "jest": "^29.7.0" }
            },
            "node_modules/left": { "version": "1.0.0" },
            "node_modules/jest": { "version": "29.7.0", "dev": true, "dependencies": { "expect": "29.7.0" } },
            "node_modules/expect": { "version": "29.7.0", "dev": true }
        } }"#;
        let diagnostics = RecordingDiagnostics::new();

        let built = build(json, true, &diagnostics);

        assert_eq!(built.graph.node_count(), 2);
        assert!(built.graph.nodes().all(|n| !n.dev));
        assert!(!built.graph.contains(&"jest-29.7.0".into()));
        assert!(built.versions.versions_of("jest").is_none());
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn test_include_dev_links_dev_dependencies() {
        let json = r#"{ "name": "app", "version": "1.0.0", "packages": {
            "": { "version": "1.0.0", "devDependencies": { "jest": "^29.7.0" } },
            "node_modules/jest": { "version": "29.7.0", "dev": true }
        } }"#;

        let built = build(json, false, &SilentDiagnostics);

        assert_eq!(built.graph.child_count(&built.root), 1);
        assert!(built.graph.get(&"jest-29.7.0".into()).unwrap().dev);
    }

    #[test]
    fn test_prod_dependency_on_dev_package_is_not_a_warning() {
        let json = r#"{ "name": "app", "version": "1.0.0", "packages": {
            "": { "version": "1.0.0", "dependencies": { "tool": "1.0.0" } },
            "node_modules/tool": { "version": "1.0.0", "dev": true }
        } }"#;
        let diagnostics = RecordingDiagnostics::new();

        let built = build(json, true, &diagnostics);

        assert_eq!(built.graph.child_count(&built.root), 0);
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn test_peer_dependencies_create_edges() {
        let json = r#"{ "name": "app", "version": "1.0.0", "packages": {
            "": { "version": "1.0.0", "dependencies": { "plugin": "1.0.0" } },
            "node_modules/plugin": { "version": "1.0.0", "peerDependencies": { "host": "^3.0.0" } },
            "node_modules/host": { "version": "3.0.0" }
        } }"#;

        let built = build(json, true, &SilentDiagnostics);
        assert_eq!(built.graph.children(&"plugin-1.0.0".into()), vec![&DependencyGraphKey::from("host-3.0.0")]);
    }

    #[test]
    fn test_version_index_tracks_kept_nodes() {
        let json = r#"{ "name": "app", "version": "1.0.0", "packages": {
            "": { "version": "1.0.0", "dependencies": { "a": "1.0.0", "b": "1.0.0" } },
            "node_modules/a": { "version": "1.0.0", "dependencies": { "semver": "^7.5.0" } },
            "node_modules/b": { "version": "1.0.0", "dependencies": { "semver": "^6.3.0" } },
            "node_modules/semver": { "version": "7.5.0" },
            "node_modules/b/node_modules/semver": { "version": "6.3.0" }
        } }"#;

        let built = build(json, true, &SilentDiagnostics);

        assert_eq!(built.versions.versions_of("semver").unwrap(), &["7.5.0", "6.3.0"]);
        assert_eq!(built.versions.multiple_versions(), vec!["semver".to_string()]);
        assert_eq!(built.graph.children(&"b-1.0.0".into()), vec![&DependencyGraphKey::from("semver-6.3.0")]);
    }

    #[test]
    fn test_child_key_strips_range_characters() {
        assert_eq!(child_key("left", &DependencySpec::VersionOnly("^1.0.0".into())).as_str(), "left-1.0.0");
        assert_eq!(child_key("any", &DependencySpec::VersionOnly("*".into())).as_str(), "any");
    }
}
