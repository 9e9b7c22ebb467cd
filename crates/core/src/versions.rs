//! Per-name version tracking and multi-version detection

use indexmap::IndexMap;

/// Versions observed for each bare package name, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionIndex {
    versions: IndexMap<String, Vec<String>>,
}

impl VersionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `version` under `name`. Repeats are ignored.
    pub fn record(&mut self, name: &str, version: &str) {
        let versions = self.versions.entry(name.to_string()).or_default();
        if !versions.iter().any(|v| v == version) {
            versions.push(version.to_string());
        }
    }

    pub fn versions_of(&self, name: &str) -> Option<&[String]> {
        self.versions.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Names present at more than one version, in first-seen order.
    pub fn multiple_versions(&self) -> Vec<String> {
        self.versions
            .iter()
            .filter(|(_, versions)| versions.len() > 1)
            .map(|(name, _)| name.clone())
            .collect()
    }
}
