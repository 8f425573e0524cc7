//! # Module Graph
//!
//! An in-memory model of `go mod graph` output: one `parent dependency` pair per
//! line, where each side is `name@version` (the main module has no version).
//! Built fresh for each invocation and discarded after rendering.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A module at a specific version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    pub name: String,
    pub version: String,
    /// Keys of the direct dependencies, mirroring `DependencyGraph::edges` for traversal.
    pub dependencies: Vec<String>,
}

/// Nodes keyed by `name@version`, plus the ordered adjacency list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    pub nodes: BTreeMap<String, DependencyNode>,
    pub edges: BTreeMap<String, Vec<String>>,
}

/// Splits `module@version` into its name and version. A key without `@` has an empty version.
pub fn parse_module_name_version(key: &str) -> (&str, &str) {
    match key.split_once('@') {
        Some((name, version)) if !version.contains('@') => (name, version),
        _ => (key, ""),
    }
}

impl DependencyGraph {
    /// Parses `go mod graph` output. Lines that are not exactly two fields are skipped.
    pub fn parse(output: &str) -> Self {
        let mut graph = Self::default();
        for line in output.lines() {
            let mut fields = line.split_whitespace();
            let (Some(parent), Some(dep), None) = (fields.next(), fields.next(), fields.next()) else {
                continue;
            };
            graph.ensure_node(parent);
            graph.ensure_node(dep);
            graph.edges.entry(parent.to_string()).or_default().push(dep.to_string());
            if let Some(node) = graph.nodes.get_mut(parent) {
                node.dependencies.push(dep.to_string());
            }
        }
        log::debug!(
            "Parsed module graph with {} nodes and {} parents",
            graph.nodes.len(),
            graph.edges.len()
        );
        graph
    }

    fn ensure_node(&mut self, key: &str) {
        if !self.nodes.contains_key(key) {
            let (name, version) = parse_module_name_version(key);
            self.nodes.insert(
                key.to_string(),
                DependencyNode {
                    name: name.to_string(),
                    version: version.to_string(),
                    dependencies: Vec::new(),
                },
            );
        }
    }

    /// Keeps only nodes whose name contains `pattern` (case-insensitive), with their outgoing edges.
    pub fn filter(&self, pattern: &str) -> Self {
        let needle = pattern.to_lowercase();
        let mut filtered = Self::default();
        for (key, node) in &self.nodes {
            if node.name.to_lowercase().contains(&needle) {
                filtered.nodes.insert(key.clone(), node.clone());
                if let Some(deps) = self.edges.get(key) {
                    filtered.edges.insert(key.clone(), deps.clone());
                }
            }
        }
        filtered
    }

    /// Number of direct dependencies of `root`.
    pub fn direct_dependencies(&self, root: &str) -> usize {
        self.edges.get(root).map_or(0, Vec::len)
    }

    /// Number of unique `name@version` nodes.
    pub fn total_modules(&self) -> usize {
        self.nodes.len()
    }

    /// Longest dependency chain below `root`, not counting the root itself.
    ///
    /// Each node's depth is computed once. An edge back into the current path counts as 0.
    pub fn max_depth(&self, root: &str) -> usize {
        let mut in_progress = HashSet::new();
        let mut finished = HashMap::new();
        self.depth_from(root, &mut in_progress, &mut finished).saturating_sub(1)
    }

    fn depth_from<'a>(
        &'a self,
        key: &'a str,
        in_progress: &mut HashSet<&'a str>,
        finished: &mut HashMap<&'a str, usize>,
    ) -> usize {
        if let Some(&depth) = finished.get(key) {
            return depth;
        }
        if !in_progress.insert(key) {
            return 0;
        }
        let deepest_child = self
            .edges
            .get(key)
            .into_iter()
            .flatten()
            .map(|dep| self.depth_from(dep, in_progress, finished))
            .max()
            .unwrap_or(0);
        in_progress.remove(key);
        finished.insert(key, deepest_child + 1);
        deepest_child + 1
    }

    /// Modules present at more than one version, with their sorted versions.
    pub fn duplicate_versions(&self) -> BTreeMap<String, Vec<String>> {
        let mut versions: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for node in self.nodes.values().filter(|n| !n.version.is_empty()) {
            versions.entry(&node.name).or_default().insert(&node.version);
        }
        versions
            .into_iter()
            .filter(|(_, v)| v.len() > 1)
            .map(|(name, v)| (name.to_string(), v.into_iter().map(str::to_string).collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
example.com/app golang.org/x/text@v0.14.0
example.com/app github.com/pkg/errors@v0.9.1
golang.org/x/text@v0.14.0 golang.org/x/tools@v0.1.0
golang.org/x/tools@v0.1.0 golang.org/x/text@v0.3.0
malformed-line
a b c
";

    #[test]
    fn test_parse_builds_nodes_and_edges() {
        let graph = DependencyGraph::parse(SAMPLE);
        assert_eq!(graph.total_modules(), 5);
        assert_eq!(graph.direct_dependencies("example.com/app"), 2);
        assert_eq!(
            graph.edges["example.com/app"],
            vec!["golang.org/x/text@v0.14.0", "github.com/pkg/errors@v0.9.1"]
        );
        let text = &graph.nodes["golang.org/x/text@v0.14.0"];
        assert_eq!(text.name, "golang.org/x/text");
        assert_eq!(text.version, "v0.14.0");
        assert_eq!(text.dependencies, vec!["golang.org/x/tools@v0.1.0"]);
        assert!(graph.nodes["example.com/app"].version.is_empty());
    }

    #[test]
    fn test_parse_module_name_version() {
        assert_eq!(parse_module_name_version("a/b@v1.2.3"), ("a/b", "v1.2.3"));
        assert_eq!(parse_module_name_version("a/b"), ("a/b", ""));
        assert_eq!(parse_module_name_version("a@b@c"), ("a@b@c", ""));
    }

    #[test]
    fn test_max_depth_and_duplicates() {
        let graph = DependencyGraph::parse(SAMPLE);
        assert_eq!(graph.max_depth("example.com/app"), 3);
        assert_eq!(graph.max_depth("unknown"), 0);

        let dups = graph.duplicate_versions();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups["golang.org/x/text"], vec!["v0.14.0", "v0.3.0"]);
    }

    #[test]
    fn test_max_depth_survives_cycles() {
        let graph = DependencyGraph::parse("root a@v1\na@v1 b@v1\nb@v1 a@v1\n");
        assert_eq!(graph.max_depth("root"), 2);
    }

    #[test]
    fn test_max_depth_on_wide_layered_graph() {
        // Every node of a layer depends on both nodes of the next one.
        let layers = 40;
        let mut output = String::from("root l0a@v1\nroot l0b@v1\n");
        for layer in 0..layers - 1 {
            for from in ["a", "b"] {
                for to in ["a", "b"] {
                    output.push_str(&format!("l{}{}@v1 l{}{}@v1\n", layer, from, layer + 1, to));
                }
            }
        }
        let graph = DependencyGraph::parse(&output);

        let started = std::time::Instant::now();
        assert_eq!(graph.max_depth("root"), layers);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let graph = DependencyGraph::parse(SAMPLE).filter("X/TEXT");
        assert_eq!(graph.total_modules(), 2);
        assert!(graph.nodes.contains_key("golang.org/x/text@v0.3.0"));
        assert_eq!(graph.edges.len(), 1);
    }
}
