// src/core/graph_display.rs

use crate::core::mod_graph::{DependencyGraph, DependencyNode, parse_module_name_version};
use serde::Serialize;
use std::{
    collections::{BTreeMap, HashSet},
    io::Write,
    str::FromStr,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("unsupported format: {0} (supported: tree, json, dot, mermaid)")]
    UnsupportedFormat(String),
    #[error("Root module not found in graph: {0}")]
    RootNotFound(String),
    #[error("Failed to write graph: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize graph to JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output formats for the module graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphFormat {
    #[default]
    Tree,
    Json,
    Dot,
    Mermaid,
}

impl FromStr for GraphFormat {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tree" => Ok(Self::Tree),
            "json" => Ok(Self::Json),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(GraphError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Options for the tree rendering.
#[derive(Debug, Clone, Copy)]
pub struct DisplayOptions {
    pub show_versions: bool,
    /// 0 means unlimited; otherwise nodes at exactly this depth are still shown.
    pub max_depth: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_versions: true,
            max_depth: 0,
        }
    }
}

/// Renders the graph in `format`. `root` is the main module key (tree and JSON start there).
pub fn render(
    graph: &DependencyGraph,
    root: &str,
    format: GraphFormat,
    options: &DisplayOptions,
    out: &mut dyn Write,
) -> Result<(), GraphError> {
    match format {
        GraphFormat::Tree => render_tree(graph, root, options, out),
        GraphFormat::Json => render_json(graph, root, out),
        GraphFormat::Dot => render_dot(graph, out),
        GraphFormat::Mermaid => render_mermaid(graph, out),
    }
}

// --- Tree ---

pub fn render_tree(
    graph: &DependencyGraph,
    root: &str,
    options: &DisplayOptions,
    out: &mut dyn Write,
) -> Result<(), GraphError> {
    let root_node = graph
        .nodes
        .get(root)
        .ok_or_else(|| GraphError::RootNotFound(root.to_string()))?;
    let mut on_path = HashSet::new();
    print_node(graph, root_node, "", true, options, 0, &mut on_path, out)
}

/// Recursive function to print a tree node and its descendants.
fn print_node(
    graph: &DependencyGraph,
    node: &DependencyNode,
    prefix: &str,
    is_last: bool,
    options: &DisplayOptions,
    depth: usize,
    on_path: &mut HashSet<String>,
    out: &mut dyn Write,
) -> Result<(), GraphError> {
    if options.max_depth > 0 && depth > options.max_depth {
        return Ok(());
    }

    let connector = if is_last { "└── " } else { "├── " };
    let mut label = node.name.clone();
    if options.show_versions && !node.version.is_empty() {
        label = format!("{}@{}", label, node.version);
    }

    if on_path.contains(&label) {
        writeln!(out, "{}{}{} (cycle detected)", prefix, connector, label)?;
        return Ok(());
    }
    writeln!(out, "{}{}{}", prefix, connector, label)?;
    on_path.insert(label.clone());

    let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
    let children: Vec<&DependencyNode> = node
        .dependencies
        .iter()
        .filter_map(|key| graph.nodes.get(key))
        .collect();
    for (i, child) in children.iter().enumerate() {
        let is_last_child = i + 1 == children.len();
        print_node(graph, child, &child_prefix, is_last_child, options, depth + 1, on_path, out)?;
    }

    // The same module may legitimately appear again in a different subtree.
    on_path.remove(&label);
    Ok(())
}

// --- JSON ---

#[derive(Serialize, Debug)]
struct JsonNode {
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<JsonNode>,
}

fn to_json_node(graph: &DependencyGraph, key: &str, node: &DependencyNode, expanded: &mut HashSet<String>) -> JsonNode {
    let mut json = JsonNode {
        name: node.name.clone(),
        version: node.version.clone(),
        dependencies: Vec::new(),
    };
    if expanded.insert(key.to_string()) {
        json.dependencies = node
            .dependencies
            .iter()
            .filter_map(|dep| graph.nodes.get(dep).map(|n| (dep, n)))
            .map(|(dep, n)| to_json_node(graph, dep, n, expanded))
            .collect();
    }
    json
}

pub fn render_json(graph: &DependencyGraph, root: &str, out: &mut dyn Write) -> Result<(), GraphError> {
    let root_node = graph
        .nodes
        .get(root)
        .ok_or_else(|| GraphError::RootNotFound(root.to_string()))?;
    let json = to_json_node(graph, root, root_node, &mut HashSet::new());
    serde_json::to_writer_pretty(&mut *out, &json)?;
    writeln!(out)?;
    Ok(())
}

// --- DOT ---

pub fn render_dot(graph: &DependencyGraph, out: &mut dyn Write) -> Result<(), GraphError> {
    writeln!(out, "digraph dependencies {{")?;
    writeln!(out, "  rankdir=TB;")?;
    writeln!(out, "  node [shape=box, style=rounded];")?;
    writeln!(out)?;

    for node in graph.nodes.values() {
        let label = if node.version.is_empty() {
            node.name.clone()
        } else {
            format!("{}\\n{}", node.name, node.version)
        };
        writeln!(out, "  \"{}\" [label=\"{}\"];", node.name, label)?;
    }
    writeln!(out)?;

    for (parent, deps) in &graph.edges {
        let (parent_name, _) = parse_module_name_version(parent);
        for dep in deps {
            let (dep_name, _) = parse_module_name_version(dep);
            writeln!(out, "  \"{}\" -> \"{}\";", parent_name, dep_name)?;
        }
    }

    writeln!(out, "}}")?;
    Ok(())
}

// --- Mermaid ---

pub fn render_mermaid(graph: &DependencyGraph, out: &mut dyn Write) -> Result<(), GraphError> {
    writeln!(out, "graph TD;")?;

    let mut node_ids: BTreeMap<&str, String> = BTreeMap::new();
    for (i, (key, node)) in graph.nodes.iter().enumerate() {
        let id = format!("N{}", i + 1);
        let label = if node.version.is_empty() {
            node.name.clone()
        } else {
            format!("{}<br/>{}", node.name, node.version)
        };
        writeln!(out, "  {}[\"{}\"];", id, label)?;
        node_ids.insert(key, id);
    }
    writeln!(out)?;

    for (parent, deps) in &graph.edges {
        let Some(parent_id) = node_ids.get(parent.as_str()) else {
            continue;
        };
        // Edges into nodes removed by a filter have no id to point at.
        for dep_id in deps.iter().filter_map(|dep| node_ids.get(dep.as_str())) {
            writeln!(out, "  {} --> {};", parent_id, dep_id)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(f: impl FnOnce(&mut Vec<u8>) -> Result<(), GraphError>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn sample() -> DependencyGraph {
        DependencyGraph::parse(
            "app a@v1\napp b@v2\na@v1 c@v3\nb@v2 c@v3\n",
        )
    }

    #[test]
    fn test_tree_rendering_with_versions() {
        let out = rendered(|buf| render_tree(&sample(), "app", &DisplayOptions::default(), buf));
        assert_eq!(
            out,
            "└── app\n    ├── a@v1\n    │   └── c@v3\n    └── b@v2\n        └── c@v3\n"
        );
    }

    #[test]
    fn test_tree_depth_limit_and_hidden_versions() {
        let options = DisplayOptions {
            show_versions: false,
            max_depth: 1,
        };
        let out = rendered(|buf| render_tree(&sample(), "app", &options, buf));
        assert_eq!(out, "└── app\n    ├── a\n    └── b\n");
    }

    #[test]
    fn test_tree_marks_cycles() {
        let graph = DependencyGraph::parse("app a@v1\na@v1 b@v1\nb@v1 a@v1\n");
        let out = rendered(|buf| render_tree(&graph, "app", &DisplayOptions::default(), buf));
        assert!(out.contains("a@v1 (cycle detected)"));
        assert_eq!(out.lines().count(), 4);
    }

    #[test]
    fn test_missing_root_is_reported() {
        let mut buf = Vec::new();
        let err = render_tree(&sample(), "other", &DisplayOptions::default(), &mut buf).unwrap_err();
        assert!(matches!(err, GraphError::RootNotFound(_)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_json_expands_each_node_once() {
        let out = rendered(|buf| render_json(&sample(), "app", buf));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["name"], "app");
        assert!(value.get("version").is_none());
        assert_eq!(value["dependencies"][0]["dependencies"][0]["name"], "c");
        // `c@v3` was already expanded under `a@v1`.
        assert!(value["dependencies"][1]["dependencies"][0].get("dependencies").is_none());
    }

    #[test]
    fn test_dot_output() {
        let out = rendered(|buf| render_dot(&sample(), buf));
        assert!(out.starts_with("digraph dependencies {\n  rankdir=TB;\n"));
        assert!(out.contains("  \"a\" [label=\"a\\nv1\"];\n"));
        assert!(out.contains("  \"app\" -> \"a\";\n"));
        assert!(out.trim_end().ends_with('}'));
    }

    #[test]
    fn test_mermaid_output_skips_filtered_edges() {
        let graph = sample().filter("a");
        let out = rendered(|buf| render_mermaid(&graph, buf));
        assert_eq!(out, "graph TD;\n  N1[\"a<br/>v1\"];\n  N2[\"app\"];\n\n  N2 --> N1;\n");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("MERMAID".parse::<GraphFormat>().unwrap(), GraphFormat::Mermaid);
        let err = "svg".parse::<GraphFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported format: svg (supported: tree, json, dot, mermaid)");
    }
}
