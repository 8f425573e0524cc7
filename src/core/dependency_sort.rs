//! # Dependency Sorter
//!
//! Orders workspace modules so that every module comes after the local modules it
//! depends on (via path `replace` directives). Cyclic graphs fall back to the
//! discovery ordering.

use crate::{
    core::{discovery::sort_modules, manifest},
    models::{ModuleDependencies, ModuleInfo},
};
use std::collections::{BTreeSet, HashMap, HashSet};

/// The result of ordering modules by their local dependencies.
#[derive(Debug, Clone, Default)]
pub struct DependencyOrder {
    /// Modules in execution order.
    pub modules: Vec<ModuleInfo>,
    /// Module identity -> identities of the local modules it depends on.
    pub dependencies: HashMap<String, Vec<String>>,
    /// True if a cycle forced the root-first fallback ordering.
    pub cycle_detected: bool,
}

/// Reads every module's `go.mod` and resolves its dependencies on the other modules in the set.
///
/// A manifest that cannot be read aborts the whole resolution: dropping it would hide edges.
pub fn resolve_dependencies(
    modules: &[ModuleInfo],
) -> Result<Vec<ModuleDependencies>, manifest::ManifestError> {
    let known: HashSet<String> = modules.iter().map(|m| m.module.clone()).collect();
    modules
        .iter()
        .map(|module| {
            Ok(ModuleDependencies {
                dependencies: manifest::parse_module_dependencies(module, &known)?,
                module: module.clone(),
            })
        })
        .collect()
}

/// Topologically sorts modules by their local dependencies (dependencies first).
pub fn sort_modules_by_dependency(
    modules: Vec<ModuleInfo>,
) -> Result<DependencyOrder, manifest::ManifestError> {
    let resolved = resolve_dependencies(&modules)?;
    Ok(order_modules(resolved))
}

/// Orders pre-resolved modules. Split out from I/O so the algorithm can be exercised directly.
pub fn order_modules(resolved: Vec<ModuleDependencies>) -> DependencyOrder {
    let mut entries = resolved;
    // Ties are broken by the discovery ordering: root first, then relative path.
    entries.sort_by(|a, b| {
        b.module
            .is_root
            .cmp(&a.module.is_root)
            .then_with(|| a.module.relative.cmp(&b.module.relative))
    });

    let dependencies: HashMap<String, Vec<String>> = entries
        .iter()
        .map(|e| (e.module.module.clone(), e.dependencies.clone()))
        .collect();
    let mut modules: Vec<ModuleInfo> = entries.iter().map(|e| e.module.clone()).collect();

    if entries.len() <= 1 || entries.iter().all(|e| e.dependencies.is_empty()) {
        sort_modules(&mut modules);
        return DependencyOrder {
            modules,
            dependencies,
            cycle_detected: false,
        };
    }

    // Identities can in principle repeat across directories, so edges fan out to every match.
    let mut indices_by_identity: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, entry) in entries.iter().enumerate() {
        indices_by_identity
            .entry(entry.module.module.as_str())
            .or_default()
            .push(idx);
    }

    let mut in_degree = vec![0usize; entries.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
    for (idx, entry) in entries.iter().enumerate() {
        let mut seen = HashSet::new();
        for dep in &entry.dependencies {
            for &dep_idx in indices_by_identity.get(dep.as_str()).into_iter().flatten() {
                if dep_idx == idx {
                    log::debug!("Ignoring self-replace in {}", entry.module.module);
                    continue;
                }
                if seen.insert(dep_idx) {
                    if let Some(slot) = in_degree.get_mut(idx) {
                        *slot += 1;
                    }
                    if let Some(list) = dependents.get_mut(dep_idx) {
                        list.push(idx);
                    }
                }
            }
        }
    }

    // Kahn's algorithm; the ready set yields the lowest discovery index first.
    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(idx, _)| idx)
        .collect();
    let mut sorted_indices = Vec::with_capacity(entries.len());

    while let Some(current) = ready.pop_first() {
        sorted_indices.push(current);
        for &dependent in dependents.get(current).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }

    if sorted_indices.len() != entries.len() {
        log::warn!("Circular dependencies detected between local modules, falling back to root-first ordering");
        sort_modules(&mut modules);
        return DependencyOrder {
            modules,
            dependencies,
            cycle_detected: true,
        };
    }

    let sorted = sorted_indices
        .into_iter()
        .filter_map(|idx| modules.get(idx).cloned())
        .collect();

    DependencyOrder {
        modules: sorted,
        dependencies,
        cycle_detected: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    fn write_go_mod(root: &Path, relative: &str, content: &str) -> ModuleInfo {
        let dir = root.join(relative);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("go.mod"), content).unwrap();
        let module = manifest::parse_module_name(content).unwrap();
        ModuleInfo::new(dir, module, relative)
    }

    fn identities(order: &DependencyOrder) -> Vec<&str> {
        order.modules.iter().map(|m| m.module.as_str()).collect()
    }

    fn resolved(module: &str, relative: &str, deps: &[&str]) -> ModuleDependencies {
        ModuleDependencies {
            module: ModuleInfo::new(format!("/ws/{}", relative), module, relative),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn test_linear_chain_sorts_dependencies_first() {
        let ws = TempDir::new().unwrap();
        let root = write_go_mod(
            ws.path(),
            ".",
            "module github.com/x/root\n\nreplace github.com/x/api => ./api\n",
        );
        let api = write_go_mod(
            ws.path(),
            "api",
            "module github.com/x/api\n\nreplace github.com/x/core => ../core\n",
        );
        let core = write_go_mod(ws.path(), "core", "module github.com/x/core\n");

        let order = sort_modules_by_dependency(vec![root, api, core]).unwrap();
        assert_eq!(
            identities(&order),
            vec!["github.com/x/core", "github.com/x/api", "github.com/x/root"]
        );
        assert!(!order.cycle_detected);
        assert_eq!(order.dependencies["github.com/x/api"], vec!["github.com/x/core"]);
    }

    #[test]
    fn test_two_cycle_falls_back_to_root_first_order() {
        let ws = TempDir::new().unwrap();
        let b = write_go_mod(ws.path(), "b", "module example.com/b\nreplace example.com/a => ../a\n");
        let a = write_go_mod(ws.path(), "a", "module example.com/a\nreplace example.com/b => ../b\n");

        let order = sort_modules_by_dependency(vec![b, a]).unwrap();
        assert!(order.cycle_detected);
        assert_eq!(identities(&order), vec!["example.com/a", "example.com/b"]);
    }

    #[test]
    fn test_coordinate_replace_creates_no_edge() {
        let ws = TempDir::new().unwrap();
        let root = write_go_mod(
            ws.path(),
            ".",
            "module example.com/root\nreplace example.com/root/lib => example.com/fork/lib v1.0.0\n",
        );
        let lib = write_go_mod(ws.path(), "lib", "module example.com/root/lib\n");

        let order = sort_modules_by_dependency(vec![lib, root]).unwrap();
        assert_eq!(identities(&order), vec!["example.com/root", "example.com/root/lib"]);
        assert!(order.dependencies["example.com/root"].is_empty());
    }

    #[test]
    fn test_unreadable_manifest_aborts_sort() {
        let ws = TempDir::new().unwrap();
        let root = write_go_mod(ws.path(), ".", "module example.com/root\n");
        let ghost = ModuleInfo::new(ws.path().join("ghost"), "example.com/ghost", "ghost");

        let err = sort_modules_by_dependency(vec![root, ghost]).unwrap_err();
        assert!(matches!(err, manifest::ManifestError::Read { .. }));
    }

    #[test]
    fn test_independent_modules_keep_discovery_ties() {
        let order = order_modules(vec![
            resolved("example.com/tools", "tools", &[]),
            resolved("example.com/api", "api", &["example.com/shared"]),
            resolved("example.com/root", ".", &[]),
            resolved("example.com/shared", "shared", &[]),
        ]);
        assert_eq!(
            identities(&order),
            vec![
                "example.com/root",
                "example.com/shared",
                "example.com/api",
                "example.com/tools"
            ]
        );
    }

    #[test]
    fn test_diamond_and_duplicate_edges() {
        let order = order_modules(vec![
            resolved("r", ".", &["l", "rt", "l"]),
            resolved("l", "left", &["base"]),
            resolved("rt", "right", &["base"]),
            resolved("base", "base", &[]),
        ]);
        assert_eq!(identities(&order), vec!["base", "l", "rt", "r"]);
    }

    #[test]
    fn test_self_edge_is_ignored() {
        let order = order_modules(vec![
            resolved("r", ".", &["r"]),
            resolved("a", "a", &[]),
        ]);
        assert!(!order.cycle_detected);
        assert_eq!(identities(&order), vec!["r", "a"]);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(order_modules(Vec::new()).modules.is_empty());
        let order = order_modules(vec![resolved("only", ".", &[])]);
        assert_eq!(identities(&order), vec!["only"]);
    }
}
