//! # Module Discovery
//!
//! Walks a workspace tree and collects every directory that directly contains a
//! `go.mod`. `vendor` trees and hidden directories are pruned, except for the CI
//! metadata directory, which commonly hosts nested action modules.

use crate::{
    constants::{CI_METADATA_DIR, MANIFEST_FILENAME, ROOT_RELATIVE, VENDOR_DIR},
    core::manifest,
    models::ModuleInfo,
};
use std::{
    env,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("failed to get working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),
    #[error("failed to walk directory tree at '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to read root module: {0}")]
    RootManifest(#[from] manifest::ManifestError),
}

/// Discovers all modules below the current working directory.
pub fn find_all_modules() -> Result<Vec<ModuleInfo>, DiscoveryError> {
    let root = env::current_dir().map_err(DiscoveryError::WorkingDirectory)?;
    find_all_modules_in(&root)
}

/// Discovers all modules below `root`, root module first and the rest sorted by relative path.
pub fn find_all_modules_in(root: &Path) -> Result<Vec<ModuleInfo>, DiscoveryError> {
    log::debug!("Discovering modules under '{}'", root.display());
    let mut modules = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_pruned_dir(entry));

    for entry in walker {
        let entry = entry.map_err(|source| DiscoveryError::Walk {
            path: source.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
            source,
        })?;

        if !entry.file_type().is_file() || entry.file_name() != MANIFEST_FILENAME {
            continue;
        }

        let Some(dir) = entry.path().parent() else {
            continue;
        };
        let relative = relative_path(root, dir);

        match manifest::read_module_name(entry.path()) {
            Ok(module_name) => modules.push(ModuleInfo::new(dir, module_name, relative)),
            Err(e) if relative == ROOT_RELATIVE => return Err(e.into()),
            Err(e) => {
                log::warn!("Skipping module at '{}': {}", relative, e);
            }
        }
    }

    sort_modules(&mut modules);
    log::debug!("Discovered {} module(s)", modules.len());
    Ok(modules)
}

/// Returns true for directories that must not be walked.
fn is_pruned_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if name == VENDOR_DIR {
        return true;
    }
    name.starts_with('.') && name != CI_METADATA_DIR
}

/// Computes the `/`-separated path of `dir` relative to `root`, or `"."` for the root itself.
fn relative_path(root: &Path, dir: &Path) -> String {
    let Ok(stripped) = dir.strip_prefix(root) else {
        return dir.to_string_lossy().into_owned();
    };
    let parts: Vec<_> = stripped
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        ROOT_RELATIVE.to_string()
    } else {
        parts.join("/")
    }
}

/// Sorts modules with the root module first, then alphabetically by relative path.
pub fn sort_modules(modules: &mut [ModuleInfo]) {
    modules.sort_by(|a, b| {
        b.is_root
            .cmp(&a.is_root)
            .then_with(|| a.relative.cmp(&b.relative))
    });
}
