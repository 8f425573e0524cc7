//! # Manifest Parsing
//!
//! A small, line-oriented reader for `go.mod` files. It only understands the two
//! directives the multi-module machinery needs: the `module` declaration and
//! `replace` directives (single-line and parenthesized block forms).

use crate::{constants::MANIFEST_FILENAME, models::ModuleInfo};
use lazy_static::lazy_static;
use regex::Regex;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

lazy_static! {
    static ref MODULE_DECLARATION: Regex =
        Regex::new(r"^module\s+(\S+)").expect("module declaration pattern is valid");
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read go.mod file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("module name not found in {0}")]
    ModuleNameNotFound(PathBuf),
}

/// Strips a trailing `//` comment and surrounding whitespace from a manifest line.
fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => line.get(..idx).unwrap_or(line).trim(),
        None => line.trim(),
    }
}

/// Extracts the module identity from `go.mod` content.
///
/// Tolerates arbitrary whitespace after the keyword, trailing comments and a
/// double-quoted identity.
pub fn parse_module_name(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = strip_comment(line);
        MODULE_DECLARATION
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
    })
}

/// Reads a `go.mod` file and returns its declared module identity.
pub fn read_module_name(go_mod_path: &Path) -> Result<String, ManifestError> {
    let content = fs::read_to_string(go_mod_path).map_err(|source| ManifestError::Read {
        path: go_mod_path.to_path_buf(),
        source,
    })?;
    parse_module_name(&content).ok_or_else(|| ManifestError::ModuleNameNotFound(go_mod_path.to_path_buf()))
}

/// Returns true if a replacement target is a filesystem path rather than a module coordinate.
fn is_filesystem_path(target: &str) -> bool {
    target == "."
        || target == ".."
        || target.starts_with("./")
        || target.starts_with("../")
        || target.starts_with('/')
}

/// Parses the body of a replace directive (`<identity> [version] => <target> [version]`).
///
/// Returns the replaced identity only when it is one of the `known` local modules and
/// the target is a filesystem path. Anything else contributes no edge.
pub fn parse_replace_directive(line: &str, known: &HashSet<String>) -> Option<String> {
    let (original, replacement) = line.split_once("=>")?;
    let original_module = original.split_whitespace().next()?;
    let target = replacement.split_whitespace().next()?;

    if is_filesystem_path(target) && known.contains(original_module) {
        Some(original_module.to_string())
    } else {
        None
    }
}

/// Scans `go.mod` content for replace directives that point at other local modules.
///
/// Identities are returned in file order; duplicates are kept.
pub fn parse_local_dependencies(content: &str, known: &HashSet<String>) -> Vec<String> {
    let mut dependencies = Vec::new();
    let mut in_replace_block = false;

    for raw_line in content.lines() {
        let line = strip_comment(raw_line);

        if in_replace_block {
            if line == ")" {
                in_replace_block = false;
            } else if let Some(dep) = parse_replace_directive(line, known) {
                dependencies.push(dep);
            }
            continue;
        }

        let Some(after_keyword) = line.strip_prefix("replace") else {
            continue;
        };
        let rest = after_keyword.trim_start();
        if rest.starts_with('(') {
            // `replace (` may carry a first directive on the same line, e.g. `replace ( a => ./a`.
            let inline = rest.trim_start_matches('(').trim();
            if inline == ")" {
                continue;
            }
            in_replace_block = true;
            if let Some(dep) = parse_replace_directive(inline, known) {
                dependencies.push(dep);
            }
        } else if after_keyword.starts_with(char::is_whitespace) {
            if let Some(dep) = parse_replace_directive(rest, known) {
                dependencies.push(dep);
            }
        }
    }

    dependencies
}

/// Reads a module's `go.mod` and returns the local modules it depends on.
pub fn parse_module_dependencies(
    module: &ModuleInfo,
    known: &HashSet<String>,
) -> Result<Vec<String>, ManifestError> {
    let go_mod_path = module.path.join(MANIFEST_FILENAME);
    let content = fs::read_to_string(&go_mod_path).map_err(|source| ManifestError::Read {
        path: go_mod_path.clone(),
        source,
    })?;
    let dependencies = parse_local_dependencies(&content, known);
    log::trace!("{} depends on local modules {:?}", module.module, dependencies);
    Ok(dependencies)
}
