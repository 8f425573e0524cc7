// src/models.rs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::ROOT_RELATIVE;

// --- MODULE MODELS ---

/// A Go module found during discovery.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Directory containing the `go.mod`, joined onto the discovery root.
    pub path: PathBuf,
    /// Module identity declared in `go.mod` (e.g. `github.com/org/project`).
    pub module: String,
    /// `/`-separated path relative to the workspace root; `"."` for the root module.
    pub relative: String,
    /// True exactly when `relative == "."`.
    pub is_root: bool,
    /// Last segment of the module identity, used for display and exclusions.
    pub name: String,
}

impl ModuleInfo {
    /// Builds a `ModuleInfo`, deriving `is_root` and `name` from the other fields.
    pub fn new(path: impl Into<PathBuf>, module: impl Into<String>, relative: impl Into<String>) -> Self {
        let module = module.into();
        let relative = relative.into();
        let name = short_module_name(&module).to_string();
        Self {
            path: path.into(),
            is_root: relative == ROOT_RELATIVE,
            module,
            relative,
            name,
        }
    }

    /// Human-readable location: "main module" for the root, the relative path otherwise.
    pub fn location(&self) -> &str {
        if self.is_root { "main module" } else { &self.relative }
    }
}

/// Returns the last `/` segment of a module identity.
pub fn short_module_name(module: &str) -> &str {
    module.rsplit_once('/').map_or(module, |(_, last)| last)
}

/// A module together with the local workspace modules it depends on.
#[derive(Debug, Clone)]
pub struct ModuleDependencies {
    pub module: ModuleInfo,
    /// Identities of other local modules, in the order they appear in `go.mod`.
    pub dependencies: Vec<String>,
}

// --- `.modx.toml` MODELS ---

/// Represents the deserialized structure of a `.modx.toml` file.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub modules: ModulesConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ModulesConfig {
    /// Module short names skipped by every multi-module operation (e.g. `magefiles`).
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    /// If set, the raw `go mod graph` output is saved here.
    pub file: Option<PathBuf>,
}
