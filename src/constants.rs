// src/constants.rs

/// The manifest file that marks a directory as a Go module root.
pub const MANIFEST_FILENAME: &str = "go.mod";

/// Directories with this name are never walked during discovery.
pub const VENDOR_DIR: &str = "vendor";

/// The one hidden directory that discovery still walks (it may host nested action modules).
pub const CI_METADATA_DIR: &str = ".github";

/// The relative path reported for the module at the workspace root.
pub const ROOT_RELATIVE: &str = ".";

/// The name of the project configuration file (at the workspace root).
pub const PROJECT_CONFIG_FILENAME: &str = ".modx.toml";

/// Overrides `modules.exclude` with a comma-separated list of module names.
pub const ENV_EXCLUDE_MODULES: &str = "MODX_EXCLUDE_MODULES";

/// Overrides `graph.file`, where the raw `go mod graph` output is saved.
pub const ENV_GRAPH_FILE: &str = "MODX_GRAPH_FILE";
