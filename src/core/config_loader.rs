//! # Config Loader
//!
//! Loads the optional `.modx.toml` at the workspace root and layers environment
//! variable overrides on top. A missing file is not an error: every field has a default.

use crate::{
    constants::{ENV_EXCLUDE_MODULES, ENV_GRAPH_FILE, PROJECT_CONFIG_FILENAME},
    models::ProjectConfig,
};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Loads the project configuration for the workspace at `root`, including environment overrides.
pub fn load_project_config(root: &Path) -> Result<ProjectConfig, ConfigError> {
    let mut config = load_config_file(root)?;
    apply_env_overrides(&mut config, |key| env::var(key).ok());
    Ok(config)
}

/// Reads `.modx.toml` without applying overrides.
pub fn load_config_file(root: &Path) -> Result<ProjectConfig, ConfigError> {
    let path = root.join(PROJECT_CONFIG_FILENAME);
    if !path.is_file() {
        log::debug!("No {} at '{}', using defaults", PROJECT_CONFIG_FILENAME, root.display());
        return Ok(ProjectConfig::default());
    }

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
    log::debug!("Loaded project config from '{}'", path.display());
    Ok(config)
}

/// Applies `MODX_*` overrides. `lookup` abstracts the environment so tests need not mutate it.
pub fn apply_env_overrides(config: &mut ProjectConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(value) = lookup(ENV_EXCLUDE_MODULES).filter(|v| !v.trim().is_empty()) {
        config.modules.exclude = value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        log::debug!("Module exclusions overridden by {}: {:?}", ENV_EXCLUDE_MODULES, config.modules.exclude);
    }

    if let Some(value) = lookup(ENV_GRAPH_FILE).filter(|v| !v.trim().is_empty()) {
        config.graph.file = Some(PathBuf::from(value.trim()));
    }
}
