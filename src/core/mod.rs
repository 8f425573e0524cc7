// src/core/mod.rs

pub mod config_loader;
pub mod dependency_sort;
pub mod discovery;
pub mod graph_display;
pub mod manifest;
pub mod mod_graph;
pub mod orchestrator;
pub mod report;
