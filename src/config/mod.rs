// src/config/mod.rs

//! Configuration loading and validation for builddag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate settings and graph structure (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    CompileSpec, ConcatSpec, ConfigFile, ConfigSection, RawConfigFile, RenameSpec, TaskConfig,
    ToolsSection, TransformSpec,
};
