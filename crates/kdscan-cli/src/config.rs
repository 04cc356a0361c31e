//! Sweep configuration assembled from a TOML file, CLI overrides and defaults.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;
