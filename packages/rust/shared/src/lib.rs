//! Shared types, error model, and configuration for libpack.
//!
//! This crate is the foundation depended on by all other libpack crates.
//! It provides:
//! - [`LibpackError`]: the unified error type
//! - The fixed file-extension contract ([`extensions`], [`FileKind`]) and [`GenerationId`]
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, BundlerConfig, PathsConfig, StyleCompilerConfig, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{LibpackError, Result};
pub use types::{FileKind, GenerationId, extensions};
