//! Directory-tree traversal and filesystem primitives.
//!
//! This crate provides:
//! - [`engine`]: the concurrent [`TreeWalker`] every pipeline stage is built on
//! - [`fsops`]: whole-tree copy and delete-by-extension

pub mod engine;
pub mod fsops;

pub use engine::{DEFAULT_CONCURRENCY, DirEntryInfo, FileAction, FileFailure, TreeWalker, WalkReport};
pub use fsops::{copy_tree, delete_by_extension};
