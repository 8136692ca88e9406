//! Build stages and pipeline orchestration for libpack.
//!
//! This crate ties the tree walker and the text transforms together into the
//! staged build (`run_build`): copy, extract styles, compile styles, remove
//! style sources, inject stylesheet imports, aggregate exports, promote, bundle.

pub mod aggregate;
pub mod compile;
pub mod extract;
pub mod inject;
pub mod pipeline;
pub mod toolchain;
pub mod worktree;

#[cfg(test)]
pub(crate) mod testutil;
