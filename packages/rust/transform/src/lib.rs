//! Text-level transforms applied by the build stages.
//!
//! Everything here is a pure `&str -> String` style function; the stages in
//! `libpack-core` own all file I/O.

pub mod exports;
pub mod imports;
pub mod style_block;

pub use exports::{EXPORT_HEADER, has_export_block, is_valid_identifier, prepend_export_block, render_export_block};
pub use imports::{inject_stylesheet_import, references_component_source, stylesheet_import_statement};
pub use style_block::{Extraction, StyleBlock, StyleBlockError, extract_style, find_style_block};
