//! Barrel export block for the package entrypoint.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

/// Header comment that opens the generated block.
pub const EXPORT_HEADER: &str = "/**\n * EXPORT COMPONENTS\n */";

/// Is `name` usable as a JavaScript binding name?
pub fn is_valid_identifier(name: &str) -> bool {
    static IDENT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid regex"));

    IDENT_RE.is_match(name)
}

/// Render the export block: header, one re-export per component in the given
/// order, then a blank line.
pub fn render_export_block(components_dir: &str, components: &[String]) -> String {
    let dir = components_dir.trim_matches('/');
    let mut block = String::from(EXPORT_HEADER);
    block.push('\n');

    for name in components {
        // Writing into a String cannot fail.
        let _ = writeln!(block, "export {{ default as {name} }} from './{dir}/{name}/index'");
    }

    block.push('\n');
    block
}

/// Whether the entrypoint already carries a generated block.
pub fn has_export_block(entrypoint: &str) -> bool {
    entrypoint.starts_with(EXPORT_HEADER)
}

pub fn prepend_export_block(entrypoint: &str, block: &str) -> String {
    let mut out = String::with_capacity(block.len() + entrypoint.len());
    out.push_str(block);
    out.push_str(entrypoint);
    out
}
