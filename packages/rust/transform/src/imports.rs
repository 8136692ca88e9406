//! Stylesheet-import injection for compiled component modules.

use std::sync::LazyLock;

use regex::Regex;

use libpack_shared::extensions::COMPONENT_SOURCE;

/// Matches an `import ... from '<path>.vue'` statement on a single line.
static COMPONENT_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"import[ \S]* from ['"][\S]*\.{}['"]"#,
        regex::escape(COMPONENT_SOURCE)
    ))
    .expect("valid regex")
});

/// Does this module import a component source file?
pub fn references_component_source(module: &str) -> bool {
    COMPONENT_IMPORT_RE.is_match(module)
}

/// The side-effect import statement for `target`, e.g. `import './src/main.css'`.
pub fn stylesheet_import_statement(target: &str) -> String {
    format!("import '{target}'")
}

/// Prepend the stylesheet import to `module` if it qualifies.
///
/// Returns `None` when the module does not import a component source, or when
/// its first line already is the statement (so re-running never duplicates it).
pub fn inject_stylesheet_import(module: &str, target: &str) -> Option<String> {
    if !references_component_source(module) {
        return None;
    }

    let statement = stylesheet_import_statement(target);
    if module.lines().next() == Some(statement.as_str()) {
        return None;
    }

    Some(format!("{statement}\n{module}"))
}
