//! Export aggregation: enumerate component directories and prepend the barrel
//! export block to the package entrypoint.

use std::path::Path;

use tracing::{info, instrument};

use libpack_shared::{LibpackError, Result};
use libpack_transform::{
    has_export_block, is_valid_identifier, prepend_export_block, render_export_block,
};
use libpack_walker::TreeWalker;

/// Names of the immediate subdirectories of `components_root`, sorted.
///
/// Dot-directories are ignored. A name that is not a valid JavaScript
/// identifier fails the whole stage, since it cannot be re-exported.
pub async fn component_names(walker: &TreeWalker, components_root: &Path) -> Result<Vec<String>> {
    let entries = walker.walk_entries(components_root).await?;

    let (names, invalid): (Vec<String>, Vec<String>) = entries
        .into_iter()
        .filter(|e| e.is_dir && !e.name.starts_with('.'))
        .map(|e| e.name)
        .partition(|name| is_valid_identifier(name));

    if !invalid.is_empty() {
        return Err(LibpackError::validation(format!(
            "not valid export names in {}: {}",
            components_root.display(),
            invalid.join(", ")
        )));
    }

    Ok(names)
}

/// Prepend one re-export per component directory to `entrypoint`.
///
/// Returns the exported component names in the order they were written.
#[instrument(skip_all, fields(root = %components_root.display(), entrypoint = %entrypoint.display()))]
pub async fn aggregate_exports(
    walker: &TreeWalker,
    components_root: &Path,
    components_dir_name: &str,
    entrypoint: &Path,
) -> Result<Vec<String>> {
    let names = component_names(walker, components_root).await?;

    let original = tokio::fs::read_to_string(entrypoint)
        .await
        .map_err(|e| LibpackError::io(entrypoint, e))?;

    if has_export_block(&original) {
        return Err(LibpackError::validation(format!(
            "{} already starts with an export block",
            entrypoint.display()
        )));
    }

    let block = render_export_block(components_dir_name, &names);
    tokio::fs::write(entrypoint, prepend_export_block(&original, &block))
        .await
        .map_err(|e| LibpackError::io(entrypoint, e))?;

    info!(components = names.len(), "export block written");
    Ok(names)
}
