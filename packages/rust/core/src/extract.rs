//! Style extraction: split each component source into a style-source sibling
//! and a style-free component.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use libpack_shared::{FileKind, LibpackError, Result, extensions};
use libpack_transform::extract_style;
use libpack_walker::{FileAction, TreeWalker, WalkReport};

/// Run extraction over every file under `root`.
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn extract_styles(walker: &TreeWalker, root: &Path) -> Result<WalkReport> {
    let report = walker.walk_files(root, extract_file).await?;

    info!(
        extracted = report.processed,
        skipped = report.skipped,
        failed = report.failures.len(),
        "style extraction finished"
    );

    Ok(report)
}

/// Extract the style block of a single component source.
///
/// Files that are not component sources, or have no style block, are left
/// byte-identical and reported as [`FileAction::Skipped`].
pub async fn extract_file(path: PathBuf) -> Result<FileAction> {
    if FileKind::of(&path) != Some(FileKind::ComponentSource) {
        return Ok(FileAction::Skipped);
    }

    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| LibpackError::io(&path, e))?;

    let extraction = match extract_style(&text) {
        Ok(Some(extraction)) => extraction,
        Ok(None) => return Ok(FileAction::Skipped),
        Err(e) => return Err(LibpackError::parse(&path, e.to_string())),
    };

    if let Some(lang) = extraction.block.lang() {
        if lang != extensions::STYLE_SOURCE {
            warn!(path = %path.display(), lang, "style block language differs from the style compiler's");
        }
    }

    let style_path = FileKind::StyleSource.sibling_of(&path);
    tokio::fs::write(&style_path, &extraction.style)
        .await
        .map_err(|e| LibpackError::io(&style_path, e))?;

    tokio::fs::write(&path, &extraction.remainder)
        .await
        .map_err(|e| LibpackError::io(&path, e))?;

    debug!(path = %path.display(), style = %style_path.display(), "style extracted");
    Ok(FileAction::Processed)
}
