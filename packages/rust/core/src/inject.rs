//! Stylesheet import injection for component modules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use libpack_shared::{FileKind, LibpackError, Result};
use libpack_transform::inject_stylesheet_import;
use libpack_walker::{FileAction, TreeWalker, WalkReport};

/// Prepend `import '<stylesheet_import>'` to every compiled module under
/// `components_root` that imports a component source.
#[instrument(skip_all, fields(root = %components_root.display(), target = stylesheet_import))]
pub async fn inject_stylesheet_imports(
    walker: &TreeWalker,
    components_root: &Path,
    stylesheet_import: &str,
) -> Result<WalkReport> {
    let target: Arc<str> = Arc::from(stylesheet_import);

    let report = walker
        .walk_files(components_root, move |path| {
            let target = Arc::clone(&target);
            async move { inject_file(path, &target).await }
        })
        .await?;

    info!(
        injected = report.processed,
        skipped = report.skipped,
        failed = report.failures.len(),
        "import injection finished"
    );

    Ok(report)
}

async fn inject_file(path: PathBuf, target: &str) -> Result<FileAction> {
    if FileKind::of(&path) != Some(FileKind::CompiledModule) {
        return Ok(FileAction::Skipped);
    }

    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| LibpackError::io(&path, e))?;

    let Some(updated) = inject_stylesheet_import(&text, target) else {
        return Ok(FileAction::Skipped);
    };

    tokio::fs::write(&path, updated)
        .await
        .map_err(|e| LibpackError::io(&path, e))?;

    debug!(path = %path.display(), "import injected");
    Ok(FileAction::Processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{component_module, make_source_tree, read, temp_dir};

    const TARGET: &str = "./src/main.css";

    #[tokio::test]
    async fn only_modules_importing_a_component_change() {
        let tmp = temp_dir("inject");
        make_source_tree(&tmp);
        let components = tmp.join("components");

        let report = inject_stylesheet_imports(&TreeWalker::default(), &components, TARGET)
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.processed, 2);

        let injected = read(&components, "borderBox1/index.js");
        let original = component_module("BorderBox1");
        assert_eq!(injected, format!("import './src/main.css'\n{original}"));
        assert_eq!(injected.lines().count(), original.lines().count() + 1);

        assert_eq!(read(&components, "plainText/index.js"), "export default {}\n");
        // Modules outside the components directory are never touched.
        assert_eq!(read(&tmp, "util/index.js"), "export function noop () {}\n");
        assert!(!read(&tmp, "index.js").contains("main.css"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn rerun_does_not_duplicate_the_import() {
        let tmp = temp_dir("inject");
        make_source_tree(&tmp);
        let components = tmp.join("components");
        let walker = TreeWalker::default();

        inject_stylesheet_imports(&walker, &components, TARGET).await.unwrap();
        let once = read(&components, "decoration1/index.js");

        let second = inject_stylesheet_imports(&walker, &components, TARGET).await.unwrap();

        assert_eq!(second.processed, 0);
        assert_eq!(read(&components, "decoration1/index.js"), once);
        assert_eq!(once.matches("main.css").count(), 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn missing_components_root_is_an_error() {
        let tmp = temp_dir("inject");

        let result =
            inject_stylesheet_imports(&TreeWalker::default(), &tmp.join("components"), TARGET).await;
        assert!(result.is_err());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
