//! Style compilation and style-source cleanup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use libpack_shared::{FileKind, LibpackError, Result, extensions};
use libpack_walker::{FileAction, TreeWalker, WalkReport, delete_by_extension};

use crate::toolchain::Toolchain;

/// Compile every style-source file under `root` into a sibling stylesheet.
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn compile_styles<T: Toolchain>(
    walker: &TreeWalker,
    root: &Path,
    toolchain: Arc<T>,
) -> Result<WalkReport> {
    let report = walker
        .walk_files(root, move |path| {
            let toolchain = Arc::clone(&toolchain);
            async move { compile_file(toolchain.as_ref(), path).await }
        })
        .await?;

    info!(
        compiled = report.processed,
        failed = report.failures.len(),
        "style compilation finished"
    );

    Ok(report)
}

async fn compile_file<T: Toolchain>(toolchain: &T, path: PathBuf) -> Result<FileAction> {
    if FileKind::of(&path) != Some(FileKind::StyleSource) {
        return Ok(FileAction::Skipped);
    }

    let output = FileKind::CompiledStylesheet.sibling_of(&path);
    toolchain.compile_style(&path, &output).await?;

    debug!(input = %path.display(), output = %output.display(), "compiled");
    Ok(FileAction::Processed)
}

/// Delete every style-source file under `root`. Returns how many were removed.
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn remove_style_sources(root: &Path) -> Result<usize> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || delete_by_extension(&root, &[extensions::STYLE_SOURCE]))
        .await
        .map_err(|e| LibpackError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeToolchain, read, temp_dir, write};
    use libpack_walker::TreeWalker;

    fn style_tree() -> PathBuf {
        let tmp = temp_dir("compile");
        write(&tmp, "a/src/main.less", ".a { }");
        write(&tmp, "b/src/main.less", ".b { }");
        write(&tmp, "c/src/main.less", ".c { }");
        write(&tmp, "c/src/main.vue", "<template/>");
        write(&tmp, "index.js", "export {}");
        tmp
    }

    #[tokio::test]
    async fn every_style_source_gets_a_stylesheet() {
        let tmp = style_tree();
        let toolchain = Arc::new(FakeToolchain::default());

        let report = compile_styles(&TreeWalker::default(), &tmp, Arc::clone(&toolchain))
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.processed, 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(toolchain.compile_count(), 3);
        for name in ["a", "b", "c"] {
            let css = read(&tmp, &format!("{name}/src/main.css"));
            assert!(css.ends_with(&format!(".{name} {{ }}")));
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn one_compiler_failure_still_attempts_the_rest() {
        let tmp = style_tree();
        let toolchain = Arc::new(FakeToolchain {
            fail_compile_for: Some("b/src".into()),
            ..FakeToolchain::default()
        });

        let report = compile_styles(&TreeWalker::new(2), &tmp, Arc::clone(&toolchain))
            .await
            .unwrap();

        assert_eq!(toolchain.compile_count(), 3);
        assert_eq!(report.processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(!tmp.join("b/src/main.css").exists());
        assert!(tmp.join("a/src/main.css").exists());
        assert!(tmp.join("c/src/main.css").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn cleanup_leaves_no_style_sources() {
        let tmp = style_tree();

        assert_eq!(remove_style_sources(&tmp).await.unwrap(), 3);
        assert_eq!(remove_style_sources(&tmp).await.unwrap(), 0);

        let (files, _) = TreeWalker::list_files(&tmp).unwrap();
        assert!(files.iter().all(|p| FileKind::of(p) != Some(FileKind::StyleSource)));
        assert!(tmp.join("c/src/main.vue").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
