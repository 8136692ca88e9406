//! Whole-tree filesystem primitives: recursive copy and delete-by-extension.
//!
//! These are blocking; async callers run them on `spawn_blocking`.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use libpack_shared::{LibpackError, Result};

/// Convert a `walkdir` error into an I/O error carrying the offending path.
pub(crate) fn walk_error(root: &Path, err: walkdir::Error) -> LibpackError {
    let path = err.path().unwrap_or(root).to_path_buf();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    LibpackError::io(path, source)
}

/// Recursively copy `src` into `dst`, creating `dst` if needed.
///
/// Returns the number of files copied. Symlinks are followed and copied as
/// regular files.
#[instrument(skip_all, fields(src = %src.display(), dst = %dst.display()))]
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    if !src.is_dir() {
        return Err(LibpackError::validation(format!(
            "source {} is not a directory",
            src.display()
        )));
    }
    if dst.starts_with(src) {
        return Err(LibpackError::validation(format!(
            "destination {} is inside source {}",
            dst.display(),
            src.display()
        )));
    }

    std::fs::create_dir_all(dst).map_err(|e| LibpackError::io(dst, e))?;

    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(src, e))?;
        let relative = entry.path().strip_prefix(src).map_err(|_| {
            LibpackError::validation(format!(
                "{} escaped the source tree",
                entry.path().display()
            ))
        })?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| LibpackError::io(&target, e))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| LibpackError::io(parent, e))?;
            }
            std::fs::copy(entry.path(), &target).map_err(|e| LibpackError::io(entry.path(), e))?;
            copied += 1;
        }
    }

    info!(files = copied, "tree copied");
    Ok(copied)
}

/// Delete every file under `root` whose extension is one of `extensions`.
///
/// Idempotent: a second call finds nothing and returns `Ok(0)`.
#[instrument(skip_all, fields(root = %root.display(), ?extensions))]
pub fn delete_by_extension(root: &Path, extensions: &[&str]) -> Result<usize> {
    let mut doomed: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if entry.file_type().is_file() && matches {
            doomed.push(entry.into_path());
        }
    }

    for path in &doomed {
        std::fs::remove_file(path).map_err(|e| LibpackError::io(path, e))?;
        debug!(path = %path.display(), "deleted");
    }

    info!(deleted = doomed.len(), "delete-by-extension complete");
    Ok(doomed.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "libpack-fsops-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn copy_tree_mirrors_structure() {
        let tmp = temp_dir();
        let src = tmp.join("src");
        std::fs::create_dir_all(src.join("components/box/src")).unwrap();
        std::fs::create_dir_all(src.join("empty")).unwrap();
        std::fs::write(src.join("index.js"), "export {}\n").unwrap();
        std::fs::write(src.join("components/box/src/main.vue"), "<template/>").unwrap();

        let dst = tmp.join("lib");
        let copied = copy_tree(&src, &dst).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(
            std::fs::read_to_string(dst.join("components/box/src/main.vue")).unwrap(),
            "<template/>"
        );
        assert!(dst.join("empty").is_dir());
        // Source untouched.
        assert!(src.join("index.js").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn copy_tree_rejects_missing_source() {
        let tmp = temp_dir();
        assert!(copy_tree(&tmp.join("nope"), &tmp.join("out")).is_err());
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn copy_tree_rejects_destination_inside_source() {
        let tmp = temp_dir();
        let err = copy_tree(&tmp, &tmp.join("nested")).unwrap_err();
        assert!(err.to_string().contains("inside source"));
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn delete_by_extension_is_idempotent() {
        let tmp = temp_dir();
        std::fs::create_dir_all(tmp.join("a/b")).unwrap();
        std::fs::write(tmp.join("a/main.less"), "").unwrap();
        std::fs::write(tmp.join("a/b/other.less"), "").unwrap();
        std::fs::write(tmp.join("a/main.css"), "").unwrap();
        std::fs::write(tmp.join("a/less"), "").unwrap();

        assert_eq!(delete_by_extension(&tmp, &["less"]).unwrap(), 2);
        assert_eq!(delete_by_extension(&tmp, &["less"]).unwrap(), 0);

        assert!(tmp.join("a/main.css").exists());
        assert!(tmp.join("a/less").exists());
        assert!(!tmp.join("a/b/other.less").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
