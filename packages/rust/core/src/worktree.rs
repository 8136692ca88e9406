//! The per-run staging copy of the source tree.
//!
//! Every run gets its own root, `<out-parent>/.<out-name>.<generation>`, so two
//! runs never share mutable state. The tree is promoted over the output
//! directory only after every transform stage has succeeded.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use libpack_shared::{GenerationId, LibpackError, Result};
use libpack_walker::copy_tree;

#[derive(Debug)]
pub struct WorkTree {
    root: PathBuf,
    generation: GenerationId,
}

impl WorkTree {
    /// Allocate a fresh staging root next to `output_dir`. Nothing is created on disk yet.
    pub fn for_output(output_dir: &Path) -> Result<Self> {
        let name = output_dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                LibpackError::config(format!(
                    "output directory '{}' has no usable name",
                    output_dir.display()
                ))
            })?;

        let generation = GenerationId::new();
        let parent = output_dir.parent().unwrap_or_else(|| Path::new(""));
        let root = parent.join(format!(".{name}.{generation}"));

        Ok(Self { root, generation })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn generation(&self) -> GenerationId {
        self.generation
    }

    /// Path of `relative` inside the tree.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Copy `source` into the (not yet existing) staging root.
    ///
    /// Returns the number of files copied.
    #[instrument(skip_all, fields(source = %source.display(), root = %self.root.display()))]
    pub async fn populate(&self, source: &Path) -> Result<usize> {
        if tokio::fs::try_exists(&self.root)
            .await
            .map_err(|e| LibpackError::io(&self.root, e))?
        {
            return Err(LibpackError::validation(format!(
                "staging directory {} already exists",
                self.root.display()
            )));
        }

        let (src, dst) = (source.to_path_buf(), self.root.clone());
        let copied = tokio::task::spawn_blocking(move || copy_tree(&src, &dst))
            .await
            .map_err(|e| LibpackError::Task(e.to_string()))??;

        info!(files = copied, generation = %self.generation, "work tree populated");
        Ok(copied)
    }

    /// Replace `output_dir` with this tree. Consumes the work tree.
    #[instrument(skip_all, fields(root = %self.root.display(), output = %output_dir.display()))]
    pub async fn promote(self, output_dir: &Path) -> Result<PathBuf> {
        if tokio::fs::try_exists(output_dir)
            .await
            .map_err(|e| LibpackError::io(output_dir, e))?
        {
            tokio::fs::remove_dir_all(output_dir)
                .await
                .map_err(|e| LibpackError::io(output_dir, e))?;
        }

        tokio::fs::rename(&self.root, output_dir)
            .await
            .map_err(|e| LibpackError::io(&self.root, e))?;

        info!(generation = %self.generation, "work tree promoted");
        Ok(output_dir.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::temp_dir;

    #[test]
    fn staging_root_is_a_hidden_sibling() {
        let tree = WorkTree::for_output(Path::new("/proj/lib")).unwrap();
        let name = tree.root().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(tree.root().parent(), Some(Path::new("/proj")));
        assert_eq!(name, format!(".lib.{}", tree.generation()));
    }

    #[test]
    fn runs_get_distinct_roots() {
        let a = WorkTree::for_output(Path::new("lib")).unwrap();
        let b = WorkTree::for_output(Path::new("lib")).unwrap();
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn output_without_name_is_rejected() {
        assert!(WorkTree::for_output(Path::new("/")).is_err());
    }

    #[tokio::test]
    async fn populate_then_promote_replaces_output() {
        let tmp = temp_dir("worktree");
        let src = tmp.join("src");
        let out = tmp.join("lib");
        std::fs::create_dir_all(src.join("components")).unwrap();
        std::fs::write(src.join("index.js"), "new").unwrap();
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("stale.js"), "old").unwrap();

        let tree = WorkTree::for_output(&out).unwrap();
        assert_eq!(tree.populate(&src).await.unwrap(), 1);
        assert!(tree.join("components").is_dir());

        let staging = tree.root().to_path_buf();
        tree.promote(&out).await.unwrap();

        assert!(!staging.exists());
        assert_eq!(std::fs::read_to_string(out.join("index.js")).unwrap(), "new");
        assert!(!out.join("stale.js").exists());
        assert!(src.join("index.js").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn populate_refuses_existing_root() {
        let tmp = temp_dir("worktree");
        std::fs::create_dir_all(tmp.join("src")).unwrap();
        let tree = WorkTree::for_output(&tmp.join("lib")).unwrap();
        std::fs::create_dir_all(tree.root()).unwrap();

        assert!(tree.populate(&tmp.join("src")).await.is_err());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
