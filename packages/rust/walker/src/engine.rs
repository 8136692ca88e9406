//! Concurrent tree walker.
//!
//! The walker snapshots every file under a root, then visits each one on its
//! own task, bounded by a semaphore. Per-file failures are collected into the
//! [`WalkReport`] instead of aborting the walk, so a stage always attempts
//! every file before its aggregate result is judged.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use libpack_shared::{LibpackError, Result};

use crate::fsops::walk_error;

/// Default number of visits in flight.
pub const DEFAULT_CONCURRENCY: usize = 8;

// ---------------------------------------------------------------------------
// WalkReport
// ---------------------------------------------------------------------------

/// What a visitor did with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// The file matched and was transformed.
    Processed,
    /// The file did not match the stage's selection, or needed no change.
    Skipped,
}

/// A single file the visitor could not handle.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: LibpackError,
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Aggregate outcome of one walk.
#[derive(Debug, Default)]
pub struct WalkReport {
    /// Files the visitor transformed.
    pub processed: usize,
    /// Files the visitor passed over.
    pub skipped: usize,
    /// Files that failed (visitor error, task panic, or unreadable entry).
    pub failures: Vec<FileFailure>,
    /// Wall-clock duration of the walk.
    pub duration: Duration,
}

impl WalkReport {
    /// `true` when no file failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of files the walk attempted.
    pub fn attempted(&self) -> usize {
        self.processed + self.skipped + self.failures.len()
    }
}

/// One immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

// ---------------------------------------------------------------------------
// TreeWalker
// ---------------------------------------------------------------------------

/// Recursive file visitor with bounded concurrency.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    concurrency: usize,
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl TreeWalker {
    /// Create a walker allowing `concurrency` visits in flight (minimum 1).
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// List every regular file under `root`, sorted by file name at each level.
    ///
    /// Entries that cannot be read are returned separately so the caller can
    /// report them without losing the rest of the tree.
    pub fn list_files(root: &Path) -> Result<(Vec<PathBuf>, Vec<FileFailure>)> {
        let meta = std::fs::metadata(root).map_err(|e| LibpackError::io(root, e))?;
        if !meta.is_dir() {
            return Err(LibpackError::validation(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut files = Vec::new();
        let mut unreadable = Vec::new();

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => {
                    let error = walk_error(root, e);
                    let path = match &error {
                        LibpackError::Io { path, .. } => path.clone(),
                        _ => root.to_path_buf(),
                    };
                    unreadable.push(FileFailure { path, error });
                }
            }
        }

        Ok((files, unreadable))
    }

    /// Visit every file under `root` once.
    ///
    /// The file list is captured before the first visit, so files a visitor
    /// creates are never visited by the same walk. Returns `Err` only when
    /// `root` itself cannot be enumerated; everything else lands in the report.
    #[instrument(skip_all, fields(root = %root.display(), concurrency = self.concurrency))]
    pub async fn walk_files<F, Fut>(&self, root: &Path, visit: F) -> Result<WalkReport>
    where
        F: Fn(PathBuf) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FileAction>> + Send + 'static,
    {
        let start = Instant::now();
        let (files, unreadable) = Self::list_files(root)?;

        debug!(files = files.len(), "snapshot taken");

        let visit = Arc::new(visit);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(files.len());

        for path in files {
            let visit = Arc::clone(&visit);
            let sem = Arc::clone(&semaphore);
            let task_path = path.clone();

            handles.push((
                path,
                tokio::spawn(async move {
                    let _permit = sem
                        .acquire()
                        .await
                        .map_err(|e| LibpackError::Task(format!("walker semaphore: {e}")))?;
                    (*visit)(task_path).await
                }),
            ));
        }

        let mut report = WalkReport {
            failures: unreadable,
            ..WalkReport::default()
        };

        // Every handle is awaited, even after a failure.
        for (path, handle) in handles {
            match handle.await {
                Ok(Ok(FileAction::Processed)) => report.processed += 1,
                Ok(Ok(FileAction::Skipped)) => report.skipped += 1,
                Ok(Err(error)) => {
                    warn!(path = %path.display(), %error, "file failed");
                    report.failures.push(FileFailure { path, error });
                }
                Err(join_err) => {
                    warn!(path = %path.display(), error = %join_err, "visit task aborted");
                    report.failures.push(FileFailure {
                        path,
                        error: LibpackError::Task(join_err.to_string()),
                    });
                }
            }
        }

        report.duration = start.elapsed();

        info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failures.len(),
            elapsed_ms = report.duration.as_millis(),
            "walk complete"
        );

        Ok(report)
    }

    /// List the immediate children of `dir` without recursing, sorted by name.
    pub async fn walk_entries(&self, dir: &Path) -> Result<Vec<DirEntryInfo>> {
        let mut read = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| LibpackError::io(dir, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = read
            .next_entry()
            .await
            .map_err(|e| LibpackError::io(dir, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| LibpackError::io(&path, e))?;
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
                is_dir: file_type.is_dir(),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
