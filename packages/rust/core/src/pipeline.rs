//! End-to-end `build` pipeline: copy → extract → compile → clean → inject →
//! aggregate → promote → bundle.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, instrument};

use libpack_shared::{AppConfig, GenerationId, LibpackError, Result};
use libpack_walker::{TreeWalker, WalkReport};

use crate::aggregate::aggregate_exports;
use crate::compile::{compile_styles, remove_style_sources};
use crate::extract::extract_styles;
use crate::inject::inject_stylesheet_imports;
use crate::toolchain::Toolchain;
use crate::worktree::WorkTree;

// ---------------------------------------------------------------------------
// Stages and outcomes
// ---------------------------------------------------------------------------

/// One step of the build, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Copy,
    ExtractStyles,
    CompileStyles,
    RemoveStyleSources,
    InjectImports,
    AggregateExports,
    Promote,
    /// One bundler invocation with the given config file.
    Bundle(PathBuf),
}

impl Stage {
    /// Human-readable label for progress output.
    pub fn description(&self) -> String {
        match self {
            Self::Copy => "Copying source tree".into(),
            Self::ExtractStyles => "Extracting style blocks".into(),
            Self::CompileStyles => "Compiling styles".into(),
            Self::RemoveStyleSources => "Removing style sources".into(),
            Self::InjectImports => "Injecting stylesheet imports".into(),
            Self::AggregateExports => "Writing component exports".into(),
            Self::Promote => "Promoting output".into(),
            Self::Bundle(config) => format!("Bundling with {}", config.display()),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => f.write_str("copy"),
            Self::ExtractStyles => f.write_str("extract-styles"),
            Self::CompileStyles => f.write_str("compile-styles"),
            Self::RemoveStyleSources => f.write_str("remove-style-sources"),
            Self::InjectImports => f.write_str("inject-imports"),
            Self::AggregateExports => f.write_str("aggregate-exports"),
            Self::Promote => f.write_str("promote"),
            Self::Bundle(config) => write!(f, "bundle({})", config.display()),
        }
    }
}

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Succeeded { processed: usize, skipped: usize },
    Failed { failures: Vec<String> },
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Record of one finished stage.
#[derive(Debug, Clone)]
pub struct StageSummary {
    pub stage: Stage,
    pub outcome: StageOutcome,
    pub elapsed: Duration,
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildResult {
    /// Identifier of this run.
    pub generation: GenerationId,
    /// The promoted output directory.
    pub output_dir: PathBuf,
    /// Every stage that ran, in order.
    pub stages: Vec<StageSummary>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called before a stage starts.
    fn stage_started(&self, stage: &Stage);
    /// Called once a stage has finished, successfully or not.
    fn stage_finished(&self, stage: &Stage, outcome: &StageOutcome);
    /// Called when the whole build succeeded.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage_started(&self, _stage: &Stage) {}
    fn stage_finished(&self, _stage: &Stage, _outcome: &StageOutcome) {}
    fn done(&self, _result: &BuildResult) {}
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for [`run_build`]. Paths are resolved against the project root.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Source tree, never modified.
    pub source_dir: PathBuf,
    /// Output tree, replaced on success.
    pub output_dir: PathBuf,
    /// Components directory name, relative to the tree root.
    pub components_dir: String,
    /// Entrypoint module, relative to the tree root.
    pub entrypoint: PathBuf,
    pub concurrency: usize,
    /// Import target injected into component modules.
    pub stylesheet_import: String,
    /// Bundler configs, run in order.
    pub bundle_configs: Vec<PathBuf>,
    /// Stop after promotion.
    pub skip_bundle: bool,
}

impl PipelineConfig {
    pub fn from_app_config(config: &AppConfig, project_root: &Path) -> Self {
        Self {
            source_dir: project_root.join(&config.paths.source),
            output_dir: project_root.join(&config.paths.output),
            components_dir: config.paths.components_dir.clone(),
            entrypoint: PathBuf::from(&config.paths.entrypoint),
            concurrency: config.build.concurrency,
            stylesheet_import: config.build.stylesheet_import.clone(),
            bundle_configs: config.bundler.configs.iter().map(PathBuf::from).collect(),
            skip_bundle: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Stage runner
// ---------------------------------------------------------------------------

/// Counts a stage reports, whatever kind of work it did.
#[derive(Debug, Default)]
struct StageTally {
    processed: usize,
    skipped: usize,
    failures: Vec<String>,
}

impl StageTally {
    fn processed(count: usize) -> Self {
        Self {
            processed: count,
            ..Self::default()
        }
    }
}

impl From<WalkReport> for StageTally {
    fn from(report: WalkReport) -> Self {
        Self {
            processed: report.processed,
            skipped: report.skipped,
            failures: report.failures.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Runs stages one at a time, reporting each and stopping at the first failure.
struct StageRunner<'a> {
    progress: &'a dyn ProgressReporter,
    summaries: Vec<StageSummary>,
}

impl<'a> StageRunner<'a> {
    fn new(progress: &'a dyn ProgressReporter) -> Self {
        Self {
            progress,
            summaries: Vec::new(),
        }
    }

    async fn step<Fut>(&mut self, stage: Stage, work: Fut) -> Result<()>
    where
        Fut: Future<Output = Result<StageTally>>,
    {
        self.progress.stage_started(&stage);
        let started = Instant::now();

        let tally = match work.await {
            Ok(tally) => tally,
            Err(e) => StageTally {
                failures: vec![e.to_string()],
                ..StageTally::default()
            },
        };

        let elapsed = started.elapsed();
        let outcome = if tally.failures.is_empty() {
            StageOutcome::Succeeded {
                processed: tally.processed,
                skipped: tally.skipped,
            }
        } else {
            StageOutcome::Failed {
                failures: tally.failures,
            }
        };

        self.progress.stage_finished(&stage, &outcome);
        self.summaries.push(StageSummary {
            stage: stage.clone(),
            outcome: outcome.clone(),
            elapsed,
        });

        match outcome {
            StageOutcome::Succeeded { processed, skipped } => {
                info!(%stage, processed, skipped, elapsed_ms = elapsed.as_millis(), "stage finished");
                Ok(())
            }
            StageOutcome::Failed { failures } => {
                error!(%stage, failed = failures.len(), "stage failed");
                Err(LibpackError::Stage {
                    stage: stage.to_string(),
                    failures,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full build.
///
/// Stages run strictly in sequence inside a fresh work tree; the first
/// failing stage ends the run with [`LibpackError::Stage`] and no later stage
/// is started. The work tree is left on disk for inspection in that case.
#[instrument(skip_all, fields(source = %config.source_dir.display(), output = %config.output_dir.display()))]
pub async fn run_build<T: Toolchain>(
    config: &PipelineConfig,
    toolchain: Arc<T>,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();
    if config.source_dir.starts_with(&config.output_dir)
        || config.output_dir.starts_with(&config.source_dir)
    {
        return Err(LibpackError::config(format!(
            "source {} and output {} must not contain each other",
            config.source_dir.display(),
            config.output_dir.display()
        )));
    }

    let tree = WorkTree::for_output(&config.output_dir)?;
    let generation = tree.generation();
    let staging = tree.root().to_path_buf();

    info!(%generation, staging = %staging.display(), "starting build");

    let mut runner = StageRunner::new(progress);
    let result = run_stages(config, tree, toolchain, &mut runner).await;

    if let Err(e) = &result {
        if staging.exists() {
            error!(staging = %staging.display(), error = %e, "build failed, staging directory kept");
        } else {
            error!(error = %e, "build failed");
        }
    }
    result?;

    let result = BuildResult {
        generation,
        output_dir: config.output_dir.clone(),
        stages: runner.summaries,
        elapsed: start.elapsed(),
    };

    info!(
        %generation,
        stages = result.stages.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "build complete"
    );

    progress.done(&result);
    Ok(result)
}

async fn run_stages<T: Toolchain>(
    config: &PipelineConfig,
    tree: WorkTree,
    toolchain: Arc<T>,
    runner: &mut StageRunner<'_>,
) -> Result<()> {
    let walker = TreeWalker::new(config.concurrency);
    let root = tree.root().to_path_buf();
    let components_root = root.join(&config.components_dir);

    runner
        .step(Stage::Copy, async {
            tree.populate(&config.source_dir).await.map(StageTally::processed)
        })
        .await?;

    runner
        .step(Stage::ExtractStyles, async {
            extract_styles(&walker, &root).await.map(StageTally::from)
        })
        .await?;

    runner
        .step(Stage::CompileStyles, async {
            compile_styles(&walker, &root, Arc::clone(&toolchain))
                .await
                .map(StageTally::from)
        })
        .await?;

    runner
        .step(Stage::RemoveStyleSources, async {
            remove_style_sources(&root).await.map(StageTally::processed)
        })
        .await?;

    runner
        .step(Stage::InjectImports, async {
            inject_stylesheet_imports(&walker, &components_root, &config.stylesheet_import)
                .await
                .map(StageTally::from)
        })
        .await?;

    runner
        .step(Stage::AggregateExports, async {
            aggregate_exports(
                &walker,
                &components_root,
                &config.components_dir,
                &root.join(&config.entrypoint),
            )
            .await
            .map(|names| StageTally::processed(names.len()))
        })
        .await?;

    runner
        .step(Stage::Promote, async {
            tree.promote(&config.output_dir).await.map(|_| StageTally::processed(1))
        })
        .await?;

    if config.skip_bundle {
        info!("bundling skipped");
        return Ok(());
    }

    for bundle_config in &config.bundle_configs {
        runner
            .step(Stage::Bundle(bundle_config.clone()), async {
                toolchain.bundle(bundle_config).await.map(|()| StageTally::processed(1))
            })
            .await?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
