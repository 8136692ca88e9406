//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use libpack_core::pipeline::{
    BuildResult, PipelineConfig, ProgressReporter, Stage, StageOutcome, run_build,
};
use libpack_core::toolchain::CommandToolchain;
use libpack_shared::{AppConfig, LibpackError, init_config, load_config, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// libpack: build a component library source tree into a publishable package.
#[derive(Parser)]
#[command(
    name = "libpack",
    version,
    about = "Build a single-file-component library into a distributable package.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full build: transform the source tree and bundle it.
    Build {
        /// Config file (defaults to ./libpack.toml, if present).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source directory, overriding `paths.source`.
        #[arg(long)]
        source: Option<PathBuf>,

        /// Output directory, overriding `paths.output`.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Stop after the output tree is written; do not run the bundler.
        #[arg(long)]
        skip_bundle: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default libpack.toml in the current directory.
    Init,
    /// Show resolved configuration.
    Show {
        /// Config file (defaults to ./libpack.toml, if present).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "libpack=info",
        1 => "libpack=debug",
        _ => "libpack=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            config,
            source,
            out,
            skip_bundle,
        } => cmd_build(config.as_deref(), source, out, skip_bundle).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show { config } => cmd_config_show(config.as_deref()).await,
        },
    }
}

/// Load the config and work out the directory relative paths resolve against.
///
/// With an explicit file that is the file's directory, otherwise the current
/// directory.
fn resolve_config(config_path: Option<&Path>) -> Result<(AppConfig, PathBuf)> {
    let cwd = std::env::current_dir()
        .map_err(|e| eyre!("cannot determine working directory: {e}"))?;

    match config_path {
        Some(path) => {
            let config = load_config_from(path)?;
            let root = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
                _ => cwd,
            };
            Ok((config, root))
        }
        None => Ok((load_config(&cwd)?, cwd)),
    }
}

async fn cmd_build(
    config_path: Option<&Path>,
    source: Option<PathBuf>,
    out: Option<PathBuf>,
    skip_bundle: bool,
) -> Result<()> {
    let (mut config, project_root) = resolve_config(config_path)?;

    if let Some(source) = source {
        config.paths.source = source.to_string_lossy().into_owned();
    }
    if let Some(out) = out {
        config.paths.output = out.to_string_lossy().into_owned();
    }
    config.validate()?;

    let mut pipeline = PipelineConfig::from_app_config(&config, &project_root);
    pipeline.skip_bundle = skip_bundle;

    info!(
        source = %pipeline.source_dir.display(),
        output = %pipeline.output_dir.display(),
        skip_bundle,
        "building library"
    );

    let toolchain = Arc::new(CommandToolchain::from_config(&config, &project_root));
    let reporter = CliProgress::new();

    let result = match run_build(&pipeline, toolchain, &reporter).await {
        Ok(result) => result,
        Err(LibpackError::Stage { stage, failures }) => {
            eprintln!();
            eprintln!("  Stage `{stage}` failed:");
            for failure in &failures {
                eprintln!("    - {failure}");
            }
            eprintln!();
            return Err(eyre!("build failed at stage `{stage}`"));
        }
        Err(e) => return Err(e.into()),
    };

    // Print summary
    println!();
    println!("  Build complete!");
    println!("  Generation: {}", result.generation);
    println!("  Output:     {}", result.output_dir.display());
    for summary in &result.stages {
        if let StageOutcome::Succeeded { processed, skipped } = summary.outcome {
            println!(
                "    {:<32} {processed:>4} processed {skipped:>4} skipped  {:>6.2}s",
                summary.stage.to_string(),
                summary.elapsed.as_secs_f64()
            );
        }
    }
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage_started(&self, stage: &Stage) {
        self.spinner.set_message(stage.description());
    }

    fn stage_finished(&self, stage: &Stage, outcome: &StageOutcome) {
        match outcome {
            StageOutcome::Succeeded { .. } => {
                self.spinner.println(format!("  ✓ {}", stage.description()));
            }
            StageOutcome::Failed { failures } => {
                self.spinner.println(format!(
                    "  ✗ {} ({} failure(s))",
                    stage.description(),
                    failures.len()
                ));
                self.spinner.finish_and_clear();
            }
        }
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let path = init_config(&cwd)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let (config, _) = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
