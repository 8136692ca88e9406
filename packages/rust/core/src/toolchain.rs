//! External tools: the style compiler and the module bundler.
//!
//! Stages talk to them through the [`Toolchain`] trait. [`CommandToolchain`]
//! runs the configured commands as child processes, each under its own
//! timeout; the child is killed if the budget runs out.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, instrument};

use libpack_shared::{AppConfig, LibpackError, Result};

/// How many trailing bytes of stderr to keep in a process error.
const STDERR_TAIL_BYTES: usize = 2000;

/// Seam for the external processes the pipeline depends on.
pub trait Toolchain: Send + Sync + 'static {
    /// Compile the style source at `input` into a stylesheet at `output`.
    fn compile_style(&self, input: &Path, output: &Path) -> impl Future<Output = Result<()>> + Send;

    /// Run the bundler with the given config file.
    fn bundle(&self, config: &Path) -> impl Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// CommandSpec
// ---------------------------------------------------------------------------

/// A command line template plus its time budget.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    /// Arguments; `{name}` placeholders are substituted per invocation.
    pub args: Vec<String>,
    pub timeout: Duration,
    pub working_dir: PathBuf,
}

impl CommandSpec {
    /// Substitute `{key}` placeholders in every argument.
    pub fn render_args(&self, substitutions: &[(&str, &str)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                substitutions
                    .iter()
                    .fold(arg.clone(), |acc, (key, value)| {
                        acc.replace(&format!("{{{key}}}"), value)
                    })
            })
            .collect()
    }

    /// Run the program with `args`, failing on spawn error, non-zero exit or timeout.
    #[instrument(skip_all, fields(program = %self.program))]
    pub async fn run(&self, args: Vec<String>) -> Result<()> {
        debug!(?args, cwd = %self.working_dir.display(), "spawning");

        let child = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                LibpackError::process(
                    &self.program,
                    format!("failed to spawn: {e}. Is `{}` installed?", self.program),
                )
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(waited) => waited
                .map_err(|e| LibpackError::process(&self.program, format!("wait failed: {e}")))?,
            Err(_) => {
                return Err(LibpackError::Timeout {
                    program: self.program.clone(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if output.status.success() {
            debug!(status = %output.status, "process finished");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(LibpackError::process(
            &self.program,
            format!("exited with {}: {}", output.status, tail(stderr.trim(), STDERR_TAIL_BYTES)),
        ))
    }
}

fn tail(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut start = s.len() - max_bytes;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

// ---------------------------------------------------------------------------
// CommandToolchain
// ---------------------------------------------------------------------------

/// [`Toolchain`] backed by real child processes.
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    pub style_compiler: CommandSpec,
    pub bundler: CommandSpec,
}

impl CommandToolchain {
    /// Build both command specs from config; processes run in `working_dir`.
    pub fn from_config(config: &AppConfig, working_dir: &Path) -> Self {
        info!(
            style_compiler = %config.style_compiler.command,
            bundler = %config.bundler.command,
            "configuring toolchain"
        );

        Self {
            style_compiler: CommandSpec {
                program: config.style_compiler.command.clone(),
                args: config.style_compiler.args.clone(),
                timeout: Duration::from_secs(config.style_compiler.timeout_secs),
                working_dir: working_dir.to_path_buf(),
            },
            bundler: CommandSpec {
                program: config.bundler.command.clone(),
                args: config.bundler.args.clone(),
                timeout: Duration::from_secs(config.bundler.timeout_secs),
                working_dir: working_dir.to_path_buf(),
            },
        }
    }
}

impl Toolchain for CommandToolchain {
    async fn compile_style(&self, input: &Path, output: &Path) -> Result<()> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        let args = self
            .style_compiler
            .render_args(&[("input", input.as_ref()), ("output", output.as_ref())]);
        self.style_compiler.run(args).await
    }

    async fn bundle(&self, config: &Path) -> Result<()> {
        let config = config.to_string_lossy();
        let args = self.bundler.render_args(&[("config", config.as_ref())]);
        self.bundler.run(args).await
    }
}
