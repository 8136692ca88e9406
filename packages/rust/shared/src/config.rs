//! Build configuration for libpack.
//!
//! Project config lives at `./libpack.toml` (or a path given with `--config`).
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LibpackError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "libpack.toml";

// ---------------------------------------------------------------------------
// Config structs (matching libpack.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source/output layout.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Pipeline tuning.
    #[serde(default)]
    pub build: BuildConfig,

    /// External style compiler invocation.
    #[serde(default)]
    pub style_compiler: StyleCompilerConfig,

    /// External bundler invocation.
    #[serde(default)]
    pub bundler: BundlerConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Source tree, copied but never modified.
    #[serde(default = "default_source")]
    pub source: String,

    /// Publishable output tree.
    #[serde(default = "default_output")]
    pub output: String,

    /// Components directory, relative to the tree root.
    #[serde(default = "default_components_dir")]
    pub components_dir: String,

    /// Package entrypoint module, relative to the tree root.
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
            components_dir: default_components_dir(),
            entrypoint: default_entrypoint(),
        }
    }
}

fn default_source() -> String {
    "src".into()
}
fn default_output() -> String {
    "lib".into()
}
fn default_components_dir() -> String {
    "components".into()
}
fn default_entrypoint() -> String {
    "index.js".into()
}

/// `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Maximum per-file operations in flight within one stage.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Import target prepended to component modules that pull in a component source.
    #[serde(default = "default_stylesheet_import")]
    pub stylesheet_import: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            stylesheet_import: default_stylesheet_import(),
        }
    }
}

fn default_concurrency() -> usize {
    8
}
fn default_stylesheet_import() -> String {
    "./src/main.css".into()
}

/// `[style_compiler]` section.
///
/// `{input}` and `{output}` in `args` are replaced per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleCompilerConfig {
    #[serde(default = "default_style_command")]
    pub command: String,

    #[serde(default = "default_style_args")]
    pub args: Vec<String>,

    /// Per-file time budget in seconds.
    #[serde(default = "default_style_timeout")]
    pub timeout_secs: u64,
}

impl Default for StyleCompilerConfig {
    fn default() -> Self {
        Self {
            command: default_style_command(),
            args: default_style_args(),
            timeout_secs: default_style_timeout(),
        }
    }
}

fn default_style_command() -> String {
    "lessc".into()
}
fn default_style_args() -> Vec<String> {
    vec!["{input}".into(), "{output}".into()]
}
fn default_style_timeout() -> u64 {
    60
}

/// `[bundler]` section.
///
/// `{config}` in `args` is replaced with each entry of `configs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundlerConfig {
    #[serde(default = "default_bundler_command")]
    pub command: String,

    #[serde(default = "default_bundler_args")]
    pub args: Vec<String>,

    /// Bundler config files, run in order (standard build, then minified).
    #[serde(default = "default_bundler_configs")]
    pub configs: Vec<String>,

    /// Per-invocation time budget in seconds.
    #[serde(default = "default_bundler_timeout")]
    pub timeout_secs: u64,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            command: default_bundler_command(),
            args: default_bundler_args(),
            configs: default_bundler_configs(),
            timeout_secs: default_bundler_timeout(),
        }
    }
}

fn default_bundler_command() -> String {
    "rollup".into()
}
fn default_bundler_args() -> Vec<String> {
    vec!["-c".into(), "{config}".into()]
}
fn default_bundler_configs() -> Vec<String> {
    vec![
        "build/rollup.config.js".into(),
        "build/rollup.terser.config.js".into(),
    ]
}
fn default_bundler_timeout() -> u64 {
    300
}

impl AppConfig {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.build.concurrency == 0 {
            return Err(LibpackError::config("build.concurrency must be at least 1"));
        }
        if self.style_compiler.timeout_secs == 0 || self.bundler.timeout_secs == 0 {
            return Err(LibpackError::config("timeout_secs must be at least 1"));
        }
        if self.style_compiler.command.trim().is_empty() {
            return Err(LibpackError::config("style_compiler.command is empty"));
        }
        if self.bundler.command.trim().is_empty() {
            return Err(LibpackError::config("bundler.command is empty"));
        }
        let source = lexical(Path::new(&self.paths.source));
        let output = lexical(Path::new(&self.paths.output));
        if output.as_os_str().is_empty() {
            return Err(LibpackError::config(format!(
                "paths.output '{}' is the project root",
                self.paths.output
            )));
        }
        if source == output {
            return Err(LibpackError::config(format!(
                "paths.source and paths.output are both '{}'",
                self.paths.source
            )));
        }
        // The output directory is replaced wholesale on promotion.
        if source.starts_with(&output) || output.starts_with(&source) {
            return Err(LibpackError::config(format!(
                "paths.source '{}' and paths.output '{}' must not contain each other",
                self.paths.source, self.paths.output
            )));
        }
        for (key, value) in [
            ("paths.components_dir", &self.paths.components_dir),
            ("paths.entrypoint", &self.paths.entrypoint),
        ] {
            if value.is_empty() || Path::new(value).is_absolute() {
                return Err(LibpackError::config(format!(
                    "{key} must be a non-empty relative path (got '{value}')"
                )));
            }
        }
        // Export paths are written relative to the tree root.
        if lexical(Path::new(&self.paths.entrypoint)).components().count() != 1 {
            return Err(LibpackError::config(format!(
                "paths.entrypoint must be a file at the tree root (got '{}')",
                self.paths.entrypoint
            )));
        }
        Ok(())
    }
}

/// `path` with `.` components dropped, so `./lib` and `lib` compare equal.
fn lexical(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config file inside a project directory.
pub fn config_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(CONFIG_FILE_NAME)
}

/// Load the project config. Returns defaults if the file does not exist.
pub fn load_config(project_dir: &Path) -> Result<AppConfig> {
    let path = config_file_path(project_dir);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LibpackError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        LibpackError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Write a default config file into `project_dir`.
/// Refuses to overwrite an existing file. Returns the path written.
pub fn init_config(project_dir: &Path) -> Result<PathBuf> {
    let path = config_file_path(project_dir);
    if path.exists() {
        return Err(LibpackError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| LibpackError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LibpackError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
