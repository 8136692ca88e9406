//! libpack CLI: build a single-file-component library into a publishable package.
//!
//! Copies the source tree, splits out and compiles component styles, wires
//! stylesheet imports and component exports, then runs the bundler.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
