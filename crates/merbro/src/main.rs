//! merbro CLI - Mermaid through headless Chrome.
//!
//! Provides commands for:
//! - `parse`: Print a flowchart's parse tree as JSON
//! - `svg`: Render a diagram to SVG
//! - `png`: Render a diagram to PNG

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CommonArgs, ParseArgs, PngArgs, SvgArgs};
use error::CliError;
use output::Output;

/// merbro - Mermaid parsing and rendering.
#[derive(Parser)]
#[command(name = "merbro", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parse tree of a flowchart as JSON.
    Parse(ParseArgs),
    /// Render a diagram to SVG.
    Svg(SvgArgs),
    /// Render a diagram to PNG.
    Png(PngArgs),
}

impl Commands {
    fn common(&self) -> &CommonArgs {
        match self {
            Self::Parse(args) => &args.common,
            Self::Svg(args) => &args.common,
            Self::Png(args) => &args.common,
        }
    }

    async fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Parse(args) => args.execute().await,
            Self::Svg(args) => args.execute().await,
            Self::Png(args) => args.execute().await,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.common().verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Runtime::new()
        .map_err(CliError::from)
        .and_then(|rt| rt.block_on(cli.command.execute()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}
