//! `merbro parse` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{CommonArgs, read_source, write_stdout};
use crate::error::CliError;

/// Arguments for the parse command.
#[derive(Args)]
pub(crate) struct ParseArgs {
    /// Diagram source file (`-` for stdin).
    input: PathBuf,

    /// Print compact JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ParseArgs {
    /// Execute the parse command.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or parsed.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let source = read_source(&self.input).await?;
        let renderer = self.common.renderer()?;

        let diagram = renderer.parse(&source).await?;

        let mut json = if self.compact {
            serde_json::to_string(&diagram)?
        } else {
            serde_json::to_string_pretty(&diagram)?
        };
        json.push('\n');
        write_stdout(json.as_bytes()).await
    }
}
