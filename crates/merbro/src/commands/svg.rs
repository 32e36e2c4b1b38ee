//! `merbro svg` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{CommonArgs, read_source, write_stdout};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the svg command.
#[derive(Args)]
pub(crate) struct SvgArgs {
    /// Diagram source file (`-` for stdin).
    input: PathBuf,

    /// Output file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl SvgArgs {
    /// Execute the svg command.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or rendered, or the
    /// output cannot be written.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let source = read_source(&self.input).await?;
        let renderer = self.common.renderer()?;

        let svg = renderer.render_svg(&source, self.output.as_deref()).await?;

        match &self.output {
            Some(path) => {
                Output::new().success(&format!("Wrote {}", path.display()));
                Ok(())
            }
            None => write_stdout(format!("{svg}\n").as_bytes()).await,
        }
    }
}
