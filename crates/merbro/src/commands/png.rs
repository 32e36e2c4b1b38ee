//! `merbro png` command implementation.

use std::path::PathBuf;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use clap::Args;
use console::Term;

use super::{CommonArgs, read_source, write_stdout};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the png command.
#[derive(Args)]
pub(crate) struct PngArgs {
    /// Diagram source file (`-` for stdin).
    input: PathBuf,

    /// Output file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a `data:image/png;base64,...` URI instead of raw bytes.
    #[arg(long, conflicts_with = "output")]
    data_uri: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl PngArgs {
    /// Execute the png command.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or rendered, or the
    /// output cannot be written.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        if self.output.is_none() && !self.data_uri && Term::stdout().is_term() {
            return Err(CliError::Validation(
                "refusing to write binary PNG to a terminal, use --output or --data-uri"
                    .to_owned(),
            ));
        }

        let source = read_source(&self.input).await?;
        let renderer = self.common.renderer()?;

        let png = renderer.render_png(&source, self.output.as_deref()).await?;

        if let Some(path) = &self.output {
            Output::new().success(&format!("Wrote {} ({} bytes)", path.display(), png.len()));
            Ok(())
        } else if self.data_uri {
            write_stdout(format!("{}\n", data_uri(&png)).as_bytes()).await
        } else {
            write_stdout(&png).await
        }
    }
}

/// Encode PNG bytes as a data URI.
fn data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64_STANDARD.encode(png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_data_uri() {
        let uri = data_uri(b"\x89PNG\r\n\x1a\n");

        assert_eq!(uri, "data:image/png;base64,iVBORw0KGgo=");
    }
}
