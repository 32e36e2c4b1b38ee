//! Writing rendered output to disk.

use std::path::Path;

use crate::error::{DiagramError, Result};

/// Write rendered bytes to `path`, replacing any existing file.
///
/// The write is not atomic: an interrupted write can leave a truncated file.
pub(crate) async fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| DiagramError::io(path, e))?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "Wrote diagram");
    Ok(())
}
