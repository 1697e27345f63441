//! Writing fetched messages to disk

use crate::error::{Error, Result};
use crate::fetch::RawMessage;
use indicatif::ProgressBar;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Check that `dest_dir` exists and is a directory.
///
/// # Errors
///
/// Returns [`Error::Config`] if the path is missing or not a directory.
pub async fn ensure_dest_dir(dest_dir: &Path) -> Result<()> {
    match fs::metadata(dest_dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::Config(format!(
            "Destination {} is not a directory",
            dest_dir.display()
        ))),
        Err(e) => Err(Error::Config(format!(
            "Destination directory {} is not accessible: {e}",
            dest_dir.display()
        ))),
    }
}

/// Write each message to `dest_dir/<index>`, indices starting at 0, and
/// advance `progress` once per file. Existing files are truncated.
///
/// Returns the number of files written.
///
/// # Errors
///
/// Returns [`Error::Output`] if a file cannot be created and
/// [`Error::Io`] if writing to it fails. Files written before the
/// failure are left in place.
pub async fn write_messages(
    dest_dir: &Path,
    messages: &[RawMessage],
    progress: &ProgressBar,
) -> Result<usize> {
    for (index, message) in messages.iter().enumerate() {
        let path = dest_dir.join(index.to_string());

        let mut file = File::create(&path)
            .await
            .map_err(|source| Error::Output {
                path: path.clone(),
                source,
            })?;
        file.write_all(message.as_bytes()).await?;
        file.flush().await?;
        drop(file);

        debug!("Wrote {} bytes to {}", message.as_bytes().len(), path.display());
        progress.inc(1);
    }

    Ok(messages.len())
}
