//! Legacy binary Word (`.doc`) extraction via an external converter.

use std::io::Write;

use tempfile::NamedTempFile;
use tokio::process::Command;

use crate::types::IngestError;

const CONVERTER: &str = "antiword";

/// Converts a `.doc` payload through the external `antiword` binary.
///
/// The converter only reads from disk, so the payload is staged in a
/// temporary file for the duration of the call. This is one opaque
/// extraction step: any failure along the way (staging, spawn, non-zero
/// exit, non-UTF-8 output) marks the document as corrupt.
pub async fn extract(bytes: &[u8]) -> Result<String, IngestError> {
    let corrupt = |reason: String| IngestError::CorruptDocument(format!("doc: {reason}"));

    let mut staged = NamedTempFile::with_suffix(".doc").map_err(|err| corrupt(err.to_string()))?;
    staged.write_all(bytes).map_err(|err| corrupt(err.to_string()))?;
    staged.flush().map_err(|err| corrupt(err.to_string()))?;

    let output = Command::new(CONVERTER)
        .arg(staged.path())
        .output()
        .await
        .map_err(|err| corrupt(format!("failed to run {CONVERTER}: {err}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(corrupt(format!(
            "{CONVERTER} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout).map_err(|err| corrupt(err.to_string()))
}
