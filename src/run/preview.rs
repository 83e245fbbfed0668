//! HTML preview: write the buffer to a file and hand it to the browser

use std::path::{Path, PathBuf};

/// Write `content` to `path` verbatim
pub fn write_preview(path: &Path, content: &str) -> Result<PathBuf, String> {
    std::fs::write(path, content)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    Ok(path.to_path_buf())
}

/// Write the preview file, then open it with the system default handler
///
/// Runs on a short-lived thread; the result comes back as
/// `RunMsg::PreviewFinished`.
pub fn write_and_open_preview(path: &Path, content: &str) -> Result<PathBuf, String> {
    let written = write_preview(path, content)?;
    // Browsers need an absolute path when launched from elsewhere
    let target = std::fs::canonicalize(&written).unwrap_or_else(|_| written.clone());
    tracing::info!("Opening preview {}", target.display());
    open::that(&target).map_err(|e| format!("Failed to open {}: {}", target.display(), e))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_preview_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp_preview.html");
        std::fs::write(&path, "old").unwrap();

        let written = write_preview(&path, "<p>new</p>").unwrap();
        assert_eq!(written, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>new</p>");
    }

    #[test]
    fn test_write_preview_reports_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("temp_preview.html");
        let err = write_preview(&path, "x").unwrap_err();
        assert!(err.starts_with("Failed to write"));
    }
}
