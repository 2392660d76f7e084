//! Document access
//!
//! Documents are read from disk through their `file://` URI. Only the line
//! under the cursor is needed, so the file is streamed line by line and
//! reading stops as soon as that line is reached.

use std::path::{Path, PathBuf};

use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};
use tracing::debug;
use url::Url;

use crate::{
    link::extract_link,
    types::{LinkSpan, LspError, LspResult, Position},
};

/// Convert a `file://` URI into a filesystem path
pub fn file_uri_to_path(uri: &str) -> LspResult<PathBuf> {
    let parsed = Url::parse(uri)
        .map_err(|e| LspError::InvalidParams(format!("Invalid document URI {}: {}", uri, e)))?;
    if parsed.scheme() != "file" {
        return Err(LspError::InvalidParams(format!(
            "Unsupported document URI scheme: {}",
            parsed.scheme()
        )));
    }
    parsed
        .to_file_path()
        .map_err(|_| LspError::InvalidParams(format!("Not a local file URI: {}", uri)))
}

/// Convert an absolute filesystem path into a `file://` URI
pub fn path_to_file_uri(path: &Path) -> LspResult<String> {
    Url::from_file_path(path)
        .map(|url| url.to_string())
        .map_err(|_| LspError::InternalError(format!("Not an absolute path: {}", path.display())))
}

/// Read line `line` (0-based) of the file at `path`, or `None` past the end
pub async fn read_line(path: &Path, line: u32) -> LspResult<Option<String>> {
    let file = File::open(path)
        .await
        .map_err(|e| LspError::IoError(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut lines = BufReader::new(file).lines();
    let mut current = 0u32;
    while let Some(text) = lines
        .next_line()
        .await
        .map_err(|e| LspError::IoError(format!("Failed to read {}: {}", path.display(), e)))?
    {
        if current == line {
            return Ok(Some(text));
        }
        current += 1;
    }

    debug!("Line {} is past the end of {}", line, path.display());
    Ok(None)
}

/// Find the link under `position` in the document at `uri`
pub async fn link_at(uri: &str, position: Position) -> LspResult<Option<LinkSpan>> {
    let path = file_uri_to_path(uri)?;
    let Some(text) = read_line(&path, position.line).await? else {
        return Ok(None);
    };
    Ok(extract_link(&text, position.character).map(|span| span.on_line(position.line)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn document(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_uri_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes with space.md");
        let uri = path_to_file_uri(&path).unwrap();

        assert!(uri.starts_with("file://"));
        assert!(uri.contains("%20"));
        assert_eq!(file_uri_to_path(&uri).unwrap(), path);
    }

    #[test]
    fn test_non_file_uri_rejected() {
        assert!(matches!(
            file_uri_to_path("https://example.com/doc.md"),
            Err(LspError::InvalidParams(_))
        ));
        assert!(matches!(
            file_uri_to_path("not a uri"),
            Err(LspError::InvalidParams(_))
        ));
    }

    #[tokio::test]
    async fn test_read_line_streams_to_target() {
        let file = document("first\r\nsecond\nthird");
        assert_eq!(read_line(file.path(), 0).await.unwrap().as_deref(), Some("first"));
        assert_eq!(read_line(file.path(), 1).await.unwrap().as_deref(), Some("second"));
        assert_eq!(read_line(file.path(), 2).await.unwrap().as_deref(), Some("third"));
        assert_eq!(read_line(file.path(), 10).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_line_missing_file() {
        let result = read_line(Path::new("/nonexistent/crawlls/doc.md"), 0).await;
        assert!(matches!(result, Err(LspError::IoError(_))));
    }

    #[tokio::test]
    async fn test_link_at_places_span_on_line() {
        let file = document("# Title\n\nCheck [Example](https://example.com) here\n");
        let uri = path_to_file_uri(file.path()).unwrap();

        let span = link_at(&uri, Position::new(2, 15)).await.unwrap().unwrap();
        assert_eq!(span.url, "https://example.com");
        assert_eq!(span.range.start, Position::new(2, 6));
        assert_eq!(span.range.end, Position::new(2, 36));

        assert_eq!(link_at(&uri, Position::new(0, 2)).await.unwrap(), None);
        assert_eq!(link_at(&uri, Position::new(10, 0)).await.unwrap(), None);
    }
}
