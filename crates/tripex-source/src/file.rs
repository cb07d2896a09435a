//! Plain-text files on disk, one per title

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use tripex_core::{Result, TextSource, TripexError};

/// Reads `<dir>/<title>.txt`
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path a title resolves to; path separators in the title become `_`
    pub fn path_for(&self, title: &str) -> PathBuf {
        let file_name: String = title
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.dir.join(format!("{file_name}.txt"))
    }
}

#[async_trait]
impl TextSource for FileSource {
    async fn fetch(&self, title: &str) -> Result<String> {
        let path = self.path_for(title);
        tracing::debug!(title, path = %path.display(), "reading text file");

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(TripexError::NotFound(title.to_string())),
            Err(e) => Err(TripexError::Transport(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_escapes_separators() {
        let source = FileSource::new("/data");
        assert_eq!(source.path_for("AC/DC"), PathBuf::from("/data/AC_DC.txt"));
        assert_eq!(
            source.path_for("J. K. Rowling"),
            PathBuf::from("/data/J. K. Rowling.txt")
        );
    }

    #[tokio::test]
    async fn test_fetch_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Alice.txt"), "Alice met Bob.").unwrap();

        let source = FileSource::new(dir.path());
        assert_eq!(source.fetch("Alice").await.unwrap(), "Alice met Bob.");
        assert!(matches!(
            source.fetch("Bob").await,
            Err(TripexError::NotFound(title)) if title == "Bob"
        ));
    }
}
