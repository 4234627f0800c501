//! Output sinks for crawl artifacts
//!
//! A crawl produces one combined text artifact. Where it goes is decided by
//! the `OutputSink` handed to the crawler: `FileSink` writes plain UTF-8 files
//! into a directory, `MemorySink` keeps them in memory for tests and embedding.

use std::future::Future;
use std::{io, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Default directory for persisted artifacts
pub const DEFAULT_OUTPUT_DIR: &str = "scraped_content";

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid artifact name: {0}")]
    InvalidName(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

type Result<T> = std::result::Result<T, StorageError>;

/// Reference to a persisted artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHandle {
    /// File name of the artifact
    pub name: String,

    /// Where the artifact lives: a path for files, a `memory://` URI otherwise
    pub location: String,
}

/// Listing entry for a persisted artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub handle: ArtifactHandle,

    /// Size in bytes
    pub size: u64,

    /// Last modification time
    pub modified: DateTime<Utc>,
}

/// Destination for crawl artifacts
pub trait OutputSink {
    /// Persist `content` under `name`, replacing any artifact of that name
    fn persist(
        &self,
        name: &str,
        content: &str,
    ) -> impl Future<Output = Result<ArtifactHandle>> + Send;

    /// List persisted artifacts, newest first
    fn list(&self) -> impl Future<Output = Result<Vec<ArtifactInfo>>> + Send;

    /// Read an artifact back by name
    fn read(&self, name: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Artifact names are bare file names
fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty()
        || name.contains(['/', '\\'])
        || name == "."
        || name == ".."
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Writes artifacts as text files into a directory
#[derive(Debug, Clone)]
pub struct FileSink {
    base_path: PathBuf,
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl FileSink {
    /// Create a sink writing into `base_path`; the directory is created on
    /// first write
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Directory this sink writes into
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl OutputSink for FileSink {
    #[instrument(skip(self, content), fields(dir = %self.base_path.display()))]
    async fn persist(&self, name: &str, content: &str) -> Result<ArtifactHandle> {
        validate_name(name)?;
        fs::create_dir_all(&self.base_path).await?;

        let path = self.base_path.join(name);
        fs::write(&path, content).await?;
        debug!("Wrote {} bytes to {}", content.len(), path.display());

        Ok(ArtifactHandle {
            name: name.to_string(),
            location: path.display().to_string(),
        })
    }

    async fn list(&self) -> Result<Vec<ArtifactInfo>> {
        if !fs::try_exists(&self.base_path).await? {
            return Ok(Vec::new());
        }

        let mut artifacts = Vec::new();
        let mut dir_entries = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = dir_entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "txt") {
                continue;
            }
            let Some(name) = path.file_name().and_then(|f| f.to_str()) else {
                continue;
            };

            let metadata = entry.metadata().await?;
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            artifacts.push(ArtifactInfo {
                handle: ArtifactHandle {
                    name: name.to_string(),
                    location: path.display().to_string(),
                },
                size: metadata.len(),
                modified,
            });
        }

        artifacts.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.handle.name.cmp(&a.handle.name))
        });
        Ok(artifacts)
    }

    async fn read(&self, name: &str) -> Result<String> {
        validate_name(name)?;
        let path = self.base_path.join(name);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps artifacts in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    // Insertion order, oldest first
    artifacts: RwLock<Vec<(ArtifactInfo, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts
    pub async fn len(&self) -> usize {
        self.artifacts.read().await.len()
    }

    /// Whether nothing has been stored
    pub async fn is_empty(&self) -> bool {
        self.artifacts.read().await.is_empty()
    }
}

impl OutputSink for MemorySink {
    async fn persist(&self, name: &str, content: &str) -> Result<ArtifactHandle> {
        validate_name(name)?;

        let handle = ArtifactHandle {
            name: name.to_string(),
            location: format!("memory://{}", name),
        };
        let info = ArtifactInfo {
            handle: handle.clone(),
            size: content.len() as u64,
            modified: Utc::now(),
        };

        let mut artifacts = self.artifacts.write().await;
        artifacts.retain(|(existing, _)| existing.handle.name != name);
        artifacts.push((info, content.to_string()));
        Ok(handle)
    }

    async fn list(&self) -> Result<Vec<ArtifactInfo>> {
        let artifacts = self.artifacts.read().await;
        Ok(artifacts.iter().rev().map(|(info, _)| info.clone()).collect())
    }

    async fn read(&self, name: &str) -> Result<String> {
        let artifacts = self.artifacts.read().await;
        artifacts
            .iter()
            .find(|(info, _)| info.handle.name == name)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("scraped_example_com_20240101_120000.txt").is_ok());
        assert!(matches!(validate_name("../etc/passwd"), Err(StorageError::InvalidName(_))));
        assert!(validate_name("a\\b.txt").is_err());
        assert!(validate_name("  ").is_err());
    }

    #[test]
    fn test_default_file_sink_dir() {
        let sink = FileSink::default();
        assert_eq!(sink.base_path(), &PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[tokio::test]
    async fn test_file_sink_persist_and_read() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path().join("nested"));

        let handle = sink.persist("crawl.txt", "URL: https://example.com").await.unwrap();
        assert_eq!(handle.name, "crawl.txt");
        assert!(handle.location.ends_with("crawl.txt"));

        let content = sink.read("crawl.txt").await.unwrap();
        assert_eq!(content, "URL: https://example.com");
    }

    #[tokio::test]
    async fn test_file_sink_read_missing() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path());

        match sink.read("missing.txt").await {
            Err(StorageError::NotFound(msg)) => assert!(msg.contains("missing.txt")),
            other => panic!("Expected NotFound error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_file_sink_list_only_text_files() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path());

        sink.persist("a.txt", "first").await.unwrap();
        sink.persist("b.txt", "second one").await.unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let listed = sink.list().await.unwrap();
        let names: Vec<_> = listed.iter().map(|a| a.handle.name.as_str()).collect();
        assert_eq!(listed.len(), 2);
        assert!(names.contains(&"a.txt"));
        assert!(names.contains(&"b.txt"));

        let b = listed.iter().find(|a| a.handle.name == "b.txt").unwrap();
        assert_eq!(b.size, 10);
    }

    #[tokio::test]
    async fn test_file_sink_list_missing_dir() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path().join("never_created"));
        assert!(sink.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_sink_newest_first_and_overwrite() {
        let sink = MemorySink::new();
        assert!(sink.is_empty().await);

        sink.persist("one.txt", "1").await.unwrap();
        sink.persist("two.txt", "2").await.unwrap();
        let handle = sink.persist("one.txt", "updated").await.unwrap();
        assert_eq!(handle.location, "memory://one.txt");

        let names: Vec<_> = sink
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.handle.name)
            .collect();
        assert_eq!(names, vec!["one.txt", "two.txt"]);
        assert_eq!(sink.len().await, 2);
        assert_eq!(sink.read("one.txt").await.unwrap(), "updated");
        assert!(sink.read("three.txt").await.is_err());
    }
}
