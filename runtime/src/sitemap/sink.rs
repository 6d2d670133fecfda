//! Storage targets for generated sitemap files.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Receives rendered sitemap documents by file name.
#[async_trait]
pub trait SitemapSink: Send + Sync {
    /// Replace the named file with `contents`.
    async fn write(&self, name: &str, contents: &str) -> Result<()>;
}

/// Writes into a directory, replacing each file atomically.
pub struct FileSitemapSink {
    dir: PathBuf,
}

impl FileSitemapSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SitemapSink for FileSitemapSink {
    async fn write(&self, name: &str, contents: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let target = self.dir.join(name);
        let tmp = self.dir.join(format!(".{name}.tmp"));
        tokio::fs::write(&tmp, contents).await?;
        // Readers never observe a half-written file.
        tokio::fs::rename(&tmp, &target).await?;
        Ok(())
    }
}

/// Keeps documents in memory; for tests and dry runs.
#[derive(Default)]
pub struct MemorySitemapSink {
    files: RwLock<BTreeMap<String, String>>,
}

impl MemorySitemapSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.keys().cloned().collect()
    }
}

#[async_trait]
impl SitemapSink for MemorySitemapSink {
    async fn write(&self, name: &str, contents: &str) -> Result<()> {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(name.to_string(), contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_file_sink_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSitemapSink::new(dir.path().join("public"));
        sink.write("sitemap.xml", "<first/>").await.unwrap();
        sink.write("sitemap.xml", "<second/>").await.unwrap();

        let text = std::fs::read_to_string(sink.dir().join("sitemap.xml")).unwrap();
        assert_eq!(text, "<second/>");
        assert!(!sink.dir().join(".sitemap.xml.tmp").exists());
    }

    #[tokio::test]
    async fn test_memory_sink() {
        let sink = MemorySitemapSink::new();
        sink.write("b.xml", "b").await.unwrap();
        sink.write("a.xml", "a").await.unwrap();
        assert_eq!(sink.get("a.xml").as_deref(), Some("a"));
        assert_eq!(sink.names(), vec!["a.xml", "b.xml"]);
    }

    #[tokio::test]
    async fn test_memory_sink_keeps_writing_after_poisoned_lock() {
        let sink = Arc::new(MemorySitemapSink::new());
        let holder = sink.clone();
        let _ = std::thread::spawn(move || {
            let _files = holder.files.write().unwrap();
            panic!("writer panicked while holding the lock");
        })
        .join();
        assert!(sink.files.is_poisoned());

        sink.write("a.xml", "a").await.unwrap();
        assert_eq!(sink.get("a.xml").as_deref(), Some("a"));
        assert_eq!(sink.names(), vec!["a.xml"]);
    }
}
