//! Append-only research log.

use super::{Tool, ToolKind};
use crate::error::{ForskError, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

/// The `save_text_to_file` tool.
///
/// Each call appends one complete block. Blocks are written with a single
/// `write_all` on an append-mode handle while holding the tool's lock, so
/// concurrent requests never interleave inside a block.
pub struct SaveTool {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SaveTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Frame `data` as one log block.
pub fn format_block(data: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "--- Research Output ---\nTimestamp: {}\n\n{}\n\n",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        data
    )
}

fn append_block(path: &Path, block: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(block.as_bytes())?;
    file.flush()
}

#[async_trait]
impl Tool for SaveTool {
    fn kind(&self) -> ToolKind {
        ToolKind::SaveTextToFile
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let block = format_block(input, Local::now().naive_local());

        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_block(&path, &block))
            .await
            .map_err(|e| ForskError::tool(ToolKind::SaveTextToFile.name(), e.to_string()))??;

        info!("Appended research output to {}", self.path.display());
        Ok(format!("Data successfully saved to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[test]
    fn test_format_block() {
        let timestamp = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap();
        assert_eq!(
            format_block("GDP summary", timestamp),
            "--- Research Output ---\nTimestamp: 2024-03-09 14:05:07\n\nGDP summary\n\n"
        );
    }

    #[tokio::test]
    async fn test_appends_without_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("research_output.txt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "existing\n").unwrap();

        let tool = SaveTool::new(&path);
        let reply = tool.invoke("first").await.unwrap();
        tool.invoke("second").await.unwrap();

        assert_eq!(reply, format!("Data successfully saved to {}", path.display()));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("existing\n--- Research Output ---\n"));
        assert!(content.find("\n\nfirst\n\n").unwrap() < content.find("\n\nsecond\n\n").unwrap());
    }

    #[tokio::test]
    async fn test_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("out.txt");

        SaveTool::new(&path).invoke("hello").await.unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("\n\nhello\n\n"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("research_output.txt");
        let tool = Arc::new(SaveTool::new(&path));

        let payload = |i: usize| format!("writer-{}:{}", i, "x".repeat(8192));
        let tasks = (0..16).map(|i| {
            let tool = tool.clone();
            let data = payload(i);
            tokio::spawn(async move { tool.invoke(&data).await })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let blocks: Vec<&str> = content
            .split("--- Research Output ---\n")
            .filter(|b| !b.is_empty())
            .collect();
        assert_eq!(blocks.len(), 16);
        for block in blocks {
            let body = block.split_once("\n\n").unwrap().1;
            let (header, rest) = body.split_once(':').unwrap();
            assert!(header.starts_with("writer-"));
            assert_eq!(rest, format!("{}\n\n", "x".repeat(8192)));
        }
    }
}
