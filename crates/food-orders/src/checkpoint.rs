//! Feed consumer checkpoints.
//!
//! A checkpoint is the feed sequence up to which every event has been fully handled. The
//! worker reopens the feed there after a restart.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkpoint file {path} is corrupt: {content:?}")]
    Corrupt { path: PathBuf, content: String },
}

/// Where a feed consumer keeps its position.
#[async_trait]
pub trait Checkpoint: Send + Sync {
    /// The saved position, or 0 if nothing was saved yet.
    async fn load(&self) -> Result<u64, CheckpointError>;

    async fn save(&self, sequence: u64) -> Result<(), CheckpointError>;
}

/// Checkpoint that lives as long as the process. Clones share the position.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpoint {
    position: Arc<AtomicU64>,
}

impl MemoryCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> u64 {
        self.position.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Checkpoint for MemoryCheckpoint {
    async fn load(&self) -> Result<u64, CheckpointError> {
        Ok(self.position())
    }

    async fn save(&self, sequence: u64) -> Result<(), CheckpointError> {
        self.position.store(sequence, Ordering::SeqCst);
        Ok(())
    }
}

/// Checkpoint persisted as a decimal number in a text file.
///
/// Saves write a sibling `.tmp` file and rename it over the target, so a crash mid-save
/// leaves either the old or the new value on disk.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl Checkpoint for FileCheckpoint {
    async fn load(&self) -> Result<u64, CheckpointError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        content
            .trim()
            .parse()
            .map_err(|_| CheckpointError::Corrupt {
                path: self.path.clone(),
                content,
            })
    }

    async fn save(&self, sequence: u64) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, format!("{sequence}\n")).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("food-orders-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn test_memory_checkpoint_shared_between_clones() {
        let checkpoint = MemoryCheckpoint::new();
        let clone = checkpoint.clone();
        assert_eq!(checkpoint.load().await.unwrap(), 0);

        clone.save(42).await.unwrap();
        assert_eq!(checkpoint.load().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_file_checkpoint_round_trip() {
        let path = scratch_path("orders.checkpoint");
        let checkpoint = FileCheckpoint::new(&path);

        assert_eq!(checkpoint.load().await.unwrap(), 0);
        checkpoint.save(17).await.unwrap();
        checkpoint.save(18).await.unwrap();

        let reopened = FileCheckpoint::new(&path);
        assert_eq!(reopened.load().await.unwrap(), 18);
        assert!(!checkpoint.temp_path().exists());

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[tokio::test]
    async fn test_corrupt_checkpoint_is_reported() {
        let path = scratch_path("broken.checkpoint");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not a number").unwrap();

        let result = FileCheckpoint::new(&path).load().await;
        assert!(matches!(result, Err(CheckpointError::Corrupt { .. })));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
