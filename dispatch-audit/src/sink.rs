//! Alert sink backends: where the Monitor's raised alerts go.

use crate::Alert;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Where the Monitor delivers alerts. The Monitor never pages anyone
/// itself; a sink implementation decides what happens next.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn emit(&self, alert: &Alert) -> Result<(), AlertSinkError>;

    /// Flush any buffered writes.
    async fn flush(&self) -> Result<(), AlertSinkError> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AlertSinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Writes alerts to a file, one JSON object per line.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AlertSink for FileBackend {
    async fn emit(&self, alert: &Alert) -> Result<(), AlertSinkError> {
        let json = alert.to_json()?;

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;

        file.write_all(json.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;

        Ok(())
    }
}

/// In-memory sink for tests: asserts on what the Monitor raised.
#[derive(Clone)]
pub struct MemoryBackend {
    alerts: std::sync::Arc<tokio::sync::Mutex<Vec<Alert>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self { alerts: std::sync::Arc::new(tokio::sync::Mutex::new(Vec::new())) }
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.alerts.lock().await.clear();
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSink for MemoryBackend {
    async fn emit(&self, alert: &Alert) -> Result<(), AlertSinkError> {
        self.alerts.lock().await.push(alert.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AlertLevel;

    #[tokio::test]
    async fn memory_backend_records_alerts() {
        let sink = MemoryBackend::new();
        let alert = Alert::new("worker_stale", AlertLevel::Critical, "worker offline");

        sink.emit(&alert).await.unwrap();

        let alerts = sink.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, "worker_stale");
    }

    #[tokio::test]
    async fn memory_backend_clear_empties_the_log() {
        let sink = MemoryBackend::new();
        sink.emit(&Alert::new("x", AlertLevel::Info, "y")).await.unwrap();
        sink.clear().await;
        assert!(sink.alerts().await.is_empty());
    }
}
