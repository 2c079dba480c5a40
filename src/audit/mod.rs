//! Append-only notes describing every mutating call sent to the manager.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

/// Receives one plain-text description per mutating call.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn note(&self, note: &str);
}

/// Discards every note.
pub struct NoopAudit;

#[async_trait::async_trait]
impl AuditSink for NoopAudit {
    async fn note(&self, _note: &str) {}
}

/// Appends timestamped notes to a file, one per line.
///
/// A failed write is logged and otherwise ignored.
pub struct FileAuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileAuditLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait::async_trait]
impl AuditSink for FileAuditLog {
    async fn note(&self, note: &str) {
        let line = format!(
            "{} {}\n",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            note.replace('\n', " ")
        );
        if let Err(e) = self.append(&line).await {
            warn!(
                component = "audit",
                event = "write_failed",
                path = ?self.path,
                error = %e,
                "failed to append audit note"
            );
        }
    }
}
