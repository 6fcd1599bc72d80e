//! Serialized access to the backup orchestrator.
//!
//! Uploads and downloads wipe and rewrite the same directories, so at most
//! one may run at a time. The lock guard travels into the blocking task and
//! is only released when the work itself is done, even if the caller stops
//! waiting.

use crate::executor::report::BackupReport;
use crate::executor::{BackupOrchestrator, Download};
use crate::utils::errors::{BackupError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Clone)]
pub struct BackupService {
    orchestrator: Arc<BackupOrchestrator>,
    gate: Arc<Mutex<()>>,
}

impl BackupService {
    pub fn new(orchestrator: BackupOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Restore all stores from `blob`
    pub async fn upload(&self, blob: Vec<u8>) -> Result<BackupReport> {
        self.run("upload", move |orchestrator| orchestrator.upload(&blob))
            .await
    }

    /// Capture all stores into a blob
    pub async fn download(&self) -> Result<Download> {
        self.run("download", |orchestrator| orchestrator.download())
            .await
    }

    async fn run<T, F>(&self, operation: &'static str, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&BackupOrchestrator) -> Result<T> + Send + 'static,
    {
        let guard = Arc::clone(&self.gate).lock_owned().await;
        debug!("Backup {} acquired the store lock", operation);

        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            work(&orchestrator)
        })
        .await
        .map_err(|e| BackupError::Task(format!("{} task failed: {}", operation, e)))?
    }
}
