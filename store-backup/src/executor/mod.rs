//! Backup orchestration.
//!
//! Ties together the flat store snapshot/restore, the template tree archive
//! and the envelope codec, and tells dependent stores when their backing
//! files have been replaced.
//!
//! Operations are synchronous and perform destructive wipe-then-write
//! sequences without locking. Callers must not run two of them against the
//! same stores at once; [`crate::service::BackupService`] enforces that.

pub mod report;

use crate::archive::codec::ArchiveCodec;
use crate::archive::envelope::{BackupEnvelope, BackupFile, TEMPLATE_TREE_FILE_NAME};
use crate::archive::tree::{archive_tree, extract_tree};
use crate::config::{Config, StorePaths};
use crate::fs::restore::{restore_directory, wipe_directory};
use crate::fs::snapshot::snapshot_directory;
use crate::fs::walker::WalkOptions;
use crate::store::Reload;
use crate::utils::errors::{BackupError, Result};
use report::{BackupReport, CollectionReport};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Result of [`BackupOrchestrator::download`]
#[derive(Debug)]
pub struct Download {
    /// Whether the template tree root could be listed. The flat stores do
    /// not affect this flag; see `report` for them.
    pub template_tree_listed: bool,

    /// Encoded backup blob
    pub blob: Vec<u8>,

    pub report: BackupReport,
}

/// Main backup orchestrator
pub struct BackupOrchestrator {
    paths: StorePaths,
    content_store: Arc<dyn Reload>,
    template_store: Arc<dyn Reload>,
    codec: ArchiveCodec,
    walk_options: WalkOptions,
}

impl BackupOrchestrator {
    /// Create an orchestrator with default compression and walk options
    pub fn new(
        paths: StorePaths,
        content_store: Arc<dyn Reload>,
        template_store: Arc<dyn Reload>,
    ) -> Self {
        let walk_options = WalkOptions {
            exclude_patterns: paths.tree_exclude.clone(),
            ..WalkOptions::default()
        };
        Self {
            paths,
            content_store,
            template_store,
            codec: ArchiveCodec::default(),
            walk_options,
        }
    }

    /// Create an orchestrator from a loaded configuration
    pub fn from_config(
        config: &Config,
        content_store: Arc<dyn Reload>,
        template_store: Arc<dyn Reload>,
    ) -> Self {
        Self::new(config.stores.clone(), content_store, template_store)
            .with_codec(ArchiveCodec::new(config.archive.compression_level))
    }

    pub fn with_codec(mut self, codec: ArchiveCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_walk_options(mut self, walk_options: WalkOptions) -> Self {
        self.walk_options = walk_options;
        self
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Restore every store from a backup blob.
    ///
    /// Only a blob that fails to decode is an error, and in that case no
    /// directory has been touched. Once decoding succeeds the restore is
    /// best effort: skipped files show up in the report, not as an error.
    pub fn upload(&self, blob: &[u8]) -> Result<BackupReport> {
        let start_time = Instant::now();

        let envelope = match self.codec.decode(blob) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("Rejecting backup blob of {} bytes: {}", blob.len(), e);
                return Err(e);
            }
        };

        info!(
            "Restoring backup: {} content, {} template store, {} image files",
            envelope.content_store_files.len(),
            envelope.template_store_files.len(),
            envelope.image_files.len()
        );

        let mut report = BackupReport::default();

        report.content_store =
            restore_directory(&self.paths.content_store, &envelope.content_store_files);
        self.content_store.reload();

        report.template_store =
            restore_directory(&self.paths.template_store, &envelope.template_store_files);
        self.template_store.reload();

        report.images = restore_directory(&self.paths.images, &envelope.image_files);

        report.template_tree = self.restore_template_tree(&envelope.template_tree);

        info!(
            "Restore finished in {:?}: {} restored, {} skipped",
            start_time.elapsed(),
            report.total_processed(),
            report.total_skipped()
        );

        Ok(report)
    }

    fn restore_template_tree(&self, tree: &BackupFile) -> CollectionReport {
        let target = &self.paths.template_tree;

        if let Err(e) = wipe_directory(target) {
            warn!("{}", BackupError::directory_io(target, e));
            return CollectionReport { processed: 0, skipped: 1 };
        }

        match extract_tree(&tree.data, target) {
            Ok(report) => report,
            Err(e) => {
                warn!("Template tree not restored: {}", e);
                CollectionReport { processed: 0, skipped: 1 }
            }
        }
    }

    /// Capture every store into a backup blob.
    ///
    /// `template_tree_listed` mirrors whether the template tree root could be
    /// listed; unreadable flat stores simply contribute empty lists.
    pub fn download(&self) -> Result<Download> {
        let start_time = Instant::now();
        let mut report = BackupReport::default();

        let content = snapshot_directory(&self.paths.content_store);
        report.content_store = snapshot_report(content.files.len(), content.skipped);

        let templates = snapshot_directory(&self.paths.template_store);
        report.template_store = snapshot_report(templates.files.len(), templates.skipped);

        let images = snapshot_directory(&self.paths.images);
        report.images = snapshot_report(images.files.len(), images.skipped);

        let tree = archive_tree(
            &self.paths.template_tree,
            &self.walk_options,
            self.codec.level(),
        )?;
        report.template_tree = tree.report;

        let envelope = BackupEnvelope {
            content_store_files: content.files,
            template_store_files: templates.files,
            image_files: images.files,
            template_tree: BackupFile::new(
                self.paths.template_tree.display().to_string(),
                TEMPLATE_TREE_FILE_NAME,
                tree.data,
            ),
        };

        let blob = self.codec.encode(&envelope)?;

        info!(
            "Backup captured in {:?}: {} items, {} skipped, {} bytes",
            start_time.elapsed(),
            report.total_processed(),
            report.total_skipped(),
            blob.len()
        );

        Ok(Download {
            template_tree_listed: tree.root_listed,
            blob,
            report,
        })
    }
}

fn snapshot_report(processed: usize, skipped: usize) -> CollectionReport {
    CollectionReport { processed, skipped }
}
