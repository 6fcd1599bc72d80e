//! Per-collection outcome of a backup or restore.
//!
//! The engine is best effort: a skipped file never fails the operation, so
//! the report is the only place a caller can see what was left out.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    /// Files (and, for the template tree, directories) handled successfully
    pub processed: usize,

    /// Items skipped after a logged failure
    pub skipped: usize,
}

impl CollectionReport {
    pub fn is_complete(&self) -> bool {
        self.skipped == 0
    }
}

/// Outcome of one upload or download, per collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackupReport {
    pub content_store: CollectionReport,
    pub template_store: CollectionReport,
    pub images: CollectionReport,
    pub template_tree: CollectionReport,
}

impl BackupReport {
    fn collections(&self) -> [&CollectionReport; 4] {
        [
            &self.content_store,
            &self.template_store,
            &self.images,
            &self.template_tree,
        ]
    }

    /// True when nothing in any collection was skipped
    pub fn is_complete(&self) -> bool {
        self.collections().iter().all(|c| c.is_complete())
    }

    pub fn total_processed(&self) -> usize {
        self.collections().iter().map(|c| c.processed).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.collections().iter().map(|c| c.skipped).sum()
    }
}
