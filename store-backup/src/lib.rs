//! Store Backup Library
//!
//! Collapses the storefront's file stores (content records, template
//! records, images and the nested template tree) into one compressed blob,
//! and restores them from it.

pub mod archive;
pub mod config;
pub mod executor;
pub mod fs;
pub mod service;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use archive::{ArchiveCodec, BackupEnvelope, BackupFile};
pub use config::{Config, StorePaths};
pub use executor::report::{BackupReport, CollectionReport};
pub use executor::{BackupOrchestrator, Download};
pub use service::BackupService;
pub use store::{ContentStore, FileStore, Reload};
pub use utils::errors::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;
