//! Backup blob formats.
//!
//! - `envelope`: the serializable aggregate of all collections
//! - `codec`: envelope <-> compressed blob
//! - `tree`: template tree <-> compressed tar stream

pub mod codec;
pub mod envelope;
pub mod tree;

pub use codec::ArchiveCodec;
pub use envelope::{BackupEnvelope, BackupFile, TEMPLATE_TREE_FILE_NAME};
pub use tree::{archive_tree, extract_tree, TreeArchive};
