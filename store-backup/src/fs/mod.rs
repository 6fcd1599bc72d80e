//! File system access for the backup engine.

pub mod metadata;
pub mod restore;
pub mod snapshot;
pub mod walker;

pub use restore::{restore_directory, wipe_directory};
pub use snapshot::{snapshot_directory, Snapshot};
pub use walker::{walk_tree, WalkOptions};
