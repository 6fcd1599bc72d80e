//! Flat directory snapshots.

use crate::archive::envelope::BackupFile;
use crate::utils::errors::BackupError;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Files captured from one flat store
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Captured files, sorted by name
    pub files: Vec<BackupFile>,

    /// Files that could not be read or named
    pub skipped: usize,

    /// Whether the directory itself could be listed
    pub listed: bool,
}

/// Capture every regular file directly inside `dir`.
///
/// Subdirectories are ignored. Symlinks are followed and kept when they
/// point at a regular file. A file that cannot be read is left out of the
/// snapshot; a directory that cannot be listed yields an empty snapshot.
pub fn snapshot_directory(dir: &Path) -> Snapshot {
    let mut snapshot = Snapshot::default();
    let location = dir.display().to_string();

    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            warn!("{}", BackupError::directory_io(dir, e));
            return snapshot;
        }
    };
    snapshot.listed = true;

    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("{}", BackupError::directory_io(dir, e));
                snapshot.skipped += 1;
                continue;
            }
        };
        let path = entry.path();

        // fs::metadata follows symlinks.
        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                warn!("{}", BackupError::directory_io(&path, e));
                snapshot.skipped += 1;
                continue;
            }
        }

        let Ok(name) = entry.file_name().into_string() else {
            warn!("Skipping file with non UTF-8 name: {}", path.display());
            snapshot.skipped += 1;
            continue;
        };

        match fs::read(&path) {
            Ok(data) => {
                debug!("Captured {} ({} bytes)", path.display(), data.len());
                snapshot.files.push(BackupFile::new(location.clone(), name, data));
            }
            Err(e) => {
                warn!("{}", BackupError::directory_io(&path, e));
                snapshot.skipped += 1;
            }
        }
    }

    snapshot.files.sort_by(|a, b| a.name.cmp(&b.name));
    snapshot
}
