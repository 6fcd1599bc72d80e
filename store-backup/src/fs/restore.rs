//! Destructive restore of flat store directories.
//!
//! Restoring replaces a directory wholesale: anything present before the
//! call and absent from the backup is gone afterwards. Nothing here is
//! transactional; a failure part-way leaves a partially restored directory.

use crate::archive::envelope::BackupFile;
use crate::executor::report::CollectionReport;
use crate::utils::errors::BackupError;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, warn};

/// Mode given to recreated store directories (before umask).
pub const STORE_DIR_MODE: u32 = 0o755;

/// Remove `dir` (whatever is there) and recreate it empty, ancestors included.
pub fn wipe_directory(dir: &Path) -> std::io::Result<()> {
    match fs::symlink_metadata(dir) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(dir)?,
        Ok(_) => fs::remove_file(dir)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    create_store_dir(dir)
}

#[cfg(unix)]
fn create_store_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(STORE_DIR_MODE)
        .create(dir)
}

#[cfg(not(unix))]
fn create_store_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

/// Replace the contents of `dir` with `files`.
///
/// Per-file failures are logged and counted; they never stop the remaining
/// files from being written. If the directory cannot be recreated every file
/// counts as skipped.
pub fn restore_directory(dir: &Path, files: &[BackupFile]) -> CollectionReport {
    let mut report = CollectionReport::default();

    if let Err(e) = wipe_directory(dir) {
        warn!("{}", BackupError::directory_io(dir, e));
        report.skipped = files.len();
        return report;
    }

    for file in files {
        if !is_plain_file_name(&file.name) {
            warn!("Skipping backup file with unsafe name {:?} for {}", file.name, dir.display());
            report.skipped += 1;
            continue;
        }

        let path = dir.join(&file.name);
        match fs::write(&path, &file.data) {
            Ok(()) => {
                debug!("Restored {} ({} bytes)", path.display(), file.data.len());
                report.processed += 1;
            }
            Err(e) => {
                warn!("{}", BackupError::directory_io(&path, e));
                report.skipped += 1;
            }
        }
    }

    report
}

/// A name is accepted only if it is exactly one normal path component.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}
