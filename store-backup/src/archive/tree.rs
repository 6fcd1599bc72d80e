//! Template tree archive: a tar stream wrapped in zstd.
//!
//! The tree is the one store whose hierarchy matters, so it travels as a
//! self-contained archive inside the envelope instead of as a flat list.

use crate::executor::report::CollectionReport;
use crate::fs::metadata::EntryMetadata;
use crate::fs::walker::{walk_tree, WalkOptions};
use crate::utils::errors::{BackupError, Result};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// A compressed archive of one directory tree
#[derive(Debug)]
pub struct TreeArchive {
    /// zstd(tar) bytes, always a complete stream with an end marker
    pub data: Vec<u8>,

    /// Whether the root directory itself could be listed
    pub root_listed: bool,

    pub report: CollectionReport,
}

/// Archive everything below `root`.
///
/// Unreadable entries are skipped and counted. An unlistable root produces a
/// valid archive with no entries.
pub fn archive_tree(root: &Path, options: &WalkOptions, level: i32) -> Result<TreeArchive> {
    let mut report = CollectionReport::default();
    let mut builder = tar::Builder::new(Vec::new());

    let root_listed = match walk_tree(root, options) {
        Ok(walk) => {
            report.skipped += walk.skipped;
            for entry in &walk.entries {
                match append_entry(&mut builder, &entry.path, &entry.relative_path, entry.is_dir) {
                    Ok(()) => {
                        debug!("Archived {}", entry.relative_path);
                        report.processed += 1;
                    }
                    Err(e) => {
                        warn!("Skipping {}: {}", entry.relative_path, e);
                        report.skipped += 1;
                    }
                }
            }
            true
        }
        Err(e) => {
            warn!("Cannot list template tree {}: {}", root.display(), e);
            false
        }
    };

    let tar_bytes = builder.into_inner()?;
    let data = zstd::bulk::compress(&tar_bytes, level)?;

    info!(
        "Archived template tree {}: {} entries, {} skipped, {} bytes",
        root.display(),
        report.processed,
        report.skipped,
        data.len()
    );

    Ok(TreeArchive {
        data,
        root_listed,
        report,
    })
}

/// Append one header (and payload for files).
///
/// File contents are read completely before the header is written, so a
/// failed read never leaves a truncated entry in the stream.
fn append_entry(
    builder: &mut tar::Builder<Vec<u8>>,
    path: &Path,
    relative_path: &str,
    is_dir: bool,
) -> Result<()> {
    let metadata = EntryMetadata::from_path(path).map_err(|e| BackupError::directory_io(path, e))?;
    let mut header = tar::Header::new_gnu();

    if is_dir {
        metadata.write_header(&mut header, 0);
        builder.append_data(&mut header, relative_path, io::empty())?;
    } else {
        let data = fs::read(path).map_err(|e| BackupError::directory_io(path, e))?;
        metadata.write_header(&mut header, data.len() as u64);
        builder.append_data(&mut header, relative_path, data.as_slice())?;
    }

    Ok(())
}

/// Rebuild a tree under `target` from an archive made by [`archive_tree`].
///
/// Parent directories are created at file-write time, so the archive order
/// does not matter. Malformed entries are skipped and extraction continues.
/// A stream failure part-way through keeps what was already written and
/// counts one skip. `Err` is returned only if the stream cannot be opened.
pub fn extract_tree(data: &[u8], target: &Path) -> Result<CollectionReport> {
    let decoder = zstd::Decoder::new(data)
        .map_err(|e| BackupError::ArchiveFormat(format!("cannot open tree stream: {}", e)))?;
    let mut archive = tar::Archive::new(decoder);
    let mut report = CollectionReport::default();

    let entries = archive
        .entries()
        .map_err(|e| BackupError::ArchiveFormat(format!("cannot read tree entries: {}", e)))?;

    for entry in entries {
        let mut entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let err = BackupError::ArchiveFormat(format!("tree stream ended early: {}", e));
                warn!("{}", err);
                report.skipped += 1;
                break;
            }
        };

        match extract_entry(&mut entry, target) {
            Ok(Some(path)) => {
                debug!("Extracted {}", path.display());
                report.processed += 1;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Skipping tree entry: {}", e);
                report.skipped += 1;
            }
        }
    }

    info!(
        "Extracted template tree into {}: {} entries, {} skipped",
        target.display(),
        report.processed,
        report.skipped
    );

    Ok(report)
}

/// Returns the written path, or `None` for entries that carry no content of
/// their own (global pax headers).
fn extract_entry<R: io::Read>(entry: &mut tar::Entry<'_, R>, target: &Path) -> Result<Option<PathBuf>> {
    let entry_type = entry.header().entry_type();
    if entry_type == tar::EntryType::XGlobalHeader {
        return Ok(None);
    }

    let raw_path = entry
        .path()
        .map_err(|e| BackupError::ArchiveFormat(format!("unreadable entry path: {}", e)))?
        .into_owned();
    let relative = sanitize_entry_path(&raw_path)?;
    let dest = target.join(&relative);
    let metadata = EntryMetadata::from_header(entry.header());

    match entry_type {
        tar::EntryType::Directory => {
            fs::create_dir_all(&dest).map_err(|e| BackupError::directory_io(&dest, e))?;
        }
        tar::EntryType::Regular | tar::EntryType::Continuous => {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| BackupError::directory_io(parent, e))?;
            }
            let expected = entry.header().size().unwrap_or_default();
            let mut file = fs::File::create(&dest).map_err(|e| BackupError::directory_io(&dest, e))?;
            let copied = io::copy(entry, &mut file);
            drop(file);
            let failure = match copied {
                Ok(written) if written == expected => None,
                Ok(written) => Some(BackupError::ArchiveFormat(format!(
                    "payload of {} truncated: {} of {} bytes",
                    raw_path.display(),
                    written,
                    expected
                ))),
                Err(e) => Some(BackupError::directory_io(&dest, e)),
            };
            if let Some(err) = failure {
                // A short file would pass for a restored one.
                let _ = fs::remove_file(&dest);
                return Err(err);
            }
            if let Err(e) = metadata.apply_to_path(&dest) {
                warn!("Cannot set mode on {}: {}", dest.display(), e);
            }
        }
        other => {
            return Err(BackupError::ArchiveFormat(format!(
                "unsupported entry type {:?} for {}",
                other,
                raw_path.display()
            )));
        }
    }

    Ok(Some(dest))
}

/// Accept only relative paths made of plain components.
fn sanitize_entry_path(path: &Path) -> Result<PathBuf> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => {
                return Err(BackupError::ArchiveFormat(format!(
                    "entry path escapes the tree root: {}",
                    path.display()
                )));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(BackupError::ArchiveFormat("empty entry path".to_string()));
    }
    Ok(clean)
}
