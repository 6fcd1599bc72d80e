//! Entry metadata carried through the template tree archive.
//!
//! Only the Unix mode and modification time survive a round trip; ownership
//! is left to whoever runs the restore.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Mode recorded for files when the platform has no permission bits.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Mode recorded for directories when the platform has no permission bits.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Metadata for one archived entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Permission bits (no file type bits)
    pub mode: u32,

    /// Last modified time (seconds since Unix epoch)
    pub modified: u64,

    /// Is this a directory?
    pub is_dir: bool,
}

impl EntryMetadata {
    /// Extract metadata from a path, following symlinks
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        Ok(Self::from_metadata(&fs::metadata(path)?))
    }

    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let is_dir = metadata.is_dir();

        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            metadata.permissions().mode() & 0o7777
        };

        #[cfg(not(unix))]
        let mode = if is_dir { DEFAULT_DIR_MODE } else { DEFAULT_FILE_MODE };

        Self {
            mode,
            modified,
            is_dir,
        }
    }

    /// Fill the mode, mtime and size fields of a tar header
    pub fn write_header(&self, header: &mut tar::Header, size: u64) {
        header.set_entry_type(if self.is_dir {
            tar::EntryType::Directory
        } else {
            tar::EntryType::Regular
        });
        header.set_mode(self.mode);
        header.set_mtime(self.modified);
        header.set_size(size);
    }

    /// Read metadata back out of a tar header, falling back to defaults for
    /// fields the header cannot decode
    pub fn from_header(header: &tar::Header) -> Self {
        let is_dir = header.entry_type().is_dir();
        let fallback = if is_dir { DEFAULT_DIR_MODE } else { DEFAULT_FILE_MODE };
        Self {
            mode: header.mode().map(|m| m & 0o7777).unwrap_or(fallback),
            modified: header.mtime().unwrap_or_default(),
            is_dir,
        }
    }

    /// Apply the recorded permission bits to a path
    #[cfg(unix)]
    pub fn apply_to_path(&self, path: &Path) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(self.mode))
    }

    #[cfg(not(unix))]
    pub fn apply_to_path(&self, _path: &Path) -> std::io::Result<()> {
        Ok(())
    }
}
