//! Directory tree traversal for the template tree archive.
//!
//! Walks are sorted by file name so the same tree always produces the same
//! archive. Entries that cannot be read are skipped and counted instead of
//! aborting the walk.

use std::path::{Component, Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Options for directory walking
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Follow symbolic links
    pub follow_links: bool,

    /// Maximum depth below the root (None = unlimited)
    pub max_depth: Option<usize>,

    /// File names to skip, together with everything beneath them
    pub exclude_patterns: Vec<String>,
}

/// One directory or regular file found under the walk root
#[derive(Debug, Clone)]
pub struct TreeEntry {
    /// Full path on disk
    pub path: PathBuf,

    /// Path relative to the root, `/`-separated
    pub relative_path: String,

    /// Is this a directory?
    pub is_dir: bool,

    /// Depth below the root (1 = immediate child)
    pub depth: usize,
}

/// Result of a walk
#[derive(Debug, Default)]
pub struct TreeWalk {
    pub entries: Vec<TreeEntry>,

    /// Entries that could not be read or named
    pub skipped: usize,
}

/// Walk a directory tree and collect every directory and regular file below
/// `root` (the root itself is not included).
///
/// # Returns
/// * `Ok(TreeWalk)` - Entries in sorted walk order plus a skip count
/// * `Err(io::Error)` - If `root` itself cannot be listed
///
/// # Example
/// ```no_run
/// use store_backup::fs::walker::{walk_tree, WalkOptions};
/// use std::path::Path;
///
/// let walk = walk_tree(Path::new("/srv/templates"), &WalkOptions::default()).unwrap();
/// println!("Found {} entries", walk.entries.len());
/// ```
pub fn walk_tree(root: &Path, options: &WalkOptions) -> std::io::Result<TreeWalk> {
    // Probe the root so an unlistable root is an error rather than a skip.
    std::fs::read_dir(root)?;

    let mut walk = TreeWalk::default();

    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(options.follow_links)
        .sort_by_file_name();

    if let Some(max_depth) = options.max_depth {
        walker = walker.max_depth(max_depth);
    }

    let iter = walker
        .into_iter()
        .filter_entry(|entry| !should_exclude(entry, &options.exclude_patterns));

    for entry in iter {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                walk.skipped += 1;
                continue;
            }
        };

        let file_type = entry.file_type();
        if !file_type.is_dir() && !file_type.is_file() {
            warn!("Skipping non-regular entry: {}", entry.path().display());
            walk.skipped += 1;
            continue;
        }

        let Some(relative_path) = relative_slash_path(entry.path(), root) else {
            warn!("Skipping entry with non UTF-8 path: {}", entry.path().display());
            walk.skipped += 1;
            continue;
        };

        walk.entries.push(TreeEntry {
            path: entry.path().to_path_buf(),
            relative_path,
            is_dir: file_type.is_dir(),
            depth: entry.depth(),
        });
    }

    Ok(walk)
}

/// Express `path` relative to `root` with `/` separators, whatever the host
/// separator is.
pub fn relative_slash_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Check if a directory entry should be excluded based on patterns
fn should_exclude(entry: &DirEntry, patterns: &[String]) -> bool {
    let file_name = entry.file_name().to_string_lossy();
    patterns.iter().any(|pattern| file_name == pattern.as_str())
}
