//! Directory-backed record store.
//!
//! Each record lives in `<dir>/<key>.json`; the directory is exactly the kind
//! of flat store the backup engine snapshots and restores. Reads are served
//! from an in-memory copy that [`Reload::reload`] refreshes.

use super::{ContentStore, Reload};
use crate::utils::errors::{BackupError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const RECORD_EXTENSION: &str = "json";

pub struct FileStore {
    dir: PathBuf,
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl FileStore {
    /// Open a store over `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| BackupError::directory_io(&dir, e))?;
        let store = Self {
            records: RwLock::new(load_records(&dir)),
            dir,
        };
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn record_path(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_key(key) {
            return Err(BackupError::Config(format!("invalid record key {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.{}", key, RECORD_EXTENSION)))
    }
}

impl Reload for FileStore {
    fn reload(&self) {
        let records = load_records(&self.dir);
        info!("Reloaded {} records from {}", records.len(), self.dir.display());
        *self.records.write() = records;
    }
}

impl ContentStore for FileStore {
    fn read(&self, key: &str) -> Option<Vec<u8>> {
        self.records.read().get(key).cloned()
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.record_path(key)?;
        fs::write(&path, value).map_err(|e| BackupError::directory_io(&path, e))?;
        self.records.write().insert(key.to_string(), value.to_vec());
        debug!("Saved record {}", key);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let path = self.record_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(BackupError::directory_io(&path, e)),
        }
        Ok(self.records.write().remove(key).is_some())
    }

    fn read_all(&self) -> Vec<Vec<u8>> {
        self.records.read().values().cloned().collect()
    }
}

/// Keys become file names, so they must be a single safe path component.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(['/', '\\', '\0'])
}

/// Read every `*.json` file in `dir`. Unreadable files are left out.
fn load_records(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut records = BTreeMap::new();

    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            warn!("Cannot list record store {}: {}", dir.display(), e);
            return records;
        }
    };

    for entry in read_dir.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
            continue;
        }
        let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match fs::read(&path) {
            Ok(data) => {
                records.insert(key.to_string(), data);
            }
            Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_crud() -> Result<()> {
        let dir = TempDir::new()?;
        let store = FileStore::open(dir.path())?;
        assert!(store.is_empty());

        store.save("about", br#"{"title":"About"}"#)?;
        store.save("home", br#"{"title":"Home"}"#)?;
        assert_eq!(store.read("about").as_deref(), Some(&br#"{"title":"About"}"#[..]));
        assert_eq!(store.len(), 2);
        assert!(dir.path().join("home.json").is_file());

        assert!(store.delete("about")?);
        assert!(!store.delete("about")?);
        assert!(store.read("about").is_none());
        assert_eq!(store.read_all(), vec![br#"{"title":"Home"}"#.to_vec()]);
        Ok(())
    }

    #[test]
    fn test_read_all_is_ordered_by_key() -> Result<()> {
        let dir = TempDir::new()?;
        let store = FileStore::open(dir.path())?;
        store.save("b", b"2")?;
        store.save("a", b"1")?;
        store.save("c", b"3")?;
        assert_eq!(store.read_all(), vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]);
        Ok(())
    }

    #[test]
    fn test_reload_picks_up_replaced_files() -> Result<()> {
        let dir = TempDir::new()?;
        let store = FileStore::open(dir.path())?;
        store.save("old", b"stale")?;

        fs::remove_file(dir.path().join("old.json"))?;
        fs::write(dir.path().join("fresh.json"), b"new")?;
        fs::write(dir.path().join("notes.txt"), b"ignored")?;
        assert!(store.read("fresh").is_none());

        store.reload();
        assert!(store.read("old").is_none());
        assert_eq!(store.read("fresh").as_deref(), Some(&b"new"[..]));
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[test]
    fn test_open_loads_existing_records() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("page.json"), b"{}")?;
        let store = FileStore::open(dir.path())?;
        assert_eq!(store.read("page").as_deref(), Some(&b"{}"[..]));
        Ok(())
    }

    #[test]
    fn test_rejects_path_keys() -> Result<()> {
        let dir = TempDir::new()?;
        let store = FileStore::open(dir.path().join("store"))?;
        assert!(store.save("../outside", b"x").is_err());
        assert!(store.save("", b"x").is_err());
        assert!(store.delete("a/b").is_err());
        assert!(!dir.path().join("outside.json").exists());
        Ok(())
    }
}
