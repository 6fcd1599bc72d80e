//! Configuration management for the backup engine.
//!
//! Loads configuration from a TOML file. Store paths are fixed at
//! construction time and never travel inside a backup blob.

use crate::utils::errors::{BackupError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub stores: StorePaths,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Locations of the four file stores covered by a backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorePaths {
    /// Flat directory backing the content record store
    pub content_store: PathBuf,

    /// Flat directory backing the template record store
    pub template_store: PathBuf,

    /// Flat directory of uploaded images
    pub images: PathBuf,

    /// Root of the nested template-engine tree
    pub template_tree: PathBuf,

    /// File names skipped (with their subtree) when archiving the template tree
    #[serde(default)]
    pub tree_exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// zstd compression level used for the envelope and the template tree
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_compression_level() -> i32 {
    *zstd::compression_level_range().end()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            compression_level: default_compression_level(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for StorePaths {
    fn default() -> Self {
        Self {
            content_store: PathBuf::from("./data/contentStore"),
            template_store: PathBuf::from("./data/templateStore"),
            images: PathBuf::from("./static/images"),
            template_tree: PathBuf::from("./static/templates"),
            tree_exclude: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stores: StorePaths::default(),
            archive: ArchiveConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| BackupError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with safely.
    ///
    /// Two stores sharing a directory would wipe each other on restore.
    pub fn validate(&self) -> Result<()> {
        let range = zstd::compression_level_range();
        if !range.contains(&self.archive.compression_level) {
            return Err(BackupError::Config(format!(
                "compression_level {} outside {}..={}",
                self.archive.compression_level,
                range.start(),
                range.end()
            )));
        }

        let stores = [
            ("content_store", &self.stores.content_store),
            ("template_store", &self.stores.template_store),
            ("images", &self.stores.images),
            ("template_tree", &self.stores.template_tree),
        ];

        for (name, path) in &stores {
            if path.as_os_str().is_empty() {
                return Err(BackupError::Config(format!("stores.{} is empty", name)));
            }
        }

        for (i, (name_a, path_a)) in stores.iter().enumerate() {
            for (name_b, path_b) in stores.iter().skip(i + 1) {
                if path_a == path_b {
                    return Err(BackupError::Config(format!(
                        "stores.{} and stores.{} share {}",
                        name_a,
                        name_b,
                        path_a.display()
                    )));
                }
            }
        }

        Ok(())
    }
}
