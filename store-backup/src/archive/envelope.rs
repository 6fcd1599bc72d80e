//! The backup envelope: every collection of one backup, serialized as a unit.

use serde::{Deserialize, Serialize};

/// Name given to the template tree archive inside the envelope.
pub const TEMPLATE_TREE_FILE_NAME: &str = "templates.tar.zst";

/// One file's identity and exact byte content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupFile {
    /// Directory the file was captured from. Informational only; restores
    /// always target the configured store path.
    pub location: String,

    /// File name, unique within its collection
    pub name: String,

    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl BackupFile {
    pub fn new(location: impl Into<String>, name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEnvelope {
    pub content_store_files: Vec<BackupFile>,
    pub template_store_files: Vec<BackupFile>,
    pub image_files: Vec<BackupFile>,

    /// Compressed tar stream of the template tree, not a flat file
    pub template_tree: BackupFile,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
