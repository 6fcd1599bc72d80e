//! Envelope codec: JSON wrapped in zstd.
//!
//! The blob carries no version marker. A blob written by an incompatible
//! schema fails to decode like any other corrupt input.

use super::envelope::BackupEnvelope;
use crate::utils::errors::{BackupError, Result};
use tracing::debug;

/// Highest compression level the linked zstd supports.
pub fn max_compression_level() -> i32 {
    *zstd::compression_level_range().end()
}

#[derive(Debug, Clone, Copy)]
pub struct ArchiveCodec {
    level: i32,
}

impl ArchiveCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    /// Serialize and compress an envelope.
    ///
    /// The bulk API is used so zstd sizes its tables to the actual payload
    /// rather than to the worst case of the chosen level.
    pub fn encode(&self, envelope: &BackupEnvelope) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(envelope)?;
        let compressed = zstd::bulk::compress(&json, self.level)?;
        debug!(
            "Encoded envelope: {} bytes of JSON -> {} bytes (level {})",
            json.len(),
            compressed.len(),
            self.level
        );
        Ok(compressed)
    }

    /// Decompress and deserialize an envelope. Never returns a partial result.
    pub fn decode(&self, blob: &[u8]) -> Result<BackupEnvelope> {
        let json = zstd::decode_all(blob)
            .map_err(|e| BackupError::Decode(format!("decompression failed: {}", e)))?;
        serde_json::from_slice(&json)
            .map_err(|e| BackupError::Decode(format!("invalid envelope document: {}", e)))
    }
}

impl Default for ArchiveCodec {
    fn default() -> Self {
        Self::new(max_compression_level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::envelope::{BackupFile, TEMPLATE_TREE_FILE_NAME};

    fn sample_envelope() -> BackupEnvelope {
        BackupEnvelope {
            content_store_files: vec![
                BackupFile::new("/srv/content", "about.json", br#"{"title":"About"}"#.to_vec()),
                BackupFile::new("/srv/content", "home.json", br#"{"title":"Home"}"#.to_vec()),
            ],
            template_store_files: vec![BackupFile::new("/srv/tpl", "active.json", b"{}".to_vec())],
            image_files: vec![BackupFile::new("/srv/img", "logo.png", vec![0x89, b'P', b'N', b'G', 0, 255])],
            template_tree: BackupFile::new("/srv/templates", TEMPLATE_TREE_FILE_NAME, vec![1, 2, 3]),
        }
    }

    fn empty_envelope() -> BackupEnvelope {
        BackupEnvelope {
            content_store_files: vec![],
            template_store_files: vec![],
            image_files: vec![],
            template_tree: BackupFile::new("", TEMPLATE_TREE_FILE_NAME, vec![]),
        }
    }

    #[test]
    fn test_envelope_round_trip() {
        let codec = ArchiveCodec::default();
        let envelope = sample_envelope();
        let blob = codec.encode(&envelope).unwrap();
        assert_eq!(codec.decode(&blob).unwrap(), envelope);
    }

    #[test]
    fn test_empty_envelope_round_trip() {
        let codec = ArchiveCodec::default();
        let envelope = empty_envelope();
        let blob = codec.encode(&envelope).unwrap();
        assert_eq!(codec.decode(&blob).unwrap(), envelope);
    }

    #[test]
    fn test_decode_rejects_every_truncation() {
        let codec = ArchiveCodec::new(3);
        let blob = codec.encode(&sample_envelope()).unwrap();
        for cut in 0..blob.len() {
            let result = codec.decode(&blob[..cut]);
            assert!(
                matches!(result, Err(BackupError::Decode(_))),
                "truncation at {} of {} decoded",
                cut,
                blob.len()
            );
        }
    }

    #[test]
    fn test_decode_rejects_uncompressed_json() {
        let json = serde_json::to_vec(&sample_envelope()).unwrap();
        assert!(matches!(
            ArchiveCodec::default().decode(&json),
            Err(BackupError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_schema() {
        let blob = zstd::bulk::compress(br#"{"ContentStoreFiles":[]}"#, 3).unwrap();
        assert!(matches!(
            ArchiveCodec::default().decode(&blob),
            Err(BackupError::Decode(_))
        ));
    }

    #[test]
    fn test_levels_interoperate() {
        let envelope = sample_envelope();
        let blob = ArchiveCodec::new(1).encode(&envelope).unwrap();
        assert_eq!(ArchiveCodec::default().decode(&blob).unwrap(), envelope);
    }
}
