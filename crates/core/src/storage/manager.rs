use std::path::Path;

use tracing::debug;

use crate::errors::CoreError;
use crate::models::snapshot::MarketSnapshot;

use super::format;

/// High-level storage operations: save/load a market snapshot to/from bytes or files.
pub struct StorageManager;

impl StorageManager {
    /// Serialize a snapshot to raw bytes (portable, platform-independent).
    ///
    /// Flow: MarketSnapshot → bincode → MVSN format bytes
    pub fn save_to_bytes(snapshot: &MarketSnapshot) -> Result<Vec<u8>, CoreError> {
        let payload = bincode::serialize(snapshot)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize snapshot: {e}")))?;

        debug!(bytes = payload.len(), "snapshot serialized");
        Ok(format::write_file(format::CURRENT_VERSION, &payload))
    }

    /// Deserialize a snapshot from raw bytes.
    ///
    /// Flow: MVSN bytes → parse header → bincode → MarketSnapshot
    pub fn load_from_bytes(data: &[u8]) -> Result<MarketSnapshot, CoreError> {
        let (header, payload) = format::read_file(data)?;

        let snapshot: MarketSnapshot = bincode::deserialize(payload).map_err(|e| {
            CoreError::Deserialization(format!("Failed to deserialize snapshot: {e}"))
        })?;

        debug!(version = header.version, bytes = header.payload_len, "snapshot loaded");
        Ok(snapshot)
    }

    /// Save a snapshot to a file on disk.
    pub fn save_to_file(snapshot: &MarketSnapshot, path: impl AsRef<Path>) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(snapshot)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a snapshot from a file on disk.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<MarketSnapshot, CoreError> {
        let bytes = std::fs::read(path)?;
        Self::load_from_bytes(&bytes)
    }
}
