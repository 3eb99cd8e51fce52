//! Snapshot encoding and the persisted record layout.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when decoding a scene payload.
#[derive(Debug, Error)]
pub enum SceneDecodeError {
    #[error("malformed scene encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scene payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// An immutable, canonical serialization of the whole scene at one instant.
///
/// Two snapshots are equal iff their encodings are byte-identical, which is
/// what echo suppression and history dedup rely on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(String);

impl Snapshot {
    /// Wrap an already-canonical encoding.
    pub fn from_encoded(encoded: String) -> Self {
        Self(encoded)
    }

    /// The canonical encoding.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// The persisted record for one scene id.
///
/// `canvas` holds the snapshot encoding; `rev` increases by one on every
/// write so concurrent writers are at least visible in logs. Records written
/// before `rev` existed decode with `rev = 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRecord {
    pub canvas: String,
    #[serde(default)]
    pub rev: u64,
}

impl SceneRecord {
    pub fn new(snapshot: &Snapshot, rev: u64) -> Self {
        Self {
            canvas: snapshot.as_str().to_string(),
            rev,
        }
    }

    /// The snapshot this record carries.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_encoded(self.canvas.clone())
    }

    /// Encode for the document store.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SceneDecodeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a stored payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SceneDecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
