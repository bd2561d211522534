//! Error types for level resolution and catalog sync

use crate::ContentType;

/// Errors raised while resolving levels, loading stages or syncing catalogs.
///
/// These never cross the [`ProgressionCoordinator`](crate::ProgressionCoordinator)
/// boundary: the coordinator logs them and hands callers an absent result.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("catalog has no stages")]
    EmptyCatalog,

    #[error("no stage payload loaded")]
    NoCurrentStage,

    #[error("level {level} is outside the resolved stage [{start}, {end}]")]
    LevelOutOfRange { level: u32, start: u32, end: u32 },

    #[error("no handler registered for {0}")]
    HandlerNotFound(ContentType),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("failed to deserialize {what}: {source}")]
    DeserializeFailed {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    SerializeFailed {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("default catalog not loaded")]
    CatalogNotLoaded,

    #[error("bundled asset not found: {0}")]
    AssetNotFound(String),

    #[error("storage error at {path}: {message}")]
    Storage { path: String, message: String },
}

impl LevelError {
    /// Wrap a serde_json error with a label for the record being parsed
    pub fn deserialize(what: impl Into<String>, source: serde_json::Error) -> Self {
        LevelError::DeserializeFailed {
            what: what.into(),
            source,
        }
    }

    pub fn serialize(what: impl Into<String>, source: serde_json::Error) -> Self {
        LevelError::SerializeFailed {
            what: what.into(),
            source,
        }
    }

    /// Build a storage error for a path
    pub fn storage(path: impl Into<String>, message: impl ToString) -> Self {
        LevelError::Storage {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result alias used across the library
pub type Result<T, E = LevelError> = std::result::Result<T, E>;
