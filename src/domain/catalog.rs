//! Versioned stage catalogs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LevelError, Result};

/// One stage entry in a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    /// Stable stage identifier, also the stage file name
    pub stage_id: String,

    /// Number of levels in the stage
    pub level_count: u32,

    /// Where the stage file can be downloaded from
    #[serde(rename = "url", default)]
    pub content_url: String,
}

impl StageDescriptor {
    pub fn new(stage_id: impl Into<String>, level_count: u32, content_url: impl Into<String>) -> Self {
        Self {
            stage_id: stage_id.into(),
            level_count,
            content_url: content_url.into(),
        }
    }
}

/// A versioned snapshot of one track's stage map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Version timestamp, milliseconds since the Unix epoch
    pub update_at: i64,

    /// Stages in play order
    #[serde(default)]
    pub stages: Vec<StageDescriptor>,
}

impl Catalog {
    pub fn new(update_at: i64, stages: Vec<StageDescriptor>) -> Self {
        Self { update_at, stages }
    }

    /// Parse a catalog from its JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| LevelError::deserialize("catalog", e))
    }

    /// Serialize the catalog to JSON bytes
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| LevelError::serialize("catalog", e))
    }

    /// Total number of levels across all stages
    pub fn total_levels(&self) -> u64 {
        self.stages.iter().map(|s| u64::from(s.level_count)).sum()
    }

    pub fn stage(&self, index: usize) -> Option<&StageDescriptor> {
        self.stages.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Version timestamp as a UTC datetime, if it is in range
    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.update_at)
    }
}

/// Which catalog a resolution call should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogSource {
    /// Always resolve against the bundled default catalog
    UseDefault,
    /// Prefer the downloaded catalog when it is at least as new as the default
    UseLocalOrDefault,
}

/// The catalog a resolved range indexes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveCatalog {
    Default,
    Local,
}

impl std::fmt::Display for ActiveCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveCatalog::Default => write!(f, "default"),
            ActiveCatalog::Local => write!(f, "local"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let json = r#"{"update_at": 1700000000000, "stages": [
            {"stage_id": "lv_1_366", "level_count": 366, "url": "maps/lv_1_366.json"},
            {"stage_id": "lv_367_500", "level_count": 134, "url": "maps/lv_367_500.json"}
        ]}"#;
        let catalog = Catalog::from_json(json.as_bytes()).unwrap();

        assert_eq!(catalog.update_at, 1_700_000_000_000);
        assert_eq!(catalog.stages[0].stage_id, "lv_1_366");
        assert_eq!(catalog.stages[1].content_url, "maps/lv_367_500.json");
        assert_eq!(catalog.total_levels(), 500);
    }

    #[test]
    fn test_persist_and_reload_keeps_version_and_order() {
        let catalog = Catalog::new(
            42,
            vec![
                StageDescriptor::new("c", 3, "u/c"),
                StageDescriptor::new("a", 7, "u/a"),
                StageDescriptor::new("b", 1, "u/b"),
            ],
        );

        let reloaded = Catalog::from_json(&catalog.to_json().unwrap()).unwrap();

        assert_eq!(reloaded.update_at, 42);
        let ids: Vec<_> = reloaded.stages.iter().map(|s| s.stage_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_malformed_catalog_is_deserialize_error() {
        let err = Catalog::from_json(b"{\"stages\": 3}").unwrap_err();
        assert!(matches!(err, LevelError::DeserializeFailed { .. }));
    }
}
