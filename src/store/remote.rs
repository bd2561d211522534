//! Remote config held in memory, published from a JSON document

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::RemoteConfigProvider;
use crate::{ContentType, RemoteDescriptor, SpecialLevelRule};

/// Shape of the remote config JSON
///
/// ```json
/// {
///   "descriptors": {
///     "main": {"update_at": 1700000000000, "url": "maps/mapdata.json", "start_level": 1}
///   },
///   "special_rule": {"enable": true, "start": 20, "offset": 10}
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfigDocument {
    /// Keyed by lowercase track name
    #[serde(default)]
    pub descriptors: BTreeMap<String, RemoteDescriptor>,

    #[serde(default)]
    pub special_rule: Option<SpecialLevelRule>,
}

impl RemoteConfigDocument {
    pub fn with_descriptor(mut self, content_type: ContentType, descriptor: RemoteDescriptor) -> Self {
        self.descriptors
            .insert(content_type.as_str().to_string(), descriptor);
        self
    }
}

/// Remote config that is not ready until a document is published
#[derive(Debug, Default)]
pub struct StaticRemoteConfig {
    document: RwLock<Option<RemoteConfigDocument>>,
}

impl StaticRemoteConfig {
    /// Not ready; nothing published yet
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ready(document: RemoteConfigDocument) -> Self {
        Self {
            document: RwLock::new(Some(document)),
        }
    }

    /// Load and publish a JSON document from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read remote config: {}", path.display()))?;
        let document: RemoteConfigDocument = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse remote config: {}", path.display()))?;
        Ok(Self::ready(document))
    }

    /// Replace the published document
    pub fn publish(&self, document: RemoteConfigDocument) {
        let mut slot = self.document.write().unwrap_or_else(|p| p.into_inner());
        *slot = Some(document);
    }
}

impl RemoteConfigProvider for StaticRemoteConfig {
    fn is_ready(&self) -> bool {
        self.document
            .read()
            .map(|doc| doc.is_some())
            .unwrap_or(false)
    }

    fn get_descriptor(&self, content_type: ContentType) -> Option<RemoteDescriptor> {
        let doc = self.document.read().ok()?;
        doc.as_ref()?.descriptors.get(content_type.as_str()).cloned()
    }

    fn special_rule(&self) -> Option<SpecialLevelRule> {
        let doc = self.document.read().ok()?;
        doc.as_ref()?.special_rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_until_published() {
        let remote = StaticRemoteConfig::empty();
        assert!(!remote.is_ready());
        assert!(remote.get_descriptor(ContentType::Main).is_none());

        remote.publish(RemoteConfigDocument::default().with_descriptor(
            ContentType::Main,
            RemoteDescriptor {
                update_at: 9,
                url: "maps/mapdata.json".to_string(),
                start_level: 1,
            },
        ));
        assert!(remote.is_ready());
        assert_eq!(remote.get_descriptor(ContentType::Main).unwrap().update_at, 9);
        assert!(remote.get_descriptor(ContentType::Daily).is_none());
    }

    #[test]
    fn test_document_parses() {
        let json = r#"{
            "descriptors": {"special": {"update_at": 12, "url": "s.json"}},
            "special_rule": {"enable": true, "start": 20, "offset": 10}
        }"#;
        let doc: RemoteConfigDocument = serde_json::from_str(json).unwrap();
        let remote = StaticRemoteConfig::ready(doc);

        assert_eq!(remote.get_descriptor(ContentType::Special).unwrap().start_level, 0);
        assert_eq!(remote.special_rule().unwrap().offset, 10);
    }
}
