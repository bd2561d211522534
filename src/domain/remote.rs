use serde::{Deserialize, Serialize};

/// Cloud-config pointer to the newest catalog of a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDescriptor {
    /// Version of the remote catalog
    pub update_at: i64,

    /// Catalog download location
    pub url: String,

    /// First level the remote catalog applies from
    #[serde(default)]
    pub start_level: u32,
}

/// Cloud-controlled unlock rule for special levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialLevelRule {
    /// Whether special levels are offered at all
    #[serde(default)]
    pub enable: bool,

    /// Main level after which special levels start appearing
    #[serde(default)]
    pub start: u32,

    /// Main levels between two special levels
    #[serde(default = "default_offset")]
    pub offset: u32,
}

fn default_offset() -> u32 {
    10
}

impl Default for SpecialLevelRule {
    fn default() -> Self {
        Self {
            enable: false,
            start: 0,
            offset: default_offset(),
        }
    }
}
