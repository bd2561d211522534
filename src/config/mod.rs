//! Configuration loading and management

mod io;
mod layout;

pub use layout::StorageLayout;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SpecialLevelRule;
use crate::handler::DEFAULT_LOOKAHEAD;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where bundled and downloaded content lives
    #[serde(default)]
    pub paths: PathSettings,

    /// Catalog sync settings
    #[serde(default)]
    pub sync: SyncSettings,

    /// Main-line handler settings
    #[serde(default)]
    pub main: MainSettings,

    /// Fallback special-level rule, used until remote config provides one
    #[serde(default)]
    pub special: SpecialLevelRule,
}

/// Content locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory bundled assets are read from
    #[serde(default = "default_bundle_dir")]
    pub bundle_dir: PathBuf,

    /// Prefix of level files inside the bundle
    #[serde(default = "default_bundle_prefix")]
    pub bundle_prefix: String,

    /// Root of writable storage (defaults to the platform data dir)
    #[serde(default)]
    pub save_root: Option<PathBuf>,

    /// Directory under `save_root` for downloaded catalogs and stages
    #[serde(default = "default_save_dir")]
    pub save_dir: String,
}

/// Catalog sync settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Base name of catalog files (`{prefix}{catalog_name}`)
    #[serde(default = "default_catalog_name")]
    pub catalog_name: String,

    /// Base URL relative remote URLs are joined onto
    #[serde(default)]
    pub cdn_base: String,

    /// Download timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Main-line handler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainSettings {
    /// Levels cached on either side of the current one
    #[serde(default = "default_lookahead")]
    pub lookahead: u32,
}

fn default_bundle_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_bundle_prefix() -> String {
    "Level/".to_string()
}

fn default_save_dir() -> String {
    "cache".to_string()
}

fn default_catalog_name() -> String {
    "mapdata".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_lookahead() -> u32 {
    DEFAULT_LOOKAHEAD
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            bundle_dir: default_bundle_dir(),
            bundle_prefix: default_bundle_prefix(),
            save_root: None,
            save_dir: default_save_dir(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            catalog_name: default_catalog_name(),
            cdn_base: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for MainSettings {
    fn default() -> Self {
        Self {
            lookahead: default_lookahead(),
        }
    }
}

impl Config {
    /// File layout derived from the path and sync settings
    pub fn layout(&self) -> StorageLayout {
        StorageLayout {
            bundle_prefix: self.paths.bundle_prefix.clone(),
            catalog_name: self.sync.catalog_name.clone(),
            save_dir: self.paths.save_dir.clone(),
            cdn_base: self.sync.cdn_base.clone(),
        }
    }

    /// Root of writable storage
    pub fn save_root(&self) -> PathBuf {
        self.paths.save_root.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("levelmap")
        })
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.timeout_secs)
    }
}
