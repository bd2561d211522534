//! Where catalogs and stages live, bundled and downloaded

use crate::ContentType;

/// Path and URL conventions shared by the coordinator and the sync tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    /// Prefix of bundled level files, e.g. `Level/`
    pub bundle_prefix: String,
    /// Catalog base name, e.g. `mapdata`
    pub catalog_name: String,
    /// Directory inside the local store for downloads
    pub save_dir: String,
    /// Base URL for relative remote URLs; empty leaves them untouched
    pub cdn_base: String,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self {
            bundle_prefix: "Level/".to_string(),
            catalog_name: "mapdata".to_string(),
            save_dir: "cache".to_string(),
            cdn_base: String::new(),
        }
    }
}

impl StorageLayout {
    pub fn bundled_catalog_path(&self, content_type: ContentType) -> String {
        format!(
            "{}{}{}.json",
            self.bundle_prefix,
            content_type.prefix(),
            self.catalog_name
        )
    }

    pub fn bundled_stage_path(&self, content_type: ContentType, stage_id: &str) -> String {
        format!("{}{}{}.json", self.bundle_prefix, content_type.prefix(), stage_id)
    }

    /// `{save_dir}/{prefix}{catalog_name}`
    pub fn saved_catalog_path(&self, content_type: ContentType) -> String {
        format!("{}/{}{}", self.save_dir, content_type.prefix(), self.catalog_name)
    }

    /// Download target for a catalog before it is validated and swapped in
    pub fn staged_catalog_path(&self, content_type: ContentType) -> String {
        format!("{}.part", self.saved_catalog_path(content_type))
    }

    /// `{save_dir}/{update_at}/{stage_id}`
    pub fn saved_stage_path(&self, update_at: i64, stage_id: &str) -> String {
        format!("{}/{}/{}", self.save_dir, update_at, stage_id)
    }

    /// Absolute URLs pass through; relative ones are joined onto `cdn_base`
    pub fn fixed_url(&self, url: &str) -> String {
        if url.contains("://") || self.cdn_base.is_empty() {
            return url.to_string();
        }
        format!(
            "{}/{}",
            self.cdn_base.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}
