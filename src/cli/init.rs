//! Init command implementation

use anyhow::{Context, Result, bail};
use std::path::PathBuf;

use levelmap::config::Config;

/// Default configuration content for levelmap init
pub const DEFAULT_CONFIG: &str = r#"# levelmap configuration
# =====================

# Where bundled and downloaded content lives
[paths]
# Directory bundled assets are read from
bundle_dir = "assets"
# Prefix of level files inside the bundle
bundle_prefix = "Level/"
# Downloads go to {save_root}/{save_dir}; save_root defaults to the platform data dir
# save_root = "/var/lib/levelmap"
save_dir = "cache"

# Catalog sync
[sync]
# Catalog files are named {track prefix}{catalog_name}
catalog_name = "mapdata"
# Relative remote URLs are joined onto this base
cdn_base = ""
timeout_secs = 30

# Main line
[main]
# Levels cached on either side of the current one
lookahead = 5

# Special levels, until remote config provides a rule
[special]
enable = false
start = 0
offset = 10
"#;

/// Write the default config to `config_path` or the global location
pub fn init_command(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Config::global_config_path);

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created: {}", config_path.display());

    Ok(())
}
