//! Resolve command implementation

use anyhow::{Context, Result};
use std::path::Path;

use levelmap::{Catalog, resolver};

/// Print the stage a level falls into
pub fn resolve_command(catalog_path: &Path, level: u32) -> Result<()> {
    let bytes = std::fs::read(catalog_path)
        .with_context(|| format!("Failed to read catalog: {}", catalog_path.display()))?;
    let catalog = Catalog::from_json(&bytes)
        .with_context(|| format!("Failed to parse catalog: {}", catalog_path.display()))?;

    let range = resolver::compute_stage(&catalog, level)
        .with_context(|| format!("Failed to resolve level {}", level))?;

    println!(
        "Level {} -> stage #{} {} (levels {}-{})",
        level, range.index, range.stage_id, range.start, range.end
    );
    if u64::from(level) > catalog.total_levels() {
        println!(
            "  beyond catalog capacity of {} levels, wrapped over the last stage",
            catalog.total_levels()
        );
    }

    Ok(())
}
