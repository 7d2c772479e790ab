//! Column layout persistence per table
//!
//! Each table view stores its column order, hidden set, widths and sort in a
//! JSON file named after a hash of the table id.

use anyhow::{Context, Result};
use atlas_grid::{ColumnLayoutSnapshot, GridState, SortSpec};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::settings_file::layouts_dir;

/// Current layout version - increment when layout structure changes
pub const LAYOUT_VERSION: usize = 1;

/// Persisted layout data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedLayout {
    /// Version for migration purposes
    pub version: usize,
    pub columns: ColumnLayoutSnapshot,
    #[serde(default)]
    pub sort: SortSpec,
}

impl PersistedLayout {
    pub fn new(columns: ColumnLayoutSnapshot, sort: SortSpec) -> Self {
        Self {
            version: LAYOUT_VERSION,
            columns,
            sort,
        }
    }

    /// Capture the layout of a live grid
    pub fn capture(state: &GridState) -> Self {
        Self::new(state.layout_snapshot(), state.sort().clone())
    }

    /// Apply to a live grid, returning whether anything changed
    pub fn apply(&self, state: &mut GridState) -> bool {
        let columns = state.restore_layout(&self.columns);
        let sort = state.set_sort_spec(self.sort.clone());
        columns || sort
    }
}

/// Identifies a table view, e.g. `"clients"` or `"projects:archived"`
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct TableLayoutId {
    identifier: String,
}

impl TableLayoutId {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Get a hash suitable for use as a filename
    pub fn to_hash(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.identifier.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    pub fn layout_path(&self) -> Result<PathBuf> {
        layouts_dir().map(|dir| self.layout_path_in(&dir))
    }

    pub fn layout_path_in(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", self.to_hash()))
    }
}

pub fn load_layout(id: &TableLayoutId) -> Result<Option<PersistedLayout>> {
    load_layout_in(&layouts_dir()?, id)
}

pub fn save_layout(id: &TableLayoutId, layout: &PersistedLayout) -> Result<()> {
    save_layout_in(&layouts_dir()?, id, layout)
}

pub fn delete_layout(id: &TableLayoutId) -> Result<()> {
    delete_layout_in(&layouts_dir()?, id)
}

/// Load a layout from `dir`. Missing files and other layout versions yield
/// `None`.
pub fn load_layout_in(dir: &Path, id: &TableLayoutId) -> Result<Option<PersistedLayout>> {
    let path = id.layout_path_in(dir);

    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read layout from {:?}", path))?;

    let layout: PersistedLayout =
        serde_json::from_str(&content).with_context(|| "Failed to parse layout JSON")?;

    if layout.version != LAYOUT_VERSION {
        tracing::warn!(
            "Layout version mismatch for {}: expected {}, got {}. Using default layout.",
            id.identifier(),
            LAYOUT_VERSION,
            layout.version
        );
        return Ok(None);
    }

    Ok(Some(layout))
}

pub fn save_layout_in(dir: &Path, id: &TableLayoutId, layout: &PersistedLayout) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create layouts directory: {:?}", dir))?;

    let path = id.layout_path_in(dir);
    let content = serde_json::to_string_pretty(layout)?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write layout to {:?}", path))?;

    tracing::debug!("Saved layout for {} to {:?}", id.identifier(), path);
    Ok(())
}

pub fn delete_layout_in(dir: &Path, id: &TableLayoutId) -> Result<()> {
    let path = id.layout_path_in(dir);

    if path.exists() {
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to delete layout at {:?}", path))?;
    }

    Ok(())
}
