//! Atlas Settings
//!
//! User preferences with JSON persistence:
//! - Grid defaults (page size, debounce, virtualization, row geometry)
//! - Backup defaults
//! - Per-table column layout persistence

use anyhow::{Context, Result};
use atlas_grid::{
    DEFAULT_OVERSCAN, DEFAULT_PAGE_SIZE, DEFAULT_ROW_HEIGHT, DEFAULT_SEARCH_DEBOUNCE, GridOptions,
    VirtualizationMode,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod layout;
mod settings_file;

pub use layout::*;
pub use settings_file::*;

pub const DEFAULT_BACKUP_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AtlasSettings {
    pub grid: GridSettings,
    pub backup: BackupSettings,
}

impl AtlasSettings {
    /// Load from the user config directory, falling back to defaults when no
    /// file exists yet
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        serde_json::from_str(&content).with_context(|| "Failed to parse settings JSON")
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;
        Ok(())
    }

    pub fn settings_path() -> Result<PathBuf> {
        settings_file()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub page_size: usize,
    pub available_page_sizes: Vec<usize>,
    pub paginate: bool,
    pub multi_select: bool,
    pub search_debounce_ms: u64,
    pub virtualization: VirtualizationMode,
    pub row_height: f64,
    pub overscan: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            available_page_sizes: vec![10, 25, 50, 100],
            paginate: true,
            multi_select: true,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE.as_millis() as u64,
            virtualization: VirtualizationMode::default(),
            row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

impl GridSettings {
    /// Options for a new grid. Out-of-range values are replaced by defaults.
    pub fn grid_options(&self) -> GridOptions {
        let row_height = if self.row_height.is_finite() && self.row_height > 0.0 {
            self.row_height
        } else {
            tracing::warn!(row_height = self.row_height, "invalid row height in settings");
            DEFAULT_ROW_HEIGHT
        };
        GridOptions {
            page_size: self.page_size.max(1),
            page_sizes: self
                .available_page_sizes
                .iter()
                .copied()
                .filter(|size| *size > 0)
                .collect(),
            paginate: self.paginate,
            multi_select: self.multi_select,
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            virtualization: self.virtualization,
            row_height,
            overscan: self.overscan,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    /// Records per upsert call when restoring
    pub batch_size: usize,
    /// Tables included in a full backup
    pub tables: Vec<String>,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BACKUP_BATCH_SIZE,
            tables: ["clients", "projects", "tasks", "meetings"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
