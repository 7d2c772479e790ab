//! Binds a grid to its persisted column layout and sort

use std::path::{Path, PathBuf};

use anyhow::Result;
use atlas_grid::GridState;
use atlas_settings::{PersistedLayout, TableLayoutId, load_layout_in, save_layout_in};

#[derive(Debug, Clone)]
pub struct SavedView {
    id: TableLayoutId,
    dir: PathBuf,
}

impl SavedView {
    /// A view stored under the user's layouts directory
    pub fn new(identifier: impl Into<String>) -> Result<Self> {
        Ok(Self::in_dir(identifier, atlas_settings::layouts_dir()?))
    }

    pub fn in_dir(identifier: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            id: TableLayoutId::new(identifier),
            dir: dir.into(),
        }
    }

    pub fn id(&self) -> &TableLayoutId {
        &self.id
    }

    pub fn path(&self) -> PathBuf {
        self.id.layout_path_in(&self.dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Apply the saved layout, if any, returning whether the grid changed
    pub fn restore(&self, grid: &mut GridState) -> Result<bool> {
        match load_layout_in(&self.dir, &self.id)? {
            Some(layout) => Ok(layout.apply(grid)),
            None => Ok(false),
        }
    }

    pub fn save(&self, grid: &GridState) -> Result<()> {
        save_layout_in(&self.dir, &self.id, &PersistedLayout::capture(grid))
    }

    pub fn forget(&self) -> Result<()> {
        atlas_settings::delete_layout_in(&self.dir, &self.id)
    }
}
