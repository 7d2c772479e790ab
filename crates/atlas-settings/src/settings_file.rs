//! On-disk locations
//!
//! Everything lives under one `atlas` directory in the platform config dir:
//! `settings.json` at the top and one file per table view in `layouts/`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "atlas";
const SETTINGS_FILE: &str = "settings.json";
const LAYOUTS_DIR: &str = "layouts";

pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(app_dir_in(&base))
}

pub fn settings_file() -> Result<PathBuf> {
    config_dir().map(|dir| dir.join(SETTINGS_FILE))
}

pub fn layouts_dir() -> Result<PathBuf> {
    config_dir().map(|dir| dir.join(LAYOUTS_DIR))
}

/// The `atlas` directory under an arbitrary base, for hosts that relocate it
pub fn app_dir_in(base: &Path) -> PathBuf {
    base.join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locations_share_app_dir() {
        let (Ok(config), Ok(settings), Ok(layouts)) = (config_dir(), settings_file(), layouts_dir())
        else {
            // headless CI without a config dir
            return;
        };
        assert!(config.ends_with("atlas"));
        assert_eq!(settings.parent(), Some(config.as_path()));
        assert_eq!(layouts.parent(), Some(config.as_path()));
    }

    #[test]
    fn test_app_dir_in() {
        assert_eq!(app_dir_in(Path::new("/tmp/x")), PathBuf::from("/tmp/x/atlas"));
    }
}
