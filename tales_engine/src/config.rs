//! Engine settings loaded from `tales.toml`.

use crate::save_files::SAVE_DIR;
use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "tales.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root directory for save files; each script gets its own subdirectory.
    pub save_dir: PathBuf,
    /// Scene to start in instead of the first one.
    pub start_scene: Option<String>,
    /// Wrap width for dialogue; terminal width when unset.
    pub wrap_width: Option<usize>,
    /// List unavailable choices (dimmed) instead of hiding them.
    pub show_unavailable: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from(SAVE_DIR),
            start_scene: None,
            wrap_width: None,
            show_unavailable: false,
        }
    }
}

/// Load the config file, falling back to defaults when it is missing or bad.
pub fn load_config(path: &Path) -> EngineConfig {
    match try_load_config(path) {
        Ok(config) => {
            info!("engine settings loaded from '{}'", path.display());
            config
        },
        Err(e) => {
            warn!("Could not load settings from '{}': {e:#}. Using defaults.", path.display());
            EngineConfig::default()
        },
    }
}

fn try_load_config(path: &Path) -> Result<EngineConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("reading settings from '{}'", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing settings from '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join(CONFIG_FILE));
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.save_dir, PathBuf::from("saved_games"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "start_scene = \"forest\"\nshow_unavailable = true\n").unwrap();
        let config = load_config(&path);
        assert_eq!(config.start_scene.as_deref(), Some("forest"));
        assert!(config.show_unavailable);
        assert_eq!(config.wrap_width, None);
        assert_eq!(config.save_dir, PathBuf::from(SAVE_DIR));
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "wrap_width = \"wide\"").unwrap();
        assert_eq!(load_config(&path), EngineConfig::default());
    }
}
