use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid world settings: {0}")]
    Terrain(#[from] openrail_kernel::TerrainError),
}

/// Settings read at startup and written back on exit.
///
/// Missing keys take their default, so older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Driver strings, `name[:param,...]`; empty picks by priority.
    pub video_driver: String,
    pub sound_driver: String,
    pub music_driver: String,
    pub resolution: [u32; 2],
    /// Personal files: saves, autosaves, scenarios, screenshots.
    pub save_root: PathBuf,
    /// Shipped data such as the intro world.
    pub data_dir: PathBuf,
    /// Autosave every N months; 0 disables.
    pub autosave_months: u32,
    /// Name autosaves after the player and date instead of rotating.
    pub keep_all_autosave: bool,
    pub disable_computer: bool,
    pub full_animation: bool,
    pub dedicated: bool,
    pub starting_year: u32,
    pub map_width: u32,
    pub map_height: u32,
    pub town_count: u32,
    /// World generation seed; a fresh one is picked when unset.
    pub seed: Option<u64>,
    pub title_theme: String,
    pub playlist: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            video_driver: String::new(),
            sound_driver: String::new(),
            music_driver: String::new(),
            resolution: [640, 480],
            save_root: PathBuf::from("openrail"),
            data_dir: PathBuf::from("data"),
            autosave_months: 3,
            keep_all_autosave: false,
            disable_computer: false,
            full_animation: true,
            dedicated: false,
            starting_year: 1950,
            map_width: 64,
            map_height: 64,
            town_count: 4,
            seed: None,
            title_theme: "gm_tt00.gm".to_string(),
            playlist: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Read `path`, or return the defaults if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        serde_json::to_writer_pretty(std::fs::File::create(path)?, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = RuntimeConfig::load(tmp.path().join("openrail.json")).unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cfg").join("openrail.json");
        let config = RuntimeConfig {
            video_driver: "null:ticks=5".into(),
            keep_all_autosave: true,
            seed: Some(9),
            playlist: vec!["gm_tt01.gm".into()],
            ..RuntimeConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(RuntimeConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("openrail.json");
        std::fs::write(&path, r#"{ "music_driver": "null", "starting_year": 1930 }"#).unwrap();
        let config = RuntimeConfig::load(&path).unwrap();
        assert_eq!(config.music_driver, "null");
        assert_eq!(config.starting_year, 1930);
        assert_eq!(config.resolution, [640, 480]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("openrail.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(RuntimeConfig::load(&path), Err(ConfigError::Json(_))));
    }
}
