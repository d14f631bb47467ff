use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::Deserialize;

use crate::error::ConfigError;

/// File picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "flycube.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub level: LevelConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "flycube".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Degrees of rotation per pixel of cursor travel
    pub sensitivity: f32,
    /// World units per second
    pub base_speed: f32,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub start: [f32; 3],
    pub look_at: [f32; 3],
}

impl CameraConfig {
    pub fn start(&self) -> Vec3 {
        Vec3::from_array(self.start)
    }

    pub fn look_at(&self) -> Vec3 {
        Vec3::from_array(self.look_at)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.1,
            base_speed: 5.0,
            fov_y: 70.0,
            start: [0.0, 2.0, 8.0],
            look_at: [0.0, 0.5, 0.0],
        }
    }
}

/// Size of the ground plane in world units.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self { width: 50, height: 50 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            vertex_shader: PathBuf::from("assets/shaders/basic.vert.wgsl"),
            fragment_shader: PathBuf::from("assets/shaders/basic.frag.wgsl"),
        }
    }
}

impl Config {
    /// Load from `path` if given, else from `flycube.toml` when it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_in(Path::new("."), path)
    }

    /// As [`Config::load`], looking for the default file in `dir` instead of the working directory.
    pub fn load_in(dir: &Path, path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let fallback = dir.join(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    tracing::debug!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [window]
            title = "test window"

            [camera]
            base_speed = 12.5
            "#,
        )
        .unwrap();

        assert_eq!(config.window.title, "test window");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.camera.base_speed, 12.5);
        assert_eq!(config.camera.sensitivity, 0.1);
        assert_eq!(config.level.width, 50);
        assert_eq!(
            config.assets.vertex_shader,
            PathBuf::from("assets/shaders/basic.vert.wgsl")
        );
    }

    #[test]
    fn malformed_file_is_rejected() {
        let err = Config::from_toml_str("[window]\nwidth = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp config");
        writeln!(file, "[level]\nwidth = 10\nheight = 20").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.level.width, 10);
        assert_eq!(config.level.height, 20);
    }

    #[test]
    fn default_file_is_picked_up() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[window]\ntitle = \"from disk\"\n").unwrap();

        let config = Config::load_in(dir.path(), None).unwrap();
        assert_eq!(config.window.title, "from disk");
        assert_eq!(config.window.height, 720);
    }

    #[test]
    fn no_file_means_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = Config::load_in(dir.path(), None).unwrap();
        assert_eq!(config.window.title, "flycube");
        assert_eq!(config.level.width, 50);
    }

    #[test]
    fn explicit_path_wins_over_default_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[level]\nwidth = 1\n").unwrap();
        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "[level]\nwidth = 7\n").unwrap();

        let config = Config::load_in(dir.path(), Some(&explicit)).unwrap();
        assert_eq!(config.level.width, 7);
    }

    #[test]
    fn load_reports_missing_explicit_path() {
        let err = Config::load(Some(Path::new("does/not/exist.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
