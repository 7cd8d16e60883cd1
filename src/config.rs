use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/viewer.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Far plane distance in nodes; fog is opaque from here on.
    pub view_distance: f32,
    /// Linear RGB, each channel 0.0 to 1.0.
    pub fog_color: [f32; 3],
    // Sensitivity of 0.003 is ~0.17° per pixel of mouse movement
    pub mouse_sensitivity: f32,
    /// Nodes per second.
    pub move_speed: f32,
    pub texture_dir: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            fov_degrees: 72.0,
            view_distance: 160.0,
            fog_color: [0.6, 0.75, 0.95],
            mouse_sensitivity: 0.003,
            move_speed: 10.0,
            texture_dir: None,
        }
    }
}

impl ViewerConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ViewerConfig>(&contents) {
                Ok(cfg) => cfg.sanitized(),
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    ViewerConfig::default()
                }
            },
            Err(err) => {
                if err.kind() == std::io::ErrorKind::NotFound
                    && path == Path::new(DEFAULT_CONFIG_PATH)
                {
                    tracing::debug!("No viewer config at {}. Using defaults", path.display());
                } else {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                ViewerConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    /// Clamp values that would produce a degenerate projection.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(1.0..=179.0).contains(&self.fov_degrees) {
            warn!(fov = self.fov_degrees, "fov_degrees out of range, using default");
            self.fov_degrees = defaults.fov_degrees;
        }
        if self.view_distance.is_nan() || self.view_distance <= 1.0 {
            warn!(distance = self.view_distance, "view_distance too small, using default");
            self.view_distance = defaults.view_distance;
        }
        self.width = self.width.max(1);
        self.height = self.height.max(1);
        self
    }
}
