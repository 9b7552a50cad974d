use std::fs;
use std::path::{Path, PathBuf};

use quadmap_render::{Camera, DEFAULT_MAX_AGE_FRAMES, DrawingOptions};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

/// Settings file for the headless renderer; every section is optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub render: DrawingOptions,
    pub camera: Camera,
    pub cache: CacheConfig,
    pub lighting: LightingConfig,
    pub assets: AssetsConfig,
    pub bench: BenchConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_age_frames: u64,
    /// Rebuild stale chunks on worker threads instead of inline.
    pub async_rebuild: bool,
    /// 0 picks half the available cores.
    pub workers: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_frames: DEFAULT_MAX_AGE_FRAMES,
            async_rebuild: true,
            workers: 0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Overrides `render.ambient_light` when set.
    pub ambient: Option<f32>,
    pub texel_size: u32,
    pub intensity: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient: None,
            texel_size: 8,
            intensity: 1.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub items: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            items: PathBuf::from("assets/items.toml"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub frames: u64,
    pub seed: i32,
    /// Side of the generated square map, in tiles.
    pub map_size: i32,
    /// Start from an empty map and stream nodes in on request.
    pub live: bool,
    pub edits_per_frame: u32,
    /// Camera pan per frame, in pixels.
    pub scroll_speed: i32,
    /// Milliseconds of simulated clock per frame.
    pub frame_ms: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            seed: 1337,
            map_size: 256,
            live: false,
            edits_per_frame: 4,
            scroll_speed: 8,
            frame_ms: 16,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let out = |field: &'static str, value: String| ConfigError::OutOfRange { field, value };
        if !(0..=15).contains(&self.camera.floor) {
            return Err(out("camera.floor", self.camera.floor.to_string()));
        }
        if self.camera.zoom.is_nan() || self.camera.zoom <= 0.0 {
            return Err(out("camera.zoom", self.camera.zoom.to_string()));
        }
        if self.camera.screen_width <= 0 || self.camera.screen_height <= 0 {
            return Err(out(
                "camera.screen",
                format!("{}x{}", self.camera.screen_width, self.camera.screen_height),
            ));
        }
        if self.lighting.texel_size == 0 {
            return Err(out("lighting.texel_size", "0".into()));
        }
        if self.bench.map_size <= 0 {
            return Err(out("bench.map_size", self.bench.map_size.to_string()));
        }
        Ok(())
    }

    /// Drawing options with the lighting overrides folded in.
    pub fn drawing_options(&self) -> DrawingOptions {
        let mut options = self.render.clone();
        if let Some(ambient) = self.lighting.ambient {
            options.ambient_light = ambient.clamp(0.0, 1.0);
        }
        options
    }
}
