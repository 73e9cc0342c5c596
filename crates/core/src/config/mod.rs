use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{GalleryError, Result};

/// Top-level configuration structure for the carousel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub carousel: CarouselConfig,
    pub render: RenderConfig,
}

impl AppConfig {
    /// Loads a JSON config file. Missing fields fall back to their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.carousel.validate()?;
        self.render.validate()
    }
}

/// Motion and input tuning for the carousel engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    /// Shaping parameter applied to the tile aspect.
    pub bend: f64,
    /// Exponential easing factor in (0, 1].
    pub smoothing: f64,
    pub drag_sensitivity: f64,
    pub wheel_sensitivity: f64,
    pub resize_debounce_ms: u64,
    /// Corner radius of the tile mask, in world units.
    pub border_radius: f64,
    /// Horizontal gap between neighbouring tiles, in world units.
    pub tile_gap: f64,
    /// Per-frame advance of the idle wave phase.
    pub wave_step: f64,
    /// Multiplier turning per-frame scroll distance into wave intensity.
    pub speed_gain: f64,
    pub max_device_pixel_ratio: f32,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            bend: 3.0,
            smoothing: 0.08,
            drag_sensitivity: 2.5,
            wheel_sensitivity: 0.8,
            resize_debounce_ms: 100,
            border_radius: 0.08,
            tile_gap: 0.5,
            wave_step: 0.03,
            speed_gain: 0.1,
            max_device_pixel_ratio: 2.0,
        }
    }
}

impl CarouselConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(GalleryError::InvalidInput("smoothing must lie in (0, 1]"));
        }
        let finite = [
            self.bend,
            self.drag_sensitivity,
            self.wheel_sensitivity,
            self.border_radius,
            self.tile_gap,
            self.wave_step,
            self.speed_gain,
        ];
        if finite.iter().any(|value| !value.is_finite()) {
            return Err(GalleryError::InvalidInput(
                "carousel parameters must be finite numbers",
            ));
        }
        if self.tile_gap < 0.0 || self.border_radius < 0.0 {
            return Err(GalleryError::InvalidInput(
                "tile gap and border radius cannot be negative",
            ));
        }
        if !(self.max_device_pixel_ratio >= 1.0) {
            return Err(GalleryError::InvalidInput(
                "max device pixel ratio must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Colours and caption settings used by the render surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub clear_rgba: [u8; 4],
    pub placeholder_rgba: [u8; 4],
    pub caption_rgba: [u8; 4],
    pub caption_px: f32,
    /// TrueType/OpenType font used for captions. The bundled font is used when unset.
    pub caption_font: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_rgba: [255, 255, 255, 0],
            placeholder_rgba: [0, 0, 0, 0],
            caption_rgba: [255, 255, 255, 255],
            caption_px: 42.0,
            caption_font: None,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.caption_px.is_finite() && self.caption_px > 0.0) {
            return Err(GalleryError::InvalidInput("caption size must be positive"));
        }
        Ok(())
    }
}
