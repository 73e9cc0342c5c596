use std::{fmt, path::Path};

use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};

use crate::{GalleryError, Result};

/// Bundled caption face (DejaVu Sans Bold, see `assets/fonts/DejaVuSans-LICENSE.txt`).
const EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Horizontal padding added around the rendered text, in pixels.
const CAPTION_PADDING: f32 = 60.0;
/// Texture height as a multiple of the font size.
const CAPTION_HEIGHT_FACTOR: f32 = 1.6;

/// Rasterizes caption text into textures that are composited with the tiles.
pub struct CaptionRasterizer {
    font: Font,
    px: f32,
    color: [u8; 4],
}

impl CaptionRasterizer {
    pub fn from_path(path: impl AsRef<Path>, px: f32, color: [u8; 4]) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes, px, color)
    }

    /// Uses the font compiled into the crate.
    pub fn embedded(px: f32, color: [u8; 4]) -> Result<Self> {
        Self::from_bytes(EMBEDDED_FONT, px, color)
    }

    pub fn from_bytes(bytes: &[u8], px: f32, color: [u8; 4]) -> Result<Self> {
        let settings = FontSettings {
            scale: px,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(bytes, settings).map_err(|e| GalleryError::Font(e.to_string()))?;
        Ok(Self { font, px, color })
    }

    /// Renders `text` centred in a transparent texture. Returns `None` for empty text.
    pub fn rasterize(&self, text: &str) -> Option<RgbaImage> {
        if text.trim().is_empty() {
            return None;
        }

        let text_width = self.measure(text);
        let width = (text_width + CAPTION_PADDING).ceil().max(1.0) as u32;
        let height = (self.px * CAPTION_HEIGHT_FACTOR).ceil().max(1.0) as u32;
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));

        let (ascent, descent) = match self.font.horizontal_line_metrics(self.px) {
            Some(metrics) => (metrics.ascent, metrics.descent),
            None => (self.px * 0.8, -self.px * 0.2),
        };
        let baseline = (height as f32 - (ascent - descent)) / 2.0 + ascent;
        let mut pen = (width as f32 - text_width) / 2.0;
        let mut previous: Option<char> = None;

        for ch in text.chars() {
            if let Some(prev) = previous {
                pen += self.font.horizontal_kern(prev, ch, self.px).unwrap_or(0.0);
            }
            let (metrics, coverage) = self.font.rasterize(ch, self.px);
            let left = (pen + metrics.xmin as f32).round() as i64;
            let top = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i64;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let alpha = coverage[gy * metrics.width + gx];
                    if alpha == 0 {
                        continue;
                    }
                    let x = left + gx as i64;
                    let y = top + gy as i64;
                    if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                        continue;
                    }
                    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
                    let a = ((u16::from(alpha) * u16::from(self.color[3])) / 255) as u8;
                    if a > pixel[3] {
                        *pixel = Rgba([self.color[0], self.color[1], self.color[2], a]);
                    }
                }
            }

            pen += metrics.advance_width;
            previous = Some(ch);
        }

        Some(canvas)
    }

    fn measure(&self, text: &str) -> f32 {
        let mut width = 0.0;
        let mut previous: Option<char> = None;
        for ch in text.chars() {
            if let Some(prev) = previous {
                width += self.font.horizontal_kern(prev, ch, self.px).unwrap_or(0.0);
            }
            width += self.font.metrics(ch, self.px).advance_width;
            previous = Some(ch);
        }
        width
    }
}

impl fmt::Debug for CaptionRasterizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptionRasterizer")
            .field("px", &self.px)
            .field("color", &self.color)
            .finish()
    }
}
