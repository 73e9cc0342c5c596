use std::{fmt, path::Path};

use image::{Rgba, RgbaImage};

use crate::{
    host::PixelSize,
    scene::{Camera, Viewport},
    Result,
};

/// Caption height relative to the tile height.
const CAPTION_SCALE: f64 = 0.18;
/// Gap between tile and caption, relative to the caption height.
const CAPTION_OFFSET: f64 = 0.6;
/// Caption texels below this alpha are discarded.
const CAPTION_ALPHA_CUTOFF: u8 = 26;
/// Amplitude of the idle wave, in world units at full speed.
const WAVE_AMPLITUDE: f64 = 0.1;
const WAVE_FREQUENCY: f64 = 3.0;
/// Edge softness of the rounded mask, in world units.
const MASK_FEATHER: f64 = 0.01;

/// Everything needed to draw one tile.
#[derive(Debug, Clone, Copy)]
pub struct TileDraw<'a> {
    pub center_x: f64,
    pub plane_width: f64,
    pub plane_height: f64,
    pub texture: Option<&'a RgbaImage>,
    pub caption: Option<&'a RgbaImage>,
    pub time: f64,
    pub speed: f64,
    pub border_radius: f64,
}

/// One frame's worth of draw calls.
#[derive(Debug, Clone)]
pub struct FrameScene<'a> {
    pub camera: Camera,
    pub viewport: Viewport,
    pub tiles: Vec<TileDraw<'a>>,
}

/// Rendering surface attached to the host container.
pub trait Surface: fmt::Debug {
    fn size(&self) -> PixelSize;

    fn resize(&mut self, size: PixelSize);

    fn render(&mut self, scene: &FrameScene<'_>);
}

/// CPU compositor that draws the strip into an RGBA buffer.
#[derive(Debug, Clone)]
pub struct SoftwareSurface {
    buffer: RgbaImage,
    clear: Rgba<u8>,
    placeholder: Rgba<u8>,
    frames: u64,
}

impl SoftwareSurface {
    pub fn new(size: PixelSize, clear: [u8; 4], placeholder: [u8; 4]) -> Self {
        Self {
            buffer: RgbaImage::from_pixel(size.width, size.height, Rgba(clear)),
            clear: Rgba(clear),
            placeholder: Rgba(placeholder),
            frames: 0,
        }
    }

    pub fn frame(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.buffer.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    fn draw_tile(&mut self, tile: &TileDraw<'_>, projection: &Projection) {
        let (width, height) = self.buffer.dimensions();
        let center_x = projection.x(tile.center_x);
        let center_y = projection.y(0.0);
        let tile_w = tile.plane_width * projection.px_per_unit_x;
        let tile_h = tile.plane_height * projection.px_per_unit_y;
        if tile_w <= 0.0 || tile_h <= 0.0 {
            return;
        }

        let distance = projection.distance;
        let max_depth = (WAVE_AMPLITUDE * tile.speed).min(distance * 0.5);
        let max_stretch = distance / (distance - max_depth);

        let left = center_x - tile_w / 2.0;
        let Some((x0, x1)) = clip_span(left, left + tile_w, width) else {
            return;
        };
        let half_h = tile_h / 2.0 * max_stretch;
        let Some((y0, y1)) = clip_span(center_y - half_h, center_y + half_h, height) else {
            return;
        };

        for x in x0..x1 {
            let u = (x as f64 + 0.5 - left) / tile_w;
            if !(0.0..1.0).contains(&u) {
                continue;
            }
            let depth = ((u - 0.5) * WAVE_FREQUENCY + tile.time).sin() * WAVE_AMPLITUDE * tile.speed;
            let stretch = distance / (distance - depth.min(distance * 0.5));

            for y in y0..y1 {
                let v = 0.5 + (y as f64 + 0.5 - center_y) / (tile_h * stretch);
                if !(0.0..1.0).contains(&v) {
                    continue;
                }
                let coverage = rounded_mask(u, v, tile.plane_width, tile.plane_height, tile.border_radius);
                if coverage <= 0.0 {
                    continue;
                }
                let texel = match tile.texture {
                    Some(texture) => sample_cover(texture, u, v, tile.plane_width / tile.plane_height),
                    None => self.placeholder,
                };
                blend_over(self.buffer.get_pixel_mut(x, y), texel, coverage);
            }
        }

        if let Some(caption) = tile.caption {
            self.draw_caption(tile, caption, projection);
        }
    }

    fn draw_caption(&mut self, tile: &TileDraw<'_>, caption: &RgbaImage, projection: &Projection) {
        let (cw, ch) = caption.dimensions();
        if cw == 0 || ch == 0 {
            return;
        }
        let (width, height) = self.buffer.dimensions();
        let text_scale = tile.plane_height * CAPTION_SCALE;
        let caption_w = text_scale * f64::from(cw) / f64::from(ch) * projection.px_per_unit_x;
        let caption_h = text_scale * projection.px_per_unit_y;
        let center_x = projection.x(tile.center_x);
        let center_y = projection.y(-tile.plane_height * 0.5 - text_scale * CAPTION_OFFSET);

        let left = center_x - caption_w / 2.0;
        let top = center_y - caption_h / 2.0;
        let Some((x0, x1)) = clip_span(left, left + caption_w, width) else {
            return;
        };
        let Some((y0, y1)) = clip_span(top, top + caption_h, height) else {
            return;
        };

        for y in y0..y1 {
            let v = (y as f64 + 0.5 - top) / caption_h;
            for x in x0..x1 {
                let u = (x as f64 + 0.5 - left) / caption_w;
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                let texel = sample(caption, u, v);
                if texel[3] < CAPTION_ALPHA_CUTOFF {
                    continue;
                }
                blend_over(self.buffer.get_pixel_mut(x, y), texel, 1.0);
            }
        }
    }
}

impl Surface for SoftwareSurface {
    fn size(&self) -> PixelSize {
        let (width, height) = self.buffer.dimensions();
        PixelSize { width, height }
    }

    fn resize(&mut self, size: PixelSize) {
        if self.size() != size {
            self.buffer = RgbaImage::from_pixel(size.width, size.height, self.clear);
        }
    }

    fn render(&mut self, scene: &FrameScene<'_>) {
        for pixel in self.buffer.pixels_mut() {
            *pixel = self.clear;
        }
        let projection = Projection::new(self.size(), scene.viewport, scene.camera);
        for tile in &scene.tiles {
            self.draw_tile(tile, &projection);
        }
        self.frames += 1;
    }
}

/// Maps world units on the focal plane to buffer pixels.
#[derive(Debug, Clone, Copy)]
struct Projection {
    width: f64,
    height: f64,
    px_per_unit_x: f64,
    px_per_unit_y: f64,
    viewport: Viewport,
    distance: f64,
}

impl Projection {
    fn new(size: PixelSize, viewport: Viewport, camera: Camera) -> Self {
        let width = f64::from(size.width);
        let height = f64::from(size.height);
        Self {
            width,
            height,
            px_per_unit_x: if viewport.width > 0.0 { width / viewport.width } else { 0.0 },
            px_per_unit_y: if viewport.height > 0.0 { height / viewport.height } else { 0.0 },
            viewport,
            distance: camera.distance,
        }
    }

    fn x(&self, world: f64) -> f64 {
        (world / self.viewport.width + 0.5) * self.width
    }

    fn y(&self, world: f64) -> f64 {
        (0.5 - world / self.viewport.height) * self.height
    }
}

fn clip_span(start: f64, end: f64, limit: u32) -> Option<(u32, u32)> {
    let lo = start.floor().max(0.0);
    let hi = end.ceil().min(f64::from(limit));
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return None;
    }
    Some((lo as u32, hi as u32))
}

/// Coverage of a rounded rectangle at plane coordinates `(u, v)`.
fn rounded_mask(u: f64, v: f64, plane_width: f64, plane_height: f64, radius: f64) -> f64 {
    let radius = radius.min(plane_width / 2.0).min(plane_height / 2.0);
    let px = ((u - 0.5) * plane_width).abs();
    let py = ((v - 0.5) * plane_height).abs();
    let qx = px - plane_width / 2.0 + radius;
    let qy = py - plane_height / 2.0 + radius;
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    let inside = qx.max(qy).min(0.0);
    let distance = outside + inside - radius;
    1.0 - smoothstep(-MASK_FEATHER, MASK_FEATHER, distance)
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Samples `texture` as if cropped to fill a plane with the given aspect.
fn sample_cover(texture: &RgbaImage, u: f64, v: f64, plane_aspect: f64) -> Rgba<u8> {
    let (iw, ih) = texture.dimensions();
    if iw == 0 || ih == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let image_aspect = f64::from(iw) / f64::from(ih);
    let ratio_x = (plane_aspect / image_aspect).min(1.0);
    let ratio_y = (image_aspect / plane_aspect).min(1.0);
    let cu = u * ratio_x + (1.0 - ratio_x) * 0.5;
    let cv = v * ratio_y + (1.0 - ratio_y) * 0.5;
    sample(texture, cu, cv)
}

fn sample(texture: &RgbaImage, u: f64, v: f64) -> Rgba<u8> {
    let (w, h) = texture.dimensions();
    let x = ((u * f64::from(w)) as u32).min(w.saturating_sub(1));
    let y = ((v * f64::from(h)) as u32).min(h.saturating_sub(1));
    *texture.get_pixel(x, y)
}

fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f64) {
    let sa = f64::from(src[3]) / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = f64::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for channel in 0..3 {
        let s = f64::from(src[channel]);
        let d = f64::from(dst[channel]);
        let value = (s * sa + d * da * (1.0 - sa)) / out_a;
        dst[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAR: [u8; 4] = [255, 255, 255, 0];
    const PLACEHOLDER: [u8; 4] = [200, 200, 200, 255];

    fn surface() -> SoftwareSurface {
        SoftwareSurface::new(PixelSize { width: 200, height: 100 }, CLEAR, PLACEHOLDER)
    }

    fn scene<'a>(tiles: Vec<TileDraw<'a>>) -> FrameScene<'a> {
        FrameScene {
            camera: Camera::default(),
            viewport: Viewport {
                width: 4.0,
                height: 2.0,
            },
            tiles,
        }
    }

    fn tile<'a>(texture: Option<&'a RgbaImage>) -> TileDraw<'a> {
        TileDraw {
            center_x: 0.0,
            plane_width: 1.0,
            plane_height: 1.0,
            texture,
            caption: None,
            time: 0.0,
            speed: 0.0,
            border_radius: 0.2,
        }
    }

    #[test]
    fn draws_texture_inside_rounded_mask() {
        let red = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]));
        let mut surface = surface();
        surface.render(&scene(vec![tile(Some(&red))]));

        // The 1x1 unit tile covers pixels 75..125 x 25..75.
        assert_eq!(*surface.frame().get_pixel(100, 50), Rgba([255, 0, 0, 255]));
        assert_eq!(surface.frame().get_pixel(76, 26)[3], 0);
        assert_eq!(surface.frame().get_pixel(10, 50)[3], 0);
        assert_eq!(surface.frames_rendered(), 1);
    }

    #[test]
    fn pending_texture_draws_placeholder() {
        let mut surface = surface();
        surface.render(&scene(vec![tile(None)]));
        assert_eq!(*surface.frame().get_pixel(100, 50), Rgba(PLACEHOLDER));
    }

    #[test]
    fn cover_fit_crops_the_long_side() {
        // Left half blue, right half green on a wide image; the square tile shows the middle.
        let mut wide = RgbaImage::from_pixel(40, 10, Rgba([0, 0, 255, 255]));
        for x in 20..40 {
            for y in 0..10 {
                wide.put_pixel(x, y, Rgba([0, 255, 0, 255]));
            }
        }
        assert_eq!(sample_cover(&wide, 0.0, 0.5, 1.0), *wide.get_pixel(15, 5));
        assert_eq!(sample_cover(&wide, 0.99, 0.5, 1.0), *wide.get_pixel(24, 5));
    }

    #[test]
    fn offscreen_tiles_are_skipped() {
        let mut surface = surface();
        let mut far = tile(None);
        far.center_x = 40.0;
        surface.render(&scene(vec![far]));
        assert!(surface.frame().pixels().all(|pixel| pixel[3] == 0));
    }

    #[test]
    fn caption_sits_below_tile() {
        let caption = RgbaImage::from_pixel(40, 10, Rgba([255, 255, 255, 255]));
        let mut surface = surface();
        let mut drawn = tile(None);
        drawn.caption = Some(&caption);
        surface.render(&scene(vec![drawn]));

        // Caption centre: 0.5 + 0.18 * 0.6 = 0.608 units below the tile centre.
        let caption_y = 50 + (0.608_f64 * 50.0).round() as u32;
        assert_eq!(*surface.frame().get_pixel(100, caption_y), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn wave_stretches_columns_with_speed() {
        let mut calm = surface();
        calm.render(&scene(vec![tile(None)]));
        let mut fast = surface();
        let mut moving = tile(None);
        moving.speed = 5.0;
        moving.time = std::f64::consts::FRAC_PI_2;
        fast.render(&scene(vec![moving]));

        let column = |surface: &SoftwareSurface| {
            (0..100).filter(|&y| surface.frame().get_pixel(100, y)[3] > 0).count()
        };
        assert!(column(&fast) > column(&calm));
    }

    #[test]
    fn blending_over_transparent_keeps_source_colour() {
        let mut dst = Rgba([255, 255, 255, 0]);
        blend_over(&mut dst, Rgba([10, 20, 30, 255]), 0.5);
        assert_eq!(dst, Rgba([10, 20, 30, 128]));
    }
}
