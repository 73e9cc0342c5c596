use serde::{Deserialize, Serialize};

use crate::timeline::{Direction, ScrollState};

/// Bend value at which tiles keep their reference aspect.
pub const NEUTRAL_BEND: f64 = 3.0;
/// Screen height, in CSS pixels, at which tiles are drawn at reference scale.
const REFERENCE_SCREEN_HEIGHT: f64 = 1200.0;
const TILE_WIDTH_FACTOR: f64 = 0.7;
const TILE_HEIGHT_FACTOR: f64 = 0.9;

/// One image and caption shown on the strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(alias = "image")]
    pub source_url: String,
    #[serde(alias = "title", default)]
    pub caption: String,
}

impl MediaItem {
    pub fn new(source_url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            caption: caption.into(),
        }
    }
}

/// Size of the host container in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Extent of the visible plane at the camera's focal distance, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Perspective camera looking down the z axis at the strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov_degrees: f64,
    pub distance: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            distance: 5.0,
        }
    }
}

impl Camera {
    pub fn viewport(&self, screen: ScreenSize) -> Viewport {
        let fov = self.fov_degrees.to_radians();
        let height = 2.0 * (fov / 2.0).tan() * self.distance;
        Viewport {
            width: height * screen.aspect(),
            height,
        }
    }
}

/// Tile dimensions derived from the screen, viewport and bend.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TileLayout {
    pub plane_width: f64,
    pub plane_height: f64,
    /// Distance between the centres of neighbouring tiles.
    pub width_units: f64,
    /// Length of the whole duplicated strip.
    pub strip_width: f64,
}

impl TileLayout {
    pub fn compute(
        screen: ScreenSize,
        viewport: Viewport,
        bend: f64,
        gap: f64,
        tile_count: usize,
    ) -> Self {
        let scale = screen.height / REFERENCE_SCREEN_HEIGHT;
        let plane_width = viewport.height * TILE_WIDTH_FACTOR * scale * bend_aspect(bend);
        let plane_height = viewport.height * TILE_HEIGHT_FACTOR * scale;
        let width_units = plane_width + gap;
        Self {
            plane_width,
            plane_height,
            width_units,
            strip_width: width_units * tile_count as f64,
        }
    }
}

/// Horizontal stretch applied to every tile for a given bend.
pub fn bend_aspect(bend: f64) -> f64 {
    (1.0 + (bend - NEUTRAL_BEND) * 0.05).clamp(0.5, 1.5)
}

/// Render state of one tile on the strip.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Position in the duplicated sequence.
    pub index: usize,
    /// Texture slot shared with the tile's duplicate.
    pub texture: usize,
    /// Net number of strip lengths this tile has been carried across the loop.
    pub wraps: i64,
    /// Horizontal centre computed on the last update.
    pub position: f64,
    pub time: f64,
    pub speed: f64,
    pub is_before: bool,
    pub is_after: bool,
}

impl Tile {
    fn new(index: usize, texture: usize, width_units: f64) -> Self {
        Self {
            index,
            texture,
            wraps: 0,
            position: width_units * index as f64,
            time: 0.0,
            speed: 0.0,
            is_before: false,
            is_after: false,
        }
    }

    pub fn position_offset_units(&self, layout: &TileLayout) -> f64 {
        self.wraps as f64 * layout.strip_width
    }

    /// Centre of the tile for a given scroll offset. Needs nothing from its siblings.
    pub fn position_at(&self, layout: &TileLayout, scroll: f64) -> f64 {
        layout.width_units * self.index as f64 + self.position_offset_units(layout) - scroll
    }
}

/// Parameters of the cosmetic per-tile motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub wave_step: f64,
    pub speed_gain: f64,
}

/// Arena of tiles laid end to end. Every item supplied by the caller appears twice.
#[derive(Debug, Clone)]
pub struct Strip {
    unique: usize,
    tiles: Vec<Tile>,
    screen: ScreenSize,
    viewport: Viewport,
    layout: TileLayout,
    bend: f64,
    gap: f64,
}

impl Strip {
    pub fn new(items: &[MediaItem], screen: ScreenSize, camera: &Camera, bend: f64, gap: f64) -> Self {
        let unique = items.len();
        let count = unique * 2;
        let viewport = camera.viewport(screen);
        let layout = TileLayout::compute(screen, viewport, bend, gap, count);
        let tiles = (0..count)
            .map(|index| Tile::new(index, index % unique.max(1), layout.width_units))
            .collect();

        Self {
            unique,
            tiles,
            screen,
            viewport,
            layout,
            bend,
            gap,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of tiles, twice the caller's item count.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn unique_len(&self) -> usize {
        self.unique
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    /// Recomputes the viewport and tile dimensions, then re-centres the wraps so
    /// every tile lies within half a strip of the viewport centre.
    pub fn resize(&mut self, screen: ScreenSize, camera: &Camera, scroll: f64) {
        self.screen = screen;
        self.viewport = camera.viewport(screen);
        self.layout = TileLayout::compute(screen, self.viewport, self.bend, self.gap, self.tiles.len());
        let layout = self.layout;
        for tile in &mut self.tiles {
            if layout.strip_width > 0.0 {
                let home = layout.width_units * tile.index as f64;
                tile.wraps = ((scroll - home) / layout.strip_width).round() as i64;
            }
            tile.position = tile.position_at(&layout, scroll);
        }
    }

    /// Runs the per-frame tile step and returns how many tiles were recycled.
    ///
    /// Positions are taken before recycling, so a tile that crossed the edge
    /// this frame is drawn where it was and only jumps on the next frame.
    pub fn update(&mut self, scroll: &ScrollState, direction: Direction, motion: Motion) -> usize {
        let layout = self.layout;
        let half_viewport = self.viewport.width / 2.0;
        let half_plane = layout.plane_width / 2.0;
        let speed = scroll.velocity() * motion.speed_gain;
        let mut recycled = 0;

        for tile in &mut self.tiles {
            tile.position = tile.position_at(&layout, scroll.current);
            tile.is_before = tile.position + half_plane < -half_viewport;
            tile.is_after = tile.position - half_plane > half_viewport;

            if layout.strip_width > 0.0 {
                // Fewest whole strips that bring the tile back inside the far edge.
                let strips = match direction {
                    Direction::Forward if tile.is_before => {
                        ((-half_viewport - half_plane - tile.position) / layout.strip_width).ceil()
                    }
                    Direction::Backward if tile.is_after => {
                        -((tile.position - half_plane - half_viewport) / layout.strip_width).ceil()
                    }
                    _ => 0.0,
                };
                let strips = strips as i64;
                tile.wraps += strips;
                recycled += strips.unsigned_abs() as usize;
            }

            tile.time += motion.wave_step;
            tile.speed = speed;
        }

        recycled
    }
}
