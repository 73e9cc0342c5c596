//! The infinite media carousel.
//!
//! [`CarouselEngine`] owns the strip, the scroll state and the render surface
//! for as long as its host view is mounted. The host feeds it input events and
//! animation frames; [`CarouselEngine::teardown`] hands the host back with
//! every listener, frame request and surface released.

mod frame_loop;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

pub use frame_loop::FrameLoop;

use crate::{
    assets::{CaptionRasterizer, ImageFetcher, ImageLoader, LoadOutcome, TextureStore},
    config::AppConfig,
    host::{FrameRequest, Host, ListenerId, PixelSize, SurfaceId},
    input::{GestureMapper, InputEvent, InputTuning, ListenerKind},
    render::{FrameScene, SoftwareSurface, Surface, TileDraw},
    scene::{Camera, MediaItem, Motion, ScreenSize, Strip},
    timeline::{CancellationToken, Debouncer, Direction, ScrollState},
    Result,
};

/// Summary of one frame step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub direction: Direction,
    pub recycled: usize,
    pub textures_applied: usize,
    pub resized: bool,
}

/// A mounted carousel. Constructed once per container and torn down exactly once.
#[derive(Debug)]
pub struct CarouselEngine<H: Host, S: Surface = SoftwareSurface> {
    host: H,
    config: AppConfig,
    camera: Camera,
    strip: Strip,
    scroll: ScrollState,
    gestures: GestureMapper,
    resize: Debouncer<ScreenSize>,
    textures: TextureStore,
    loader: Option<ImageLoader>,
    surface: Option<S>,
    surface_id: Option<SurfaceId>,
    listeners: Vec<(ListenerId, ListenerKind)>,
    pending_frame: Option<FrameRequest>,
    token: CancellationToken,
    frames: u64,
}

impl<H: Host> CarouselEngine<H, SoftwareSurface> {
    /// Mounts a carousel drawing into a [`SoftwareSurface`].
    pub fn create(
        host: H,
        items: &[MediaItem],
        config: AppConfig,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Result<Self> {
        let clear = config.render.clear_rgba;
        let placeholder = config.render.placeholder_rgba;
        Self::mount(host, items, config, fetcher, |size| {
            SoftwareSurface::new(size, clear, placeholder)
        })
    }
}

impl<H: Host, S: Surface> CarouselEngine<H, S> {
    /// Mounts a carousel with a caller-provided surface.
    ///
    /// An empty item list yields an inert engine that attaches nothing and
    /// never schedules a frame.
    pub fn mount(
        mut host: H,
        items: &[MediaItem],
        config: AppConfig,
        fetcher: Arc<dyn ImageFetcher>,
        make_surface: impl FnOnce(PixelSize) -> S,
    ) -> Result<Self> {
        config.validate()?;

        let camera = Camera::default();
        let screen = host.client_size();
        let carousel = &config.carousel;
        let strip = Strip::new(items, screen, &camera, carousel.bend, carousel.tile_gap);
        let scroll = ScrollState::new(carousel.smoothing);
        let gestures = GestureMapper::new(InputTuning {
            drag_sensitivity: carousel.drag_sensitivity,
            wheel_sensitivity: carousel.wheel_sensitivity,
        });
        let resize = Debouncer::new(Duration::from_millis(carousel.resize_debounce_ms));
        let token = CancellationToken::new();
        let mut textures = TextureStore::new(items.len());

        if items.is_empty() {
            info!("no media items supplied; carousel stays inert");
            return Ok(Self {
                host,
                config,
                camera,
                strip,
                scroll,
                gestures,
                resize,
                textures,
                loader: None,
                surface: None,
                surface_id: None,
                listeners: Vec::new(),
                pending_frame: None,
                token,
                frames: 0,
            });
        }

        let pixel_size = PixelSize::scaled(screen, pixel_ratio(&host, &config));
        let surface = make_surface(pixel_size);
        let surface_id = host.attach_surface(pixel_size);

        rasterize_captions(&config, items, &mut textures);

        let loader = ImageLoader::spawn(
            fetcher,
            items
                .iter()
                .enumerate()
                .map(|(slot, item)| (slot, item.source_url.clone())),
            token.clone(),
        );

        let listeners = ListenerKind::ALL
            .iter()
            .map(|kind| (host.add_listener(*kind), *kind))
            .collect();
        let pending_frame = Some(host.request_frame());

        info!(
            items = items.len(),
            tiles = strip.len(),
            width = pixel_size.width,
            height = pixel_size.height,
            "carousel mounted"
        );

        Ok(Self {
            host,
            config,
            camera,
            strip,
            scroll,
            gestures,
            resize,
            textures,
            loader: Some(loader),
            surface: Some(surface),
            surface_id: Some(surface_id),
            listeners,
            pending_frame,
            token,
            frames: 0,
        })
    }

    pub fn is_inert(&self) -> bool {
        self.strip.is_empty()
    }

    pub fn is_live(&self) -> bool {
        !self.is_inert() && !self.token.is_cancelled()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn strip(&self) -> &Strip {
        &self.strip
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.gestures.is_dragging()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Token that background work checks before touching engine state.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Applies one input event. Only `scroll.target`, drag tracking and the
    /// pending resize are touched here.
    pub fn handle_event(&mut self, event: InputEvent, now: Instant) {
        if !self.is_live() {
            return;
        }
        let kind = event.kind();
        if !self.listeners.iter().any(|(_, registered)| *registered == kind) {
            return;
        }
        match event {
            InputEvent::Resize(size) => self.resize.push(size, now),
            other => {
                self.gestures.apply(&other, &mut self.scroll);
            }
        }
    }

    /// Runs one animation frame and schedules the next one.
    pub fn frame(&mut self, now: Instant) -> Option<FrameReport> {
        if !self.is_live() {
            return None;
        }
        self.pending_frame = None;

        let textures_applied = self.apply_finished_loads();
        let resized = match self.resize.poll(now) {
            Some(size) => {
                self.apply_resize(size);
                true
            }
            None => false,
        };

        let direction = self.scroll.ease();
        let motion = Motion {
            wave_step: self.config.carousel.wave_step,
            speed_gain: self.config.carousel.speed_gain,
        };
        let recycled = self.strip.update(&self.scroll, direction, motion);
        if recycled > 0 {
            debug!(recycled, ?direction, current = self.scroll.current, "recycled tiles");
        }

        self.render();
        self.scroll.settle();
        self.frames += 1;
        self.pending_frame = Some(self.host.request_frame());

        Some(FrameReport {
            direction,
            recycled,
            textures_applied,
            resized,
        })
    }

    /// Unmounts the carousel and returns the host with nothing left attached.
    pub fn teardown(self) -> H {
        let Self {
            mut host,
            token,
            pending_frame,
            listeners,
            surface_id,
            loader,
            surface,
            frames,
            ..
        } = self;

        token.cancel();
        if let Some(request) = pending_frame {
            host.cancel_frame(request);
        }
        let removed = listeners.len();
        for (id, _) in listeners {
            host.remove_listener(id);
        }
        if let Some(id) = surface_id {
            host.detach_surface(id);
        }
        drop(loader);
        drop(surface);

        info!(frames, listeners = removed, "carousel torn down");
        host
    }

    fn apply_finished_loads(&mut self) -> usize {
        let Some(loader) = &self.loader else {
            return 0;
        };
        let mut applied = 0;
        for outcome in loader.drain() {
            if let LoadOutcome::Failed { slot, source, reason } = &outcome {
                warn!(slot, %source, %reason, "image failed to load; tile keeps its placeholder");
            }
            if self.textures.apply(outcome) {
                applied += 1;
            }
        }
        applied
    }

    fn apply_resize(&mut self, screen: ScreenSize) {
        let pixel_size = PixelSize::scaled(screen, pixel_ratio(&self.host, &self.config));
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(pixel_size);
        }
        if let Some(id) = self.surface_id {
            self.host.resize_surface(id, pixel_size);
        }
        self.strip.resize(screen, &self.camera, self.scroll.current);
        debug!(
            width = screen.width,
            height = screen.height,
            width_units = self.strip.layout().width_units,
            "carousel resized"
        );
    }

    fn render(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let layout = self.strip.layout();
        let border_radius = self.config.carousel.border_radius;
        let scene = FrameScene {
            camera: self.camera,
            viewport: self.strip.viewport(),
            tiles: self
                .strip
                .tiles()
                .iter()
                .map(|tile| TileDraw {
                    center_x: tile.position,
                    plane_width: layout.plane_width,
                    plane_height: layout.plane_height,
                    texture: self.textures.image(tile.texture),
                    caption: self.textures.caption(tile.texture),
                    time: tile.time,
                    speed: tile.speed,
                    border_radius,
                })
                .collect(),
        };
        surface.render(&scene);
    }
}

fn pixel_ratio<H: Host>(host: &H, config: &AppConfig) -> f32 {
    host.device_pixel_ratio()
        .min(config.carousel.max_device_pixel_ratio)
        .max(1.0)
}

fn rasterize_captions(config: &AppConfig, items: &[MediaItem], textures: &mut TextureStore) {
    let render = &config.render;
    let loaded = match &render.caption_font {
        Some(font) => CaptionRasterizer::from_path(font, render.caption_px, render.caption_rgba)
            .or_else(|err| {
                warn!(font = %font.display(), error = %err, "caption font unavailable; using bundled font");
                CaptionRasterizer::embedded(render.caption_px, render.caption_rgba)
            }),
        None => CaptionRasterizer::embedded(render.caption_px, render.caption_rgba),
    };
    let rasterizer = match loaded {
        Ok(rasterizer) => rasterizer,
        Err(err) => {
            warn!(error = %err, "caption rasterizer unavailable; captions disabled");
            return;
        }
    };
    for (slot, item) in items.iter().enumerate() {
        if let Some(texture) = rasterizer.rasterize(&item.caption) {
            textures.set_caption(slot, texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Cursor, thread};

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;
    use crate::{
        assets::TextureSlot,
        host::HeadlessHost,
        timeline::{FrameClock, Pacing},
        GalleryError,
    };

    #[derive(Debug, Default)]
    struct MemoryFetcher {
        files: HashMap<String, Vec<u8>>,
    }

    impl ImageFetcher for MemoryFetcher {
        fn fetch(&self, source: &str) -> Result<Vec<u8>> {
            self.files
                .get(source)
                .cloned()
                .ok_or_else(|| GalleryError::msg(format!("no such image `{source}`")))
        }
    }

    fn png(color: [u8; 4]) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(16, 16, Rgba(color))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn items(count: usize) -> Vec<MediaItem> {
        (0..count)
            .map(|i| MediaItem::new(format!("tile-{i}.png"), format!("Tile {i}")))
            .collect()
    }

    fn fetcher_for(items: &[MediaItem]) -> Arc<dyn ImageFetcher> {
        let mut fetcher = MemoryFetcher::default();
        for item in items {
            fetcher.files.insert(item.source_url.clone(), png([200, 30, 30, 255]));
        }
        Arc::new(fetcher)
    }

    fn host() -> HeadlessHost {
        HeadlessHost::new(ScreenSize::new(480.0, 320.0))
    }

    fn engine(count: usize) -> CarouselEngine<HeadlessHost> {
        let items = items(count);
        CarouselEngine::create(host(), &items, AppConfig::default(), fetcher_for(&items)).unwrap()
    }

    #[test]
    fn mount_registers_listeners_surface_and_first_frame() {
        let engine = engine(6);
        assert_eq!(engine.strip().len(), 12);
        assert_eq!(engine.host().listener_count(), ListenerKind::ALL.len());
        assert_eq!(engine.host().surface_count(), 1);
        assert!(engine.host().has_pending_frame());

        let host = engine.teardown();
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.surface_count(), 0);
        assert!(!host.has_pending_frame());
    }

    #[test]
    fn empty_items_leave_engine_inert() {
        let mut engine =
            CarouselEngine::create(host(), &[], AppConfig::default(), fetcher_for(&[])).unwrap();
        assert!(engine.is_inert());
        assert_eq!(engine.host().listener_count(), 0);
        assert_eq!(engine.host().surface_count(), 0);
        assert!(!engine.host().has_pending_frame());

        engine.handle_event(InputEvent::Wheel { delta_y: 100.0 }, Instant::now());
        assert!(engine.frame(Instant::now()).is_none());
        assert_eq!(engine.scroll().target, 0.0);
        engine.teardown();
    }

    #[test]
    fn rejects_invalid_config() {
        let items = items(2);
        let mut config = AppConfig::default();
        config.carousel.smoothing = 0.0;
        let result = CarouselEngine::create(host(), &items, config, fetcher_for(&items));
        assert!(matches!(result, Err(GalleryError::InvalidInput(_))));
    }

    #[test]
    fn wheel_and_drag_only_move_target() {
        let mut engine = engine(3);
        let now = Instant::now();
        for delta_y in [100.0, -50.0, 200.0] {
            engine.handle_event(InputEvent::Wheel { delta_y }, now);
        }
        assert!((engine.scroll().target - 200.0).abs() < 1e-9);
        assert_eq!(engine.scroll().current, 0.0);

        let mut engine = self::engine(3);
        engine.handle_event(InputEvent::MouseDown { x: 500.0 }, now);
        engine.handle_event(InputEvent::MouseMove { x: 400.0 }, now);
        assert!(engine.is_dragging());
        assert_eq!(engine.scroll().target, 250.0);
        engine.handle_event(InputEvent::MouseUp, now);
        assert!(!engine.is_dragging());
        assert_eq!(engine.scroll().target, 250.0);
    }

    #[test]
    fn frame_eases_and_reschedules() {
        let mut engine = engine(6);
        let now = Instant::now();
        engine.handle_event(InputEvent::Wheel { delta_y: 10.0 }, now);
        engine.host_mut().take_frame_request();

        let report = engine.frame(now).unwrap();
        assert_eq!(report.direction, Direction::Forward);
        assert!((engine.scroll().current - 8.0 * 0.08).abs() < 1e-9);
        assert_eq!(engine.scroll().last, engine.scroll().current);
        assert!(engine.host().has_pending_frame());
        assert_eq!(engine.surface().unwrap().frames_rendered(), 1);
    }

    #[test]
    fn resize_is_debounced_and_keeps_scroll() {
        let mut engine = engine(6);
        let start = Instant::now();
        engine.handle_event(InputEvent::Wheel { delta_y: 50.0 }, start);
        for _ in 0..5 {
            engine.frame(start);
        }
        let before = engine.scroll().clone();
        let old_width = engine.strip().layout().width_units;

        let resized = ScreenSize::new(960.0, 640.0);
        engine.handle_event(InputEvent::Resize(resized), start);
        let early = engine.frame(start + Duration::from_millis(50)).unwrap();
        assert!(!early.resized);
        assert_eq!(engine.strip().screen(), ScreenSize::new(480.0, 320.0));

        let late = engine.frame(start + Duration::from_millis(150)).unwrap();
        assert!(late.resized);
        assert_eq!(engine.strip().screen(), resized);
        assert!(engine.strip().layout().width_units > old_width);
        assert_eq!(engine.scroll().target, before.target);
        assert!(engine.scroll().current > before.current);
        assert_eq!(
            engine.surface().unwrap().size(),
            PixelSize { width: 960, height: 640 }
        );
    }

    #[test]
    fn caps_device_pixel_ratio() {
        let items = items(1);
        let host = host().with_device_pixel_ratio(3.0);
        let engine = CarouselEngine::create(host, &items, AppConfig::default(), fetcher_for(&items)).unwrap();
        assert_eq!(
            engine.surface().unwrap().size(),
            PixelSize { width: 960, height: 640 }
        );
    }

    #[test]
    fn failed_images_do_not_block_other_tiles() {
        let items = vec![
            MediaItem::new("good.png", "Good"),
            MediaItem::new("missing.png", "Missing"),
        ];
        let mut fetcher = MemoryFetcher::default();
        fetcher.files.insert("good.png".to_string(), png([0, 0, 255, 255]));
        let mut engine =
            CarouselEngine::create(host(), &items, AppConfig::default(), Arc::new(fetcher)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while engine.textures().pending_count() > 0 && Instant::now() < deadline {
            engine.frame(Instant::now());
            thread::sleep(Duration::from_millis(5));
        }

        assert!(engine.textures().image(0).is_some());
        assert!(matches!(engine.textures().slot(1), Some(TextureSlot::Failed)));
        assert!(engine.frames_rendered() > 0);
    }

    #[test]
    fn frame_loop_converges_on_target() {
        let mut engine = engine(6);
        engine.handle_event(InputEvent::Wheel { delta_y: 40.0 }, Instant::now());

        let mut frames = FrameLoop::new(FrameClock::new(Pacing::Simulated)).with_max_frames(200);
        let ran = frames.run(&mut engine, |_, _| {});
        assert_eq!(ran, 200);
        assert!((engine.scroll().current - engine.scroll().target).abs() < 0.01);
    }

    #[test]
    fn torn_down_engine_ignores_token_holders() {
        let engine = engine(2);
        let token = engine.cancellation_token();
        assert!(!token.is_cancelled());
        engine.teardown();
        assert!(token.is_cancelled());
    }

    #[test]
    fn settled_strip_stays_visible_after_shrinking() {
        let items = items(6);
        let host = HeadlessHost::new(ScreenSize::new(240.0, 170.0));
        let mut engine =
            CarouselEngine::create(host, &items, AppConfig::default(), fetcher_for(&items)).unwrap();
        let start = Instant::now();
        engine.handle_event(InputEvent::Wheel { delta_y: 500.0 }, start);
        for _ in 0..1000 {
            engine.frame(start);
        }
        assert_eq!(engine.scroll().direction(), Direction::Backward);

        engine.handle_event(InputEvent::Resize(ScreenSize::new(240.0, 120.0)), start);
        let report = engine.frame(start + Duration::from_millis(150)).unwrap();
        assert!(report.resized);
        for _ in 0..20 {
            engine.frame(start + Duration::from_millis(200));
        }

        let strip = engine.strip();
        let half_viewport = strip.viewport().width / 2.0;
        let half_plane = strip.layout().plane_width / 2.0;
        let visible = strip
            .tiles()
            .iter()
            .filter(|tile| tile.position.abs() - half_plane < half_viewport)
            .count();
        assert!(visible >= 2, "visible tiles: {visible}");
    }

    #[test]
    fn captions_use_bundled_font_by_default() {
        let engine = engine(3);
        for slot in 0..3 {
            assert!(engine.textures().caption(slot).is_some());
        }
    }

    #[test]
    fn unreadable_caption_font_falls_back_to_bundled() {
        let items = items(2);
        let mut config = AppConfig::default();
        config.render.caption_font = Some("/nonexistent/caption-font.ttf".into());
        let engine = CarouselEngine::create(host(), &items, config, fetcher_for(&items)).unwrap();
        assert!(engine.textures().caption(0).is_some());
        assert!(engine.textures().caption(1).is_some());
    }
}
