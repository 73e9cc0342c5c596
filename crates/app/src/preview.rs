use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use telaura_core::{
    AppConfig, CarouselEngine, FrameClock, FrameLoop, FsImageFetcher, HeadlessHost, InputEvent,
    Pacing, ScreenSize,
};
use tracing::{info, warn};

use crate::{catalogue, fetch::HttpImageFetcher};

/// Settings for one headless preview run.
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub manifest: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub font: Option<PathBuf>,
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f32,
    pub frames: u32,
    pub wheel_per_frame: f64,
    pub snapshot_every: u32,
    pub output_dir: PathBuf,
    pub realtime: bool,
}

/// Mounts the carousel on a headless host, scrolls it and writes PNG snapshots.
pub fn run(options: PreviewOptions) -> anyhow::Result<()> {
    let mut config = match &options.config {
        Some(path) => AppConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(font) = &options.font {
        config.render.caption_font = Some(font.clone());
    }

    let (items, root) = match &options.manifest {
        Some(path) => (
            catalogue::load_manifest(path)?,
            path.parent().map(PathBuf::from),
        ),
        None => (catalogue::default_catalogue(), None),
    };
    let local = root.map_or_else(FsImageFetcher::new, FsImageFetcher::with_root);
    let fetcher = Arc::new(HttpImageFetcher::new(local)?);

    std::fs::create_dir_all(&options.output_dir)
        .with_context(|| format!("creating {}", options.output_dir.display()))?;

    let host = HeadlessHost::new(ScreenSize::new(options.width, options.height))
        .with_device_pixel_ratio(options.device_pixel_ratio);
    info!(items = items.len(), frames = options.frames, "starting preview");
    let mut engine = CarouselEngine::create(host, &items, config, fetcher)?;
    if engine.is_inert() {
        warn!("no media items to preview");
        engine.teardown();
        return Ok(());
    }

    let pacing = if options.realtime {
        Pacing::Realtime
    } else {
        Pacing::Simulated
    };
    let mut frame_loop = FrameLoop::new(FrameClock::new(pacing)).with_max_frames(options.frames);
    let mut snapshot_error = None;

    let ran = frame_loop.run(&mut engine, |frame, engine| {
        if options.wheel_per_frame != 0.0 {
            engine.host_mut().push_event(InputEvent::Wheel {
                delta_y: options.wheel_per_frame,
            });
        }
        if snapshot_error.is_none() && options.snapshot_every > 0 && frame % options.snapshot_every == 0 {
            let path = options.output_dir.join(format!("frame-{frame:05}.png"));
            if let Err(e) = snapshot(engine, &path) {
                snapshot_error = Some(e);
            }
        }
    });
    if let Some(e) = snapshot_error {
        engine.teardown();
        return Err(e);
    }

    let final_path = options.output_dir.join("final.png");
    snapshot(&engine, &final_path)?;
    info!(
        frames = ran,
        loaded = engine.textures().ready_count(),
        pending = engine.textures().pending_count(),
        path = %final_path.display(),
        "preview finished"
    );

    engine.teardown();
    Ok(())
}

fn snapshot(engine: &CarouselEngine<HeadlessHost>, path: &std::path::Path) -> anyhow::Result<()> {
    let Some(surface) = engine.surface() else {
        return Ok(());
    };
    surface
        .save_png(path)
        .with_context(|| format!("writing snapshot {}", path.display()))
}
