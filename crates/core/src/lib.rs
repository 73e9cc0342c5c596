//! Core library for the Telaura storefront carousel.
//!
//! The crate implements an infinitely looping, draggable strip of image tiles.
//! Each module owns one concern: the tile arena and its layout (`scene`),
//! scroll easing and frame timing (`timeline`), gesture mapping (`input`),
//! texture and caption loading (`assets`), compositing (`render`), the page
//! boundary (`host`) and the engine tying them together (`carousel`).

pub mod assets;
pub mod carousel;
pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod render;
pub mod scene;
pub mod timeline;

pub use assets::{CaptionRasterizer, FsImageFetcher, ImageFetcher, TextureStore};
pub use carousel::{CarouselEngine, FrameLoop, FrameReport};
pub use config::{AppConfig, CarouselConfig, RenderConfig};
pub use error::{GalleryError, Result};
pub use host::{HeadlessHost, Host, PixelSize};
pub use input::{InputEvent, ListenerKind};
pub use render::{SoftwareSurface, Surface};
pub use scene::{MediaItem, ScreenSize, Strip};
pub use timeline::{CancellationToken, Direction, FrameClock, Pacing, ScrollState};
