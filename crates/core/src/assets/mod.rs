mod caption;
mod loader;

use image::RgbaImage;

pub use caption::CaptionRasterizer;
pub use loader::{FsImageFetcher, ImageFetcher, ImageLoader, LoadOutcome};

/// Texture slot for one unique media item.
#[derive(Debug, Clone, Default)]
pub enum TextureSlot {
    /// Still loading; the tile draws the placeholder.
    #[default]
    Pending,
    Ready(RgbaImage),
    /// Loading failed; the tile keeps the placeholder for good.
    Failed,
}

/// Textures shared by the tiles of a strip, one slot per unique item.
#[derive(Debug, Default)]
pub struct TextureStore {
    slots: Vec<TextureSlot>,
    captions: Vec<Option<RgbaImage>>,
}

impl TextureStore {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![TextureSlot::Pending; count],
            captions: vec![None; count],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&TextureSlot> {
        self.slots.get(index)
    }

    pub fn image(&self, index: usize) -> Option<&RgbaImage> {
        match self.slots.get(index) {
            Some(TextureSlot::Ready(image)) => Some(image),
            _ => None,
        }
    }

    pub fn caption(&self, index: usize) -> Option<&RgbaImage> {
        self.captions.get(index).and_then(Option::as_ref)
    }

    pub fn set_caption(&mut self, index: usize, caption: RgbaImage) {
        if let Some(slot) = self.captions.get_mut(index) {
            *slot = Some(caption);
        }
    }

    /// Stores a finished load. Returns `false` for slots outside the store.
    pub fn apply(&mut self, outcome: LoadOutcome) -> bool {
        let (index, value) = match outcome {
            LoadOutcome::Loaded { slot, image } => (slot, TextureSlot::Ready(image)),
            LoadOutcome::Failed { slot, .. } => (slot, TextureSlot::Failed),
        };
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn ready_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, TextureSlot::Ready(_)))
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, TextureSlot::Pending))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_leave_other_slots_untouched() {
        let mut store = TextureStore::new(3);
        assert!(store.apply(LoadOutcome::Loaded {
            slot: 0,
            image: RgbaImage::new(2, 2),
        }));
        assert!(store.apply(LoadOutcome::Failed {
            slot: 1,
            source: "missing.png".to_string(),
            reason: "not found".to_string(),
        }));

        assert!(store.image(0).is_some());
        assert!(matches!(store.slot(1), Some(TextureSlot::Failed)));
        assert!(matches!(store.slot(2), Some(TextureSlot::Pending)));
        assert_eq!(store.ready_count(), 1);
        assert_eq!(store.pending_count(), 1);
    }

    #[test]
    fn ignores_out_of_range_slots() {
        let mut store = TextureStore::new(1);
        assert!(!store.apply(LoadOutcome::Loaded {
            slot: 4,
            image: RgbaImage::new(1, 1),
        }));
        assert_eq!(store.ready_count(), 0);
    }
}
