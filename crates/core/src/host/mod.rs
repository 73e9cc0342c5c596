//! Boundary between the carousel and the page that mounts it.
//!
//! A [`Host`] owns the container the engine draws into, the global event
//! streams it listens to, and the animation-frame scheduler. [`HeadlessHost`]
//! provides all of that in-process for previews and tests.

use std::collections::{BTreeMap, VecDeque};

use crate::{input::InputEvent, input::ListenerKind, scene::ScreenSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Handle for a scheduled animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Size of the backing pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    /// Backing size for a CSS size at the given pixel ratio.
    pub fn scaled(screen: ScreenSize, ratio: f32) -> Self {
        let ratio = f64::from(ratio);
        Self {
            width: (screen.width * ratio).round().max(0.0) as u32,
            height: (screen.height * ratio).round().max(0.0) as u32,
        }
    }
}

pub trait Host {
    fn client_size(&self) -> ScreenSize;

    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }

    fn attach_surface(&mut self, size: PixelSize) -> SurfaceId;

    fn resize_surface(&mut self, id: SurfaceId, size: PixelSize);

    fn detach_surface(&mut self, id: SurfaceId);

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;

    fn remove_listener(&mut self, id: ListenerId);

    /// Schedules one callback for the next display refresh.
    fn request_frame(&mut self) -> FrameRequest;

    fn cancel_frame(&mut self, request: FrameRequest);
}

/// In-process host with a queued event stream and a single frame slot.
#[derive(Debug)]
pub struct HeadlessHost {
    size: ScreenSize,
    pixel_ratio: f32,
    next_id: u64,
    surfaces: BTreeMap<SurfaceId, PixelSize>,
    listeners: BTreeMap<ListenerId, ListenerKind>,
    pending_frame: Option<FrameRequest>,
    events: VecDeque<InputEvent>,
}

impl HeadlessHost {
    pub fn new(size: ScreenSize) -> Self {
        Self {
            size,
            pixel_ratio: 1.0,
            next_id: 1,
            surfaces: BTreeMap::new(),
            listeners: BTreeMap::new(),
            pending_frame: None,
            events: VecDeque::new(),
        }
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    /// Changes the container size and emits a resize event to listeners.
    pub fn set_client_size(&mut self, size: ScreenSize) {
        self.size = size;
        self.push_event(InputEvent::Resize(size));
    }

    /// Queues an event. Events nobody listens for are dropped, like an
    /// unobserved DOM event.
    pub fn push_event(&mut self, event: InputEvent) -> bool {
        let observed = self.listeners.values().any(|kind| *kind == event.kind());
        if observed {
            self.events.push_back(event);
        }
        observed
    }

    pub fn drain_events(&mut self) -> Vec<InputEvent> {
        self.events.drain(..).collect()
    }

    /// Takes the pending frame request, if the engine scheduled one.
    pub fn take_frame_request(&mut self) -> Option<FrameRequest> {
        self.pending_frame.take()
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn surface_size(&self, id: SurfaceId) -> Option<PixelSize> {
        self.surfaces.get(&id).copied()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Host for HeadlessHost {
    fn client_size(&self) -> ScreenSize {
        self.size
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn attach_surface(&mut self, size: PixelSize) -> SurfaceId {
        let id = SurfaceId(self.next_id());
        self.surfaces.insert(id, size);
        id
    }

    fn resize_surface(&mut self, id: SurfaceId, size: PixelSize) {
        if let Some(slot) = self.surfaces.get_mut(&id) {
            *slot = size;
        }
    }

    fn detach_surface(&mut self, id: SurfaceId) {
        self.surfaces.remove(&id);
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.insert(id, kind);
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn request_frame(&mut self) -> FrameRequest {
        let request = FrameRequest(self.next_id());
        self.pending_frame = Some(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending_frame == Some(request) {
            self.pending_frame = None;
        }
    }
}
