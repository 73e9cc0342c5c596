use crate::{host::HeadlessHost, render::Surface, timeline::FrameClock};

use super::CarouselEngine;

/// Explicit animation loop for an engine mounted on a [`HeadlessHost`].
///
/// Each iteration services the host's pending frame request: queued input is
/// delivered first, then the engine steps. The loop ends when the engine stops
/// requesting frames, its token is cancelled, or the frame budget runs out.
#[derive(Debug)]
pub struct FrameLoop {
    clock: FrameClock,
    max_frames: Option<u32>,
}

impl FrameLoop {
    pub fn new(clock: FrameClock) -> Self {
        Self {
            clock,
            max_frames: None,
        }
    }

    pub fn with_max_frames(mut self, max_frames: u32) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Runs frames until the loop ends and returns how many were run.
    /// `after_frame` receives the frame number and may queue more input on the host.
    pub fn run<S, F>(&mut self, engine: &mut CarouselEngine<HeadlessHost, S>, mut after_frame: F) -> u32
    where
        S: Surface,
        F: FnMut(u32, &mut CarouselEngine<HeadlessHost, S>),
    {
        let token = engine.cancellation_token();
        let mut ran = 0;

        while self.max_frames.map_or(true, |max| ran < max) {
            if token.is_cancelled() || engine.host_mut().take_frame_request().is_none() {
                break;
            }
            let now = self.clock.next_frame();
            for event in engine.host_mut().drain_events() {
                engine.handle_event(event, now);
            }
            if engine.frame(now).is_none() {
                break;
            }
            ran += 1;
            after_frame(ran, engine);
        }

        ran
    }
}
