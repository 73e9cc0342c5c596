use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

/// Interval of a 60 Hz display refresh.
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Which way the strip moved during the last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Content moves left, offsets grow.
    Forward,
    Backward,
}

/// Eased scroll offset shared by every tile on the strip.
///
/// Input handlers only ever write `target`; the frame step is the sole writer
/// of `current` and `last`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollState {
    pub current: f64,
    pub target: f64,
    pub last: f64,
    pub smoothing: f64,
}

impl ScrollState {
    pub fn new(smoothing: f64) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            last: 0.0,
            smoothing,
        }
    }

    /// Moves `current` a fixed fraction of the remaining distance toward
    /// `target` and reports the resulting direction relative to `last`.
    pub fn ease(&mut self) -> Direction {
        self.current = lerp(self.current, self.target, self.smoothing);
        self.direction()
    }

    pub fn direction(&self) -> Direction {
        if self.current > self.last {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    /// Distance travelled since the previous frame.
    pub fn velocity(&self) -> f64 {
        (self.current - self.last).abs()
    }

    /// Commits the current offset as the reference for the next frame.
    pub fn settle(&mut self) {
        self.last = self.current;
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Holds the most recent value until a quiet period passes without a newer one.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Replaces any pending value and restarts the quiet period.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    /// Returns the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Liveness flag shared between an engine and its background work.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// How a [`FrameClock`] spaces consecutive frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Sleep until each frame deadline.
    Realtime,
    /// Advance a virtual clock without waiting.
    Simulated,
}

/// Produces frame timestamps at a fixed interval.
#[derive(Debug, Clone)]
pub struct FrameClock {
    pacing: Pacing,
    interval: Duration,
    origin: Instant,
    frames: u32,
}

impl FrameClock {
    pub fn new(pacing: Pacing) -> Self {
        Self::with_interval(pacing, FRAME_INTERVAL)
    }

    pub fn with_interval(pacing: Pacing, interval: Duration) -> Self {
        Self {
            pacing,
            interval,
            origin: Instant::now(),
            frames: 0,
        }
    }

    /// Time of the most recently issued frame, or the origin before any frame.
    pub fn now(&self) -> Instant {
        self.origin + self.interval * self.frames
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Advances to the next frame deadline and returns its timestamp.
    pub fn next_frame(&mut self) -> Instant {
        self.frames += 1;
        let deadline = self.now();
        match self.pacing {
            Pacing::Simulated => deadline,
            Pacing::Realtime => {
                let wait = deadline.saturating_duration_since(Instant::now());
                if !wait.is_zero() {
                    std::thread::sleep(wait);
                }
                Instant::now()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_converges_without_overshoot() {
        for target in [250.0, -80.0, 0.5, 1_000.0] {
            let mut scroll = ScrollState::new(0.08);
            scroll.target = target;
            let mut previous_gap = (scroll.target - scroll.current).abs();

            for _ in 0..200 {
                scroll.ease();
                let gap = (scroll.target - scroll.current).abs();
                assert!(gap <= previous_gap);
                assert!(scroll.current.signum() == target.signum() || scroll.current == 0.0);
                assert!(scroll.current.abs() <= target.abs());
                previous_gap = gap;
                scroll.settle();
            }
        }
    }

    #[test]
    fn settles_within_tolerance_after_two_hundred_frames() {
        let mut scroll = ScrollState::new(0.08);
        scroll.target = 12.0;
        for _ in 0..200 {
            scroll.ease();
            scroll.settle();
        }
        assert!((scroll.current - scroll.target).abs() < 0.01);
    }

    #[test]
    fn direction_follows_last_frame() {
        let mut scroll = ScrollState::new(0.5);
        scroll.target = 10.0;
        assert_eq!(scroll.ease(), Direction::Forward);
        scroll.settle();
        scroll.target = -10.0;
        assert_eq!(scroll.ease(), Direction::Backward);
        scroll.settle();
        // At rest the strip counts as moving backward.
        let mut rest = ScrollState::new(0.5);
        assert_eq!(rest.ease(), Direction::Backward);
    }

    #[test]
    fn debouncer_keeps_latest_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.push(1, start);
        debouncer.push(2, start + Duration::from_millis(60));

        assert_eq!(debouncer.poll(start + Duration::from_millis(120)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(160)), Some(2));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn simulated_clock_does_not_wait() {
        let mut clock = FrameClock::with_interval(Pacing::Simulated, Duration::from_secs(1));
        let origin = clock.now();
        let third = (0..3).map(|_| clock.next_frame()).last().unwrap();
        assert_eq!(third - origin, Duration::from_secs(3));
        assert_eq!(clock.frames(), 3);
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let worker = token.clone();
        assert!(!worker.is_cancelled());
        token.cancel();
        assert!(worker.is_cancelled());
    }
}
