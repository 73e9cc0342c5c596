use serde::{Deserialize, Serialize};

use crate::{scene::ScreenSize, timeline::ScrollState};

/// Global event streams the engine subscribes to while mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListenerKind {
    Resize,
    Wheel,
    MouseDown,
    MouseMove,
    MouseUp,
    TouchStart,
    TouchMove,
    TouchEnd,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 8] = [
        ListenerKind::Resize,
        ListenerKind::Wheel,
        ListenerKind::MouseDown,
        ListenerKind::MouseMove,
        ListenerKind::MouseUp,
        ListenerKind::TouchStart,
        ListenerKind::TouchMove,
        ListenerKind::TouchEnd,
    ];
}

/// Input delivered by the host. Coordinates are client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    MouseDown { x: f64 },
    MouseMove { x: f64 },
    MouseUp,
    /// Touch events carry the first touch point.
    TouchStart { x: f64 },
    TouchMove { x: f64 },
    TouchEnd,
    Wheel { delta_y: f64 },
    Resize(ScreenSize),
}

impl InputEvent {
    pub fn kind(&self) -> ListenerKind {
        match self {
            InputEvent::MouseDown { .. } => ListenerKind::MouseDown,
            InputEvent::MouseMove { .. } => ListenerKind::MouseMove,
            InputEvent::MouseUp => ListenerKind::MouseUp,
            InputEvent::TouchStart { .. } => ListenerKind::TouchStart,
            InputEvent::TouchMove { .. } => ListenerKind::TouchMove,
            InputEvent::TouchEnd => ListenerKind::TouchEnd,
            InputEvent::Wheel { .. } => ListenerKind::Wheel,
            InputEvent::Resize(_) => ListenerKind::Resize,
        }
    }
}

/// Sensitivities used to turn gestures into scroll distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputTuning {
    pub drag_sensitivity: f64,
    pub wheel_sensitivity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Press {
    start_x: f64,
    position: f64,
}

/// Maps pointer, touch and wheel gestures onto `ScrollState::target`.
///
/// Releasing a drag leaves the target where it is; there is no fling.
#[derive(Debug, Clone)]
pub struct GestureMapper {
    tuning: InputTuning,
    press: Option<Press>,
}

impl GestureMapper {
    pub fn new(tuning: InputTuning) -> Self {
        Self { tuning, press: None }
    }

    pub fn is_dragging(&self) -> bool {
        self.press.is_some()
    }

    /// Applies a gesture event. Returns `false` for events that do not move the strip.
    pub fn apply(&mut self, event: &InputEvent, scroll: &mut ScrollState) -> bool {
        match *event {
            InputEvent::MouseDown { x } | InputEvent::TouchStart { x } => {
                self.press = Some(Press {
                    start_x: x,
                    position: scroll.current,
                });
                false
            }
            InputEvent::MouseMove { x } | InputEvent::TouchMove { x } => match self.press {
                Some(press) => {
                    let distance = (press.start_x - x) * self.tuning.drag_sensitivity;
                    scroll.target = press.position + distance;
                    true
                }
                None => false,
            },
            InputEvent::MouseUp | InputEvent::TouchEnd => {
                self.press = None;
                false
            }
            InputEvent::Wheel { delta_y } => {
                scroll.target += delta_y * self.tuning.wheel_sensitivity;
                true
            }
            InputEvent::Resize(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> GestureMapper {
        GestureMapper::new(InputTuning {
            drag_sensitivity: 2.5,
            wheel_sensitivity: 0.8,
        })
    }

    #[test]
    fn drag_left_moves_target_forward() {
        let mut mapper = mapper();
        let mut scroll = ScrollState::new(0.08);

        mapper.apply(&InputEvent::MouseDown { x: 500.0 }, &mut scroll);
        assert!(mapper.apply(&InputEvent::MouseMove { x: 400.0 }, &mut scroll));
        assert_eq!(scroll.target, 250.0);

        mapper.apply(&InputEvent::MouseUp, &mut scroll);
        assert!(!mapper.is_dragging());
        assert!(!mapper.apply(&InputEvent::MouseMove { x: 0.0 }, &mut scroll));
        assert_eq!(scroll.target, 250.0);
    }

    #[test]
    fn drag_is_relative_to_position_at_press() {
        let mut mapper = mapper();
        let mut scroll = ScrollState::new(0.08);
        scroll.current = 40.0;
        scroll.target = 90.0;

        mapper.apply(&InputEvent::TouchStart { x: 100.0 }, &mut scroll);
        mapper.apply(&InputEvent::TouchMove { x: 120.0 }, &mut scroll);
        assert_eq!(scroll.target, 40.0 - 50.0);
        mapper.apply(&InputEvent::TouchEnd, &mut scroll);
    }

    #[test]
    fn wheel_accumulates_unbounded() {
        let mut mapper = mapper();
        let mut scroll = ScrollState::new(0.08);
        for delta_y in [100.0, -50.0, 200.0] {
            mapper.apply(&InputEvent::Wheel { delta_y }, &mut scroll);
        }
        assert!((scroll.target - 200.0).abs() < 1e-9);
        assert_eq!(scroll.current, 0.0);
    }

    #[test]
    fn events_report_their_listener() {
        assert_eq!(InputEvent::Wheel { delta_y: 1.0 }.kind(), ListenerKind::Wheel);
        assert_eq!(
            InputEvent::Resize(ScreenSize::new(1.0, 1.0)).kind(),
            ListenerKind::Resize
        );
        assert_eq!(ListenerKind::ALL.len(), 8);
    }
}
