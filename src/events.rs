//! Input events delivered to a host element
//!
//! Events mirror what a browser hands to a listener: a named kind, page
//! coordinates, touch lists and wheel deltas. Kinds the viewport does not
//! know are kept as `EventType::Other` rather than rejected.

use egui::Pos2;
use std::rc::Rc;

/// Kind of an input event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    MouseDown,
    MouseUp,
    MouseMove,
    MouseOver,
    MouseOut,
    MouseEnter,
    MouseLeave,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    Wheel,
    /// Any event name outside the set above
    Other(String),
}

impl EventType {
    /// Map a DOM event name onto a kind.
    pub fn from_name(name: &str) -> Self {
        match name {
            "mousedown" => EventType::MouseDown,
            "mouseup" => EventType::MouseUp,
            "mousemove" => EventType::MouseMove,
            "mouseover" => EventType::MouseOver,
            "mouseout" => EventType::MouseOut,
            "mouseenter" => EventType::MouseEnter,
            "mouseleave" => EventType::MouseLeave,
            "touchstart" => EventType::TouchStart,
            "touchmove" => EventType::TouchMove,
            "touchend" => EventType::TouchEnd,
            "touchcancel" => EventType::TouchCancel,
            "wheel" => EventType::Wheel,
            other => EventType::Other(other.to_string()),
        }
    }

    /// The DOM event name.
    pub fn name(&self) -> &str {
        match self {
            EventType::MouseDown => "mousedown",
            EventType::MouseUp => "mouseup",
            EventType::MouseMove => "mousemove",
            EventType::MouseOver => "mouseover",
            EventType::MouseOut => "mouseout",
            EventType::MouseEnter => "mouseenter",
            EventType::MouseLeave => "mouseleave",
            EventType::TouchStart => "touchstart",
            EventType::TouchMove => "touchmove",
            EventType::TouchEnd => "touchend",
            EventType::TouchCancel => "touchcancel",
            EventType::Wheel => "wheel",
            EventType::Other(name) => name,
        }
    }

    pub fn is_touch(&self) -> bool {
        matches!(
            self,
            EventType::TouchStart | EventType::TouchMove | EventType::TouchEnd | EventType::TouchCancel
        )
    }

    pub fn is_mouse(&self) -> bool {
        matches!(
            self,
            EventType::MouseDown
                | EventType::MouseUp
                | EventType::MouseMove
                | EventType::MouseOver
                | EventType::MouseOut
                | EventType::MouseEnter
                | EventType::MouseLeave
        )
    }
}

/// A single touch point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub identifier: u32,
    pub page: Pos2,
}

impl Touch {
    pub fn new(identifier: u32, x: f32, y: f32) -> Self {
        Self {
            identifier,
            page: Pos2::new(x, y),
        }
    }
}

/// Wheel payload; `detail` is the legacy line-based delta
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelDelta {
    pub delta_y: f32,
    pub detail: f32,
}

/// An input event as seen by listeners
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: EventType,
    /// Page coordinates carried by mouse and wheel events
    pub page: Pos2,
    pub touches: Vec<Touch>,
    pub changed_touches: Vec<Touch>,
    pub wheel: Option<WheelDelta>,
    default_prevented: bool,
}

impl Event {
    /// A mouse event at page position `(x, y)`.
    pub fn mouse(event_type: EventType, x: f32, y: f32) -> Self {
        Self {
            event_type,
            page: Pos2::new(x, y),
            touches: Vec::new(),
            changed_touches: Vec::new(),
            wheel: None,
            default_prevented: false,
        }
    }

    /// A touch event with its active and changed touch lists.
    pub fn touch(event_type: EventType, touches: Vec<Touch>, changed_touches: Vec<Touch>) -> Self {
        Self {
            event_type,
            page: Pos2::ZERO,
            touches,
            changed_touches,
            wheel: None,
            default_prevented: false,
        }
    }

    /// A wheel event at page position `(x, y)`.
    pub fn wheel(x: f32, y: f32, delta_y: f32) -> Self {
        Self {
            event_type: EventType::Wheel,
            page: Pos2::new(x, y),
            touches: Vec::new(),
            changed_touches: Vec::new(),
            wheel: Some(WheelDelta { delta_y, detail: 0.0 }),
            default_prevented: false,
        }
    }

    /// A wheel event that only carries the legacy `detail` delta.
    pub fn wheel_detail(x: f32, y: f32, detail: f32) -> Self {
        let mut event = Self::wheel(x, y, 0.0);
        event.wheel = Some(WheelDelta { delta_y: 0.0, detail });
        event
    }

    /// Suppress the host's native handling (scrolling, text selection).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Callback registered on an element for one event kind
pub type EventHandler = Rc<dyn Fn(&mut Event)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_round_trip() {
        for name in ["mousedown", "mouseleave", "touchstart", "touchcancel", "wheel"] {
            assert_eq!(EventType::from_name(name).name(), name);
        }

        let unknown = EventType::from_name("pointerdown");
        assert_eq!(unknown, EventType::Other("pointerdown".to_string()));
        assert_eq!(unknown.name(), "pointerdown");
        assert!(!unknown.is_mouse());
        assert!(!unknown.is_touch());
    }

    #[test]
    fn test_classification() {
        assert!(EventType::MouseOver.is_mouse());
        assert!(EventType::TouchEnd.is_touch());
        assert!(!EventType::Wheel.is_mouse());
        assert!(!EventType::Wheel.is_touch());
    }

    #[test]
    fn test_prevent_default() {
        let mut event = Event::mouse(EventType::MouseMove, 1.0, 2.0);
        assert!(!event.default_prevented());
        event.prevent_default();
        assert!(event.default_prevented());
    }
}
