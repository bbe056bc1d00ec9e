//! Pointer gesture normalization
//!
//! Mouse and touch input arrive on separate channels with different event
//! shapes. Each channel has an adapter that classifies its events into one
//! gesture vocabulary (down, move, up, leave) and extracts a page position,
//! so drag tracking never needs to know where the input came from.

use std::rc::Rc;

use egui::Pos2;

use crate::element::{Element, Subscriptions};
use crate::events::{Event, EventType};

/// Normalized phase of a pointer gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Down,
    Move,
    Up,
    Leave,
}

/// A classified pointer event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    pub kind: GestureKind,
    /// Page coordinates of the pointer
    pub position: Pos2,
}

/// Receives normalized gestures together with the raw event
pub type GestureHandler = Rc<dyn Fn(&Gesture, &mut Event)>;

/// Page position of the pointer for an event.
///
/// Touch events use the first active touch, falling back to the first
/// changed touch (a `touchend` has no active touches left). Mouse events use
/// their own page coordinates. Anything else yields `(0, 0)`.
pub fn pointer_event_to_xy(event: &Event) -> Pos2 {
    if event.event_type.is_touch() {
        event
            .touches
            .first()
            .or_else(|| event.changed_touches.first())
            .map(|touch| touch.page)
            .unwrap_or(Pos2::ZERO)
    } else if event.event_type.is_mouse() {
        event.page
    } else {
        Pos2::ZERO
    }
}

/// One input channel that can produce pointer gestures
pub trait GestureSource {
    /// Channel name, used in logs
    fn name(&self) -> &'static str;

    /// Event kinds this channel listens to
    fn event_types(&self) -> Vec<EventType>;

    /// Gesture phase for an event kind of this channel
    fn classify(&self, event_type: &EventType) -> Option<GestureKind>;

    /// Listen on `target` and forward classified gestures to `handler`.
    fn bind(&self, target: &Element, handler: GestureHandler) -> Subscriptions {
        let mut subscriptions = Subscriptions::new();
        for event_type in self.event_types() {
            let Some(kind) = self.classify(&event_type) else {
                continue;
            };
            let handler = handler.clone();
            subscriptions.push(target.listen(event_type, move |event| {
                let gesture = Gesture {
                    kind,
                    position: pointer_event_to_xy(event),
                };
                handler(&gesture, event);
            }));
        }
        log::trace!("Bound {} {} listeners", subscriptions.len(), self.name());
        subscriptions
    }
}

/// Mouse button and movement events
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseGestures;

impl GestureSource for MouseGestures {
    fn name(&self) -> &'static str {
        "mouse"
    }

    fn event_types(&self) -> Vec<EventType> {
        vec![
            EventType::MouseDown,
            EventType::MouseMove,
            EventType::MouseUp,
            EventType::MouseLeave,
        ]
    }

    fn classify(&self, event_type: &EventType) -> Option<GestureKind> {
        match event_type {
            EventType::MouseDown => Some(GestureKind::Down),
            EventType::MouseMove => Some(GestureKind::Move),
            EventType::MouseUp => Some(GestureKind::Up),
            EventType::MouseLeave => Some(GestureKind::Leave),
            _ => None,
        }
    }
}

/// Single-finger touch events
#[derive(Debug, Clone, Copy, Default)]
pub struct TouchGestures;

impl GestureSource for TouchGestures {
    fn name(&self) -> &'static str {
        "touch"
    }

    fn event_types(&self) -> Vec<EventType> {
        vec![
            EventType::TouchStart,
            EventType::TouchMove,
            EventType::TouchEnd,
            EventType::TouchCancel,
        ]
    }

    fn classify(&self, event_type: &EventType) -> Option<GestureKind> {
        match event_type {
            EventType::TouchStart => Some(GestureKind::Down),
            EventType::TouchMove => Some(GestureKind::Move),
            EventType::TouchEnd | EventType::TouchCancel => Some(GestureKind::Up),
            _ => None,
        }
    }
}

/// Bind every standard channel on `target`.
pub fn bind_pointer_sources(target: &Element, handler: GestureHandler) -> Subscriptions {
    let sources: [&dyn GestureSource; 2] = [&MouseGestures, &TouchGestures];
    let mut subscriptions = Subscriptions::new();
    for source in sources {
        subscriptions.extend(source.bind(target, handler.clone()));
    }
    subscriptions
}
