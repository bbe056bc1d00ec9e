//! Drag-to-pan handling
//!
//! Pan turns pointer drags on the host element into `left`/`top` offsets on
//! the transformable element and reports every effective change.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

use crate::element::{Element, Subscriptions};
use crate::error::{Result, ZoomPanError};
use crate::events::Event;
use crate::notify::Notifier;
use crate::pointer::{bind_pointer_sources, pointer_event_to_xy, Gesture, GestureHandler, GestureKind};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::style;

/// Class marking the content element whose intrinsic size is reported
pub const ZOOMABLE_CLASS: &str = "zoomable";

/// Translation of the transformable element, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub left: f32,
    pub top: f32,
}

impl Offset {
    pub fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }
}

/// Options for a programmatic move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveOptions {
    /// Animate the jump with a short transition
    pub slide: bool,
}

impl MoveOptions {
    pub fn slide() -> Self {
        Self { slide: true }
    }
}

/// Where a drag started
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    pointer_origin: Pos2,
    element_origin: Offset,
}

#[derive(Debug, Default)]
struct PanState {
    disabled: bool,
    destroyed: bool,
    drag: Option<DragState>,
    slide_timer: Option<TimerHandle>,
}

struct PanCore {
    host: Element,
    target: Element,
    scheduler: Scheduler,
    slide_duration: Duration,
    state: RefCell<PanState>,
    moved: Notifier<Offset>,
    subscriptions: RefCell<Subscriptions>,
}

/// Pointer-drag panning bound to a host/target element pair
pub struct Pan {
    core: Rc<PanCore>,
}

impl Pan {
    /// Bind drag handling on `host`, moving `target`.
    pub fn new(host: &Element, target: &Element, scheduler: &Scheduler, slide_duration: Duration) -> Self {
        let core = Rc::new(PanCore {
            host: host.clone(),
            target: target.clone(),
            scheduler: scheduler.clone(),
            slide_duration,
            state: RefCell::new(PanState::default()),
            moved: Notifier::new(),
            subscriptions: RefCell::new(Subscriptions::new()),
        });

        let weak: Weak<PanCore> = Rc::downgrade(&core);
        let handler: GestureHandler = Rc::new(move |gesture: &Gesture, event: &mut Event| {
            if let Some(core) = weak.upgrade() {
                Pan { core }.handle_gesture(gesture, event);
            }
        });
        *core.subscriptions.borrow_mut() = bind_pointer_sources(host, handler);

        log::debug!("Pan bound on element {} moving element {}", host.id(), target.id());
        Pan { core }
    }

    fn handle_gesture(&self, gesture: &Gesture, event: &mut Event) {
        match gesture.kind {
            GestureKind::Down => self.drag_start(event),
            GestureKind::Move => self.drag(event),
            GestureKind::Up | GestureKind::Leave => self.drag_end(),
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.core.state.borrow().destroyed {
            log::warn!("Pan used after destroy");
            return Err(ZoomPanError::destroyed("Pan"));
        }
        Ok(())
    }

    // === GESTURES ===

    /// Begin a drag at the event's pointer position. Ignored while disabled.
    pub fn drag_start(&self, event: &Event) {
        let element_origin = self.offset();
        let mut state = self.core.state.borrow_mut();
        if state.disabled || state.destroyed {
            return;
        }
        state.drag = Some(DragState {
            pointer_origin: pointer_event_to_xy(event),
            element_origin,
        });
    }

    /// Follow the pointer while a drag is active.
    pub fn drag(&self, event: &mut Event) {
        let Some(drag) = self.core.state.borrow().drag else {
            return;
        };

        event.prevent_default();

        let position = pointer_event_to_xy(event);
        let delta: Vec2 = position - drag.pointer_origin;
        if let Err(err) = self.move_to(
            drag.element_origin.left + delta.x,
            drag.element_origin.top + delta.y,
            MoveOptions::default(),
        ) {
            log::warn!("Drag move failed: {}", err);
        }
    }

    /// End the drag. Runs even while disabled so a gesture can't get stuck.
    pub fn drag_end(&self) {
        self.core.state.borrow_mut().drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.core.state.borrow().drag.is_some()
    }

    // === MOVEMENT ===

    /// Place the target's top-left corner at `(left, top)`.
    ///
    /// Only axes that change are written. A move notification is emitted
    /// when either axis changed; the return value says whether it did.
    pub fn move_to(&self, left: f32, top: f32, options: MoveOptions) -> Result<bool> {
        self.ensure_alive()?;

        if !left.is_finite() || !top.is_finite() {
            log::warn!("Ignoring move to non-finite offset ({}, {})", left, top);
            return Ok(false);
        }

        if options.slide {
            self.enable_slide();
        }

        let current = self.offset();
        let mut changed = false;
        if current.left != left {
            self.core.target.set_style(style::LEFT, style::format_px(left));
            changed = true;
        }
        if current.top != top {
            self.core.target.set_style(style::TOP, style::format_px(top));
            changed = true;
        }

        if options.slide {
            self.schedule_slide_end();
        }

        if changed {
            log::trace!("Moved to ({:.1}, {:.1})", left, top);
            self.core.moved.emit(&Offset { left, top });
        }
        Ok(changed)
    }

    /// Put the target back at the origin. Writes the style directly without
    /// a move notification.
    pub fn reset(&self) -> Result<()> {
        self.ensure_alive()?;
        self.core.state.borrow_mut().drag = None;
        self.core.target.set_style(style::TOP, style::format_px(0.0));
        self.core.target.set_style(style::LEFT, style::format_px(0.0));
        Ok(())
    }

    /// Turn on the offset transition used by sliding moves.
    pub fn enable_slide(&self) {
        if self.is_destroyed() {
            return;
        }
        self.core
            .target
            .set_style(style::TRANSITION, style::slide_transition(self.core.slide_duration));
    }

    pub fn disable_slide(&self) {
        if self.is_destroyed() {
            return;
        }
        self.core.target.set_style(style::TRANSITION, "");
    }

    fn schedule_slide_end(&self) {
        if let Some(previous) = self.core.state.borrow_mut().slide_timer.take() {
            self.core.scheduler.clear_timeout(previous);
        }

        let weak = Rc::downgrade(&self.core);
        let handle = self.core.scheduler.set_timeout(self.core.slide_duration, move || {
            if let Some(core) = weak.upgrade() {
                core.state.borrow_mut().slide_timer = None;
                core.target.set_style(style::TRANSITION, "");
            }
        });
        self.core.state.borrow_mut().slide_timer = Some(handle);
    }

    // === ACCESSORS ===

    /// Current left offset; unset or unparsable styles read as 0.
    pub fn left(&self) -> f32 {
        self.core.target.style_px(style::LEFT)
    }

    /// Current top offset; unset or unparsable styles read as 0.
    pub fn top(&self) -> f32 {
        self.core.target.style_px(style::TOP)
    }

    pub fn offset(&self) -> Offset {
        Offset::new(self.left(), self.top())
    }

    /// Host (viewport) width
    pub fn width(&self) -> f32 {
        self.core.host.offset_width()
    }

    /// Host (viewport) height
    pub fn height(&self) -> f32 {
        self.core.host.offset_height()
    }

    /// Size of the host's `.zoomable` content element, if there is one.
    pub fn zoomable_size(&self) -> Option<Vec2> {
        self.core.host.query_selector(ZOOMABLE_CLASS).map(|el| el.size())
    }

    pub fn host(&self) -> &Element {
        &self.core.host
    }

    pub fn target(&self) -> &Element {
        &self.core.target
    }

    pub fn moved(&self) -> &Notifier<Offset> {
        &self.core.moved
    }

    pub fn is_disabled(&self) -> bool {
        self.core.state.borrow().disabled
    }

    /// Ignore (or accept again) pointer input. The API keeps working.
    pub fn set_disabled(&self, disabled: bool) {
        self.core.state.borrow_mut().disabled = disabled;
    }

    pub fn is_destroyed(&self) -> bool {
        self.core.state.borrow().destroyed
    }

    /// Detach every input listener and cancel the pending slide timer.
    /// Further calls are no-ops.
    pub fn destroy(&self) {
        let slide_timer = {
            let mut state = self.core.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.drag = None;
            state.slide_timer.take()
        };

        if let Some(handle) = slide_timer {
            self.core.scheduler.clear_timeout(handle);
        }
        self.core.subscriptions.borrow_mut().release_all();
        log::debug!("Pan on element {} destroyed", self.core.host.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Layout;
    use crate::events::{EventType, Touch};
    use std::cell::RefCell;

    fn fixture() -> (Element, Element, Scheduler, Pan) {
        let host = Element::new().with_layout(Layout::new(0.0, 0.0, 800.0, 600.0));
        let target = Element::new().with_class(ZOOMABLE_CLASS).with_layout(Layout::new(0.0, 0.0, 2000.0, 1500.0));
        host.append_child(&target);
        let scheduler = Scheduler::new();
        let pan = Pan::new(&host, &target, &scheduler, Duration::from_millis(250));
        (host, target, scheduler, pan)
    }

    fn record_moves(pan: &Pan) -> (Rc<RefCell<Vec<Offset>>>, crate::notify::Subscription) {
        let moves = Rc::new(RefCell::new(Vec::new()));
        let log = moves.clone();
        let subscription = pan.moved().subscribe(move |offset| log.borrow_mut().push(*offset));
        (moves, subscription)
    }

    #[test]
    fn test_drag_composition() {
        let (host, _target, _scheduler, pan) = fixture();

        host.dispatch(&mut Event::mouse(EventType::MouseDown, 100.0, 100.0));
        let mut drag = Event::mouse(EventType::MouseMove, 150.0, 130.0);
        host.dispatch(&mut drag);

        assert_eq!(pan.offset(), Offset::new(50.0, 30.0));
        assert!(drag.default_prevented());
    }

    #[test]
    fn test_drag_continues_from_existing_offset() {
        let (host, _target, _scheduler, pan) = fixture();
        pan.move_to(-40.0, 25.0, MoveOptions::default()).unwrap();

        host.dispatch(&mut Event::touch(EventType::TouchStart, vec![Touch::new(0, 10.0, 10.0)], vec![]));
        host.dispatch(&mut Event::touch(EventType::TouchMove, vec![Touch::new(0, 0.0, 30.0)], vec![]));
        host.dispatch(&mut Event::touch(EventType::TouchEnd, vec![], vec![Touch::new(0, 0.0, 30.0)]));

        assert_eq!(pan.offset(), Offset::new(-50.0, 45.0));
        assert!(!pan.is_dragging());
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let (host, _target, _scheduler, pan) = fixture();
        let mut event = Event::mouse(EventType::MouseMove, 150.0, 130.0);
        host.dispatch(&mut event);

        assert_eq!(pan.offset(), Offset::default());
        assert!(!event.default_prevented());
    }

    #[test]
    fn test_mouse_leave_ends_drag() {
        let (host, _target, _scheduler, pan) = fixture();
        host.dispatch(&mut Event::mouse(EventType::MouseDown, 0.0, 0.0));
        host.dispatch(&mut Event::mouse(EventType::MouseLeave, 0.0, 0.0));
        host.dispatch(&mut Event::mouse(EventType::MouseMove, 10.0, 10.0));

        assert_eq!(pan.offset(), Offset::default());
    }

    #[test]
    fn test_move_notifies_only_on_change() {
        let (_host, target, _scheduler, pan) = fixture();
        let (moves, _subscription) = record_moves(&pan);

        assert!(pan.move_to(10.0, 20.0, MoveOptions::default()).unwrap());
        assert!(!pan.move_to(10.0, 20.0, MoveOptions::default()).unwrap());
        assert!(pan.move_to(10.0, 25.0, MoveOptions::default()).unwrap());
        assert!(pan.move_to(15.0, 25.0, MoveOptions::default()).unwrap());

        assert_eq!(
            *moves.borrow(),
            vec![Offset::new(10.0, 20.0), Offset::new(10.0, 25.0), Offset::new(15.0, 25.0)]
        );
        assert_eq!(target.style("left").as_deref(), Some("15px"));
        assert_eq!(target.style("top").as_deref(), Some("25px"));
    }

    #[test]
    fn test_move_to_origin_from_unset_style_is_no_change() {
        let (_host, target, _scheduler, pan) = fixture();
        let (moves, _subscription) = record_moves(&pan);

        assert!(!pan.move_to(0.0, 0.0, MoveOptions::default()).unwrap());
        assert!(moves.borrow().is_empty());
        assert_eq!(target.style("left"), None);
    }

    #[test]
    fn test_slide_transition_is_temporary() {
        let (_host, target, scheduler, pan) = fixture();

        pan.move_to(100.0, 100.0, MoveOptions::slide()).unwrap();
        assert_eq!(
            target.style("transition").as_deref(),
            Some("top 0.25s ease, left 0.25s ease")
        );

        scheduler.advance(Duration::from_millis(249));
        assert!(target.style("transition").is_some());

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(target.style("transition"), None);
    }

    #[test]
    fn test_disabled_ignores_drag_but_not_api() {
        let (host, _target, _scheduler, pan) = fixture();
        pan.set_disabled(true);

        host.dispatch(&mut Event::mouse(EventType::MouseDown, 0.0, 0.0));
        host.dispatch(&mut Event::mouse(EventType::MouseMove, 30.0, 30.0));
        assert_eq!(pan.offset(), Offset::default());

        assert!(pan.move_to(5.0, 5.0, MoveOptions::default()).unwrap());
        pan.reset().unwrap();
        assert_eq!(pan.offset(), Offset::default());
    }

    #[test]
    fn test_disable_during_drag_still_ends_it() {
        let (host, _target, _scheduler, pan) = fixture();
        host.dispatch(&mut Event::mouse(EventType::MouseDown, 0.0, 0.0));
        pan.set_disabled(true);
        host.dispatch(&mut Event::mouse(EventType::MouseUp, 0.0, 0.0));
        assert!(!pan.is_dragging());
    }

    #[test]
    fn test_reset_does_not_notify() {
        let (_host, target, _scheduler, pan) = fixture();
        pan.move_to(30.0, 40.0, MoveOptions::default()).unwrap();
        let (moves, _subscription) = record_moves(&pan);

        pan.reset().unwrap();
        assert!(moves.borrow().is_empty());
        assert_eq!(target.style("left").as_deref(), Some("0px"));
        assert_eq!(target.style("top").as_deref(), Some("0px"));
    }

    #[test]
    fn test_accessors() {
        let (_host, _target, _scheduler, pan) = fixture();
        assert_eq!(pan.width(), 800.0);
        assert_eq!(pan.height(), 600.0);
        assert_eq!(pan.zoomable_size(), Some(Vec2::new(2000.0, 1500.0)));
    }

    #[test]
    fn test_destroy_detaches_everything() {
        let (host, target, scheduler, pan) = fixture();
        pan.move_to(1.0, 1.0, MoveOptions::slide()).unwrap();
        let (moves, _subscription) = record_moves(&pan);

        pan.destroy();
        pan.destroy();
        assert!(pan.is_destroyed());
        assert_eq!(host.listener_count(), 0);
        assert!(!scheduler.has_pending());

        host.dispatch(&mut Event::mouse(EventType::MouseDown, 0.0, 0.0));
        host.dispatch(&mut Event::mouse(EventType::MouseMove, 50.0, 50.0));
        // A stale handler invoked directly is a no-op as well
        pan.drag_start(&Event::mouse(EventType::MouseDown, 0.0, 0.0));
        pan.drag(&mut Event::mouse(EventType::MouseMove, 80.0, 80.0));

        assert!(moves.borrow().is_empty());
        assert_eq!(target.style_px("left"), 1.0);
        assert!(matches!(
            pan.move_to(2.0, 2.0, MoveOptions::default()),
            Err(ZoomPanError::Destroyed { .. })
        ));
        assert!(pan.reset().is_err());
    }
}
