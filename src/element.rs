//! DOM-like element handles
//!
//! An `Element` is a cheap, clonable handle to a box with a layout, an
//! inline style map, children, event listeners and layout observers. The
//! host element and the transformable element of a viewport are both
//! elements, passed explicitly to the components that mutate them.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use egui::{Pos2, Rect, Vec2};

use crate::events::{Event, EventHandler, EventType};
use crate::style;

/// Unique element identifier
pub type ElementId = u64;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Box of an element relative to its offset parent
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layout {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

struct ListenerEntry {
    id: u64,
    event_type: EventType,
    handler: EventHandler,
}

struct ElementData {
    id: ElementId,
    classes: Vec<String>,
    layout: Layout,
    style: BTreeMap<String, String>,
    parent: Weak<RefCell<ElementData>>,
    children: Vec<Element>,
    listeners: Vec<ListenerEntry>,
    observers: Vec<(u64, Rc<dyn Fn()>)>,
    next_slot: u64,
}

impl ElementData {
    fn next_slot(&mut self) -> u64 {
        self.next_slot += 1;
        self.next_slot
    }
}

/// Shared handle to an element
#[derive(Clone)]
pub struct Element {
    data: Rc<RefCell<ElementData>>,
}

impl Element {
    /// Create a detached element with an empty layout.
    pub fn new() -> Self {
        Self {
            data: Rc::new(RefCell::new(ElementData {
                id: NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed),
                classes: Vec::new(),
                layout: Layout::default(),
                style: BTreeMap::new(),
                parent: Weak::new(),
                children: Vec::new(),
                listeners: Vec::new(),
                observers: Vec::new(),
                next_slot: 0,
            })),
        }
    }

    /// Builder-style class assignment.
    pub fn with_class(self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// Builder-style layout assignment; does not signal observers.
    pub fn with_layout(self, layout: Layout) -> Self {
        self.data.borrow_mut().layout = layout;
        self
    }

    pub fn id(&self) -> ElementId {
        self.data.borrow().id
    }

    pub fn add_class(&self, class: &str) {
        let mut data = self.data.borrow_mut();
        if !data.classes.iter().any(|c| c == class) {
            data.classes.push(class.to_string());
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.data.borrow().classes.iter().any(|c| c == class)
    }

    // === LAYOUT ===

    pub fn layout(&self) -> Layout {
        self.data.borrow().layout
    }

    /// Replace the layout box and signal layout observers when it changed.
    pub fn set_layout(&self, layout: Layout) {
        let changed = {
            let mut data = self.data.borrow_mut();
            let changed = data.layout != layout;
            data.layout = layout;
            changed
        };
        if changed {
            self.notify_layout_changed();
        }
    }

    pub fn offset_left(&self) -> f32 {
        self.data.borrow().layout.left
    }

    pub fn offset_top(&self) -> f32 {
        self.data.borrow().layout.top
    }

    pub fn offset_width(&self) -> f32 {
        self.data.borrow().layout.width
    }

    pub fn offset_height(&self) -> f32 {
        self.data.borrow().layout.height
    }

    pub fn size(&self) -> Vec2 {
        self.data.borrow().layout.size()
    }

    /// Bounding box in page coordinates, accumulating offsets up the parent chain.
    pub fn page_rect(&self) -> Rect {
        let layout = self.layout();
        let mut origin = Pos2::new(layout.left, layout.top);
        let mut ancestor = self.parent();
        while let Some(element) = ancestor {
            let parent_layout = element.layout();
            origin.x += parent_layout.left;
            origin.y += parent_layout.top;
            ancestor = element.parent();
        }
        Rect::from_min_size(origin, layout.size())
    }

    // === TREE ===

    pub fn parent(&self) -> Option<Element> {
        self.data.borrow().parent.upgrade().map(|data| Element { data })
    }

    pub fn children(&self) -> Vec<Element> {
        self.data.borrow().children.clone()
    }

    /// Attach `child`, detaching it from any previous parent.
    pub fn append_child(&self, child: &Element) {
        if let Some(previous) = child.parent() {
            previous.remove_child(child);
        }
        child.data.borrow_mut().parent = Rc::downgrade(&self.data);
        self.data.borrow_mut().children.push(child.clone());
        child.notify_layout_changed();
    }

    pub fn remove_child(&self, child: &Element) -> bool {
        let removed = {
            let mut data = self.data.borrow_mut();
            let before = data.children.len();
            data.children.retain(|c| c != child);
            before != data.children.len()
        };
        if removed {
            child.data.borrow_mut().parent = Weak::new();
            child.notify_layout_changed();
        }
        removed
    }

    /// First descendant (depth-first) carrying `class`.
    pub fn query_selector(&self, class: &str) -> Option<Element> {
        for child in self.children() {
            if child.has_class(class) {
                return Some(child);
            }
            if let Some(found) = child.query_selector(class) {
                return Some(found);
            }
        }
        None
    }

    // === STYLE ===

    pub fn style(&self, name: &str) -> Option<String> {
        self.data.borrow().style.get(name).cloned()
    }

    /// Write an inline style property. An empty value removes it.
    pub fn set_style(&self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let mut data = self.data.borrow_mut();
        if value.is_empty() {
            data.style.remove(name);
        } else {
            data.style.insert(name.to_string(), value);
        }
    }

    /// Read a pixel length; missing or unparsable values read as `0`.
    pub fn style_px(&self, name: &str) -> f32 {
        self.style(name).and_then(|value| style::parse_px(&value)).unwrap_or(0.0)
    }

    /// Inline style rendered as CSS declaration text.
    pub fn style_text(&self) -> String {
        self.data
            .borrow()
            .style
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    // === EVENTS ===

    /// Register `handler` for `event_type`. The listener is removed when the
    /// returned handle is removed or dropped.
    pub fn listen(&self, event_type: EventType, handler: impl Fn(&mut Event) + 'static) -> Listener {
        let mut data = self.data.borrow_mut();
        let id = data.next_slot();
        data.listeners.push(ListenerEntry {
            id,
            event_type,
            handler: Rc::new(handler),
        });
        Listener {
            element: Rc::downgrade(&self.data),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.data.borrow().listeners.len()
    }

    /// Deliver `event` to every listener of its kind, in registration order.
    ///
    /// Handlers run on a snapshot, so they may add or remove listeners and
    /// mutate any element, including this one.
    pub fn dispatch(&self, event: &mut Event) {
        let handlers: Vec<EventHandler> = self
            .data
            .borrow()
            .listeners
            .iter()
            .filter(|entry| entry.event_type == event.event_type)
            .map(|entry| entry.handler.clone())
            .collect();

        for handler in handlers {
            handler(&mut *event);
        }
    }

    // === LAYOUT OBSERVATION ===

    /// Call `callback` whenever this element or any ancestor changes layout
    /// or is re-parented.
    pub fn observe_layout(&self, callback: impl Fn() + 'static) -> LayoutObserver {
        let mut data = self.data.borrow_mut();
        let id = data.next_slot();
        let callback: Rc<dyn Fn()> = Rc::new(callback);
        data.observers.push((id, callback));
        LayoutObserver {
            element: Rc::downgrade(&self.data),
            id,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.data.borrow().observers.len()
    }

    fn notify_layout_changed(&self) {
        let mut callbacks = Vec::new();
        self.collect_observers(&mut callbacks);
        for callback in callbacks {
            callback();
        }
    }

    fn collect_observers(&self, out: &mut Vec<Rc<dyn Fn()>>) {
        let data = self.data.borrow();
        out.extend(data.observers.iter().map(|(_, callback)| callback.clone()));
        for child in &data.children {
            child.collect_observers(out);
        }
    }
}

impl Default for Element {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("Element")
            .field("id", &data.id)
            .field("classes", &data.classes)
            .field("layout", &data.layout)
            .field("style", &data.style)
            .finish()
    }
}

/// Handle to a registered event listener
pub struct Listener {
    element: Weak<RefCell<ElementData>>,
    id: u64,
}

impl Listener {
    /// Detach the listener. Safe to call more than once.
    pub fn remove(&mut self) {
        if let Some(data) = self.element.upgrade() {
            data.borrow_mut().listeners.retain(|entry| entry.id != self.id);
        }
        self.element = Weak::new();
    }

    pub fn is_active(&self) -> bool {
        match self.element.upgrade() {
            Some(data) => {
                let registered = data.borrow().listeners.iter().any(|entry| entry.id == self.id);
                registered
            }
            None => false,
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Handle to a registered layout observer
pub struct LayoutObserver {
    element: Weak<RefCell<ElementData>>,
    id: u64,
}

impl LayoutObserver {
    /// Stop observing. Safe to call more than once.
    pub fn disconnect(&mut self) {
        if let Some(data) = self.element.upgrade() {
            data.borrow_mut().observers.retain(|(id, _)| *id != self.id);
        }
        self.element = Weak::new();
    }
}

impl Drop for LayoutObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// A group of listeners released together
#[derive(Default)]
pub struct Subscriptions {
    listeners: Vec<Listener>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn extend(&mut self, other: Subscriptions) {
        let mut other = other;
        self.listeners.append(&mut other.listeners);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Detach every listener in the group.
    pub fn release_all(&mut self) {
        for mut listener in self.listeners.drain(..) {
            listener.remove();
        }
    }
}
