//! Pan and zoom, coordinated
//!
//! `ZoomPan` owns one `Pan` and one `Zoom` bound to the same host/target
//! pair. Scale changes go through it so that a content point stays put on
//! screen: the point under the pointer for wheel input, the viewport center
//! for discrete zoom actions.
//!
//! Coordinates come in three flavours:
//! - page: where input events happen
//! - view: page minus the host's page offset
//! - content: untransformed coordinates of the target, `(view - offset) / scale`

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use egui::{Pos2, Vec2};

use crate::config::ZoomPanConfig;
use crate::element::{Element, Listener};
use crate::error::{Result, ZoomPanError};
use crate::events::{Event, EventType};
use crate::notify::Notifier;
use crate::pan::{MoveOptions, Offset, Pan};
use crate::scheduler::{Scheduler, Throttle};
use crate::zoom::{Zoom, ZoomChange};

/// Options for centering on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CenterOptions {
    /// Center along x; when false the current x center is kept
    pub horizontal: bool,
    /// Center along y; when false the current y center is kept
    pub vertical: bool,
    pub slide: bool,
}

impl Default for CenterOptions {
    fn default() -> Self {
        Self {
            horizontal: true,
            vertical: true,
            slide: false,
        }
    }
}

impl CenterOptions {
    pub fn with_slide(mut self) -> Self {
        self.slide = true;
        self
    }

    pub fn horizontal_only(mut self) -> Self {
        self.vertical = false;
        self
    }

    pub fn vertical_only(mut self) -> Self {
        self.horizontal = false;
        self
    }
}

/// Unit zoom step for a wheel event: scrolling down zooms out.
pub fn wheel_step(event: &Event) -> f32 {
    let Some(wheel) = event.wheel else {
        return 0.0;
    };
    let delta = if wheel.delta_y != 0.0 { wheel.delta_y } else { wheel.detail };
    if delta > 0.0 {
        -1.0
    } else if delta < 0.0 {
        1.0
    } else {
        0.0
    }
}

struct ZoomPanCore {
    host: Element,
    target: Element,
    config: ZoomPanConfig,
    scheduler: Scheduler,
    pan: Pan,
    zoom: Zoom,
    throttle: RefCell<Throttle>,
    wheel_listener: RefCell<Option<Listener>>,
    destroyed: Cell<bool>,
}

/// Pan/zoom viewport over a host element and its transformable child
pub struct ZoomPan {
    core: Rc<ZoomPanCore>,
}

impl ZoomPan {
    /// Bind to `host` and `target`. The config is validated first; the
    /// initial scale and position are applied immediately.
    pub fn new(host: &Element, target: &Element, config: ZoomPanConfig, scheduler: &Scheduler) -> Result<Self> {
        config.validate()?;

        let pan = Pan::new(host, target, scheduler, config.slide_duration());
        let zoom = Zoom::new(host, target, &config, scheduler);

        let core = Rc::new(ZoomPanCore {
            host: host.clone(),
            target: target.clone(),
            throttle: RefCell::new(Throttle::new(config.wheel_throttle())),
            config,
            scheduler: scheduler.clone(),
            pan,
            zoom,
            wheel_listener: RefCell::new(None),
            destroyed: Cell::new(false),
        });

        let weak = Rc::downgrade(&core);
        let listener = host.listen(EventType::Wheel, move |event| {
            if let Some(core) = weak.upgrade() {
                ZoomPan { core }.wheel(event);
            }
        });
        *core.wheel_listener.borrow_mut() = Some(listener);

        let zoom_pan = ZoomPan { core };
        let (left, top) = (zoom_pan.core.config.left, zoom_pan.core.config.top);
        if left != 0.0 || top != 0.0 {
            zoom_pan.move_to(left, top, MoveOptions::default())?;
        }

        log::debug!(
            "ZoomPan bound on element {} (scale {}, offset {:?})",
            host.id(),
            zoom_pan.scale(),
            zoom_pan.offset()
        );
        Ok(zoom_pan)
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.core.destroyed.get() {
            log::warn!("ZoomPan used after destroy");
            return Err(ZoomPanError::destroyed("ZoomPan"));
        }
        Ok(())
    }

    // === STATE ===

    pub fn scale(&self) -> f32 {
        self.core.zoom.scale()
    }

    pub fn left(&self) -> f32 {
        self.core.pan.left()
    }

    pub fn top(&self) -> f32 {
        self.core.pan.top()
    }

    pub fn offset(&self) -> Offset {
        self.core.pan.offset()
    }

    pub fn config(&self) -> &ZoomPanConfig {
        &self.core.config
    }

    pub fn host(&self) -> &Element {
        &self.core.host
    }

    pub fn target(&self) -> &Element {
        &self.core.target
    }

    pub fn pan_component(&self) -> &Pan {
        &self.core.pan
    }

    pub fn zoom_component(&self) -> &Zoom {
        &self.core.zoom
    }

    /// Size of the host's `.zoomable` content, if present.
    pub fn content_size(&self) -> Option<Vec2> {
        self.core.pan.zoomable_size()
    }

    /// Move notifications, one per effective offset change.
    pub fn moved(&self) -> &Notifier<Offset> {
        self.core.pan.moved()
    }

    /// Zoom notifications, one per effective scale change.
    pub fn zoomed(&self) -> &Notifier<ZoomChange> {
        self.core.zoom.zoomed()
    }

    pub fn is_disabled(&self) -> bool {
        self.core.zoom.is_disabled() && self.core.pan.is_disabled()
    }

    pub fn is_destroyed(&self) -> bool {
        self.core.destroyed.get()
    }

    // === LIFECYCLE ===

    /// Back to the default scale at the origin.
    pub fn reset(&self) -> Result<()> {
        self.ensure_alive()?;
        self.core.zoom.reset()?;
        self.core.pan.reset()?;
        Ok(())
    }

    /// Accept pointer and wheel input again.
    pub fn enable(&self) -> Result<()> {
        self.ensure_alive()?;
        self.core.pan.set_disabled(false);
        self.core.zoom.set_disabled(false);
        Ok(())
    }

    /// Ignore pointer and wheel input. Explicit calls keep working.
    pub fn disable(&self) -> Result<()> {
        self.ensure_alive()?;
        self.core.pan.set_disabled(true);
        self.core.zoom.set_disabled(true);
        Ok(())
    }

    /// Detach every listener, observer and timer, then complete both
    /// notification streams. Calling it again does nothing.
    pub fn destroy(&self) {
        if self.core.destroyed.replace(true) {
            return;
        }

        if let Some(mut listener) = self.core.wheel_listener.borrow_mut().take() {
            listener.remove();
        }
        self.core.pan.destroy();
        self.core.zoom.destroy();
        self.core.pan.moved().complete();
        self.core.zoom.zoomed().complete();
        log::debug!("ZoomPan on element {} destroyed", self.core.host.id());
    }

    // === SCALE ===

    /// Set the scale without re-centering.
    pub fn set_scale(&self, scale: f32) -> Result<bool> {
        self.ensure_alive()?;
        self.core.zoom.set_scale(scale)
    }

    /// Zoom to `scale`, keeping the viewport center fixed.
    pub fn zoom(&self, scale: f32) -> Result<bool> {
        self.ensure_alive()?;
        let center = self.get_center();
        let changed = self.core.zoom.set_scale(scale)?;
        self.move_center(center.x, center.y, MoveOptions::default())?;
        Ok(changed)
    }

    /// One step in around the viewport center.
    pub fn zoom_in(&self) -> Result<bool> {
        self.ensure_alive()?;
        let center = self.get_center();
        let changed = self.core.zoom.zoom_in()?;
        self.move_center(center.x, center.y, MoveOptions::default())?;
        Ok(changed)
    }

    /// One step out around the viewport center.
    pub fn zoom_out(&self) -> Result<bool> {
        self.ensure_alive()?;
        let center = self.get_center();
        let changed = self.core.zoom.zoom_out()?;
        self.move_center(center.x, center.y, MoveOptions::default())?;
        Ok(changed)
    }

    // === POSITION ===

    /// Place the target's top-left corner at `(left, top)` view pixels.
    pub fn move_to(&self, left: f32, top: f32, options: MoveOptions) -> Result<bool> {
        self.ensure_alive()?;
        self.core.pan.move_to(left, top, options)
    }

    /// Move to a position given in content pixels at the current scale.
    pub fn move_scaled(&self, left: f32, top: f32) -> Result<bool> {
        let scale = self.scale();
        self.move_to(left * scale, top * scale, MoveOptions::default())
    }

    /// Content point currently shown at the middle of the viewport.
    pub fn get_center(&self) -> Pos2 {
        let scale = self.scale();
        let view = Vec2::new(self.core.pan.width(), self.core.pan.height());
        let offset = self.offset();
        Pos2::new(
            -offset.left / scale + view.x / 2.0 / scale,
            -offset.top / scale + view.y / 2.0 / scale,
        )
    }

    /// Bring content point `(x, y)` to the middle of the viewport.
    pub fn move_center(&self, x: f32, y: f32, options: MoveOptions) -> Result<bool> {
        self.ensure_alive()?;
        let scale = self.scale();
        let half_view = Vec2::new(self.core.pan.width(), self.core.pan.height()) / 2.0 / scale;
        let left = -(x - half_view.x) * scale;
        let top = -(y - half_view.y) * scale;
        self.core.pan.move_to(left, top, options)
    }

    /// Center of `element` in content coordinates (its layout box within the target).
    pub fn get_element_center(&self, element: &Element) -> Pos2 {
        Pos2::new(
            element.offset_left() + element.offset_width() / 2.0,
            element.offset_top() + element.offset_height() / 2.0,
        )
    }

    /// Scroll so `element` sits in the middle of the viewport.
    pub fn center_on_element(&self, element: &Element, options: CenterOptions) -> Result<bool> {
        self.ensure_alive()?;
        let current = self.get_center();
        let wanted = self.get_element_center(element);
        let x = if options.horizontal { wanted.x } else { current.x };
        let y = if options.vertical { wanted.y } else { current.y };
        self.move_center(x, y, MoveOptions { slide: options.slide })
    }

    /// Place `content` under `view` at the current scale.
    pub fn align_position(&self, content: Pos2, view: Pos2) -> Result<bool> {
        self.ensure_alive()?;
        let scale = self.scale();
        let left = -(content.x - view.x / scale) * scale;
        let top = -(content.y - view.y / scale) * scale;
        self.core.pan.move_to(left, top, MoveOptions::default())
    }

    // === INPUT ===

    /// Handle a wheel event: one zoom step around the pointer.
    pub fn wheel(&self, event: &mut Event) {
        if self.core.destroyed.get() || self.core.zoom.is_disabled() {
            return;
        }
        event.prevent_default();

        let step = wheel_step(event);
        if step == 0.0 {
            return;
        }

        let now = self.core.scheduler.now();
        if !self.core.throttle.borrow_mut().admit(now) {
            log::trace!("Wheel event throttled at {:?}", now);
            return;
        }

        let scale = self.scale();
        let view = (event.page - self.core.zoom.offset()).to_pos2();
        let offset = self.offset();
        let content = Pos2::new(
            -offset.left / scale + view.x / scale,
            -offset.top / scale + view.y / scale,
        );

        let result = self
            .core
            .zoom
            .adjust_zoom(step)
            .and_then(|_| self.align_position(content, view));
        if let Err(err) = result {
            log::warn!("Wheel zoom failed: {}", err);
        }
    }
}
