//! Scale handling
//!
//! Zoom owns the uniform scale of the transformable element. Every request
//! is clamped to the configured bounds before it touches state or style,
//! and each effective change is reported. Zoom also tracks where the host
//! sits on the page so wheel positions can be turned into content
//! coordinates.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use egui::Pos2;
use serde::{Deserialize, Serialize};

use crate::config::{ZoomPanConfig, ZoomStep};
use crate::element::{Element, LayoutObserver};
use crate::error::{Result, ZoomPanError};
use crate::notify::Notifier;
use crate::scheduler::{Debouncer, Scheduler};
use crate::style;

/// Direction of a scale change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Payload of a zoom notification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomChange {
    pub scale: f32,
    pub previous: f32,
    pub direction: ZoomDirection,
}

/// Clamp `scale` into `[min, max]`; a missing bound leaves that side open.
pub fn clamp_scale(scale: f32, min: Option<f32>, max: Option<f32>) -> f32 {
    let mut clamped = scale;
    if let Some(min) = min {
        if clamped < min {
            clamped = min;
        }
    }
    if let Some(max) = max {
        if clamped > max {
            clamped = max;
        }
    }
    clamped
}

fn is_usable_scale(scale: f32) -> bool {
    scale.is_finite() && scale > 0.0
}

#[derive(Debug)]
struct ZoomState {
    scale: f32,
    disabled: bool,
    destroyed: bool,
    /// Host position on the page
    offset: Pos2,
}

struct ZoomCore {
    host: Element,
    target: Element,
    min: Option<f32>,
    max: Option<f32>,
    default_scale: f32,
    step: ZoomStep,
    state: RefCell<ZoomState>,
    zoomed: Notifier<ZoomChange>,
    layout_observer: RefCell<Option<LayoutObserver>>,
    offset_refresh: Debouncer,
}

/// Clamped scale control for a host/target element pair
pub struct Zoom {
    core: Rc<ZoomCore>,
}

impl Zoom {
    /// Apply the initial scale to `target` and start tracking the host offset.
    pub fn new(host: &Element, target: &Element, config: &ZoomPanConfig, scheduler: &Scheduler) -> Self {
        let min = config.min_bound();
        let max = config.max_bound();
        let mut initial = clamp_scale(config.initial_scale(), min, max);
        if !is_usable_scale(initial) {
            log::warn!("Initial scale {} is unusable, starting at 1", initial);
            initial = 1.0;
        }

        let core = Rc::new_cyclic(|weak: &Weak<ZoomCore>| {
            let refresh = weak.clone();
            ZoomCore {
                host: host.clone(),
                target: target.clone(),
                min,
                max,
                default_scale: config.zoom_default,
                step: config.zoom_step_mode(),
                state: RefCell::new(ZoomState {
                    scale: initial,
                    disabled: false,
                    destroyed: false,
                    offset: host.page_rect().min,
                }),
                zoomed: Notifier::new(),
                layout_observer: RefCell::new(None),
                offset_refresh: Debouncer::new(scheduler.clone(), config.layout_debounce(), move || {
                    if let Some(core) = refresh.upgrade() {
                        Zoom { core }.refresh_offset();
                    }
                }),
            }
        });

        // The host is signalled for its own layout changes and any ancestor's
        let weak = Rc::downgrade(&core);
        let observer = host.observe_layout(move || {
            if let Some(core) = weak.upgrade() {
                core.offset_refresh.signal();
            }
        });
        *core.layout_observer.borrow_mut() = Some(observer);

        target.set_style(style::TRANSFORM_ORIGIN, "0 0");
        target.set_style(style::TRANSFORM, style::format_scale(initial));

        log::debug!("Zoom bound on element {} at scale {}", host.id(), initial);
        Zoom { core }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.core.state.borrow().destroyed {
            log::warn!("Zoom used after destroy");
            return Err(ZoomPanError::destroyed("Zoom"));
        }
        Ok(())
    }

    /// Current clamped scale.
    pub fn scale(&self) -> f32 {
        self.core.state.borrow().scale
    }

    /// Clamp a requested scale to the configured bounds.
    pub fn validate_zoom(&self, scale: f32) -> f32 {
        clamp_scale(scale, self.core.min, self.core.max)
    }

    /// Set the scale directly (still clamped).
    pub fn set_scale(&self, scale: f32) -> Result<bool> {
        self.ensure_alive()?;
        Ok(self.apply_scale(scale))
    }

    /// One step in.
    pub fn zoom_in(&self) -> Result<bool> {
        self.adjust_zoom(1.0)
    }

    /// One step out.
    pub fn zoom_out(&self) -> Result<bool> {
        self.adjust_zoom(-1.0)
    }

    /// Apply `delta` steps: `scale × (1 + factor)^delta`, or
    /// `scale + step × delta` in additive mode.
    pub fn adjust_zoom(&self, delta: f32) -> Result<bool> {
        self.ensure_alive()?;
        let requested = self.core.step.apply(self.scale(), delta);
        Ok(self.apply_scale(requested))
    }

    /// Return to the configured default scale.
    pub fn reset(&self) -> Result<bool> {
        self.ensure_alive()?;
        Ok(self.apply_scale(self.core.default_scale))
    }

    fn apply_scale(&self, requested: f32) -> bool {
        let scale = self.validate_zoom(requested);
        if !is_usable_scale(scale) {
            log::warn!("Ignoring unusable scale {}", requested);
            return false;
        }

        let previous = {
            let mut state = self.core.state.borrow_mut();
            let previous = state.scale;
            if previous == scale {
                return false;
            }
            state.scale = scale;
            previous
        };

        self.core.target.set_style(style::TRANSFORM, style::format_scale(scale));

        let direction = if scale > previous { ZoomDirection::In } else { ZoomDirection::Out };
        log::trace!("Scale {} -> {} ({:?})", previous, scale, direction);
        self.core.zoomed.emit(&ZoomChange {
            scale,
            previous,
            direction,
        });
        true
    }

    // === HOST OFFSET ===

    /// Host position on the page as of the last recomputation.
    pub fn offset(&self) -> Pos2 {
        self.core.state.borrow().offset
    }

    /// Recompute the host position immediately.
    pub fn refresh_offset(&self) {
        let offset = self.core.host.page_rect().min;
        let mut state = self.core.state.borrow_mut();
        if state.destroyed {
            return;
        }
        if state.offset != offset {
            log::debug!("Host offset {:?} -> {:?}", state.offset, offset);
            state.offset = offset;
        }
    }

    // === ACCESSORS ===

    pub fn min_bound(&self) -> Option<f32> {
        self.core.min
    }

    pub fn max_bound(&self) -> Option<f32> {
        self.core.max
    }

    pub fn default_scale(&self) -> f32 {
        self.core.default_scale
    }

    pub fn step(&self) -> ZoomStep {
        self.core.step
    }

    pub fn zoomed(&self) -> &Notifier<ZoomChange> {
        &self.core.zoomed
    }

    pub fn is_disabled(&self) -> bool {
        self.core.state.borrow().disabled
    }

    /// Mark organic (wheel) input as ignored. Explicit calls are not gated.
    pub fn set_disabled(&self, disabled: bool) {
        self.core.state.borrow_mut().disabled = disabled;
    }

    pub fn is_destroyed(&self) -> bool {
        self.core.state.borrow().destroyed
    }

    /// Stop observing layout and drop any pending offset recomputation.
    pub fn destroy(&self) {
        {
            let mut state = self.core.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
        }

        if let Some(mut observer) = self.core.layout_observer.borrow_mut().take() {
            observer.disconnect();
        }
        self.core.offset_refresh.cancel();
        log::debug!("Zoom on element {} destroyed", self.core.host.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Layout;
    use std::time::Duration;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn fixture(config: ZoomPanConfig) -> (Element, Element, Element, Scheduler, Zoom) {
        let page = Element::new().with_layout(Layout::new(0.0, 0.0, 1200.0, 900.0));
        let host = Element::new().with_layout(Layout::new(50.0, 40.0, 800.0, 600.0));
        let target = Element::new();
        page.append_child(&host);
        host.append_child(&target);
        let scheduler = Scheduler::new();
        let zoom = Zoom::new(&host, &target, &config, &scheduler);
        (page, host, target, scheduler, zoom)
    }

    #[test]
    fn test_clamp_scale() {
        assert_eq!(clamp_scale(5.0, Some(0.5), Some(2.0)), 2.0);
        assert_eq!(clamp_scale(0.1, Some(0.5), Some(2.0)), 0.5);
        assert_eq!(clamp_scale(1.0, Some(0.5), Some(2.0)), 1.0);
        assert_eq!(clamp_scale(50.0, Some(0.5), None), 50.0);
        assert_eq!(clamp_scale(0.01, None, Some(2.0)), 0.01);
    }

    #[test]
    fn test_clamp_invariant_over_requests() {
        let (_page, _host, _target, _scheduler, zoom) =
            fixture(ZoomPanConfig::default().with_bounds(Some(0.25), Some(3.0)));

        for requested in [-5.0, 0.0, 0.1, 0.25, 1.0, 2.999, 3.0, 7.5, 1e9] {
            zoom.set_scale(requested).unwrap();
            let scale = zoom.scale();
            assert!((0.25..=3.0).contains(&scale), "{requested} produced {scale}");
        }
    }

    #[test]
    fn test_initial_scale_applied_and_clamped() {
        let config = ZoomPanConfig {
            zoom_scale: Some(10.0),
            ..Default::default()
        };
        let (_page, _host, target, _scheduler, zoom) = fixture(config);
        assert_eq!(zoom.scale(), 2.0);
        assert_eq!(target.style("transform").as_deref(), Some("scale(2)"));
        assert_eq!(target.style("transform-origin").as_deref(), Some("0 0"));
    }

    #[test]
    fn test_unusable_initial_scale_falls_back_to_one() {
        let config = ZoomPanConfig::default().with_bounds(None, Some(-1.0));
        let (_page, _host, target, _scheduler, zoom) = fixture(config);
        assert_eq!(zoom.scale(), 1.0);
        assert_eq!(target.style("transform").as_deref(), Some("scale(1)"));
    }

    #[test]
    fn test_multiplicative_steps_are_reversible() {
        let (_page, _host, _target, _scheduler, zoom) = fixture(ZoomPanConfig::default().with_factor(0.2));

        zoom.zoom_in().unwrap();
        assert!(approx_eq(zoom.scale(), 1.2));
        zoom.zoom_out().unwrap();
        assert!(approx_eq(zoom.scale(), 1.0));

        zoom.adjust_zoom(-2.0).unwrap();
        assert!(approx_eq(zoom.scale(), 1.0 / 1.44));
    }

    #[test]
    fn test_additive_steps() {
        let (_page, _host, _target, _scheduler, zoom) = fixture(ZoomPanConfig::default().with_step(0.2));

        zoom.zoom_in().unwrap();
        assert!(approx_eq(zoom.scale(), 1.2));
        zoom.zoom_out().unwrap();
        assert!(approx_eq(zoom.scale(), 1.0));
    }

    #[test]
    fn test_additive_step_cannot_reach_zero_without_bound() {
        let config = ZoomPanConfig::default().with_step(0.5).with_bounds(None, None);
        let (_page, _host, _target, _scheduler, zoom) = fixture(config);

        zoom.zoom_out().unwrap();
        assert!(approx_eq(zoom.scale(), 0.5));
        assert!(!zoom.zoom_out().unwrap());
        assert!(approx_eq(zoom.scale(), 0.5));
    }

    #[test]
    fn test_notifications_carry_scale_and_direction() {
        let (_page, _host, _target, _scheduler, zoom) = fixture(ZoomPanConfig::default().with_factor(0.5));
        let changes = Rc::new(RefCell::new(Vec::new()));
        let log = changes.clone();
        let _subscription = zoom.zoomed().subscribe(move |change| log.borrow_mut().push(*change));

        zoom.zoom_in().unwrap();
        zoom.zoom_in().unwrap(); // 2.25 clamps to 2.0
        zoom.zoom_in().unwrap(); // already at max, no change
        zoom.reset().unwrap();

        let changes = changes.borrow();
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].direction, ZoomDirection::In);
        assert!(approx_eq(changes[0].scale, 1.5));
        assert_eq!(changes[1].scale, 2.0);
        assert_eq!(changes[2].direction, ZoomDirection::Out);
        assert_eq!(changes[2].scale, 1.0);
        assert_eq!(changes[2].previous, 2.0);
    }

    #[test]
    fn test_disabled_does_not_gate_api() {
        let (_page, _host, _target, _scheduler, zoom) = fixture(ZoomPanConfig::default());
        zoom.set_disabled(true);
        zoom.set_scale(2.0).unwrap();
        assert_eq!(zoom.scale(), 2.0);
        zoom.set_scale(4.0).unwrap();
        assert_eq!(zoom.scale(), 2.0);
    }

    #[test]
    fn test_offset_follows_layout_after_quiet_window() {
        let (page, host, _target, scheduler, zoom) = fixture(ZoomPanConfig::default());
        assert_eq!(zoom.offset(), Pos2::new(50.0, 40.0));

        page.set_layout(Layout::new(10.0, 0.0, 1200.0, 900.0));
        scheduler.advance(Duration::from_millis(60));
        host.set_layout(Layout::new(60.0, 40.0, 800.0, 600.0));
        scheduler.advance(Duration::from_millis(99));
        assert_eq!(zoom.offset(), Pos2::new(50.0, 40.0));

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(zoom.offset(), Pos2::new(70.0, 40.0));
    }

    #[test]
    fn test_destroy_releases_observer() {
        let (page, host, _target, scheduler, zoom) = fixture(ZoomPanConfig::default());
        page.set_layout(Layout::new(10.0, 0.0, 1200.0, 900.0));
        assert!(scheduler.has_pending());

        zoom.destroy();
        zoom.destroy();
        assert_eq!(host.observer_count(), 0);
        assert!(!scheduler.has_pending());

        page.set_layout(Layout::new(30.0, 0.0, 1200.0, 900.0));
        scheduler.advance(Duration::from_millis(500));
        assert_eq!(zoom.offset(), Pos2::new(50.0, 40.0));

        assert!(matches!(zoom.zoom_in(), Err(ZoomPanError::Destroyed { .. })));
        assert!(zoom.set_scale(1.5).is_err());
        assert!(zoom.reset().is_err());
    }
}
