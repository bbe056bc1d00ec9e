//! Zoompan playground
//!
//! Builds a small element tree (page, viewport host, transformable content,
//! a scatter of objects), feeds egui pointer and scroll input into it as
//! events and paints the content from the element styles. Pass a JSON
//! config path as the first argument to try other bounds and steps.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use eframe::egui;
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use rand::Rng;

use zoompan::pan::ZOOMABLE_CLASS;
use zoompan::style;
use zoompan::{
    CenterOptions, Element, Event, EventType, Layout, MoveOptions, Scheduler, Subscription, ZoomPan, ZoomPanConfig,
};

const CONTENT_SIZE: Vec2 = Vec2::new(2400.0, 1600.0);
const OBJECT_COUNT: usize = 24;
const LOG_LINES: usize = 12;

/// A box placed on the content surface
struct Object {
    element: Element,
    label: String,
    color: Color32,
}

struct Playground {
    scheduler: Scheduler,
    page: Element,
    host: Element,
    target: Element,
    objects: Vec<Object>,
    zoom_pan: ZoomPan,
    messages: Rc<RefCell<VecDeque<String>>>,
    _subscriptions: Vec<Subscription>,
    hovering: bool,
    enabled: bool,
}

impl Playground {
    fn new(config: ZoomPanConfig) -> zoompan::Result<Self> {
        let page = Element::new().with_layout(Layout::new(0.0, 0.0, 1280.0, 800.0));
        let host = Element::new().with_class("zoompan-host");
        let target = Element::new().with_class("zoompan-target");
        let content = Element::new()
            .with_class(ZOOMABLE_CLASS)
            .with_layout(Layout::new(0.0, 0.0, CONTENT_SIZE.x, CONTENT_SIZE.y));
        page.append_child(&host);
        host.append_child(&target);
        target.append_child(&content);

        let mut rng = rand::rng();
        let objects = (0..OBJECT_COUNT)
            .map(|index| {
                let width = rng.random_range(60.0..180.0);
                let height = rng.random_range(40.0..120.0);
                let left = rng.random_range(0.0..CONTENT_SIZE.x - width);
                let top = rng.random_range(0.0..CONTENT_SIZE.y - height);
                let element = Element::new()
                    .with_class("object")
                    .with_layout(Layout::new(left, top, width, height));
                content.append_child(&element);
                Object {
                    element,
                    label: format!("#{index}"),
                    color: Color32::from_rgb(
                        rng.random_range(60..200),
                        rng.random_range(60..200),
                        rng.random_range(60..200),
                    ),
                }
            })
            .collect();

        let scheduler = Scheduler::new();
        let zoom_pan = ZoomPan::new(&host, &target, config, &scheduler)?;

        let messages = Rc::new(RefCell::new(VecDeque::new()));
        let sink = messages.clone();
        let moved = zoom_pan.moved().subscribe(move |offset| {
            log::info!("moved to ({:.1}, {:.1})", offset.left, offset.top);
            push_message(&sink, format!("move  left {:.1}  top {:.1}", offset.left, offset.top));
        });
        let sink = messages.clone();
        let zoomed = zoom_pan.zoomed().subscribe(move |change| {
            log::info!("zoomed {:?} to {:.3}", change.direction, change.scale);
            push_message(&sink, format!("zoom  {:?}  {:.3} -> {:.3}", change.direction, change.previous, change.scale));
        });

        Ok(Self {
            scheduler,
            page,
            host,
            target,
            objects,
            zoom_pan,
            messages,
            _subscriptions: vec![moved, zoomed],
            hovering: false,
            enabled: true,
        })
    }

    /// Translate this frame's egui input into element events.
    fn feed_input(&mut self, ui: &egui::Ui, rect: Rect) {
        let (hover, pressed, released, moving, scroll) = ui.input(|i| {
            (
                i.pointer.hover_pos(),
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.is_moving(),
                i.raw_scroll_delta.y,
            )
        });

        let inside = hover.is_some_and(|pos| rect.contains(pos));
        if self.hovering && !inside {
            let pos = hover.unwrap_or(rect.center());
            self.host.dispatch(&mut Event::mouse(EventType::MouseLeave, pos.x, pos.y));
        }
        self.hovering = inside;

        let Some(pos) = hover else {
            return;
        };
        if inside && pressed {
            self.host.dispatch(&mut Event::mouse(EventType::MouseDown, pos.x, pos.y));
        }
        if inside && moving {
            self.host.dispatch(&mut Event::mouse(EventType::MouseMove, pos.x, pos.y));
        }
        if released {
            self.host.dispatch(&mut Event::mouse(EventType::MouseUp, pos.x, pos.y));
        }
        // egui scrolls up with positive y, wheel events scroll down with positive deltaY
        if inside && scroll != 0.0 {
            self.host.dispatch(&mut Event::wheel(pos.x, pos.y, -scroll));
        }
    }

    /// Content point under a screen position, read back from the element styles.
    fn screen_to_content(&self, rect: Rect, pos: Pos2) -> Pos2 {
        let (offset, scale) = self.transform();
        ((pos - rect.min - offset) / scale).to_pos2()
    }

    fn transform(&self) -> (Vec2, f32) {
        let offset = Vec2::new(self.target.style_px(style::LEFT), self.target.style_px(style::TOP));
        let scale = self
            .target
            .style(style::TRANSFORM)
            .and_then(|transform| style::parse_scale(&transform))
            .unwrap_or(1.0);
        (offset, scale)
    }

    fn paint(&self, painter: &egui::Painter, rect: Rect) {
        let (offset, scale) = self.transform();
        let to_screen = |content: Pos2| rect.min + offset + content.to_vec2() * scale;

        painter.rect_filled(rect, 0.0, Color32::from_gray(24));
        let surface = Rect::from_min_max(to_screen(Pos2::ZERO), to_screen(CONTENT_SIZE.to_pos2()));
        painter.rect_filled(surface, 4.0 * scale, Color32::from_gray(40));

        // Grid every 200 content pixels
        let grid = Stroke::new(1.0, Color32::from_gray(55));
        let mut x = 0.0;
        while x <= CONTENT_SIZE.x {
            painter.line_segment([to_screen(Pos2::new(x, 0.0)), to_screen(Pos2::new(x, CONTENT_SIZE.y))], grid);
            x += 200.0;
        }
        let mut y = 0.0;
        while y <= CONTENT_SIZE.y {
            painter.line_segment([to_screen(Pos2::new(0.0, y)), to_screen(Pos2::new(CONTENT_SIZE.x, y))], grid);
            y += 200.0;
        }

        for object in &self.objects {
            let layout = object.element.layout();
            let min = to_screen(Pos2::new(layout.left, layout.top));
            let object_rect = Rect::from_min_size(min, layout.size() * scale);
            painter.rect_filled(object_rect, 6.0 * scale, object.color);
            painter.text(
                object_rect.center(),
                egui::Align2::CENTER_CENTER,
                &object.label,
                egui::FontId::proportional((14.0 * scale).max(6.0)),
                Color32::WHITE,
            );
        }

        // Viewport center marker
        let center = rect.center();
        let marker = Stroke::new(1.0, Color32::from_rgb(255, 200, 100));
        painter.line_segment([center - Vec2::new(8.0, 0.0), center + Vec2::new(8.0, 0.0)], marker);
        painter.line_segment([center - Vec2::new(0.0, 8.0), center + Vec2::new(0.0, 8.0)], marker);
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Zoompan");
        ui.separator();

        ui.horizontal(|ui| {
            if ui.button("Zoom in").clicked() {
                report(self.zoom_pan.zoom_in());
            }
            if ui.button("Zoom out").clicked() {
                report(self.zoom_pan.zoom_out());
            }
        });
        ui.horizontal(|ui| {
            if ui.button("Reset").clicked() {
                report(self.zoom_pan.reset().map(|_| true));
            }
            if ui.button("Random center").clicked() {
                let mut rng = rand::rng();
                let x = rng.random_range(0.0..CONTENT_SIZE.x);
                let y = rng.random_range(0.0..CONTENT_SIZE.y);
                report(self.zoom_pan.move_center(x, y, MoveOptions::slide()));
            }
        });
        if ui.checkbox(&mut self.enabled, "Input enabled").changed() {
            let result = if self.enabled {
                self.zoom_pan.enable()
            } else {
                self.zoom_pan.disable()
            };
            report(result.map(|_| true));
        }

        ui.separator();
        let center = self.zoom_pan.get_center();
        ui.label(format!("scale   {:.3}", self.zoom_pan.scale()));
        ui.label(format!("offset  {:.1}, {:.1}", self.zoom_pan.left(), self.zoom_pan.top()));
        ui.label(format!("center  {:.1}, {:.1}", center.x, center.y));
        if let Some(size) = self.zoom_pan.content_size() {
            ui.label(format!("content {:.0} x {:.0}", size.x, size.y));
        }
        ui.label(format!("style   {}", self.target.style_text()));

        ui.separator();
        ui.label("Click an object to center it.");
        for message in self.messages.borrow().iter() {
            ui.monospace(message);
        }
    }
}

impl eframe::App for Playground {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.stable_dt);
        self.scheduler.advance(Duration::from_secs_f32(dt));

        egui::SidePanel::right("controls").min_width(260.0).show(ctx, |ui| {
            self.controls(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;

            let screen = ctx.screen_rect();
            self.page.set_layout(Layout::new(0.0, 0.0, screen.width(), screen.height()));
            self.host
                .set_layout(Layout::new(rect.left(), rect.top(), rect.width(), rect.height()));

            self.feed_input(ui, rect);

            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let point = self.screen_to_content(rect, pos);
                    let hit = self.objects.iter().find(|object| {
                        let layout = object.element.layout();
                        Rect::from_min_size(Pos2::new(layout.left, layout.top), layout.size()).contains(point)
                    });
                    if let Some(object) = hit {
                        log::debug!("centering on {}", object.label);
                        report(self.zoom_pan.center_on_element(&object.element, CenterOptions::default().with_slide()));
                    }
                }
            }

            self.paint(&ui.painter_at(rect), rect);
        });

        if self.scheduler.has_pending() {
            ctx.request_repaint();
        }
    }
}

fn push_message(messages: &RefCell<VecDeque<String>>, message: String) {
    let mut messages = messages.borrow_mut();
    messages.push_front(message);
    messages.truncate(LOG_LINES);
}

fn report(result: zoompan::Result<bool>) {
    if let Err(err) = result {
        log::error!("{}", err);
    }
}

fn load_config() -> ZoomPanConfig {
    let Some(path) = std::env::args().nth(1) else {
        return ZoomPanConfig::default();
    };
    match ZoomPanConfig::from_file(Path::new(&path)) {
        Ok(config) => {
            log::info!("Loaded config from {}", path);
            config
        }
        Err(err) => {
            log::warn!("{}; using defaults", err);
            ZoomPanConfig::default()
        }
    }
}

/// Application entry point
fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    let config = load_config();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_app_id("com.zoompan.playground"),
        ..Default::default()
    };

    eframe::run_native(
        "Zoompan",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(Playground::new(config)?))
        }),
    )
}
