//! Zoom and pan over a rendered diagram.
//!
//! A [`Viewport`] owns the SVG `viewBox` window (origin plus extent, in the
//! diagram's own coordinate space) and turns pointer, wheel, touch and key
//! input into window changes. Zoom keeps the focal point fixed on screen:
//!
//! ```text
//! new_origin = focal - relative_offset * new_extent
//! ```
//!
//! The main invariant is `scale == original.width / view.width`; the aspect
//! ratio of the window never changes. Requests that would leave the
//! `[min_scale, max_scale]` range are rejected and the window stays put.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use log::trace;
use regex::Regex;

use crate::diagram::DiagramSurface;

/// Added on every side of a bounding box when the SVG has no `viewBox`.
pub const BBOX_PADDING: f64 = 20.0;
/// Pixel padding kept around the diagram by [`Viewport::fit_to_visible_area`].
pub const FIT_PADDING: f64 = 20.0;
/// Fitting never zooms past this scale.
pub const DEFAULT_ZOOM: f64 = 1.0;

const SCALE_EPSILON: f64 = 1e-9;

static VIEW_BOX_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"viewBox\s*=\s*["']([^"']*)["']"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn padded(&self, padding: f64) -> Self {
        Self::new(
            self.x - padding,
            self.y - padding,
            self.width + padding * 2.0,
            self.height + padding * 2.0,
        )
    }

    fn is_usable(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseViewBoxError(String);

impl fmt::Display for ParseViewBoxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid viewBox: {:?}", self.0)
    }
}

impl std::error::Error for ParseViewBoxError {}

impl FromStr for ViewBox {
    type Err = ParseViewBoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseViewBoxError(s.to_string());
        let values: Vec<f64> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<f64>().map_err(|_| err()))
            .collect::<Result<_, _>>()?;
        let [x, y, width, height] = values[..] else {
            return Err(err());
        };
        let vb = Self::new(x, y, width, height);
        if vb.is_usable() { Ok(vb) } else { Err(err()) }
    }
}

/// Read the `viewBox` attribute of the first element in `svg` that has one.
pub fn svg_view_box(svg: &str) -> Option<ViewBox> {
    VIEW_BOX_ATTR
        .captures(svg)
        .and_then(|caps| caps[1].parse().ok())
}

/// Where the diagram currently sits on screen, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Grab,
    Grabbing,
}

impl Cursor {
    pub fn css(self) -> &'static str {
        match self {
            Self::Grab => "grab",
            Self::Grabbing => "grabbing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Multiplicative zoom step.
    pub step: f64,
    /// Use Meta instead of Ctrl as the zoom modifier.
    pub mac_modifiers: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 10.0,
            step: 1.2,
            mac_modifiers: cfg!(target_os = "macos"),
        }
    }
}

impl ViewportConfig {
    fn zoom_modifier(&self, mods: Modifiers) -> bool {
        if self.mac_modifiers {
            mods.meta
        } else {
            mods.ctrl
        }
    }
}

/// Declarative state for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportView {
    /// Value for the SVG `viewBox` attribute.
    pub view_box: String,
    pub percent: u32,
    pub can_zoom_in: bool,
    pub can_zoom_out: bool,
    pub cursor: Cursor,
}

/// Pointer, touch, key and layout input aimed at a mounted diagram.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportInput {
    Wheel {
        client: Point,
        delta_y: f64,
        mods: Modifiers,
    },
    MouseDown {
        button: u16,
        x: f64,
        y: f64,
    },
    MouseMove {
        x: f64,
        y: f64,
    },
    MouseUp,
    TouchStart(Vec<Point>),
    TouchMove(Vec<Point>),
    /// Fingers still down after the touch ended.
    TouchEnd {
        remaining: usize,
    },
    Key {
        key: String,
        mods: Modifiers,
    },
    DoubleClick,
    /// Toolbar buttons.
    ZoomIn,
    ZoomOut,
    Reset,
    Fit {
        width: f64,
        height: f64,
    },
    /// The diagram moved or changed size on screen.
    Resize(ScreenRect),
}

#[derive(Debug, Clone, Default)]
struct TouchState {
    pan_from: Option<Point>,
    last_distance: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    config: ViewportConfig,
    view: ViewBox,
    original: ViewBox,
    /// Rendered pixel size, captured once.
    original_pixels: (f64, f64),
    scale: f64,
    screen: ScreenRect,
    drag_from: Option<Point>,
    touch: TouchState,
}

impl Viewport {
    /// Capture the initial window from a freshly rendered surface.
    pub fn new(surface: &DiagramSurface, config: ViewportConfig) -> Self {
        let view = surface
            .view_box
            .unwrap_or_else(|| surface.bbox.padded(BBOX_PADDING));
        Self {
            config,
            view,
            original: view,
            original_pixels: (surface.pixel_width, surface.pixel_height),
            scale: 1.0,
            screen: ScreenRect::new(0.0, 0.0, surface.pixel_width, surface.pixel_height),
            drag_from: None,
            touch: TouchState::default(),
        }
    }

    pub fn view_box(&self) -> ViewBox {
        self.view
    }

    pub fn original(&self) -> ViewBox {
        self.original
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Update the on-screen rectangle after layout changes.
    pub fn set_screen_rect(&mut self, rect: ScreenRect) {
        self.screen = rect;
    }

    /// Map a client-space pixel position to diagram coordinates.
    pub fn screen_to_diagram(&self, client: Point) -> (f64, f64) {
        let rel_x = if self.screen.width > 0.0 {
            (client.x - self.screen.left) / self.screen.width
        } else {
            0.5
        };
        let rel_y = if self.screen.height > 0.0 {
            (client.y - self.screen.top) / self.screen.height
        } else {
            0.5
        };
        (
            self.view.x + rel_x * self.view.width,
            self.view.y + rel_y * self.view.height,
        )
    }

    /// One step in or out around `(fx, fy)` in diagram coordinates.
    pub fn zoom_at_point(&mut self, fx: f64, fy: f64, direction: ZoomDirection) -> bool {
        let factor = match direction {
            ZoomDirection::In => self.config.step,
            ZoomDirection::Out => 1.0 / self.config.step,
        };
        self.zoom_by(factor, fx, fy)
    }

    /// Multiply the scale by `factor` keeping `(fx, fy)` fixed on screen.
    pub fn zoom_by(&mut self, factor: f64, fx: f64, fy: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 || !fx.is_finite() || !fy.is_finite() {
            return false;
        }
        let new_scale = self.scale * factor;
        if !self.in_range(new_scale) {
            trace!("Zoom to {new_scale:.3} rejected");
            return false;
        }
        self.apply_scale(new_scale, fx, fy);
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        let (cx, cy) = self.view.center();
        self.zoom_at_point(cx, cy, ZoomDirection::In)
    }

    pub fn zoom_out(&mut self) -> bool {
        let (cx, cy) = self.view.center();
        self.zoom_at_point(cx, cy, ZoomDirection::Out)
    }

    pub fn reset(&mut self) {
        self.view = self.original;
        self.scale = 1.0;
    }

    /// Fit the original pixel size into `container` (minus padding), never
    /// going past [`DEFAULT_ZOOM`], and centre on the original window.
    pub fn fit_to_visible_area(&mut self, container_width: f64, container_height: f64) -> bool {
        let (ow, oh) = self.original_pixels;
        if ow <= 0.0 || oh <= 0.0 {
            return false;
        }
        let available_w = container_width - FIT_PADDING * 2.0;
        let available_h = container_height - FIT_PADDING * 2.0;
        let scale = (available_w / ow).min(available_h / oh).min(DEFAULT_ZOOM);
        if !scale.is_finite() || scale <= 0.0 {
            return false;
        }
        let scale = scale.clamp(self.config.min_scale, self.config.max_scale);
        let (cx, cy) = self.original.center();
        let width = self.original.width / scale;
        let height = self.original.height / scale;
        self.view = ViewBox::new(cx - width / 2.0, cy - height / 2.0, width, height);
        self.scale = scale;
        true
    }

    fn in_range(&self, scale: f64) -> bool {
        scale >= self.config.min_scale - SCALE_EPSILON
            && scale <= self.config.max_scale + SCALE_EPSILON
    }

    fn apply_scale(&mut self, new_scale: f64, fx: f64, fy: f64) {
        let rel_x = (fx - self.view.x) / self.view.width;
        let rel_y = (fy - self.view.y) / self.view.height;
        let width = self.original.width / new_scale;
        let height = self.original.height / new_scale;
        self.view = ViewBox::new(fx - rel_x * width, fy - rel_y * height, width, height);
        self.scale = new_scale;
    }

    fn pan_by_pixels(&mut self, dx: f64, dy: f64) {
        if self.screen.width > 0.0 {
            self.view.x -= dx * (self.view.width / self.screen.width);
        }
        if self.screen.height > 0.0 {
            self.view.y -= dy * (self.view.height / self.screen.height);
        }
    }

    /// Mouse down. Only the primary button starts a drag.
    pub fn begin_drag(&mut self, button: u16, x: f64, y: f64) -> bool {
        if button != 0 {
            return false;
        }
        self.drag_from = Some(Point::new(x, y));
        true
    }

    pub fn drag_to(&mut self, x: f64, y: f64) -> bool {
        let Some(from) = self.drag_from else {
            return false;
        };
        self.pan_by_pixels(x - from.x, y - from.y);
        self.drag_from = Some(Point::new(x, y));
        true
    }

    pub fn end_drag(&mut self) {
        self.drag_from = None;
    }

    pub fn touch_start(&mut self, touches: &[Point]) -> bool {
        match touches {
            [one] => {
                self.touch.pan_from = Some(*one);
                true
            }
            [a, b, ..] => {
                self.touch.last_distance = Some(a.distance(*b));
                true
            }
            [] => false,
        }
    }

    /// One finger pans; two fingers pinch around their midpoint.
    pub fn touch_move(&mut self, touches: &[Point]) -> bool {
        match touches {
            [one] => {
                let Some(from) = self.touch.pan_from else {
                    return false;
                };
                self.pan_by_pixels(one.x - from.x, one.y - from.y);
                self.touch.pan_from = Some(*one);
                true
            }
            [a, b] => {
                let distance = a.distance(*b);
                if let Some(last) = self.touch.last_distance.filter(|d| *d > 0.0) {
                    let (fx, fy) = self.screen_to_diagram(a.midpoint(*b));
                    self.zoom_by(distance / last, fx, fy);
                }
                self.touch.last_distance = Some(distance);
                true
            }
            _ => false,
        }
    }

    pub fn touch_end(&mut self, remaining: usize) {
        match remaining {
            0 => self.touch = TouchState::default(),
            1 => self.touch.last_distance = None,
            _ => {}
        }
    }

    /// Returns true when the wheel event was consumed (zoom modifier held),
    /// false when the page should scroll.
    pub fn wheel(&mut self, client: Point, delta_y: f64, mods: Modifiers) -> bool {
        if !self.config.zoom_modifier(mods) {
            return false;
        }
        let (fx, fy) = self.screen_to_diagram(client);
        let direction = if delta_y > 0.0 {
            ZoomDirection::Out
        } else {
            ZoomDirection::In
        };
        self.zoom_at_point(fx, fy, direction);
        true
    }

    /// Modifier plus `=`/`+`, `-`/`_` or `0`. Returns true when handled.
    pub fn key(&mut self, key: &str, mods: Modifiers) -> bool {
        if !self.config.zoom_modifier(mods) {
            return false;
        }
        match key {
            "=" | "+" => {
                self.zoom_in();
            }
            "-" | "_" => {
                self.zoom_out();
            }
            "0" => self.reset(),
            _ => return false,
        }
        true
    }

    pub fn double_click(&mut self) {
        self.reset();
    }

    /// Apply one input. Returns true when it was consumed; an unconsumed
    /// wheel or key belongs to the page.
    pub fn handle(&mut self, input: ViewportInput) -> bool {
        match input {
            ViewportInput::Wheel {
                client,
                delta_y,
                mods,
            } => self.wheel(client, delta_y, mods),
            ViewportInput::MouseDown { button, x, y } => self.begin_drag(button, x, y),
            ViewportInput::MouseMove { x, y } => self.drag_to(x, y),
            ViewportInput::MouseUp => {
                let was_dragging = self.is_dragging();
                self.end_drag();
                was_dragging
            }
            ViewportInput::TouchStart(touches) => self.touch_start(&touches),
            ViewportInput::TouchMove(touches) => self.touch_move(&touches),
            ViewportInput::TouchEnd { remaining } => {
                self.touch_end(remaining);
                true
            }
            ViewportInput::Key { key, mods } => self.key(&key, mods),
            ViewportInput::DoubleClick => {
                self.double_click();
                true
            }
            ViewportInput::ZoomIn => self.zoom_in(),
            ViewportInput::ZoomOut => self.zoom_out(),
            ViewportInput::Reset => {
                self.reset();
                true
            }
            ViewportInput::Fit { width, height } => self.fit_to_visible_area(width, height),
            ViewportInput::Resize(rect) => {
                self.set_screen_rect(rect);
                true
            }
        }
    }

    pub fn view(&self) -> ViewportView {
        ViewportView {
            view_box: self.view.to_string(),
            percent: (self.scale * 100.0).round() as u32,
            can_zoom_in: self.in_range(self.scale * self.config.step),
            can_zoom_out: self.in_range(self.scale / self.config.step),
            cursor: if self.is_dragging() {
                Cursor::Grabbing
            } else {
                Cursor::Grab
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn surface() -> DiagramSurface {
        DiagramSurface {
            svg: String::new(),
            view_box: Some(ViewBox::new(0.0, 0.0, 400.0, 200.0)),
            bbox: ViewBox::new(0.0, 0.0, 400.0, 200.0),
            pixel_width: 400.0,
            pixel_height: 200.0,
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(
            &surface(),
            ViewportConfig {
                mac_modifiers: false,
                ..Default::default()
            },
        )
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    fn assert_box_close(a: ViewBox, b: ViewBox) {
        assert_close(a.x, b.x);
        assert_close(a.y, b.y);
        assert_close(a.width, b.width);
        assert_close(a.height, b.height);
    }

    #[test]
    fn test_parse_view_box() {
        assert_eq!(
            "0 0 100 50".parse::<ViewBox>().unwrap(),
            ViewBox::new(0.0, 0.0, 100.0, 50.0)
        );
        assert_eq!(
            "-8, -8.5 116,66".parse::<ViewBox>().unwrap(),
            ViewBox::new(-8.0, -8.5, 116.0, 66.0)
        );
        assert!("0 0 100".parse::<ViewBox>().is_err());
        assert!("0 0 0 10".parse::<ViewBox>().is_err());
        assert!("a b c d".parse::<ViewBox>().is_err());
    }

    #[test]
    fn test_svg_view_box() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="-8 -8 300 120" style="max-width: 300px;">"#;
        assert_eq!(svg_view_box(svg), Some(ViewBox::new(-8.0, -8.0, 300.0, 120.0)));
        assert_eq!(svg_view_box("<svg width=\"10\"></svg>"), None);
    }

    #[test]
    fn test_bbox_padding_without_view_box() {
        let mut s = surface();
        s.view_box = None;
        s.bbox = ViewBox::new(5.0, 5.0, 100.0, 50.0);
        let vp = Viewport::new(&s, ViewportConfig::default());
        assert_eq!(vp.view_box(), ViewBox::new(-15.0, -15.0, 140.0, 90.0));
    }

    #[test]
    fn test_focal_point_preserved() {
        let mut vp = viewport();
        let (fx, fy) = (100.0, 50.0);
        let before = vp.view_box();
        let rel_before = ((fx - before.x) / before.width, (fy - before.y) / before.height);

        assert!(vp.zoom_at_point(fx, fy, ZoomDirection::In));
        let after = vp.view_box();
        let rel_after = ((fx - after.x) / after.width, (fy - after.y) / after.height);

        assert_close(rel_before.0, rel_after.0);
        assert_close(rel_before.1, rel_after.1);
        assert_close(after.width, 400.0 / 1.2);
        assert_close(vp.scale(), 1.2);
    }

    #[test]
    fn test_zoom_in_then_out_is_identity() {
        let mut vp = viewport();
        let start = vp.view_box();
        assert!(vp.zoom_at_point(37.0, 141.0, ZoomDirection::In));
        assert!(vp.zoom_at_point(37.0, 141.0, ZoomDirection::Out));
        assert_box_close(vp.view_box(), start);
        assert_close(vp.scale(), 1.0);
    }

    #[test]
    fn test_aspect_ratio_invariant() {
        let mut vp = viewport();
        let aspect = vp.view_box().aspect();
        for i in 0..30 {
            if i % 3 == 0 {
                vp.zoom_out();
            } else {
                vp.zoom_in();
            }
            assert!((vp.view_box().aspect() - aspect).abs() < EPS);
            assert_close(vp.scale(), vp.original().width / vp.view_box().width);
        }
    }

    #[test]
    fn test_out_of_range_zoom_rejected_unchanged() {
        let mut vp = viewport();
        while vp.zoom_in() {}
        let at_max = vp.view_box();
        let scale = vp.scale();
        assert!(scale <= 10.0 + EPS);
        assert!(!vp.zoom_in());
        assert_eq!(vp.view_box(), at_max);
        assert_eq!(vp.scale(), scale);
        assert!(!vp.view().can_zoom_in);

        vp.reset();
        while vp.zoom_out() {}
        assert!(vp.scale() >= 0.1 - EPS);
        assert!(!vp.view().can_zoom_out);
    }

    #[test]
    fn test_reset_and_double_click() {
        let mut vp = viewport();
        vp.zoom_in();
        vp.begin_drag(0, 10.0, 10.0);
        vp.drag_to(50.0, 10.0);
        vp.end_drag();
        vp.double_click();
        assert_eq!(vp.view_box(), vp.original());
        assert_eq!(vp.scale(), 1.0);
    }

    #[test]
    fn test_drag_pans_by_screen_ratio() {
        let mut vp = viewport();
        vp.set_screen_rect(ScreenRect::new(0.0, 0.0, 200.0, 100.0));
        assert!(!vp.begin_drag(2, 0.0, 0.0), "right button ignored");
        assert!(vp.begin_drag(0, 100.0, 50.0));
        assert_eq!(vp.view().cursor, Cursor::Grabbing);
        vp.drag_to(110.0, 45.0);
        // 400 units over 200 px: 2 units per pixel
        assert_close(vp.view_box().x, -20.0);
        assert_close(vp.view_box().y, 10.0);
        vp.end_drag();
        assert!(!vp.drag_to(0.0, 0.0));
        assert_eq!(vp.view().cursor, Cursor::Grab);
    }

    #[test]
    fn test_wheel_requires_modifier() {
        let mut vp = viewport();
        let before = vp.view_box();
        assert!(!vp.wheel(Point::new(200.0, 100.0), -1.0, Modifiers::default()));
        assert_eq!(vp.view_box(), before);

        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };
        assert!(vp.wheel(Point::new(200.0, 100.0), -1.0, ctrl));
        assert_close(vp.scale(), 1.2);
        assert!(vp.wheel(Point::new(200.0, 100.0), 1.0, ctrl));
        assert_close(vp.scale(), 1.0);
    }

    #[test]
    fn test_mac_uses_meta() {
        let mut vp = Viewport::new(
            &surface(),
            ViewportConfig {
                mac_modifiers: true,
                ..Default::default()
            },
        );
        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };
        let meta = Modifiers {
            meta: true,
            ..Default::default()
        };
        assert!(!vp.key("=", ctrl));
        assert!(vp.key("=", meta));
        assert_close(vp.scale(), 1.2);
        assert!(vp.key("0", meta));
        assert_eq!(vp.scale(), 1.0);
    }

    #[test]
    fn test_pinch_zooms_around_midpoint() {
        let mut vp = viewport();
        let a = Point::new(100.0, 100.0);
        assert!(vp.touch_start(&[a, Point::new(200.0, 100.0)]));
        assert!(vp.touch_move(&[a, Point::new(300.0, 100.0)]));
        assert_close(vp.scale(), 2.0);

        // The midpoint (200, 100) stays at the centre of the window
        let after = vp.view_box();
        assert_box_close(after, ViewBox::new(100.0, 50.0, 200.0, 100.0));

        vp.touch_end(0);
        assert!(!vp.touch_move(&[a]), "pan needs a fresh touch_start");
    }

    #[test]
    fn test_single_finger_pans() {
        let mut vp = viewport();
        vp.touch_start(&[Point::new(10.0, 10.0)]);
        vp.touch_move(&[Point::new(20.0, 10.0)]);
        assert_close(vp.view_box().x, -10.0);
    }

    #[test]
    fn test_fit_never_exceeds_default_zoom() {
        let mut vp = viewport();
        assert!(vp.fit_to_visible_area(2000.0, 2000.0));
        assert_close(vp.scale(), 1.0);
        assert_box_close(vp.view_box(), vp.original());

        assert!(vp.fit_to_visible_area(240.0, 1000.0));
        // (240 - 40) / 400
        assert_close(vp.scale(), 0.5);
        let (cx, cy) = vp.view_box().center();
        assert_close(cx, 200.0);
        assert_close(cy, 100.0);

        assert!(!vp.fit_to_visible_area(10.0, 10.0));
    }

    #[test]
    fn test_handle_routes_inputs() {
        let mut vp = viewport();
        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };
        assert!(vp.handle(ViewportInput::Resize(ScreenRect::new(0.0, 0.0, 200.0, 100.0))));
        assert!(vp.handle(ViewportInput::ZoomIn));
        assert_close(vp.scale(), 1.2);

        // 10px on a 200px-wide screen showing ~333 units
        let before = vp.view_box();
        assert!(vp.handle(ViewportInput::MouseDown { button: 0, x: 50.0, y: 50.0 }));
        assert_eq!(vp.view().cursor, Cursor::Grabbing);
        assert!(vp.handle(ViewportInput::MouseMove { x: 60.0, y: 50.0 }));
        assert!(vp.handle(ViewportInput::MouseUp));
        assert!(!vp.handle(ViewportInput::MouseUp), "no drag to end");
        assert_close(vp.view_box().x, before.x - 10.0 * before.width / 200.0);

        assert!(!vp.handle(ViewportInput::Key {
            key: "=".to_string(),
            mods: Modifiers::default(),
        }));
        assert!(vp.handle(ViewportInput::Key {
            key: "0".to_string(),
            mods: ctrl,
        }));
        assert_eq!(vp.view_box(), vp.original());

        assert!(vp.handle(ViewportInput::Fit {
            width: 240.0,
            height: 1000.0,
        }));
        assert_close(vp.scale(), 0.5);
        assert!(vp.handle(ViewportInput::DoubleClick));
        assert_close(vp.scale(), 1.0);
    }

    #[test]
    fn test_view_percent() {
        let mut vp = viewport();
        assert_eq!(vp.view().percent, 100);
        assert_eq!(vp.view().view_box, "0 0 400 200");
        vp.zoom_in();
        assert_eq!(vp.view().percent, 120);
    }
}
