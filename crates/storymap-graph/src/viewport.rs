use crate::geometry::{Rect, Vec2};

pub const DEFAULT_ZOOM_MIN: f32 = 0.1;
pub const DEFAULT_ZOOM_MAX: f32 = 4.0;
/// Factor applied by one zoom-in / zoom-out button press.
pub const ZOOM_STEP: f32 = 1.2;

/// Maps between map-space and screen-space.
///
/// Screen-space is relative to the canvas' top-left corner. The visible
/// window into the map (the view box) starts at `origin` and spans
/// `screen_size / zoom`; it is kept inside `[0, map_size]` whenever the map
/// is large enough to contain it.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    zoom: f32,
    origin: Vec2,
    screen_size: Vec2,
    map_size: Vec2,
    zoom_min: f32,
    zoom_max: f32,
}

impl Viewport {
    pub fn new(map_size: Vec2, screen_size: Vec2) -> Self {
        let mut viewport = Self {
            zoom: 1.0,
            origin: Vec2::ZERO,
            screen_size: Vec2::ZERO,
            map_size: Vec2::ZERO,
            zoom_min: DEFAULT_ZOOM_MIN,
            zoom_max: DEFAULT_ZOOM_MAX,
        };
        viewport.set_map_size(map_size);
        viewport.set_screen_size(screen_size);
        viewport
    }

    pub fn with_zoom_bounds(mut self, min: f32, max: f32) -> Self {
        self.set_zoom_bounds(min, max);
        self
    }

    /// Bounds are ignored unless `0 < min <= max`.
    pub fn set_zoom_bounds(&mut self, min: f32, max: f32) {
        if min > 0.0 && min <= max {
            self.zoom_min = min;
            self.zoom_max = max;
            self.zoom = self.clamp_zoom(self.zoom);
            self.clamp_origin();
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn screen_size(&self) -> Vec2 {
        self.screen_size
    }

    pub fn map_size(&self) -> Vec2 {
        self.map_size
    }

    pub fn map_rect(&self) -> Rect {
        Rect::from_pos_size(Vec2::ZERO, self.map_size)
    }

    /// Map or screen has a non-positive extent; nothing should be drawn.
    pub fn is_degenerate(&self) -> bool {
        self.map_size.x <= 0.0
            || self.map_size.y <= 0.0
            || self.screen_size.x <= 0.0
            || self.screen_size.y <= 0.0
    }

    /// The map-space rectangle currently visible.
    pub fn view_box(&self) -> Rect {
        Rect::from_pos_size(self.origin, self.screen_size / self.zoom)
    }

    pub fn to_screen(&self, map_point: Vec2) -> Vec2 {
        (map_point - self.origin) * self.zoom
    }

    pub fn to_map(&self, screen_point: Vec2) -> Vec2 {
        screen_point / self.zoom + self.origin
    }

    pub fn rect_to_screen(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.to_screen(rect.min), self.to_screen(rect.max))
    }

    pub fn screen_center(&self) -> Vec2 {
        self.screen_size * 0.5
    }

    /// Window was resized. Non-positive sizes are ignored.
    pub fn set_screen_size(&mut self, size: Vec2) {
        if size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        self.screen_size = size;
        self.zoom = self.clamp_zoom(self.zoom);
        self.clamp_origin();
    }

    /// Non-positive map extents are stored but leave the view pinned at the origin.
    pub fn set_map_size(&mut self, size: Vec2) {
        self.map_size = size;
        self.zoom = self.clamp_zoom(self.zoom);
        self.clamp_origin();
    }

    /// Lowest zoom that still keeps the view box inside the map.
    pub fn effective_zoom_min(&self) -> f32 {
        let mut min = self.zoom_min;
        if self.map_size.x > 0.0 && self.map_size.y > 0.0 {
            min = min
                .max(self.screen_size.x / self.map_size.x)
                .max(self.screen_size.y / self.map_size.y);
        }
        min.min(self.zoom_max)
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.effective_zoom_min(), self.zoom_max)
    }

    fn clamp_origin(&mut self) {
        let view = self.screen_size / self.zoom;
        let max_x = (self.map_size.x - view.x).max(0.0);
        let max_y = (self.map_size.y - view.y).max(0.0);
        self.origin = Vec2::new(self.origin.x.clamp(0.0, max_x), self.origin.y.clamp(0.0, max_y));
    }

    /// Multiply the zoom by `factor`, keeping the map point under `screen_point` fixed.
    ///
    /// Non-positive factors are ignored. Near the map edge the view box clamp
    /// takes precedence over the anchor.
    pub fn zoom_at(&mut self, screen_point: Vec2, factor: f32) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        let new_zoom = self.clamp_zoom(self.zoom * factor);
        if (new_zoom - self.zoom).abs() <= f32::EPSILON {
            return;
        }
        let anchor = self.to_map(screen_point);
        self.zoom = new_zoom;
        self.origin = anchor - screen_point / new_zoom;
        self.clamp_origin();
        tracing::trace!(zoom = self.zoom, "zoom");
    }

    pub fn zoom_in(&mut self) {
        self.zoom_at(self.screen_center(), ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_at(self.screen_center(), 1.0 / ZOOM_STEP);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom_at(self.screen_center(), 1.0 / self.zoom);
    }

    /// Move the view so the content follows a pointer that moved by `delta_screen`.
    pub fn pan(&mut self, delta_screen: Vec2) {
        self.origin -= delta_screen / self.zoom;
        self.clamp_origin();
    }

    /// Recenter the view box on `map_point` without changing its size.
    pub fn center_on(&mut self, map_point: Vec2) {
        let view = self.screen_size / self.zoom;
        self.origin = map_point - view * 0.5;
        self.clamp_origin();
    }

    pub fn fit_to_node(&mut self, node_rect: Rect) {
        self.center_on(node_rect.center());
    }

    /// Zoom and center so `bounds` (plus `padding` on each side) fills the screen.
    pub fn fit_to_rect(&mut self, bounds: Rect, padding: f32) {
        if self.is_degenerate() {
            return;
        }
        let padded = bounds.expand(padding.max(0.0));
        if padded.is_positive() {
            let scale = (self.screen_size.x / padded.width()).min(self.screen_size.y / padded.height());
            self.zoom = self.clamp_zoom(scale);
        }
        self.center_on(bounds.center());
    }
}
