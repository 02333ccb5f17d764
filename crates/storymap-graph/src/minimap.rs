use crate::geometry::{Rect, Vec2};
use crate::viewport::Viewport;
use storymap_core::{Result, StoryMapError};

/// Uniform-scale projection of the whole map into a small panel.
///
/// Minimap coordinates are relative to the panel's top-left corner. When the
/// panel and the map have different aspect ratios the map is centered
/// (letterboxed) inside the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiniMap {
    size: Vec2,
    map_size: Vec2,
    scale: f32,
    offset: Vec2,
}

impl MiniMap {
    pub fn new(size: Vec2, map_size: Vec2) -> Result<Self> {
        for extent in [size, map_size] {
            if extent.x <= 0.0 || extent.y <= 0.0 || !extent.x.is_finite() || !extent.y.is_finite() {
                return Err(StoryMapError::DegenerateGeometry {
                    width: extent.x,
                    height: extent.y,
                });
            }
        }
        let scale = (size.x / map_size.x).min(size.y / map_size.y);
        let offset = (size - map_size * scale) * 0.5;
        Ok(Self {
            size,
            map_size,
            scale,
            offset,
        })
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn to_mini(&self, map_point: Vec2) -> Vec2 {
        map_point * self.scale + self.offset
    }

    pub fn to_map(&self, mini_point: Vec2) -> Vec2 {
        (mini_point - self.offset) / self.scale
    }

    pub fn rect_to_mini(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.to_mini(rect.min), self.to_mini(rect.max))
    }

    /// The part of the panel the map actually occupies.
    pub fn content_rect(&self) -> Rect {
        self.rect_to_mini(Rect::from_pos_size(Vec2::ZERO, self.map_size))
    }

    /// The main view box as drawn on the minimap.
    pub fn view_rect(&self, viewport: &Viewport) -> Rect {
        self.rect_to_mini(viewport.view_box())
    }

    /// Recenter the main view on the map point under `mini_point`.
    ///
    /// Only the view box origin changes; its size is left alone.
    pub fn navigate(&self, viewport: &mut Viewport, mini_point: Vec2) {
        let target = self.to_map(mini_point);
        viewport.center_on(target);
    }
}

/// Click and drag handling for the minimap panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiniMapNavigator {
    dragging: bool,
}

impl MiniMapNavigator {
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// A press on the view box rectangle starts a drag; anywhere else it is a
    /// one-shot jump.
    pub fn pointer_down(&mut self, minimap: &MiniMap, viewport: &mut Viewport, mini_point: Vec2) {
        if minimap.view_rect(viewport).contains(mini_point) {
            self.dragging = true;
        } else {
            minimap.navigate(viewport, mini_point);
        }
    }

    pub fn pointer_move(&mut self, minimap: &MiniMap, viewport: &mut Viewport, mini_point: Vec2) {
        if self.dragging {
            minimap.navigate(viewport, mini_point);
        }
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-2
    }

    fn setup() -> (MiniMap, Viewport) {
        let minimap = MiniMap::new(Vec2::new(200.0, 150.0), Vec2::new(4000.0, 3000.0)).unwrap();
        let viewport = Viewport::new(Vec2::new(4000.0, 3000.0), Vec2::new(800.0, 600.0));
        (minimap, viewport)
    }

    #[test]
    fn test_uniform_scale_without_letterbox() {
        let (minimap, _) = setup();
        assert!((minimap.scale() - 0.05).abs() < 1e-6);
        assert!(minimap.offset().length() < 1e-4);
    }

    #[test]
    fn test_letterbox_centers_map() {
        let minimap = MiniMap::new(Vec2::new(200.0, 150.0), Vec2::new(4000.0, 1000.0)).unwrap();
        assert!((minimap.scale() - 0.05).abs() < 1e-6);
        // 1000 * 0.05 = 50 tall, centered in 150.
        assert!((minimap.offset().y - 50.0).abs() < 1e-4);
        let content = minimap.content_rect();
        assert!((content.height() - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_sizes_are_rejected() {
        assert!(MiniMap::new(Vec2::new(200.0, 150.0), Vec2::new(0.0, 3000.0)).is_err());
        assert!(MiniMap::new(Vec2::new(200.0, -1.0), Vec2::new(4000.0, 3000.0)).is_err());
        assert_eq!(
            MiniMap::new(Vec2::new(200.0, 150.0), Vec2::new(4000.0, 0.0)),
            Err(StoryMapError::DegenerateGeometry { width: 4000.0, height: 0.0 })
        );
    }

    #[test]
    fn test_click_center_recenters_view() {
        let (minimap, mut viewport) = setup();
        let size_before = viewport.view_box().size();
        let mut nav = MiniMapNavigator::default();
        nav.pointer_down(&minimap, &mut viewport, Vec2::new(100.0, 75.0));
        assert!(!nav.is_dragging());
        assert!(approx(viewport.view_box().center(), Vec2::new(2000.0, 1500.0)));
        assert_eq!(viewport.view_box().size(), size_before);
    }

    #[test]
    fn test_click_near_corner_is_clamped() {
        let (minimap, mut viewport) = setup();
        minimap.navigate(&mut viewport, Vec2::new(199.0, 149.0));
        assert_eq!(viewport.origin(), Vec2::new(3200.0, 2400.0));
    }

    #[test]
    fn test_drag_on_view_rect_follows_pointer() {
        let (minimap, mut viewport) = setup();
        let mut nav = MiniMapNavigator::default();
        // View box 0..800 x 0..600 is 0..40 x 0..30 on the minimap.
        nav.pointer_down(&minimap, &mut viewport, Vec2::new(20.0, 15.0));
        assert!(nav.is_dragging());
        assert_eq!(viewport.origin(), Vec2::ZERO);

        nav.pointer_move(&minimap, &mut viewport, Vec2::new(60.0, 45.0));
        assert!(approx(viewport.view_box().center(), Vec2::new(1200.0, 900.0)));

        nav.pointer_up();
        nav.pointer_move(&minimap, &mut viewport, Vec2::new(100.0, 75.0));
        assert!(approx(viewport.view_box().center(), Vec2::new(1200.0, 900.0)));
    }
}
