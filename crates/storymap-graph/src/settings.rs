use crate::geometry::Vec2;
use crate::link_path::LinkStyle;
use crate::viewport::{DEFAULT_ZOOM_MAX, DEFAULT_ZOOM_MIN};
use serde::{Deserialize, Serialize};

/// User preferences for the map view, persisted by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryMapSettings {
    pub line_style: LinkStyle,
    pub show_minimap: bool,
    pub minimap_size: Vec2,
    /// Extent of the logical canvas, in map units.
    pub map_size: Vec2,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub search_result_limit: usize,
    /// Quiet period before backdrop adjustments are re-rendered.
    pub backdrop_debounce_ms: u64,
    pub show_grid: bool,
    /// Save the whole layout after every committed drag.
    pub autosave_layout: bool,
}

impl Default for StoryMapSettings {
    fn default() -> Self {
        Self {
            line_style: LinkStyle::Curved,
            show_minimap: true,
            minimap_size: Vec2::new(200.0, 150.0),
            map_size: Vec2::new(4000.0, 3000.0),
            zoom_min: DEFAULT_ZOOM_MIN,
            zoom_max: DEFAULT_ZOOM_MAX,
            search_result_limit: 5,
            backdrop_debounce_ms: 250,
            show_grid: true,
            autosave_layout: false,
        }
    }
}
