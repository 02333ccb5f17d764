use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Filters applied to the optional map backdrop.
///
/// Percent-valued fields follow CSS filter conventions: `contrast` and
/// `brightness` are neutral at 100, `transparency`, `black_and_white` and
/// `sharpness` are neutral at 0. `width`/`height` are the rendered size in
/// map units; 0 means "use the image's own size".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageAdjustments {
    pub contrast: f32,
    pub transparency: f32,
    pub black_and_white: f32,
    pub sharpness: f32,
    pub brightness: f32,
    pub width: f32,
    pub height: f32,
    pub maintain_aspect_ratio: bool,
    /// Width / height of the source image, captured once when it is uploaded.
    pub original_aspect_ratio: Option<f32>,
}

impl Default for ImageAdjustments {
    fn default() -> Self {
        Self {
            contrast: 100.0,
            transparency: 0.0,
            black_and_white: 0.0,
            sharpness: 0.0,
            brightness: 100.0,
            width: 0.0,
            height: 0.0,
            maintain_aspect_ratio: true,
            original_aspect_ratio: None,
        }
    }
}

impl ImageAdjustments {
    /// True when every filter is at its neutral value.
    pub fn is_neutral(&self) -> bool {
        let neutral = Self::default();
        self.contrast == neutral.contrast
            && self.transparency == neutral.transparency
            && self.black_and_white == neutral.black_and_white
            && self.sharpness == neutral.sharpness
            && self.brightness == neutral.brightness
    }

    /// Set the width, recomputing the height when the aspect ratio is locked.
    pub fn set_width(&mut self, width: f32) {
        self.width = width.max(0.0);
        if self.maintain_aspect_ratio
            && let Some(ratio) = self.original_aspect_ratio.filter(|r| *r > 0.0)
        {
            self.height = (self.width / ratio).round();
        }
    }

    /// Set the height, recomputing the width when the aspect ratio is locked.
    pub fn set_height(&mut self, height: f32) {
        self.height = height.max(0.0);
        if self.maintain_aspect_ratio
            && let Some(ratio) = self.original_aspect_ratio.filter(|r| *r > 0.0)
        {
            self.width = (self.height * ratio).round();
        }
    }
}

/// Legacy per-project position record, keyed by stringified paragraph id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegacyPosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapSettings {
    /// Backdrop as a `data:` URI.
    pub background_image: Option<String>,
    pub image_adjustments: ImageAdjustments,
    /// Only read once to migrate old projects into per-paragraph x/y.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub positions: BTreeMap<String, LegacyPosition>,
}

impl MapSettings {
    pub fn has_legacy_positions(&self) -> bool {
        !self.positions.is_empty()
    }
}
