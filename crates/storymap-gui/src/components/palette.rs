use eframe::egui::{Color32, Visuals};
use storymap_core::ParagraphKind;

/// Colours for the map, derived from the active egui visuals.
#[derive(Debug, Clone, Copy)]
pub struct MapPalette {
    pub background: Color32,
    pub grid: Color32,
    pub link: Color32,
    pub link_highlighted: Color32,
    pub node_normal: Color32,
    pub node_branch: Color32,
    pub node_final: Color32,
    pub node_border: Color32,
    pub node_text: Color32,
    pub selection: Color32,
    pub connector: Color32,
    pub minimap_background: Color32,
    pub minimap_view: Color32,
}

impl MapPalette {
    pub fn from_visuals(visuals: &Visuals) -> Self {
        if visuals.dark_mode {
            Self {
                background: Color32::from_rgb(30, 30, 46),
                grid: Color32::from_rgb(49, 50, 68),
                link: Color32::from_rgb(108, 112, 134),
                link_highlighted: Color32::from_rgb(249, 226, 175),
                node_normal: Color32::from_rgb(69, 71, 90),
                node_branch: Color32::from_rgb(30, 102, 245),
                node_final: Color32::from_rgb(166, 227, 161),
                node_border: Color32::from_rgb(147, 153, 178),
                node_text: Color32::from_rgb(205, 214, 244),
                selection: visuals.selection.stroke.color,
                connector: Color32::from_rgb(137, 180, 250),
                minimap_background: Color32::from_black_alpha(180),
                minimap_view: Color32::from_rgb(243, 139, 168),
            }
        } else {
            Self {
                background: Color32::from_rgb(239, 241, 245),
                grid: Color32::from_rgb(220, 224, 232),
                link: Color32::from_rgb(140, 143, 161),
                link_highlighted: Color32::from_rgb(223, 142, 29),
                node_normal: Color32::from_rgb(204, 208, 218),
                node_branch: Color32::from_rgb(114, 135, 253),
                node_final: Color32::from_rgb(64, 160, 43),
                node_border: Color32::from_rgb(92, 95, 119),
                node_text: Color32::from_rgb(76, 79, 105),
                selection: visuals.selection.stroke.color,
                connector: Color32::from_rgb(30, 102, 245),
                minimap_background: Color32::from_white_alpha(200),
                minimap_view: Color32::from_rgb(210, 15, 57),
            }
        }
    }

    pub fn node_fill(&self, kind: ParagraphKind, hovered: bool) -> Color32 {
        let base = match kind {
            ParagraphKind::Normal => self.node_normal,
            ParagraphKind::Node => self.node_branch,
            ParagraphKind::Final => self.node_final,
        };
        if hovered { base.gamma_multiply(1.2) } else { base }
    }
}
