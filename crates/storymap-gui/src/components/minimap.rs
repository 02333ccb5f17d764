use super::canvas::{to_pos, to_rect};
use super::palette::MapPalette;
use eframe::egui::{self, Stroke};
use storymap_graph::StoryMap;

/// Distance between the minimap and the canvas corner.
const MARGIN: f32 = 12.0;

/// Bottom-right overview panel drawn over the canvas.
#[derive(Default)]
pub struct MiniMapOverlay;

impl MiniMapOverlay {
    /// Where the panel sits inside `canvas`, or `None` when hidden.
    pub fn rect_in(&self, canvas: egui::Rect, map: &StoryMap) -> Option<egui::Rect> {
        if !map.settings().show_minimap {
            return None;
        }
        let size = map.minimap()?.size();
        let size = egui::vec2(size.x, size.y);
        let min = canvas.max - size - egui::vec2(MARGIN, MARGIN);
        (min.x >= canvas.min.x && min.y >= canvas.min.y)
            .then(|| egui::Rect::from_min_size(min, size))
    }

    pub fn paint(&self, painter: &egui::Painter, rect: egui::Rect, map: &StoryMap, palette: &MapPalette) {
        let Some(minimap) = map.minimap() else {
            return;
        };
        let offset = rect.min.to_vec2();
        painter.rect_filled(rect, 5.0, palette.minimap_background);
        painter.rect_stroke(
            rect,
            5.0,
            Stroke::new(1.0, palette.node_border),
            egui::StrokeKind::Middle,
        );
        let content = to_rect(minimap.content_rect()).translate(offset);
        painter.rect_stroke(
            content,
            0.0,
            Stroke::new(1.0, palette.grid),
            egui::StrokeKind::Inside,
        );

        for link in &map.graph().links {
            let (Some(source), Some(target)) =
                (map.graph().node(link.source), map.graph().node(link.target))
            else {
                continue;
            };
            let a = to_pos(minimap.to_mini(source.rect().center())) + offset;
            let b = to_pos(minimap.to_mini(target.rect().center())) + offset;
            painter.line_segment([a, b], Stroke::new(0.5, palette.link));
        }
        for node in &map.graph().nodes {
            let r = to_rect(minimap.rect_to_mini(node.rect())).translate(offset);
            // Keep tiny nodes visible at high compression.
            let r = egui::Rect::from_center_size(r.center(), r.size().max(egui::vec2(2.0, 2.0)));
            painter.rect_filled(r, 0.0, palette.node_fill(node.kind, false));
        }

        let view = to_rect(minimap.view_rect(map.viewport()))
            .translate(offset)
            .intersect(rect);
        painter.rect_stroke(
            view,
            0.0,
            Stroke::new(1.5, palette.minimap_view),
            egui::StrokeKind::Middle,
        );
    }
}
