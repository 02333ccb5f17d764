use super::minimap::MiniMapOverlay;
use super::palette::MapPalette;
use eframe::egui::{self, Color32, Pos2, Sense, Stroke};
use egui::epaint::CubicBezierShape;
use egui_phosphor::regular as ph;
use storymap_graph::{CubicBezier, GestureState, HitResult, Node, Rect, StoryMap, Vec2};

/// Grid spacing in map units.
const GRID_STEP: f32 = 100.0;
/// Wheel delta (points) that doubles or halves the zoom.
const WHEEL_ZOOM_SPEED: f32 = 1.0 / 400.0;
const PREVIEW_SAMPLES: usize = 24;

pub fn to_pos(v: Vec2) -> Pos2 {
    Pos2::new(v.x, v.y)
}

pub fn to_vec(p: Pos2) -> Vec2 {
    Vec2::new(p.x, p.y)
}

pub fn to_rect(r: Rect) -> egui::Rect {
    egui::Rect::from_min_max(to_pos(r.min), to_pos(r.max))
}

/// The rendered backdrop texture and the map-space area it covers.
pub struct BackdropTexture<'a> {
    pub texture: &'a egui::TextureHandle,
    pub map_size: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressTarget {
    Map,
    MiniMap,
}

/// Paints the map and routes pointer input into `StoryMap`.
#[derive(Default)]
pub struct MapCanvas {
    press: Option<PressTarget>,
    minimap: MiniMapOverlay,
}

impl MapCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one frame; returns the canvas rect in window coordinates.
    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        map: &mut StoryMap,
        backdrop: Option<BackdropTexture<'_>>,
    ) -> egui::Rect {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        let origin = rect.min;
        let local = |p: Pos2| to_vec(p) - to_vec(origin);
        map.resize(Vec2::new(rect.width(), rect.height()));

        let minimap_rect = self.minimap.rect_in(rect, map);
        self.handle_input(ui, &response, map, minimap_rect, local);

        let palette = MapPalette::from_visuals(ui.visuals());
        painter.rect_filled(rect, 0.0, palette.background);
        if let Some(backdrop) = backdrop {
            draw_backdrop(&painter, map, origin, &backdrop);
        }
        if map.settings().show_grid {
            draw_grid(&painter, map, origin, &palette);
        }
        draw_links(&painter, map, origin, &palette);
        draw_preview(&painter, map, origin, &palette);
        for node in map.visible_nodes() {
            draw_node(&painter, map, node, origin, &palette);
        }
        if let Some(mini_rect) = minimap_rect {
            self.minimap.paint(&painter, mini_rect, map, &palette);
        }

        let cursor = match map.gesture() {
            GestureState::DraggingNode { .. } | GestureState::Panning { .. } => {
                Some(egui::CursorIcon::Grabbing)
            }
            GestureState::Linking { .. } => Some(egui::CursorIcon::Crosshair),
            GestureState::Idle => response.hover_pos().and_then(|p| match map.hit_at(local(p)) {
                HitResult::Connector(_) => Some(egui::CursorIcon::Crosshair),
                HitResult::Node(_) => Some(egui::CursorIcon::Grab),
                HitResult::None => None,
            }),
        };
        if let Some(icon) = cursor {
            ui.ctx().set_cursor_icon(icon);
        }
        rect
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        map: &mut StoryMap,
        minimap_rect: Option<egui::Rect>,
        local: impl Fn(Pos2) -> Vec2,
    ) {
        let (pressed, released, pointer) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
            )
        });
        let mini_local = |p: Pos2| minimap_rect.map(|r| to_vec(p) - to_vec(r.min));

        if pressed
            && response.hovered()
            && let Some(pos) = pointer
        {
            match (minimap_rect, mini_local(pos)) {
                (Some(r), Some(mini)) if r.contains(pos) => {
                    self.press = Some(PressTarget::MiniMap);
                    map.minimap_pointer_down(mini);
                }
                _ => {
                    self.press = Some(PressTarget::Map);
                    map.pointer_down(local(pos));
                }
            }
        }

        if let Some(pos) = pointer {
            match self.press {
                Some(PressTarget::Map) => map.pointer_move(local(pos)),
                Some(PressTarget::MiniMap) => {
                    if let Some(mini) = mini_local(pos) {
                        map.minimap_pointer_move(mini);
                    }
                }
                None if response.hovered() => map.pointer_move(local(pos)),
                None => {}
            }
        }

        if released {
            match self.press.take() {
                Some(PressTarget::Map) => {
                    let at = pointer.map(&local).unwrap_or_else(|| map.viewport().screen_center());
                    map.pointer_up(at);
                }
                Some(PressTarget::MiniMap) => map.minimap_pointer_up(),
                None => {}
            }
        }

        if response.secondary_clicked()
            && let Some(pos) = response.interact_pointer_pos()
            && !minimap_rect.is_some_and(|r| r.contains(pos))
        {
            map.open_context_menu(local(pos));
        }

        if response.hovered()
            && let Some(pos) = response.hover_pos()
        {
            let (zoom_delta, scroll) = ui.input(|i| (i.zoom_delta(), i.smooth_scroll_delta.y));
            let factor = zoom_delta * (scroll * WHEEL_ZOOM_SPEED).exp2();
            if (factor - 1.0).abs() > f32::EPSILON {
                map.zoom_at(local(pos), factor);
            }
        }
    }
}

fn screen(map: &StoryMap, origin: Pos2, p: Vec2) -> Pos2 {
    origin + to_pos(map.viewport().to_screen(p)).to_vec2()
}

fn screen_rect(map: &StoryMap, origin: Pos2, r: Rect) -> egui::Rect {
    to_rect(map.viewport().rect_to_screen(r)).translate(origin.to_vec2())
}

fn draw_backdrop(painter: &egui::Painter, map: &StoryMap, origin: Pos2, backdrop: &BackdropTexture<'_>) {
    let area = Rect::from_pos_size(Vec2::ZERO, backdrop.map_size);
    let uv = egui::Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
    painter.image(
        backdrop.texture.id(),
        screen_rect(map, origin, area),
        uv,
        Color32::WHITE,
    );
}

fn draw_grid(painter: &egui::Painter, map: &StoryMap, origin: Pos2, palette: &MapPalette) {
    let view = map.viewport().view_box();
    // Skip the grid once lines would be closer than a few pixels.
    if GRID_STEP * map.viewport().zoom() < 8.0 {
        return;
    }
    let stroke = Stroke::new(1.0, palette.grid);
    let mut x = (view.min.x / GRID_STEP).ceil() * GRID_STEP;
    while x <= view.max.x {
        let top = screen(map, origin, Vec2::new(x, view.min.y));
        let bottom = screen(map, origin, Vec2::new(x, view.max.y));
        painter.line_segment([top, bottom], stroke);
        x += GRID_STEP;
    }
    let mut y = (view.min.y / GRID_STEP).ceil() * GRID_STEP;
    while y <= view.max.y {
        let left = screen(map, origin, Vec2::new(view.min.x, y));
        let right = screen(map, origin, Vec2::new(view.max.x, y));
        painter.line_segment([left, right], stroke);
        y += GRID_STEP;
    }
}

fn curve_to_screen(map: &StoryMap, origin: Pos2, curve: &CubicBezier) -> [Pos2; 4] {
    curve.points().map(|p| screen(map, origin, p))
}

fn draw_links(painter: &egui::Painter, map: &StoryMap, origin: Pos2, palette: &MapPalette) {
    let view = map.viewport().view_box();
    let width = (2.0 * map.viewport().zoom()).clamp(1.0, 4.0);
    for (link, curve) in map.link_paths() {
        let bounds = Rect::from_min_max(curve.start, curve.start)
            .union(&Rect::from_min_max(curve.end, curve.end))
            .expand(300.0);
        if !bounds.intersects(&view) {
            continue;
        }
        let color = if link.is_highlighted {
            palette.link_highlighted
        } else {
            palette.link
        };
        let points = curve_to_screen(map, origin, &curve);
        painter.add(CubicBezierShape::from_points_stroke(
            points,
            false,
            Color32::TRANSPARENT,
            Stroke::new(width, color),
        ));
        draw_arrow_head(painter, points[2], points[3], width * 4.0, color);
    }
}

fn draw_arrow_head(painter: &egui::Painter, from: Pos2, tip: Pos2, size: f32, color: Color32) {
    let dir = (tip - from).normalized();
    if !dir.x.is_finite() || !dir.y.is_finite() {
        return;
    }
    let normal = egui::vec2(-dir.y, dir.x);
    let back = tip - dir * size;
    painter.add(egui::Shape::convex_polygon(
        vec![tip, back + normal * size * 0.5, back - normal * size * 0.5],
        color,
        Stroke::NONE,
    ));
}

fn draw_preview(painter: &egui::Painter, map: &StoryMap, origin: Pos2, palette: &MapPalette) {
    let Some(curve) = map.link_preview() else {
        return;
    };
    let points: Vec<Pos2> = (0..=PREVIEW_SAMPLES)
        .map(|i| screen(map, origin, curve.sample(i as f32 / PREVIEW_SAMPLES as f32)))
        .collect();
    painter.extend(egui::Shape::dashed_line(
        &points,
        Stroke::new(2.0, palette.link_highlighted),
        8.0,
        6.0,
    ));
}

fn draw_node(painter: &egui::Painter, map: &StoryMap, node: &Node, origin: Pos2, palette: &MapPalette) {
    let zoom = map.viewport().zoom();
    let rect = screen_rect(map, origin, node.rect());
    let selected = map.selected() == Some(node.id);
    let hovered = map.hovered() == Some(node.id);
    let corner = 6.0 * zoom;

    let fill = palette.node_fill(node.kind, hovered);
    painter.rect_filled(rect, corner, fill);
    let border = if selected {
        Stroke::new(2.5, palette.selection)
    } else {
        Stroke::new(1.0, palette.node_border)
    };
    painter.rect_stroke(rect, corner, border, egui::StrokeKind::Middle);

    if zoom >= 0.35 {
        let font = egui::FontId::proportional((13.0 * zoom).clamp(6.0, 28.0));
        let padding = egui::vec2(8.0, 6.0) * zoom;
        painter.text(
            rect.min + padding,
            egui::Align2::LEFT_TOP,
            format!("{}", node.id),
            font.clone(),
            palette.node_text,
        );
        let title = elide(&node.title, (node.size().x / 8.0) as usize);
        painter.text(
            rect.left_bottom() + egui::vec2(padding.x, -padding.y),
            egui::Align2::LEFT_BOTTOM,
            title,
            font.clone(),
            palette.node_text,
        );
        if node.locked {
            painter.text(
                rect.right_top() + egui::vec2(-padding.x, padding.y),
                egui::Align2::RIGHT_TOP,
                ph::LOCK_SIMPLE,
                font,
                palette.node_text,
            );
        }
    }

    let connector = screen(map, origin, node.connector());
    let radius = storymap_graph::model::CONNECTOR_RADIUS * zoom;
    painter.circle_filled(connector, radius, palette.connector);
    painter.circle_stroke(connector, radius, Stroke::new(1.0, palette.node_border));
}

fn elide(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}
