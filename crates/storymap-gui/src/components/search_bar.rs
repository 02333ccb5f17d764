use eframe::egui;
use egui_phosphor::regular as ph;
use storymap_core::{ParagraphId, ParagraphKind};
use storymap_graph::StoryMap;

/// What the search bar asked the app to do this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAction {
    None,
    Focused(ParagraphId),
    NoMatch,
}

/// Paragraph search box with a ranked dropdown.
///
/// Ranking and selection live in the map's `SearchSession`; this only edits
/// the text buffer and mirrors the session back on screen.
#[derive(Default)]
pub struct SearchBar {
    query: String,
}

impl SearchBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, map: &mut StoryMap) -> SearchAction {
        let mut action = SearchAction::None;

        if self.query != map.search().query() {
            self.query = map.search().query().to_string();
        }

        let response = ui
            .horizontal(|ui| {
                ui.label(
                    egui::RichText::new(ph::MAGNIFYING_GLASS)
                        .color(ui.visuals().selection.bg_fill),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut self.query)
                        .hint_text("Find paragraph by number or title")
                        .desired_width(240.0),
                )
            })
            .inner;

        if response.changed() {
            map.set_search_query(self.query.clone());
        }

        if response.has_focus() {
            if ui.input(|i| i.key_pressed(egui::Key::ArrowDown)) {
                map.move_search_selection(true);
            }
            if ui.input(|i| i.key_pressed(egui::Key::ArrowUp)) {
                map.move_search_selection(false);
            }
            if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                map.set_search_query(String::new());
            }
        }
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            action = match map.select_current_search_result() {
                Some(id) => SearchAction::Focused(id),
                None if !self.query.trim().is_empty() => SearchAction::NoMatch,
                None => SearchAction::None,
            };
        }

        if map.search().show_dropdown()
            && let Some(index) = Self::dropdown(ui.ctx(), response.rect, map)
            && let Some(id) = map.select_search_result(index)
        {
            action = SearchAction::Focused(id);
        }

        if matches!(action, SearchAction::Focused(_)) {
            self.query.clear();
        }
        action
    }

    fn dropdown(ctx: &egui::Context, input_rect: egui::Rect, map: &StoryMap) -> Option<usize> {
        let search = map.search();
        let mut clicked = None;
        egui::Area::new(egui::Id::new("paragraph_search_dropdown"))
            .fixed_pos(input_rect.left_bottom())
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_min_width(input_rect.width().max(260.0));
                    for (idx, result) in search.results().iter().enumerate() {
                        let selected = idx == search.selected_index();
                        let text = format!(
                            "{} {}  {}",
                            kind_icon(result.kind),
                            result.id,
                            result.title
                        );
                        if ui.selectable_label(selected, text).clicked() {
                            clicked = Some(idx);
                        }
                    }
                });
            });
        clicked
    }
}

pub fn kind_icon(kind: ParagraphKind) -> &'static str {
    match kind {
        ParagraphKind::Normal => ph::FILE_TEXT,
        ParagraphKind::Node => ph::GIT_FORK,
        ParagraphKind::Final => ph::FLAG_CHECKERED,
    }
}
