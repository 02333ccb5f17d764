use eframe::egui;
use egui_phosphor::regular as ph;
use storymap_graph::{LinkStyle, StoryMap};

/// Toolbar requests the app handles itself; view changes are applied inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    OpenProject,
    SaveProject,
    SaveLayout,
    UploadBackdrop,
    RemoveBackdrop,
    ToggleBackdropWindow,
    SettingsChanged,
    CloseMap,
}

pub fn show(ui: &mut egui::Ui, map: &mut StoryMap, has_backdrop: bool) -> Vec<ToolbarAction> {
    let mut actions = Vec::new();
    ui.horizontal(|ui| {
        if ui.button(ph::FOLDER_OPEN).on_hover_text("Open project").clicked() {
            actions.push(ToolbarAction::OpenProject);
        }
        if ui.button(ph::FLOPPY_DISK).on_hover_text("Save project (Ctrl+S)").clicked() {
            actions.push(ToolbarAction::SaveProject);
        }
        ui.separator();

        if ui.button(ph::MAGNIFYING_GLASS_PLUS).on_hover_text("Zoom in").clicked() {
            map.zoom_in();
        }
        if ui.button(ph::MAGNIFYING_GLASS_MINUS).on_hover_text("Zoom out").clicked() {
            map.zoom_out();
        }
        if ui.button(ph::ARROW_COUNTER_CLOCKWISE).on_hover_text("Reset zoom").clicked() {
            map.reset_zoom();
        }
        if ui.button(ph::CORNERS_OUT).on_hover_text("Fit to content").clicked() {
            map.fit_to_content();
        }
        ui.label(format!("{:.0}%", map.viewport().zoom() * 100.0));
        ui.separator();

        if ui.button(format!("{} Save layout", ph::MAP_PIN)).clicked() {
            actions.push(ToolbarAction::SaveLayout);
        }

        let mut settings = map.settings().clone();
        let style_icon = match settings.line_style {
            LinkStyle::Curved => ph::BEZIER_CURVE,
            LinkStyle::Straight => ph::LINE_SEGMENT,
        };
        egui::ComboBox::from_id_salt("story_map_line_style")
            .selected_text(format!("{} {}", style_icon, settings.line_style.label()))
            .show_ui(ui, |ui| {
                for style in [LinkStyle::Curved, LinkStyle::Straight] {
                    ui.selectable_value(&mut settings.line_style, style, style.label());
                }
            });
        ui.toggle_value(&mut settings.show_minimap, ph::MAP_TRIFOLD)
            .on_hover_text("Minimap");
        ui.toggle_value(&mut settings.show_grid, ph::GRID_FOUR)
            .on_hover_text("Grid");
        if settings != *map.settings() {
            map.apply_settings(settings);
            actions.push(ToolbarAction::SettingsChanged);
        }
        ui.separator();

        if ui.button(ph::IMAGE).on_hover_text("Upload backdrop").clicked() {
            actions.push(ToolbarAction::UploadBackdrop);
        }
        if has_backdrop {
            if ui.button(ph::SLIDERS).on_hover_text("Adjust backdrop").clicked() {
                actions.push(ToolbarAction::ToggleBackdropWindow);
            }
            if ui.button(ph::IMAGE_BROKEN).on_hover_text("Remove backdrop").clicked() {
                actions.push(ToolbarAction::RemoveBackdrop);
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button(format!("{} Back to text", ph::SIGN_OUT)).clicked() {
                actions.push(ToolbarAction::CloseMap);
            }
        });
    });
    actions
}
