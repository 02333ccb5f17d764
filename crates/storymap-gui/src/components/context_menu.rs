use super::search_bar::kind_icon;
use eframe::egui;
use egui_phosphor::regular as ph;
use storymap_core::{ParagraphKind, StoryMapError};
use storymap_graph::{ContextMenu, StoryMap};

/// One button press or field commit inside the popover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    CommitNumber,
    CommitTitle,
    ToggleLocked,
    SetKind(ParagraphKind),
    Edit,
    AddNote,
    AddLinked,
    Delete,
    AddNodeHere,
    Close,
}

/// Draws the open popover anchored at its screen point.
///
/// Returns a renumber error for the caller to surface; the field has already
/// been reverted by then.
pub fn show(ctx: &egui::Context, canvas: egui::Rect, map: &mut StoryMap) -> Option<StoryMapError> {
    let anchor = map.menu().anchor()?;
    let pos = canvas.min + egui::vec2(anchor.x, anchor.y);
    let mut actions = Vec::new();

    let area = egui::Area::new(egui::Id::new("story_map_context_menu"))
        .fixed_pos(pos)
        .order(egui::Order::Foreground)
        .constrain_to(canvas)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(260.0);
                match map.menu_mut() {
                    ContextMenu::Closed => {}
                    ContextMenu::Canvas { .. } => {
                        if ui.button(format!("{} Add paragraph here", ph::PLUS)).clicked() {
                            actions.push(MenuAction::AddNodeHere);
                        }
                    }
                    ContextMenu::Node(inspector) => {
                        ui.horizontal(|ui| {
                            ui.label("Number");
                            let number = ui.add(
                                egui::TextEdit::singleline(&mut inspector.number_field)
                                    .desired_width(60.0),
                            );
                            if number.lost_focus() {
                                actions.push(MenuAction::CommitNumber);
                            }
                        });
                        ui.horizontal(|ui| {
                            ui.label("Title");
                            let title = ui.text_edit_singleline(&mut inspector.title_field);
                            if title.lost_focus() {
                                actions.push(MenuAction::CommitTitle);
                            }
                        });

                        let mut locked = inspector.locked;
                        if ui
                            .checkbox(&mut locked, format!("{} Locked", ph::LOCK_SIMPLE))
                            .changed()
                        {
                            actions.push(MenuAction::ToggleLocked);
                        }

                        let mut kind = inspector.kind;
                        ui.horizontal(|ui| {
                            for option in ParagraphKind::ALL {
                                let label = format!("{} {}", kind_icon(option), option.label());
                                if ui.selectable_value(&mut kind, option, label).changed() {
                                    actions.push(MenuAction::SetKind(option));
                                }
                            }
                        });

                        ui.separator();
                        ui.horizontal(|ui| {
                            ui.add(
                                egui::TextEdit::singleline(&mut inspector.note_field)
                                    .hint_text("Note")
                                    .desired_width(180.0),
                            );
                            if ui.button(ph::NOTE_PENCIL).on_hover_text("Add note").clicked() {
                                actions.push(MenuAction::AddNote);
                            }
                        });

                        ui.separator();
                        if ui.button(format!("{} Edit text", ph::PENCIL_SIMPLE)).clicked() {
                            actions.push(MenuAction::Edit);
                        }
                        if ui.button(format!("{} Add linked paragraph", ph::LINK)).clicked() {
                            actions.push(MenuAction::AddLinked);
                        }
                        if ui.button(format!("{} Delete", ph::TRASH)).clicked() {
                            actions.push(MenuAction::Delete);
                        }
                    }
                }
                if ui.small_button(format!("{} Close", ph::X)).clicked() {
                    actions.push(MenuAction::Close);
                }
            });
        });

    let outside_click = ctx.input(|i| {
        i.pointer.any_pressed()
            && i.pointer
                .interact_pos()
                .is_some_and(|p| !area.response.rect.contains(p) && !canvas.contains(p))
    });
    if outside_click {
        actions.push(MenuAction::Close);
    }

    let mut error = None;
    for action in actions {
        match action {
            MenuAction::CommitNumber => {
                if let Err(err) = map.menu_commit_number() {
                    error = Some(err);
                }
            }
            MenuAction::CommitTitle => map.menu_commit_title(),
            MenuAction::ToggleLocked => map.menu_toggle_locked(),
            MenuAction::SetKind(kind) => map.menu_set_kind(kind),
            MenuAction::Edit => map.menu_edit(),
            MenuAction::AddNote => map.menu_add_note(),
            MenuAction::AddLinked => map.menu_add_linked(),
            MenuAction::Delete => map.menu_delete(),
            MenuAction::AddNodeHere => map.menu_add_node_here(),
            MenuAction::Close => map.menu_mut().close(),
        }
    }
    error
}
