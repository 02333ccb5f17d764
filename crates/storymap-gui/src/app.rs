use crate::components::backdrop::{BackdropLayer, IMAGE_EXTENSIONS};
use crate::components::canvas::MapCanvas;
use crate::components::context_menu;
use crate::components::notifications::NotificationManager;
use crate::components::search_bar::{SearchAction, SearchBar};
use crate::components::toolbar::{self, ToolbarAction};
use crate::settings::AppSettings;
use anyhow::{Context, Result};
use eframe::egui;
use egui_phosphor::regular as ph;
use std::path::PathBuf;
use std::time::Duration;
use storymap_events::{ParagraphStore, SnapshotFeed, SyncBridge};
use storymap_graph::{StoryMap, Vec2};
use storymap_project::{InMemoryStore, Project};

const INITIAL_SCREEN: Vec2 = Vec2::new(1280.0, 720.0);

/// One open map: the store that owns the paragraphs and the view over it.
struct MapSession {
    bridge: SyncBridge,
    feed: SnapshotFeed,
    store: InMemoryStore,
    map: StoryMap,
    needs_fit: bool,
}

impl MapSession {
    fn new(store: InMemoryStore, settings: &AppSettings) -> Self {
        let bridge = SyncBridge::new();
        let feed = bridge.feed();
        let mut map = StoryMap::new(bridge.bus(), settings.story_map.clone(), INITIAL_SCREEN);
        map.load(store.paragraphs().to_vec(), store.map_settings().clone());
        Self {
            bridge,
            feed,
            store,
            map,
            needs_fit: true,
        }
    }
}

pub struct StoryMapApp {
    settings: AppSettings,
    project_name: String,
    project_path: Option<PathBuf>,
    session: MapSession,
    canvas: MapCanvas,
    search_bar: SearchBar,
    backdrop: BackdropLayer,
    notifications: NotificationManager,
}

impl StoryMapApp {
    pub fn new(cc: &eframe::CreationContext<'_>, project: Option<PathBuf>) -> Self {
        let settings = AppSettings::load();
        cc.egui_ctx.set_pixels_per_point(settings.ui_scale);
        cc.egui_ctx.set_visuals(if settings.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let debounce = Duration::from_millis(settings.story_map.backdrop_debounce_ms);
        let mut notifications = NotificationManager::new();
        notifications.enabled = settings.notifications.enabled;
        let session = MapSession::new(InMemoryStore::default(), &settings);

        let mut app = Self {
            settings,
            project_name: String::from("Untitled"),
            project_path: None,
            session,
            canvas: MapCanvas::new(),
            search_bar: SearchBar::new(),
            backdrop: BackdropLayer::new(debounce),
            notifications,
        };
        if let Some(path) = project.or_else(|| app.settings.startup_project()) {
            app.open_project(path);
        }
        app
    }

    fn open_project(&mut self, path: PathBuf) {
        match Project::load(&path) {
            Ok(project) => {
                self.project_name = project.file.name.clone();
                let (store, path) = project.into_store();
                self.session = MapSession::new(store, &self.settings);
                self.settings.remember_project(&path);
                self.project_path = Some(path);
            }
            Err(e) => {
                tracing::error!("Failed to open project: {:#}", e);
                self.notifications.error(format!("Could not open project: {e:#}"));
            }
        }
    }

    fn save_project(&mut self) -> Result<()> {
        let path = match &self.project_path {
            Some(path) => path.clone(),
            None => match rfd::FileDialog::new()
                .add_filter("Story project", &["json"])
                .set_file_name("story.json")
                .save_file()
            {
                Some(path) => path,
                None => return Ok(()),
            },
        };
        Project::from_store(self.project_name.clone(), &self.session.store, path.clone())
            .save()
            .context("saving project")?;
        self.session.store.mark_saved();
        self.settings.remember_project(&path);
        self.project_path = Some(path);
        self.notifications.success("Project saved");
        Ok(())
    }

    fn save_if_dirty(&mut self) {
        if self.session.store.is_dirty()
            && self.project_path.is_some()
            && let Err(e) = self.save_project()
        {
            tracing::error!("Autosave failed: {:#}", e);
            self.notifications.error(format!("{e:#}"));
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let map = &mut self.session.map;
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            map.escape();
        }
        if !ctx.wants_keyboard_input()
            && ctx.input(|i| i.key_pressed(egui::Key::Delete))
        {
            map.delete_selected();
        }
        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::S))
            && let Err(e) = self.save_project()
        {
            self.notifications.error(format!("{e:#}"));
        }
    }

    fn handle_toolbar(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::OpenProject => {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Story project", &["json"])
                    .pick_file()
                {
                    self.save_if_dirty();
                    self.open_project(path);
                }
            }
            ToolbarAction::SaveProject => {
                if let Err(e) = self.save_project() {
                    self.notifications.error(format!("{e:#}"));
                }
            }
            ToolbarAction::SaveLayout => {
                self.session.map.save_layout();
                self.notifications.info("Layout saved");
            }
            ToolbarAction::UploadBackdrop => {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Images", &IMAGE_EXTENSIONS)
                    .pick_file()
                    && let Err(e) = self.backdrop.upload(&path, &mut self.session.map)
                {
                    tracing::warn!("Backdrop upload failed: {:#}", e);
                    self.notifications.warning(format!("{e:#}"));
                }
            }
            ToolbarAction::RemoveBackdrop => self.backdrop.remove(&mut self.session.map),
            ToolbarAction::ToggleBackdropWindow => {
                self.backdrop.window_open = !self.backdrop.window_open;
            }
            ToolbarAction::SettingsChanged => {
                self.settings.story_map = self.session.map.settings().clone();
            }
            ToolbarAction::CloseMap => self.session.map.close(),
        }
    }

    /// Deliver this frame's events to the store and the fresh snapshot back.
    fn sync_store(&mut self, ctx: &egui::Context) {
        let session = &mut self.session;
        let report = session.bridge.flush(&mut session.store);
        if let Some(paragraphs) = session.feed.take_latest() {
            session.map.replace_paragraphs(&paragraphs);
        }
        if report.settings_changed {
            session.map.set_map_settings(session.store.map_settings().clone());
        }
        for err in &report.rejected {
            self.notifications.warning(err.to_string());
        }
        if self.settings.notifications.show_edit_requests {
            for id in session.store.take_edit_requests() {
                self.notifications
                    .info(format!("Paragraph {id} opened in the text editor"));
            }
        }
        if report.closed {
            self.save_if_dirty();
        }
        if report.applied > 0 {
            ctx.request_repaint();
        }
    }

    fn closed_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 3.0);
                ui.heading(&self.project_name);
                ui.label(format!("{} paragraphs", self.session.store.paragraphs().len()));
                if ui.button(format!("{} Reopen story map", ph::MAP_TRIFOLD)).clicked() {
                    self.session.store.reopen();
                    let store = std::mem::take(&mut self.session.store);
                    self.session = MapSession::new(store, &self.settings);
                }
            });
        });
    }
}

impl eframe::App for StoryMapApp {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.story_map = self.session.map.settings().clone();
        self.settings.save();
        self.save_if_dirty();
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.session.map.is_closed() {
            self.closed_view(ctx);
            self.notifications.show(ctx);
            return;
        }

        self.backdrop
            .set_debounce(Duration::from_millis(self.settings.story_map.backdrop_debounce_ms));
        if let Err(e) = self.backdrop.sync(ctx, &mut self.session.map) {
            self.notifications.warning(format!("Backdrop ignored: {e}"));
        }
        self.handle_shortcuts(ctx);

        let mut toolbar_actions = Vec::new();
        egui::TopBottomPanel::top("story_map_toolbar").show(ctx, |ui| {
            toolbar_actions =
                toolbar::show(ui, &mut self.session.map, self.backdrop.has_image());
            match self.search_bar.ui(ui, &mut self.session.map) {
                SearchAction::Focused(id) => tracing::debug!(%id, "search focused node"),
                SearchAction::NoMatch => self.notifications.info("No matching paragraph"),
                SearchAction::None => {}
            }
        });
        for action in toolbar_actions {
            self.handle_toolbar(action);
        }

        let mut canvas_rect = egui::Rect::NOTHING;
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let texture = self.backdrop.texture(self.session.map.map_settings());
                canvas_rect = self.canvas.ui(ui, &mut self.session.map, texture);
            });
        if self.session.needs_fit && canvas_rect.is_positive() {
            self.session.map.fit_to_content();
            self.session.needs_fit = false;
        }
        if let Some(err) = context_menu::show(ctx, canvas_rect, &mut self.session.map) {
            self.notifications.warning(err.to_string());
        }
        if self.backdrop.window_open {
            self.backdrop.window(ctx);
        }

        self.sync_store(ctx);
        self.notifications.show(ctx);
    }
}
