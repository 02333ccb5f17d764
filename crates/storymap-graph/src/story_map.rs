use crate::context_menu::ContextMenu;
use crate::geometry::{CubicBezier, Vec2};
use crate::hit_tester::{HitResult, HitTester};
use crate::interaction::{GestureCommit, GestureContext, GestureState, InteractionController};
use crate::link_path::{link_curve, preview_curve};
use crate::migration::migrate_legacy_positions;
use crate::minimap::{MiniMap, MiniMapNavigator};
use crate::model::{Link, Node, StoryGraph, derive_graph};
use crate::settings::StoryMapSettings;
use crate::viewport::Viewport;
use storymap_core::{ImageAdjustments, MapSettings, Paragraph, ParagraphId, Result};
use storymap_events::{Event, EventBus, NodePlacement};
use storymap_search::{SearchSession, Searchable};

/// Padding around the nodes for fit-to-content, in map units.
const FIT_PADDING: f32 = 40.0;

impl Searchable for Node {
    fn search_id(&self) -> ParagraphId {
        self.id
    }

    fn search_title(&self) -> &str {
        &self.title
    }

    fn search_kind(&self) -> storymap_core::ParagraphKind {
        self.kind
    }
}

/// One open Story Map: derived graph, view state, gestures and popovers.
///
/// Reads paragraph snapshots in, publishes mutation intents on the bus. It
/// never edits canonical data itself.
pub struct StoryMap {
    graph: StoryGraph,
    hits: HitTester,
    viewport: Viewport,
    minimap: Option<MiniMap>,
    navigator: MiniMapNavigator,
    controller: InteractionController,
    menu: ContextMenu,
    search: SearchSession,
    settings: StoryMapSettings,
    map_settings: MapSettings,
    bus: EventBus,
    loaded: bool,
    closed: bool,
}

impl StoryMap {
    pub fn new(bus: EventBus, settings: StoryMapSettings, screen_size: Vec2) -> Self {
        let viewport = Viewport::new(settings.map_size, screen_size)
            .with_zoom_bounds(settings.zoom_min, settings.zoom_max);
        let minimap = build_minimap(&settings);
        Self {
            graph: StoryGraph::default(),
            hits: HitTester::default(),
            viewport,
            minimap,
            navigator: MiniMapNavigator::default(),
            controller: InteractionController::default(),
            menu: ContextMenu::default(),
            search: SearchSession::new(settings.search_result_limit),
            settings,
            map_settings: MapSettings::default(),
            bus,
            loaded: false,
            closed: false,
        }
    }

    /// First load. Legacy positions are migrated once and the result sent back.
    pub fn load(&mut self, paragraphs: Vec<Paragraph>, map_settings: MapSettings) {
        let (paragraphs, map_settings) = if self.loaded {
            (paragraphs, map_settings)
        } else {
            self.loaded = true;
            match migrate_legacy_positions(&paragraphs, &map_settings) {
                Some(migration) => {
                    self.bus.publish(Event::UpdateParagraphs {
                        paragraphs: migration.paragraphs.clone(),
                    });
                    self.bus.publish(Event::UpdateMapSettings {
                        settings: migration.settings.clone(),
                    });
                    (migration.paragraphs, migration.settings)
                }
                None => (paragraphs, map_settings),
            }
        };
        self.map_settings = map_settings;
        self.replace_paragraphs(&paragraphs);
    }

    /// Rebuild nodes and links from a fresh snapshot.
    ///
    /// Runs to completion before any further pointer input is handled.
    pub fn replace_paragraphs(&mut self, paragraphs: &[Paragraph]) {
        self.graph = derive_graph(paragraphs, self.controller.selected());
        self.hits.rebuild(&self.graph);
        self.controller.reconcile(&mut self.graph, &mut self.hits);
        self.graph.set_selected(self.controller.selected());
        self.menu.reconcile(&self.graph);
        self.search.refresh(&self.graph.nodes);
        tracing::debug!(
            nodes = self.graph.nodes.len(),
            links = self.graph.links.len(),
            "story map rebuilt"
        );
    }

    pub fn set_map_settings(&mut self, map_settings: MapSettings) {
        self.map_settings = map_settings;
    }

    pub fn apply_settings(&mut self, settings: StoryMapSettings) {
        self.viewport.set_map_size(settings.map_size);
        self.viewport.set_zoom_bounds(settings.zoom_min, settings.zoom_max);
        self.minimap = build_minimap(&settings);
        if settings.search_result_limit != self.settings.search_result_limit {
            self.search = SearchSession::new(settings.search_result_limit);
        }
        self.settings = settings;
    }

    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn minimap(&self) -> Option<&MiniMap> {
        self.minimap.as_ref()
    }

    pub fn gesture(&self) -> &GestureState {
        self.controller.state()
    }

    pub fn selected(&self) -> Option<ParagraphId> {
        self.controller.selected()
    }

    pub fn hovered(&self) -> Option<ParagraphId> {
        self.controller.hovered()
    }

    pub fn menu(&self) -> &ContextMenu {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut ContextMenu {
        &mut self.menu
    }

    pub fn search(&self) -> &SearchSession {
        &self.search
    }

    pub fn settings(&self) -> &StoryMapSettings {
        &self.settings
    }

    pub fn map_settings(&self) -> &MapSettings {
        &self.map_settings
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn resize(&mut self, screen_size: Vec2) {
        self.viewport.set_screen_size(screen_size);
    }

    fn gesture_ctx(&mut self) -> (&mut InteractionController, GestureContext<'_>) {
        (
            &mut self.controller,
            GestureContext {
                graph: &mut self.graph,
                hits: &mut self.hits,
                viewport: &mut self.viewport,
            },
        )
    }

    fn sync_selection(&mut self, before: Option<ParagraphId>) {
        let now = self.controller.selected();
        if now != before {
            self.graph.set_selected(now);
        }
    }

    // Pointer input, screen coordinates relative to the canvas.

    pub fn pointer_down(&mut self, screen: Vec2) {
        if self.closed {
            return;
        }
        self.menu.close();
        let before = self.controller.selected();
        let (controller, ctx) = self.gesture_ctx();
        controller.pointer_down(ctx, screen);
        self.sync_selection(before);
    }

    pub fn pointer_move(&mut self, screen: Vec2) {
        if self.closed {
            return;
        }
        let (controller, ctx) = self.gesture_ctx();
        controller.pointer_move(ctx, screen);
    }

    pub fn pointer_up(&mut self, screen: Vec2) {
        if self.closed {
            return;
        }
        let before = self.controller.selected();
        let (controller, ctx) = self.gesture_ctx();
        let commit = controller.pointer_up(ctx, screen);
        self.sync_selection(before);
        match commit {
            Some(GestureCommit::Move(placement)) => {
                self.bus.publish(Event::MoveNode(placement));
                if self.settings.autosave_layout {
                    self.save_layout();
                }
            }
            Some(GestureCommit::Link { source, target }) => {
                self.bus.publish(Event::LinkParagraphs { source, target });
            }
            None => {}
        }
    }

    /// Secondary click opens the node inspector or the canvas menu.
    pub fn open_context_menu(&mut self, screen: Vec2) {
        if self.closed || !self.controller.is_idle() {
            return;
        }
        let map_point = self.viewport.to_map(screen);
        match self.hits.hit_test(map_point).node_id().and_then(|id| self.graph.node(id)) {
            Some(node) => self.menu.open_node(node, screen),
            None => self.menu.open_canvas(screen, map_point),
        }
    }

    pub fn zoom_at(&mut self, screen: Vec2, factor: f32) {
        self.viewport.zoom_at(screen, factor);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn reset_zoom(&mut self) {
        self.viewport.reset_zoom();
    }

    pub fn fit_to_content(&mut self) {
        if let Some(bounds) = self.graph.bounds() {
            self.viewport.fit_to_rect(bounds, FIT_PADDING);
        }
    }

    /// Center on a node and select it.
    pub fn focus_node(&mut self, id: ParagraphId) -> bool {
        let Some(rect) = self.graph.node(id).map(Node::rect) else {
            return false;
        };
        self.viewport.fit_to_node(rect);
        self.controller.set_selected(Some(id));
        self.graph.set_selected(Some(id));
        true
    }

    // Keyboard

    /// Escape: drop the gesture in progress and close the menu.
    pub fn escape(&mut self) {
        let (controller, ctx) = self.gesture_ctx();
        controller.cancel(ctx);
        self.menu.close();
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.controller.selected() {
            self.bus.publish(Event::DeleteParagraph { id });
        }
    }

    // Search

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search.set_query(&self.graph.nodes, query);
    }

    pub fn move_search_selection(&mut self, forward: bool) {
        self.search.move_selection(forward);
    }

    /// Focus the chosen result and clear the query.
    pub fn select_search_result(&mut self, index: usize) -> Option<ParagraphId> {
        let id = self.search.select(index)?;
        self.focus_node(id);
        Some(id)
    }

    pub fn select_current_search_result(&mut self) -> Option<ParagraphId> {
        let index = self.search.selected_index();
        self.select_search_result(index)
    }

    // Minimap, coordinates relative to the minimap panel

    pub fn minimap_pointer_down(&mut self, mini_point: Vec2) {
        if let Some(minimap) = &self.minimap {
            self.navigator.pointer_down(minimap, &mut self.viewport, mini_point);
        }
    }

    pub fn minimap_pointer_move(&mut self, mini_point: Vec2) {
        if let Some(minimap) = &self.minimap {
            self.navigator.pointer_move(minimap, &mut self.viewport, mini_point);
        }
    }

    pub fn minimap_pointer_up(&mut self) {
        self.navigator.pointer_up();
    }

    // Context menu actions. Each publishes through the bus.

    pub fn menu_commit_number(&mut self) -> Result<()> {
        let Some(inspector) = self.menu.inspector_mut() else {
            return Ok(());
        };
        if let Some(event) = inspector.commit_number(&self.graph)? {
            self.bus.publish(event);
        }
        Ok(())
    }

    pub fn menu_commit_title(&mut self) {
        if let Some(event) = self.menu.inspector_mut().and_then(|i| i.commit_title()) {
            self.bus.publish(event);
        }
    }

    pub fn menu_toggle_locked(&mut self) {
        if let Some(inspector) = self.menu.inspector_mut() {
            let event = inspector.toggle_locked();
            self.bus.publish(event);
        }
    }

    pub fn menu_set_kind(&mut self, kind: storymap_core::ParagraphKind) {
        if let Some(event) = self.menu.inspector_mut().and_then(|i| i.set_kind(kind)) {
            self.bus.publish(event);
        }
    }

    pub fn menu_edit(&mut self) {
        if let Some(inspector) = self.menu.inspector_mut() {
            let event = inspector.edit();
            self.bus.publish(event);
            self.menu.close();
        }
    }

    pub fn menu_delete(&mut self) {
        if let Some(inspector) = self.menu.inspector_mut() {
            let event = inspector.delete();
            self.bus.publish(event);
            self.menu.close();
        }
    }

    pub fn menu_add_note(&mut self) {
        if let Some(event) = self.menu.inspector_mut().and_then(|i| i.add_note()) {
            self.bus.publish(event);
        }
    }

    pub fn menu_add_linked(&mut self) {
        if let Some(inspector) = self.menu.inspector_mut() {
            let event = inspector.add_linked();
            self.bus.publish(event);
            self.menu.close();
        }
    }

    pub fn menu_add_node_here(&mut self) {
        if let Some(event) = self.menu.add_node_here() {
            self.bus.publish(event);
        }
    }

    // Layout and backdrop

    /// Publish every node position (`onSave`).
    pub fn save_layout(&self) {
        let nodes = self
            .graph
            .nodes
            .iter()
            .map(|node| NodePlacement {
                id: node.id,
                x: node.x,
                y: node.y,
            })
            .collect();
        self.bus.publish(Event::SaveLayout { nodes });
    }

    pub fn set_image_adjustments(&mut self, adjustments: ImageAdjustments) {
        self.map_settings.image_adjustments = adjustments;
        self.bus.publish(Event::UpdateMapSettings {
            settings: self.map_settings.clone(),
        });
    }

    /// New backdrop; the aspect ratio is captured for width/height coupling.
    pub fn set_background(&mut self, data_uri: Option<String>, aspect_ratio: Option<f32>) {
        self.map_settings.background_image = data_uri;
        self.map_settings.image_adjustments.original_aspect_ratio = aspect_ratio;
        self.bus.publish(Event::UpdateMapSettings {
            settings: self.map_settings.clone(),
        });
    }

    /// Leave the map. Any open gesture is discarded, never committed.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let (controller, ctx) = self.gesture_ctx();
        controller.cancel(ctx);
        self.menu.close();
        self.navigator.pointer_up();
        self.closed = true;
        self.bus.publish(Event::Close);
    }

    // Rendering helpers

    /// Nodes inside the current view box, in draw order.
    pub fn visible_nodes(&self) -> Vec<&Node> {
        self.hits
            .visible(self.viewport.view_box())
            .into_iter()
            .filter_map(|id| self.graph.node(id))
            .collect()
    }

    /// Map-space paths of every link whose endpoints are alive.
    pub fn link_paths(&self) -> Vec<(Link, CubicBezier)> {
        self.graph
            .links
            .iter()
            .filter_map(|link| {
                let source = self.graph.node(link.source)?;
                let target = self.graph.node(link.target)?;
                Some((*link, link_curve(source, target, self.settings.line_style)))
            })
            .collect()
    }

    /// Dashed path of the link being drawn, if any.
    pub fn link_preview(&self) -> Option<CubicBezier> {
        let GestureState::Linking { source_id, pointer } = *self.controller.state() else {
            return None;
        };
        let source = self.graph.node(source_id)?;
        Some(preview_curve(source, pointer, self.settings.line_style))
    }

    /// What the pointer is over, for cursor feedback.
    pub fn hit_at(&self, screen: Vec2) -> HitResult {
        self.hits.hit_test(self.viewport.to_map(screen))
    }
}

fn build_minimap(settings: &StoryMapSettings) -> Option<MiniMap> {
    match MiniMap::new(settings.minimap_size, settings.map_size) {
        Ok(minimap) => Some(minimap),
        Err(err) => {
            tracing::warn!("minimap disabled: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storymap_core::{Action, LegacyPosition, StoryMapError};

    fn story() -> Vec<Paragraph> {
        vec![
            Paragraph::new(ParagraphId(1), "Start")
                .with_action(Action::new("go", "2"))
                .with_position(100.0, 100.0),
            Paragraph::new(ParagraphId(2), "Fork").with_position(500.0, 100.0),
        ]
    }

    fn map() -> (StoryMap, EventBus) {
        let bus = EventBus::new();
        let mut map = StoryMap::new(bus.clone(), StoryMapSettings::default(), Vec2::new(800.0, 600.0));
        map.load(story(), MapSettings::default());
        (map, bus)
    }

    #[test]
    fn test_load_derives_graph() {
        let (map, bus) = map();
        assert_eq!(map.graph().nodes.len(), 2);
        assert_eq!(map.link_paths().len(), 1);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_drag_publishes_single_move() {
        let (mut map, bus) = map();
        map.pointer_down(Vec2::new(120.0, 110.0));
        map.pointer_move(Vec2::new(140.0, 110.0));
        map.pointer_move(Vec2::new(170.0, 130.0));
        assert!(bus.drain().is_empty());
        map.pointer_up(Vec2::new(170.0, 130.0));
        assert_eq!(
            bus.drain(),
            vec![Event::MoveNode(NodePlacement { id: ParagraphId(1), x: 150.0, y: 120.0 })]
        );
    }

    #[test]
    fn test_autosave_follows_drag() {
        let bus = EventBus::new();
        let settings = StoryMapSettings {
            autosave_layout: true,
            ..Default::default()
        };
        let mut map = StoryMap::new(bus.clone(), settings, Vec2::new(800.0, 600.0));
        map.load(story(), MapSettings::default());
        map.pointer_down(Vec2::new(120.0, 110.0));
        map.pointer_move(Vec2::new(170.0, 110.0));
        map.pointer_up(Vec2::new(170.0, 110.0));
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        match &events[1] {
            Event::SaveLayout { nodes } => {
                assert_eq!(nodes.len(), 2);
                assert_eq!(nodes[0], NodePlacement { id: ParagraphId(1), x: 150.0, y: 100.0 });
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_link_gesture_publishes_link() {
        let (mut map, bus) = map();
        map.pointer_down(Vec2::new(260.0, 130.0));
        map.pointer_move(Vec2::new(400.0, 130.0));
        assert!(map.link_preview().is_some());
        map.pointer_up(Vec2::new(520.0, 120.0));
        assert_eq!(
            bus.drain(),
            vec![Event::LinkParagraphs { source: ParagraphId(1), target: ParagraphId(2) }]
        );
        assert!(map.link_preview().is_none());
    }

    #[test]
    fn test_selection_highlights_links() {
        let (mut map, _bus) = map();
        map.pointer_down(Vec2::new(520.0, 110.0));
        map.pointer_up(Vec2::new(520.0, 110.0));
        assert_eq!(map.selected(), Some(ParagraphId(2)));
        assert!(map.graph().links[0].is_highlighted);

        map.replace_paragraphs(&story());
        assert!(map.graph().links[0].is_highlighted);

        map.pointer_down(Vec2::new(700.0, 500.0));
        map.pointer_up(Vec2::new(700.0, 500.0));
        assert_eq!(map.selected(), None);
        assert!(map.graph().links[0].is_paused);
    }

    #[test]
    fn test_close_discards_gesture() {
        let (mut map, bus) = map();
        map.pointer_down(Vec2::new(120.0, 110.0));
        map.pointer_move(Vec2::new(300.0, 300.0));
        map.close();
        assert_eq!(bus.drain(), vec![Event::Close]);
        assert_eq!(map.graph().node(ParagraphId(1)).unwrap().position(), Vec2::new(100.0, 100.0));
        map.pointer_up(Vec2::new(300.0, 300.0));
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_escape_cancels_and_closes_menu() {
        let (mut map, bus) = map();
        map.open_context_menu(Vec2::new(120.0, 110.0));
        assert!(map.menu().is_open());
        map.escape();
        assert!(!map.menu().is_open());

        map.pointer_down(Vec2::new(260.0, 130.0));
        map.escape();
        assert!(matches!(map.gesture(), GestureState::Idle));
        map.pointer_up(Vec2::new(520.0, 120.0));
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_context_menu_modes() {
        let (mut map, bus) = map();
        map.open_context_menu(Vec2::new(700.0, 500.0));
        assert!(matches!(map.menu(), ContextMenu::Canvas { .. }));
        map.menu_add_node_here();
        assert_eq!(
            bus.drain(),
            vec![Event::AddParagraph { parent_id: None, position: Some((700.0, 500.0)) }]
        );

        map.open_context_menu(Vec2::new(120.0, 110.0));
        assert!(matches!(map.menu(), ContextMenu::Node(_)));
        map.menu_delete();
        assert_eq!(bus.drain(), vec![Event::DeleteParagraph { id: ParagraphId(1) }]);
        assert!(!map.menu().is_open());
    }

    #[test]
    fn test_renumber_collision_never_reaches_bus() {
        let (mut map, bus) = map();
        map.open_context_menu(Vec2::new(120.0, 110.0));
        if let Some(inspector) = map.menu_mut().inspector_mut() {
            inspector.number_field = "2".into();
        }
        assert_eq!(
            map.menu_commit_number(),
            Err(StoryMapError::RenumberCollision { from: ParagraphId(1), to: ParagraphId(2) })
        );
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_menu_closes_when_node_deleted_upstream() {
        let (mut map, _bus) = map();
        map.open_context_menu(Vec2::new(520.0, 110.0));
        let mut paragraphs = story();
        paragraphs.truncate(1);
        map.replace_paragraphs(&paragraphs);
        assert!(!map.menu().is_open());
        assert!(map.graph().links.is_empty());
    }

    #[test]
    fn test_search_select_focuses_node() {
        let (mut map, _bus) = map();
        map.set_search_query("fork");
        assert_eq!(map.search().results().len(), 1);
        assert_eq!(map.select_search_result(0), Some(ParagraphId(2)));
        assert_eq!(map.search().query(), "");
        assert_eq!(map.selected(), Some(ParagraphId(2)));
        let rect = map.graph().node(ParagraphId(2)).unwrap().rect();
        let view = map.viewport().view_box();
        assert!(view.contains(rect.center()));
    }

    #[test]
    fn test_delete_key_removes_selected() {
        let (mut map, bus) = map();
        map.delete_selected();
        assert!(bus.drain().is_empty());
        map.pointer_down(Vec2::new(120.0, 110.0));
        map.pointer_up(Vec2::new(120.0, 110.0));
        map.delete_selected();
        assert_eq!(bus.drain(), vec![Event::DeleteParagraph { id: ParagraphId(1) }]);
    }

    #[test]
    fn test_legacy_positions_migrate_on_first_load() {
        let bus = EventBus::new();
        let mut map = StoryMap::new(bus.clone(), StoryMapSettings::default(), Vec2::new(800.0, 600.0));
        let mut settings = MapSettings::default();
        settings.positions.insert("1".into(), LegacyPosition { x: 300.0, y: 50.0 });
        map.load(vec![Paragraph::new(ParagraphId(1), "old")], settings.clone());

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Event::UpdateParagraphs { paragraphs } if paragraphs[0].x == Some(300.0)));
        assert!(matches!(&events[1], Event::UpdateMapSettings { settings } if settings.positions.is_empty()));
        assert_eq!(map.graph().nodes[0].position(), Vec2::new(300.0, 50.0));

        map.load(vec![Paragraph::new(ParagraphId(1), "old")], settings);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_visible_nodes_are_culled() {
        let bus = EventBus::new();
        let mut map = StoryMap::new(bus, StoryMapSettings::default(), Vec2::new(800.0, 600.0));
        let mut paragraphs = story();
        paragraphs.push(Paragraph::new(ParagraphId(3), "far").with_position(3500.0, 2800.0));
        map.load(paragraphs, MapSettings::default());
        let ids: Vec<ParagraphId> = map.visible_nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![ParagraphId(1), ParagraphId(2)]);
    }

    #[test]
    fn test_minimap_click_moves_view() {
        let (mut map, _bus) = map();
        map.minimap_pointer_down(Vec2::new(100.0, 75.0));
        map.minimap_pointer_up();
        let center = map.viewport().view_box().center();
        assert!((center - Vec2::new(2000.0, 1500.0)).length() < 0.05);
    }

    #[test]
    fn test_background_upload_captures_ratio() {
        let (mut map, bus) = map();
        map.set_background(Some("data:image/png;base64,AAAA".into()), Some(1.5));
        match bus.drain().as_slice() {
            [Event::UpdateMapSettings { settings }] => {
                assert_eq!(settings.image_adjustments.original_aspect_ratio, Some(1.5));
                assert!(settings.background_image.is_some());
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn test_fit_to_content() {
        let (mut map, _bus) = map();
        map.fit_to_content();
        let view = map.viewport().view_box();
        let bounds = map.graph().bounds().unwrap();
        assert!(view.contains(bounds.min) && view.contains(bounds.max));
    }
}
