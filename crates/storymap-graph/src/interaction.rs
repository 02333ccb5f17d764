use crate::geometry::Vec2;
use crate::hit_tester::{HitResult, HitTester};
use crate::model::StoryGraph;
use crate::viewport::Viewport;
use storymap_core::ParagraphId;
use storymap_events::NodePlacement;

/// Screen distance under which a press-and-release counts as a click.
pub const CLICK_SLOP: f32 = 3.0;

/// The one gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    DraggingNode {
        node_id: ParagraphId,
        /// Pointer minus node top-left, in map units.
        grab_offset: Vec2,
        /// Node top-left when the drag began.
        origin: Vec2,
        press: Vec2,
        current: Vec2,
    },
    Linking {
        source_id: ParagraphId,
        /// Live pointer position, map-space.
        pointer: Vec2,
    },
    Panning {
        start_point: Vec2,
        last: Vec2,
    },
}

/// Mutations a finished gesture asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureCommit {
    Move(NodePlacement),
    Link {
        source: ParagraphId,
        target: ParagraphId,
    },
}

/// Everything a gesture reads or previews against.
pub struct GestureContext<'a> {
    pub graph: &'a mut StoryGraph,
    pub hits: &'a mut HitTester,
    pub viewport: &'a mut Viewport,
}

/// Pointer state machine: drag a node, draw a link, or pan the canvas.
///
/// Node moves are previewed locally while the pointer moves; nothing is
/// committed until the pointer is released.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: GestureState,
    selected: Option<ParagraphId>,
    hovered: Option<ParagraphId>,
}

impl InteractionController {
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    pub fn selected(&self) -> Option<ParagraphId> {
        self.selected
    }

    pub fn set_selected(&mut self, id: Option<ParagraphId>) {
        self.selected = id;
    }

    pub fn hovered(&self) -> Option<ParagraphId> {
        self.hovered
    }

    /// Start a gesture. Ignored while another gesture is active.
    pub fn pointer_down(&mut self, ctx: GestureContext<'_>, screen: Vec2) {
        if !self.is_idle() {
            return;
        }
        let map_point = ctx.viewport.to_map(screen);
        match ctx.hits.hit_test(map_point) {
            HitResult::Connector(source_id) => {
                tracing::debug!(%source_id, "link gesture started");
                self.state = GestureState::Linking {
                    source_id,
                    pointer: map_point,
                };
            }
            HitResult::Node(node_id) => {
                self.selected = Some(node_id);
                let Some(node) = ctx.graph.node(node_id) else {
                    return;
                };
                if node.locked {
                    tracing::debug!(%node_id, "locked node, drag ignored");
                    return;
                }
                let origin = node.position();
                self.state = GestureState::DraggingNode {
                    node_id,
                    grab_offset: map_point - origin,
                    origin,
                    press: screen,
                    current: origin,
                };
            }
            HitResult::None => {
                self.state = GestureState::Panning {
                    start_point: screen,
                    last: screen,
                };
            }
        }
    }

    pub fn pointer_move(&mut self, ctx: GestureContext<'_>, screen: Vec2) {
        match &mut self.state {
            GestureState::Idle => {
                let map_point = ctx.viewport.to_map(screen);
                self.hovered = ctx.hits.hit_test(map_point).node_id();
            }
            GestureState::DraggingNode {
                node_id,
                grab_offset,
                current,
                ..
            } => {
                let size = ctx
                    .graph
                    .node(*node_id)
                    .map(|node| node.size())
                    .unwrap_or(Vec2::ZERO);
                let wanted = ctx.viewport.to_map(screen) - *grab_offset;
                let top_left = clamp_to_map(ctx.viewport, wanted, size);
                *current = top_left;
                if let Some(node) = ctx.graph.node_mut(*node_id) {
                    node.x = top_left.x;
                    node.y = top_left.y;
                }
                ctx.hits.move_node(*node_id, top_left);
            }
            GestureState::Linking { pointer, .. } => {
                *pointer = ctx.viewport.to_map(screen);
            }
            GestureState::Panning { last, .. } => {
                ctx.viewport.pan(screen - *last);
                *last = screen;
            }
        }
    }

    /// Finish the gesture and report what should be committed.
    pub fn pointer_up(&mut self, ctx: GestureContext<'_>, screen: Vec2) -> Option<GestureCommit> {
        let state = std::mem::take(&mut self.state);
        match state {
            GestureState::Idle => None,
            GestureState::DraggingNode {
                node_id,
                origin,
                press,
                current,
                ..
            } => {
                if (screen - press).length() < CLICK_SLOP {
                    restore(ctx, node_id, origin);
                    return None;
                }
                tracing::debug!(%node_id, x = current.x, y = current.y, "drag committed");
                Some(GestureCommit::Move(NodePlacement {
                    id: node_id,
                    x: current.x,
                    y: current.y,
                }))
            }
            GestureState::Linking { source_id, .. } => {
                let map_point = ctx.viewport.to_map(screen);
                // Back on its own connector is a cancel; its own body is a loop.
                let target = match ctx.hits.hit_test(map_point) {
                    HitResult::Connector(id) if id == source_id => None,
                    hit => hit.node_id(),
                };
                match target {
                    Some(target) => {
                        tracing::debug!(%source_id, %target, "link committed");
                        Some(GestureCommit::Link {
                            source: source_id,
                            target,
                        })
                    }
                    _ => {
                        tracing::debug!(%source_id, "link gesture cancelled");
                        None
                    }
                }
            }
            GestureState::Panning { start_point, .. } => {
                if (screen - start_point).length() < CLICK_SLOP {
                    self.selected = None;
                }
                None
            }
        }
    }

    /// Drop the active gesture without committing anything.
    pub fn cancel(&mut self, ctx: GestureContext<'_>) {
        let state = std::mem::take(&mut self.state);
        if let GestureState::DraggingNode { node_id, origin, .. } = state {
            restore(ctx, node_id, origin);
        }
        if !matches!(state, GestureState::Idle) {
            tracing::debug!("gesture discarded");
        }
    }

    /// Re-attach to a freshly derived graph.
    ///
    /// A node still being dragged keeps its previewed position; gestures and
    /// selection that point at vanished nodes are dropped.
    pub fn reconcile(&mut self, graph: &mut StoryGraph, hits: &mut HitTester) {
        match self.state {
            GestureState::DraggingNode {
                node_id, current, ..
            } => match graph.node_mut(node_id) {
                Some(node) => {
                    node.x = current.x;
                    node.y = current.y;
                    hits.move_node(node_id, current);
                }
                None => self.state = GestureState::Idle,
            },
            GestureState::Linking { source_id, .. } if !graph.contains(source_id) => {
                self.state = GestureState::Idle;
            }
            _ => {}
        }
        if self.selected.is_some_and(|id| !graph.contains(id)) {
            self.selected = None;
        }
        if self.hovered.is_some_and(|id| !graph.contains(id)) {
            self.hovered = None;
        }
    }
}

fn restore(ctx: GestureContext<'_>, node_id: ParagraphId, origin: Vec2) {
    if let Some(node) = ctx.graph.node_mut(node_id) {
        node.x = origin.x;
        node.y = origin.y;
    }
    ctx.hits.move_node(node_id, origin);
}

/// Keep a dragged node's top-left inside the map so it can always be reached again.
fn clamp_to_map(viewport: &Viewport, top_left: Vec2, size: Vec2) -> Vec2 {
    if viewport.is_degenerate() {
        return top_left;
    }
    let map = viewport.map_size();
    Vec2::new(
        top_left.x.clamp(0.0, (map.x - size.x).max(0.0)),
        top_left.y.clamp(0.0, (map.y - size.y).max(0.0)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::derive_graph;
    use storymap_core::Paragraph;

    struct Rig {
        graph: StoryGraph,
        hits: HitTester,
        viewport: Viewport,
        ctl: InteractionController,
    }

    impl Rig {
        fn new(paragraphs: &[Paragraph]) -> Self {
            let graph = derive_graph(paragraphs, None);
            let mut hits = HitTester::default();
            hits.rebuild(&graph);
            Self {
                graph,
                hits,
                viewport: Viewport::new(Vec2::new(4000.0, 3000.0), Vec2::new(800.0, 600.0)),
                ctl: InteractionController::default(),
            }
        }

        fn ctx(&mut self) -> (&mut InteractionController, GestureContext<'_>) {
            (
                &mut self.ctl,
                GestureContext {
                    graph: &mut self.graph,
                    hits: &mut self.hits,
                    viewport: &mut self.viewport,
                },
            )
        }

        fn down(&mut self, x: f32, y: f32) {
            let (ctl, ctx) = self.ctx();
            ctl.pointer_down(ctx, Vec2::new(x, y));
        }

        fn drag_to(&mut self, x: f32, y: f32) {
            let (ctl, ctx) = self.ctx();
            ctl.pointer_move(ctx, Vec2::new(x, y));
        }

        fn up(&mut self, x: f32, y: f32) -> Option<GestureCommit> {
            let (ctl, ctx) = self.ctx();
            ctl.pointer_up(ctx, Vec2::new(x, y))
        }

        fn pos(&self, id: i64) -> Vec2 {
            self.graph.node(ParagraphId(id)).unwrap().position()
        }
    }

    fn two_nodes() -> Vec<Paragraph> {
        vec![
            Paragraph::new(ParagraphId(1), "a").with_position(100.0, 100.0),
            Paragraph::new(ParagraphId(2), "b").with_position(500.0, 100.0),
        ]
    }

    #[test]
    fn test_drag_previews_then_commits_once() {
        let mut rig = Rig::new(&two_nodes());
        rig.down(120.0, 110.0);
        assert!(matches!(rig.ctl.state(), GestureState::DraggingNode { .. }));
        rig.drag_to(150.0, 130.0);
        rig.drag_to(220.0, 160.0);
        assert_eq!(rig.pos(1), Vec2::new(200.0, 150.0));

        let commit = rig.up(220.0, 160.0);
        assert_eq!(
            commit,
            Some(GestureCommit::Move(NodePlacement { id: ParagraphId(1), x: 200.0, y: 150.0 }))
        );
        assert!(rig.ctl.is_idle());
        assert_eq!(rig.ctl.selected(), Some(ParagraphId(1)));
    }

    #[test]
    fn test_drag_respects_zoom() {
        let mut rig = Rig::new(&two_nodes());
        rig.viewport.zoom_at(Vec2::ZERO, 2.0);
        // Node 1 body starts at screen (200, 200) at zoom 2.
        rig.down(220.0, 220.0);
        rig.drag_to(320.0, 220.0);
        assert_eq!(rig.pos(1), Vec2::new(150.0, 100.0));
    }

    #[test]
    fn test_click_without_movement_selects_only() {
        let mut rig = Rig::new(&two_nodes());
        rig.down(120.0, 110.0);
        rig.drag_to(121.0, 111.0);
        assert_eq!(rig.up(121.0, 111.0), None);
        assert_eq!(rig.pos(1), Vec2::new(100.0, 100.0));
        assert_eq!(rig.ctl.selected(), Some(ParagraphId(1)));
    }

    #[test]
    fn test_locked_node_does_not_move() {
        let mut rig = Rig::new(&[Paragraph::new(ParagraphId(1), "a")
            .with_position(100.0, 100.0)
            .with_locked(true)]);
        rig.down(120.0, 110.0);
        assert!(rig.ctl.is_idle());
        rig.drag_to(400.0, 400.0);
        assert_eq!(rig.up(400.0, 400.0), None);
        assert_eq!(rig.pos(1), Vec2::new(100.0, 100.0));
        assert_eq!(rig.ctl.selected(), Some(ParagraphId(1)));
    }

    #[test]
    fn test_link_gesture_commits_on_target() {
        let mut rig = Rig::new(&two_nodes());
        // Connector of node 1 at (260, 130).
        rig.down(260.0, 130.0);
        rig.drag_to(400.0, 140.0);
        match rig.ctl.state() {
            GestureState::Linking { source_id, pointer } => {
                assert_eq!(*source_id, ParagraphId(1));
                assert_eq!(*pointer, Vec2::new(400.0, 140.0));
            }
            other => panic!("unexpected state {other:?}"),
        }
        assert_eq!(
            rig.up(520.0, 120.0),
            Some(GestureCommit::Link { source: ParagraphId(1), target: ParagraphId(2) })
        );
        assert_eq!(rig.pos(1), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_link_released_on_empty_or_own_connector_cancels() {
        let mut rig = Rig::new(&two_nodes());
        rig.down(260.0, 130.0);
        assert_eq!(rig.up(400.0, 400.0), None);
        rig.down(260.0, 130.0);
        assert_eq!(rig.up(261.0, 131.0), None);
        assert!(rig.ctl.is_idle());
    }

    #[test]
    fn test_link_released_on_own_body_loops() {
        let mut rig = Rig::new(&two_nodes());
        rig.down(260.0, 130.0);
        rig.drag_to(320.0, 60.0);
        assert_eq!(
            rig.up(150.0, 120.0),
            Some(GestureCommit::Link { source: ParagraphId(1), target: ParagraphId(1) })
        );
    }

    #[test]
    fn test_drag_stays_inside_map() {
        let mut rig = Rig::new(&two_nodes());
        rig.down(120.0, 110.0);
        rig.drag_to(-400.0, -300.0);
        assert_eq!(rig.pos(1), Vec2::ZERO);
        assert_eq!(
            rig.up(-400.0, -300.0),
            Some(GestureCommit::Move(NodePlacement { id: ParagraphId(1), x: 0.0, y: 0.0 }))
        );

        rig.down(20.0, 10.0);
        rig.drag_to(9000.0, 9000.0);
        // Normal nodes are 160 x 60 on a 4000 x 3000 map.
        assert_eq!(rig.pos(1), Vec2::new(3840.0, 2940.0));
    }

    #[test]
    fn test_locked_node_can_still_link() {
        let mut paragraphs = two_nodes();
        paragraphs[0].locked = Some(true);
        let mut rig = Rig::new(&paragraphs);
        rig.down(260.0, 130.0);
        assert!(matches!(rig.ctl.state(), GestureState::Linking { .. }));
    }

    #[test]
    fn test_empty_canvas_pans() {
        let mut rig = Rig::new(&two_nodes());
        rig.viewport.center_on(Vec2::new(2000.0, 1500.0));
        let before = rig.viewport.origin();
        rig.down(10.0, 500.0);
        rig.drag_to(60.0, 520.0);
        assert_eq!(rig.up(60.0, 520.0), None);
        assert_eq!(rig.viewport.origin(), before - Vec2::new(50.0, 20.0));
    }

    #[test]
    fn test_click_on_empty_clears_selection() {
        let mut rig = Rig::new(&two_nodes());
        rig.down(120.0, 110.0);
        rig.up(120.0, 110.0);
        assert!(rig.ctl.selected().is_some());
        rig.down(10.0, 500.0);
        rig.up(10.0, 500.0);
        assert_eq!(rig.ctl.selected(), None);
    }

    #[test]
    fn test_second_press_is_ignored_mid_gesture() {
        let mut rig = Rig::new(&two_nodes());
        rig.down(120.0, 110.0);
        rig.down(520.0, 110.0);
        match rig.ctl.state() {
            GestureState::DraggingNode { node_id, .. } => assert_eq!(*node_id, ParagraphId(1)),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_cancel_restores_drag_origin() {
        let mut rig = Rig::new(&two_nodes());
        rig.down(120.0, 110.0);
        rig.drag_to(300.0, 300.0);
        let (ctl, ctx) = rig.ctx();
        ctl.cancel(ctx);
        assert!(rig.ctl.is_idle());
        assert_eq!(rig.pos(1), Vec2::new(100.0, 100.0));
        assert_eq!(
            rig.hits.hit_test(Vec2::new(120.0, 110.0)),
            HitResult::Node(ParagraphId(1))
        );
    }

    #[test]
    fn test_reconcile_keeps_drag_on_rebuild() {
        let mut rig = Rig::new(&two_nodes());
        rig.down(120.0, 110.0);
        rig.drag_to(220.0, 110.0);

        rig.graph = derive_graph(&two_nodes(), None);
        rig.hits.rebuild(&rig.graph);
        rig.ctl.reconcile(&mut rig.graph, &mut rig.hits);
        assert_eq!(rig.pos(1), Vec2::new(200.0, 100.0));
        assert!(matches!(rig.ctl.state(), GestureState::DraggingNode { .. }));
    }

    #[test]
    fn test_reconcile_drops_gesture_on_deleted_node() {
        let mut rig = Rig::new(&two_nodes());
        rig.down(120.0, 110.0);
        rig.drag_to(220.0, 110.0);

        let remaining = vec![two_nodes().remove(1)];
        rig.graph = derive_graph(&remaining, None);
        rig.hits.rebuild(&rig.graph);
        rig.ctl.reconcile(&mut rig.graph, &mut rig.hits);
        assert!(rig.ctl.is_idle());
        assert_eq!(rig.ctl.selected(), None);
    }

    #[test]
    fn test_hover_tracks_pointer_when_idle() {
        let mut rig = Rig::new(&two_nodes());
        rig.drag_to(520.0, 120.0);
        assert_eq!(rig.ctl.hovered(), Some(ParagraphId(2)));
        rig.drag_to(10.0, 500.0);
        assert_eq!(rig.ctl.hovered(), None);
    }
}
