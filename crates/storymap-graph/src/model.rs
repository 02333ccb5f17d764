use crate::geometry::{Rect, Vec2};
use std::collections::HashMap;
use storymap_core::{Action, Paragraph, ParagraphId, ParagraphKind};

/// Radius of the link connector drawn on a node's right edge, in map units.
pub const CONNECTOR_RADIUS: f32 = 8.0;

/// Map-space size of a node of the given kind.
pub fn footprint(kind: ParagraphKind) -> Vec2 {
    match kind {
        ParagraphKind::Normal => Vec2::new(160.0, 60.0),
        ParagraphKind::Node => Vec2::new(180.0, 70.0),
        ParagraphKind::Final => Vec2::new(160.0, 60.0),
    }
}

/// A paragraph projected onto the map. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: ParagraphId,
    pub x: f32,
    pub y: f32,
    pub kind: ParagraphKind,
    pub title: String,
    pub locked: bool,
    pub actions: Vec<Action>,
    /// Stringified ids of the targets this node actually links to.
    pub outgoing_connections: Vec<String>,
}

impl Node {
    pub fn from_paragraph(paragraph: &Paragraph) -> Self {
        Self {
            id: paragraph.id,
            x: paragraph.x.unwrap_or(0.0),
            y: paragraph.y.unwrap_or(0.0),
            kind: paragraph.kind,
            title: paragraph.title.clone(),
            locked: paragraph.is_locked(),
            actions: paragraph.actions.clone(),
            outgoing_connections: Vec::new(),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        footprint(self.kind)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.position(), self.size())
    }

    /// Link handle: right-edge midpoint.
    pub fn connector(&self) -> Vec2 {
        let rect = self.rect();
        Vec2::new(rect.max.x, rect.center().y)
    }

    /// Where incoming links attach: left-edge midpoint.
    pub fn inlet(&self) -> Vec2 {
        let rect = self.rect();
        Vec2::new(rect.min.x, rect.center().y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub source: ParagraphId,
    pub target: ParagraphId,
    pub is_paused: bool,
    pub is_highlighted: bool,
}

impl Link {
    pub fn touches(&self, id: ParagraphId) -> bool {
        self.source == id || self.target == id
    }
}

/// Nodes and links derived from one paragraph snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    index: HashMap<ParagraphId, usize>,
}

impl StoryGraph {
    pub fn node(&self, id: ParagraphId) -> Option<&Node> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: ParagraphId) -> Option<&mut Node> {
        let i = *self.index.get(&id)?;
        self.nodes.get_mut(i)
    }

    pub fn contains(&self, id: ParagraphId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bounding box of every node footprint, `None` for an empty graph.
    pub fn bounds(&self) -> Option<Rect> {
        self.nodes
            .iter()
            .map(Node::rect)
            .reduce(|acc, rect| acc.union(&rect))
    }

    /// Re-flag links after the selection changed, without re-deriving.
    pub fn set_selected(&mut self, selected: Option<ParagraphId>) {
        for link in &mut self.links {
            flag_link(link, selected);
        }
    }
}

fn flag_link(link: &mut Link, selected: Option<ParagraphId>) {
    link.is_highlighted = selected.is_some_and(|id| link.touches(id));
    link.is_paused = !link.is_highlighted;
}

/// Build the graph for `paragraphs`.
///
/// Pure and deterministic: the same input always yields an equal graph. One
/// node per paragraph in input order; one link per action whose target names
/// a paragraph in the list, its own included. Empty, unparsable and dangling
/// targets are skipped.
pub fn derive_graph(paragraphs: &[Paragraph], selected: Option<ParagraphId>) -> StoryGraph {
    let mut nodes: Vec<Node> = paragraphs.iter().map(Node::from_paragraph).collect();

    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        // Duplicate ids in the input keep the first node as the lookup target.
        index.entry(node.id).or_insert(i);
    }

    let mut links = Vec::new();
    for node in &mut nodes {
        for action in &node.actions {
            let Some(target) = action.target_id() else {
                continue;
            };
            if !index.contains_key(&target) {
                continue;
            }
            let mut link = Link {
                source: node.id,
                target,
                is_paused: true,
                is_highlighted: false,
            };
            flag_link(&mut link, selected);
            links.push(link);
            node.outgoing_connections.push(target.to_string());
        }
    }

    StoryGraph {
        nodes,
        links,
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story() -> Vec<Paragraph> {
        vec![
            Paragraph::new(ParagraphId(1), "Start")
                .with_action(Action::new("go", "2"))
                .with_position(10.0, 20.0),
            Paragraph::new(ParagraphId(2), "Fork").with_kind(ParagraphKind::Node),
        ]
    }

    #[test]
    fn test_two_nodes_one_link() {
        let graph = derive_graph(&story(), None);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.links[0].source, ParagraphId(1));
        assert_eq!(graph.links[0].target, ParagraphId(2));
        assert_eq!(graph.nodes[0].outgoing_connections, vec!["2".to_string()]);
    }

    #[test]
    fn test_missing_position_defaults_to_origin() {
        let graph = derive_graph(&story(), None);
        let node = graph.node(ParagraphId(2)).unwrap();
        assert_eq!((node.x, node.y), (0.0, 0.0));
        assert!(!node.locked);
        assert_eq!(node.size(), Vec2::new(180.0, 70.0));
    }

    #[test]
    fn test_dangling_and_empty_targets_are_skipped() {
        let paragraphs = vec![
            Paragraph::new(ParagraphId(1), "A")
                .with_action(Action::new("nowhere", "99"))
                .with_action(Action::new("later", ""))
                .with_action(Action::new("junk", "two")),
        ];
        let graph = derive_graph(&paragraphs, None);
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.links.is_empty());
        assert!(graph.nodes[0].outgoing_connections.is_empty());
    }

    #[test]
    fn test_self_and_zero_targets_link() {
        let paragraphs = vec![
            Paragraph::new(ParagraphId(1), "Try again").with_action(Action::new("retry", "1")),
            Paragraph::new(ParagraphId(0), "Prologue"),
            Paragraph::new(ParagraphId(2), "Back").with_action(Action::new("restart", "0")),
        ];
        let graph = derive_graph(&paragraphs, None);
        let pairs: Vec<(i64, i64)> = graph.links.iter().map(|l| (l.source.0, l.target.0)).collect();
        assert_eq!(pairs, vec![(1, 1), (2, 0)]);
        assert_eq!(graph.nodes[0].outgoing_connections, vec!["1".to_string()]);
    }

    #[test]
    fn test_deleted_target_drops_link() {
        let mut paragraphs = story();
        paragraphs.retain(|p| p.id != ParagraphId(2));
        let graph = derive_graph(&paragraphs, None);
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_each_action_yields_its_own_link() {
        let paragraphs = vec![
            Paragraph::new(ParagraphId(1), "A")
                .with_action(Action::new("left", "2"))
                .with_action(Action::new("right", "2")),
            Paragraph::new(ParagraphId(2), "B"),
        ];
        let graph = derive_graph(&paragraphs, None);
        assert_eq!(graph.links.len(), 2);
    }

    #[test]
    fn test_selection_highlights_touching_links() {
        let mut paragraphs = story();
        paragraphs.push(
            Paragraph::new(ParagraphId(3), "Side").with_action(Action::new("back", "1")),
        );
        paragraphs.push(Paragraph::new(ParagraphId(4), "Alone").with_action(Action::new("x", "3")));

        let graph = derive_graph(&paragraphs, Some(ParagraphId(1)));
        let flags: Vec<(i64, i64, bool)> = graph
            .links
            .iter()
            .map(|l| (l.source.0, l.target.0, l.is_highlighted))
            .collect();
        assert_eq!(flags, vec![(1, 2, true), (3, 1, true), (4, 3, false)]);
        assert!(graph.links.iter().all(|l| l.is_paused != l.is_highlighted));

        let none = derive_graph(&paragraphs, None);
        assert!(none.links.iter().all(|l| l.is_paused && !l.is_highlighted));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        assert_eq!(derive_graph(&story(), None), derive_graph(&story(), None));
    }

    #[test]
    fn test_bounds_cover_all_nodes() {
        let graph = derive_graph(&story(), None);
        let bounds = graph.bounds().unwrap();
        assert_eq!(bounds.min, Vec2::new(0.0, 0.0));
        assert_eq!(bounds.max, Vec2::new(180.0, 80.0));
        assert!(derive_graph(&[], None).bounds().is_none());
    }

    #[test]
    fn test_connector_sits_on_right_edge() {
        let graph = derive_graph(&story(), None);
        let node = graph.node(ParagraphId(1)).unwrap();
        assert_eq!(node.connector(), Vec2::new(170.0, 50.0));
        assert_eq!(node.inlet(), Vec2::new(10.0, 50.0));
    }
}
