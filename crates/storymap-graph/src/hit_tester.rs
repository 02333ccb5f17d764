use crate::geometry::{Rect, Vec2};
use crate::model::{CONNECTOR_RADIUS, Node, StoryGraph};
use std::collections::{BTreeSet, HashMap};
use storymap_core::ParagraphId;

pub const DEFAULT_CELL_SIZE: f32 = 256.0;

/// What sits under a map-space point.
///
/// Topmost node first, then connector before body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResult {
    None,
    /// The link handle on a node's right edge.
    Connector(ParagraphId),
    Node(ParagraphId),
}

impl HitResult {
    pub fn node_id(&self) -> Option<ParagraphId> {
        match self {
            Self::None => None,
            Self::Connector(id) | Self::Node(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone)]
struct HitEntry {
    id: ParagraphId,
    rect: Rect,
    connector: Vec2,
}

impl HitEntry {
    fn from_node(node: &Node) -> Self {
        Self {
            id: node.id,
            rect: node.rect(),
            connector: node.connector(),
        }
    }

    /// Body plus the connector circle poking out of the right edge.
    fn reach(&self) -> Rect {
        self.rect.expand(CONNECTOR_RADIUS)
    }
}

/// Spatial index over node footprints.
///
/// Nodes are bucketed into a uniform grid so point queries and viewport
/// culling only look at nearby cells. Later nodes draw on top of earlier ones
/// and win overlapping hits.
#[derive(Debug, Clone)]
pub struct HitTester {
    cell_size: f32,
    entries: Vec<HitEntry>,
    by_id: HashMap<ParagraphId, usize>,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl Default for HitTester {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl HitTester {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { DEFAULT_CELL_SIZE },
            entries: Vec::new(),
            by_id: HashMap::new(),
            cells: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace all hit regions with the nodes of `graph`.
    pub fn rebuild(&mut self, graph: &StoryGraph) {
        self.entries = graph.nodes.iter().map(HitEntry::from_node).collect();
        self.by_id.clear();
        for (idx, entry) in self.entries.iter().enumerate() {
            self.by_id.insert(entry.id, idx);
        }
        self.cells.clear();
        for idx in 0..self.entries.len() {
            self.insert_cells(idx);
        }
    }

    fn cell_range(&self, rect: Rect) -> ((i32, i32), (i32, i32)) {
        (
            cell_for(rect.min, self.cell_size),
            cell_for(rect.max, self.cell_size),
        )
    }

    fn insert_cells(&mut self, idx: usize) {
        let (min, max) = self.cell_range(self.entries[idx].reach());
        for y in min.1..=max.1 {
            for x in min.0..=max.0 {
                self.cells.entry((x, y)).or_default().push(idx);
            }
        }
    }

    fn remove_cells(&mut self, idx: usize) {
        let (min, max) = self.cell_range(self.entries[idx].reach());
        for y in min.1..=max.1 {
            for x in min.0..=max.0 {
                if let Some(list) = self.cells.get_mut(&(x, y)) {
                    list.retain(|&i| i != idx);
                    if list.is_empty() {
                        self.cells.remove(&(x, y));
                    }
                }
            }
        }
    }

    /// Keep the index in step with a node being dragged.
    pub fn move_node(&mut self, id: ParagraphId, top_left: Vec2) {
        let Some(&idx) = self.by_id.get(&id) else {
            return;
        };
        self.remove_cells(idx);
        let entry = &mut self.entries[idx];
        let delta = top_left - entry.rect.min;
        entry.rect = Rect::from_pos_size(top_left, entry.rect.size());
        entry.connector += delta;
        self.insert_cells(idx);
    }

    pub fn node_rect(&self, id: ParagraphId) -> Option<Rect> {
        self.by_id.get(&id).map(|&idx| self.entries[idx].rect)
    }

    fn query_rect(&self, rect: Rect) -> BTreeSet<usize> {
        let (min, max) = self.cell_range(rect);
        let mut result = BTreeSet::new();
        for y in min.1..=max.1 {
            for x in min.0..=max.0 {
                if let Some(list) = self.cells.get(&(x, y)) {
                    result.extend(list.iter().copied());
                }
            }
        }
        result
    }

    /// Hit test a map-space point.
    ///
    /// Nodes are tried topmost first; within a node the connector wins over
    /// the body it overlaps.
    pub fn hit_test(&self, pos: Vec2) -> HitResult {
        let candidates = self.query_rect(Rect::from_min_max(pos, pos));
        for &idx in candidates.iter().rev() {
            let entry = &self.entries[idx];
            if entry.connector.distance(pos) <= CONNECTOR_RADIUS {
                return HitResult::Connector(entry.id);
            }
            if entry.rect.contains(pos) {
                return HitResult::Node(entry.id);
            }
        }
        HitResult::None
    }

    /// Ids of nodes intersecting `view`, in draw order.
    pub fn visible(&self, view: Rect) -> Vec<ParagraphId> {
        self.query_rect(view)
            .into_iter()
            .map(|idx| &self.entries[idx])
            .filter(|entry| entry.reach().intersects(&view))
            .map(|entry| entry.id)
            .collect()
    }
}

fn cell_for(pos: Vec2, cell_size: f32) -> (i32, i32) {
    let x = (pos.x / cell_size).floor() as i32;
    let y = (pos.y / cell_size).floor() as i32;
    (x, y)
}
