use crate::geometry::Vec2;
use crate::model::{Node, StoryGraph};
use storymap_core::{ParagraphId, ParagraphKind, Result, StoryMapError};
use storymap_events::Event;

/// Where "add linked paragraph" places the new node, relative to its parent.
pub const LINKED_NODE_OFFSET: Vec2 = Vec2::new(240.0, 0.0);

/// Editable copy of one node's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInspector {
    pub node_id: ParagraphId,
    pub screen: Vec2,
    /// Free text; only validated on commit.
    pub number_field: String,
    pub title_field: String,
    pub locked: bool,
    pub kind: ParagraphKind,
    pub note_field: String,
    position: Vec2,
    title: String,
}

impl NodeInspector {
    fn new(node: &Node, screen: Vec2) -> Self {
        Self {
            node_id: node.id,
            screen,
            number_field: node.id.to_string(),
            title_field: node.title.clone(),
            locked: node.locked,
            kind: node.kind,
            note_field: String::new(),
            position: node.position(),
            title: node.title.clone(),
        }
    }

    /// Validate the number field and produce a renumber request.
    ///
    /// Invalid or colliding numbers revert the field and are never sent on.
    /// An unchanged number is accepted with no request.
    pub fn commit_number(&mut self, graph: &StoryGraph) -> Result<Option<Event>> {
        let from = self.node_id;
        let Some(to) = ParagraphId::parse_new(&self.number_field) else {
            let err = StoryMapError::InvalidParagraphNumber(self.number_field.clone());
            self.number_field = from.to_string();
            tracing::warn!("{}", err);
            return Err(err);
        };
        if to == from {
            self.number_field = from.to_string();
            return Ok(None);
        }
        if graph.contains(to) {
            self.number_field = from.to_string();
            let err = StoryMapError::RenumberCollision { from, to };
            tracing::warn!("{}", err);
            return Err(err);
        }
        self.node_id = to;
        self.number_field = to.to_string();
        Ok(Some(Event::RenumberParagraph { from, to }))
    }

    pub fn commit_title(&mut self) -> Option<Event> {
        if self.title_field == self.title {
            return None;
        }
        self.title = self.title_field.clone();
        Some(Event::SetTitle {
            id: self.node_id,
            title: self.title_field.clone(),
        })
    }

    pub fn toggle_locked(&mut self) -> Event {
        self.locked = !self.locked;
        Event::SetLocked {
            id: self.node_id,
            locked: self.locked,
        }
    }

    pub fn set_kind(&mut self, kind: ParagraphKind) -> Option<Event> {
        if kind == self.kind {
            return None;
        }
        self.kind = kind;
        Some(Event::SetKind {
            id: self.node_id,
            kind,
        })
    }

    pub fn edit(&self) -> Event {
        Event::EditParagraph { id: self.node_id }
    }

    pub fn delete(&self) -> Event {
        Event::DeleteParagraph { id: self.node_id }
    }

    /// Blank notes are not sent.
    pub fn add_note(&mut self) -> Option<Event> {
        let text = self.note_field.trim();
        if text.is_empty() {
            return None;
        }
        let event = Event::AddNote {
            id: self.node_id,
            text: text.to_string(),
        };
        self.note_field.clear();
        Some(event)
    }

    pub fn add_linked(&self) -> Event {
        let at = self.position + LINKED_NODE_OFFSET;
        Event::AddParagraph {
            parent_id: Some(self.node_id),
            position: Some((at.x, at.y)),
        }
    }
}

/// The popover: closed, on empty canvas, or on a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ContextMenu {
    #[default]
    Closed,
    Canvas {
        screen: Vec2,
        map: Vec2,
    },
    Node(NodeInspector),
}

impl ContextMenu {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn anchor(&self) -> Option<Vec2> {
        match self {
            Self::Closed => None,
            Self::Canvas { screen, .. } => Some(*screen),
            Self::Node(inspector) => Some(inspector.screen),
        }
    }

    pub fn open_canvas(&mut self, screen: Vec2, map: Vec2) {
        *self = Self::Canvas { screen, map };
    }

    pub fn open_node(&mut self, node: &Node, screen: Vec2) {
        *self = Self::Node(NodeInspector::new(node, screen));
    }

    pub fn close(&mut self) {
        *self = Self::Closed;
    }

    pub fn inspector_mut(&mut self) -> Option<&mut NodeInspector> {
        match self {
            Self::Node(inspector) => Some(inspector),
            _ => None,
        }
    }

    /// "Add node here" from the canvas menu. Closes the menu.
    pub fn add_node_here(&mut self) -> Option<Event> {
        let Self::Canvas { map, .. } = *self else {
            return None;
        };
        self.close();
        Some(Event::AddParagraph {
            parent_id: None,
            position: Some((map.x, map.y)),
        })
    }

    /// Follow a rebuilt graph: close if the node vanished, refresh toggles otherwise.
    pub fn reconcile(&mut self, graph: &StoryGraph) {
        let Self::Node(inspector) = self else {
            return;
        };
        match graph.node(inspector.node_id) {
            Some(node) => {
                inspector.locked = node.locked;
                inspector.kind = node.kind;
                inspector.position = node.position();
                inspector.title = node.title.clone();
            }
            None => {
                tracing::debug!(id = %inspector.node_id, "menu node vanished, closing");
                self.close();
            }
        }
    }
}
