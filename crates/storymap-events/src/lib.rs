//! Mutation intents emitted by the Story Map and the bridge that delivers them
//! to the paragraph store that owns the canonical data.

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use storymap_core::{MapSettings, Paragraph, ParagraphId, ParagraphKind};

pub mod bridge;

pub use bridge::{FlushReport, ParagraphStore, SnapshotFeed, SyncBridge, renumber};

/// Map-space position of one node, as persisted by `onSave`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePlacement {
    pub id: ParagraphId,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Paragraph lifecycle
    EditParagraph {
        id: ParagraphId,
    },
    DeleteParagraph {
        id: ParagraphId,
    },
    AddNote {
        id: ParagraphId,
        text: String,
    },
    /// `position` places the new node; it is applied even where a drag would be refused.
    AddParagraph {
        parent_id: Option<ParagraphId>,
        position: Option<(f32, f32)>,
    },

    // Graph
    LinkParagraphs {
        source: ParagraphId,
        target: ParagraphId,
    },
    MoveNode(NodePlacement),
    SaveLayout {
        nodes: Vec<NodePlacement>,
    },

    // Inspector
    RenumberParagraph {
        from: ParagraphId,
        to: ParagraphId,
    },
    SetTitle {
        id: ParagraphId,
        title: String,
    },
    SetLocked {
        id: ParagraphId,
        locked: bool,
    },
    SetKind {
        id: ParagraphId,
        kind: ParagraphKind,
    },

    // Bulk sync
    UpdateParagraphs {
        paragraphs: Vec<Paragraph>,
    },
    UpdateMapSettings {
        settings: MapSettings,
    },

    /// Leave the map and return to the text editor.
    Close,
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn publish(&self, event: Event) {
        tracing::debug!(?event, "map event");
        let _ = self.tx.send(event);
    }

    /// Drain pending events without blocking.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}
