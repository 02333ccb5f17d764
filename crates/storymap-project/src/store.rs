use storymap_core::{Action, MapSettings, Paragraph, ParagraphId};
use storymap_events::{NodePlacement, ParagraphStore};

/// Paragraph store backed by a plain vector, as used by the desktop and CLI hosts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    paragraphs: Vec<Paragraph>,
    map_settings: MapSettings,
    edit_requests: Vec<ParagraphId>,
    closed: bool,
    dirty: bool,
}

impl InMemoryStore {
    pub fn new(paragraphs: Vec<Paragraph>, map_settings: MapSettings) -> Self {
        Self {
            paragraphs,
            map_settings,
            ..Default::default()
        }
    }

    /// Paragraphs the map asked to open in the text editor, oldest first.
    pub fn take_edit_requests(&mut self) -> Vec<ParagraphId> {
        std::mem::take(&mut self.edit_requests)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reopen after the host brought the map back.
    pub fn reopen(&mut self) {
        self.closed = false;
    }

    /// Unsaved changes since the last `mark_saved`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn next_id(&self) -> ParagraphId {
        ParagraphId(self.paragraphs.iter().map(|p| p.id.0).max().unwrap_or(0) + 1)
    }

    fn find_mut(&mut self, id: ParagraphId) -> Option<&mut Paragraph> {
        self.paragraphs.iter_mut().find(|p| p.id == id)
    }

    fn connect(&mut self, source: ParagraphId, target: ParagraphId) {
        if let Some(p) = self.find_mut(source) {
            p.actions.push(Action::linking_to(target));
            if !p.outgoing_connections.contains(&target) {
                p.outgoing_connections.push(target);
            }
        }
        if let Some(p) = self.find_mut(target)
            && !p.incoming_connections.contains(&source)
        {
            p.incoming_connections.push(source);
        }
    }
}

impl ParagraphStore for InMemoryStore {
    fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    fn map_settings(&self) -> &MapSettings {
        &self.map_settings
    }

    fn edit_paragraph(&mut self, id: ParagraphId) {
        tracing::info!(%id, "edit requested");
        self.edit_requests.push(id);
    }

    /// Actions elsewhere that pointed at `id` are left as they are; the map
    /// treats them as dangling.
    fn delete_paragraph(&mut self, id: ParagraphId) {
        let before = self.paragraphs.len();
        self.paragraphs.retain(|p| p.id != id);
        if self.paragraphs.len() == before {
            return;
        }
        for p in &mut self.paragraphs {
            p.incoming_connections.retain(|c| *c != id);
            p.outgoing_connections.retain(|c| *c != id);
        }
        self.dirty = true;
        tracing::info!(%id, "paragraph deleted");
    }

    fn add_note(&mut self, id: ParagraphId, text: &str) {
        if let Some(p) = self.find_mut(id) {
            p.note = Some(match p.note.take() {
                Some(existing) if !existing.is_empty() => format!("{existing}\n{text}"),
                _ => text.to_string(),
            });
            self.dirty = true;
        }
    }

    fn add_paragraph(&mut self, parent_id: Option<ParagraphId>, position: Option<(f32, f32)>) {
        let id = self.next_id();
        let mut paragraph = Paragraph::new(id, String::new());
        if let Some((x, y)) = position {
            paragraph = paragraph.with_position(x, y);
        }
        self.paragraphs.push(paragraph);
        if let Some(parent) = parent_id {
            self.connect(parent, id);
        }
        self.dirty = true;
        tracing::info!(%id, ?parent_id, "paragraph added");
    }

    fn link_paragraphs(&mut self, source: ParagraphId, target: ParagraphId) {
        self.connect(source, target);
        self.dirty = true;
    }

    /// Placements are applied regardless of the lock flag. Only a paragraph
    /// that actually moved marks the store dirty.
    fn save_layout(&mut self, nodes: &[NodePlacement]) {
        let mut moved = false;
        for placement in nodes {
            if let Some(p) = self.find_mut(placement.id) {
                let (x, y) = (Some(placement.x), Some(placement.y));
                if p.x != x || p.y != y {
                    p.x = x;
                    p.y = y;
                    moved = true;
                }
            }
        }
        if moved {
            self.dirty = true;
        }
    }

    fn update_paragraphs(&mut self, paragraphs: Vec<Paragraph>) {
        self.paragraphs = paragraphs;
        self.dirty = true;
    }

    fn update_map_settings(&mut self, settings: MapSettings) {
        self.map_settings = settings;
        self.dirty = true;
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryStore {
        InMemoryStore::new(
            vec![
                Paragraph::new(ParagraphId(3), "a"),
                Paragraph::new(ParagraphId(8), "b"),
            ],
            MapSettings::default(),
        )
    }

    #[test]
    fn test_add_paragraph_uses_next_id_and_links_parent() {
        let mut store = store();
        store.add_paragraph(Some(ParagraphId(3)), Some((40.0, 50.0)));
        let added = store.paragraphs().last().unwrap();
        assert_eq!(added.id, ParagraphId(9));
        assert_eq!((added.x, added.y), (Some(40.0), Some(50.0)));
        assert_eq!(added.incoming_connections, vec![ParagraphId(3)]);
        let parent = &store.paragraphs()[0];
        assert_eq!(parent.actions, vec![Action::linking_to(ParagraphId(9))]);
        assert!(store.is_dirty());
    }

    #[test]
    fn test_delete_leaves_actions_dangling() {
        let mut store = store();
        store.link_paragraphs(ParagraphId(3), ParagraphId(8));
        store.delete_paragraph(ParagraphId(8));
        assert_eq!(store.paragraphs().len(), 1);
        let p = &store.paragraphs()[0];
        assert_eq!(p.actions.len(), 1);
        assert!(p.outgoing_connections.is_empty());
    }

    #[test]
    fn test_notes_append() {
        let mut store = store();
        store.add_note(ParagraphId(3), "one");
        store.add_note(ParagraphId(3), "two");
        assert_eq!(store.paragraphs()[0].note.as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn test_layout_ignores_unknown_and_overrides_lock() {
        let mut store = InMemoryStore::new(
            vec![Paragraph::new(ParagraphId(1), "a").with_locked(true)],
            MapSettings::default(),
        );
        store.save_layout(&[
            NodePlacement { id: ParagraphId(1), x: 7.0, y: 8.0 },
            NodePlacement { id: ParagraphId(5), x: 1.0, y: 1.0 },
        ]);
        assert_eq!(store.paragraphs()[0].x, Some(7.0));
        assert_eq!(store.paragraphs().len(), 1);
        assert!(store.is_dirty());
    }

    #[test]
    fn test_layout_without_movement_stays_clean() {
        let mut store = InMemoryStore::new(
            vec![Paragraph::new(ParagraphId(1), "a").with_position(7.0, 8.0)],
            MapSettings::default(),
        );
        store.save_layout(&[NodePlacement { id: ParagraphId(5), x: 1.0, y: 1.0 }]);
        assert!(!store.is_dirty());
        store.save_layout(&[NodePlacement { id: ParagraphId(1), x: 7.0, y: 8.0 }]);
        assert!(!store.is_dirty());
        store.save_layout(&[NodePlacement { id: ParagraphId(1), x: 9.0, y: 8.0 }]);
        assert!(store.is_dirty());
    }

    #[test]
    fn test_edit_requests_and_close() {
        let mut store = store();
        store.edit_paragraph(ParagraphId(8));
        assert_eq!(store.take_edit_requests(), vec![ParagraphId(8)]);
        assert!(store.take_edit_requests().is_empty());
        store.close();
        assert!(store.is_closed());
        assert!(!store.is_dirty());
    }
}
