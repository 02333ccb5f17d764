use crate::{Event, EventBus, NodePlacement};
use crossbeam_channel::{Receiver, Sender, unbounded};
use storymap_core::{MapSettings, Paragraph, ParagraphId, Result, StoryMapError};

/// The external collaborator that owns canonical paragraph data.
///
/// Calls are synchronous; persisting them (and reporting persistence
/// failures) is the implementor's business.
pub trait ParagraphStore {
    fn paragraphs(&self) -> &[Paragraph];
    fn map_settings(&self) -> &MapSettings;

    fn edit_paragraph(&mut self, id: ParagraphId);
    fn delete_paragraph(&mut self, id: ParagraphId);
    fn add_note(&mut self, id: ParagraphId, text: &str);
    fn add_paragraph(&mut self, parent_id: Option<ParagraphId>, position: Option<(f32, f32)>);
    fn link_paragraphs(&mut self, source: ParagraphId, target: ParagraphId);
    fn save_layout(&mut self, nodes: &[NodePlacement]);
    fn update_paragraphs(&mut self, paragraphs: Vec<Paragraph>);
    fn update_map_settings(&mut self, settings: MapSettings);
    fn close(&mut self);
}

/// Latest-wins channel of paragraph-list snapshots flowing back into the map.
#[derive(Clone)]
pub struct SnapshotFeed {
    tx: Sender<Vec<Paragraph>>,
    rx: Receiver<Vec<Paragraph>>,
}

impl Default for SnapshotFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotFeed {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn publish(&self, paragraphs: Vec<Paragraph>) {
        let _ = self.tx.send(paragraphs);
    }

    /// Returns only the newest pending snapshot; older ones are dropped.
    pub fn take_latest(&self) -> Option<Vec<Paragraph>> {
        let mut latest = None;
        let mut skipped = 0usize;
        while let Ok(snapshot) = self.rx.try_recv() {
            if latest.is_some() {
                skipped += 1;
            }
            latest = Some(snapshot);
        }
        if skipped > 0 {
            tracing::debug!(skipped, "coalesced paragraph snapshots");
        }
        latest
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlushReport {
    pub applied: usize,
    pub rejected: Vec<StoryMapError>,
    pub paragraphs_changed: bool,
    pub settings_changed: bool,
    pub closed: bool,
}

/// Routes Story Map events into a `ParagraphStore` and store changes back out.
#[derive(Clone, Default)]
pub struct SyncBridge {
    bus: EventBus,
    feed: SnapshotFeed,
}

impl SyncBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bus the Story Map publishes its mutation intents on.
    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    pub fn feed(&self) -> SnapshotFeed {
        self.feed.clone()
    }

    /// Apply every pending event to `store`, then publish one fresh snapshot
    /// if the paragraph list changed.
    pub fn flush<S: ParagraphStore>(&self, store: &mut S) -> FlushReport {
        let mut report = FlushReport::default();
        for event in self.bus.drain() {
            match apply(&event, store) {
                Ok(effect) => {
                    report.applied += 1;
                    match effect {
                        Effect::Paragraphs => report.paragraphs_changed = true,
                        Effect::Settings => report.settings_changed = true,
                        Effect::Closed => report.closed = true,
                        Effect::None => {}
                    }
                }
                Err(err) => {
                    tracing::warn!("rejected map event {:?}: {}", event, err);
                    report.rejected.push(err);
                }
            }
        }
        if report.paragraphs_changed {
            self.feed.publish(store.paragraphs().to_vec());
        }
        report
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    None,
    Paragraphs,
    Settings,
    Closed,
}

fn require<S: ParagraphStore>(store: &S, id: ParagraphId) -> Result<()> {
    if store.paragraphs().iter().any(|p| p.id == id) {
        Ok(())
    } else {
        Err(StoryMapError::UnknownParagraph(id))
    }
}

fn patch_one<S, F>(store: &mut S, id: ParagraphId, patch: F) -> Result<Effect>
where
    S: ParagraphStore,
    F: FnOnce(&mut Paragraph),
{
    let mut paragraphs = store.paragraphs().to_vec();
    let target = paragraphs
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or(StoryMapError::UnknownParagraph(id))?;
    patch(target);
    store.update_paragraphs(paragraphs);
    Ok(Effect::Paragraphs)
}

/// Give paragraph `from` the number `to`, retargeting every action and
/// connection list that referenced the old number.
pub fn renumber(paragraphs: &[Paragraph], from: ParagraphId, to: ParagraphId) -> Result<Vec<Paragraph>> {
    if !paragraphs.iter().any(|p| p.id == from) {
        return Err(StoryMapError::UnknownParagraph(from));
    }
    if from != to && paragraphs.iter().any(|p| p.id == to) {
        return Err(StoryMapError::RenumberCollision { from, to });
    }
    let old = from.to_string();
    let new = to.to_string();
    let remap = |id: &mut ParagraphId| {
        if *id == from {
            *id = to;
        }
    };
    let mut out = paragraphs.to_vec();
    for paragraph in &mut out {
        remap(&mut paragraph.id);
        for action in &mut paragraph.actions {
            if action.target_id() == Some(from) || action.target.trim() == old {
                action.target = new.clone();
            }
        }
        paragraph.incoming_connections.iter_mut().for_each(remap);
        paragraph.outgoing_connections.iter_mut().for_each(remap);
    }
    Ok(out)
}

fn apply<S: ParagraphStore>(event: &Event, store: &mut S) -> Result<Effect> {
    match event {
        Event::EditParagraph { id } => {
            require(store, *id)?;
            store.edit_paragraph(*id);
            Ok(Effect::None)
        }
        Event::DeleteParagraph { id } => {
            require(store, *id)?;
            store.delete_paragraph(*id);
            Ok(Effect::Paragraphs)
        }
        Event::AddNote { id, text } => {
            require(store, *id)?;
            store.add_note(*id, text);
            Ok(Effect::Paragraphs)
        }
        Event::AddParagraph {
            parent_id,
            position,
        } => {
            if let Some(parent) = parent_id {
                require(store, *parent)?;
            }
            store.add_paragraph(*parent_id, *position);
            Ok(Effect::Paragraphs)
        }
        Event::LinkParagraphs { source, target } => {
            require(store, *source)?;
            require(store, *target)?;
            store.link_paragraphs(*source, *target);
            Ok(Effect::Paragraphs)
        }
        Event::MoveNode(placement) => {
            require(store, placement.id)?;
            store.save_layout(std::slice::from_ref(placement));
            Ok(Effect::Paragraphs)
        }
        Event::SaveLayout { nodes } => {
            store.save_layout(nodes);
            Ok(Effect::Paragraphs)
        }
        Event::RenumberParagraph { from, to } => {
            let renumbered = renumber(store.paragraphs(), *from, *to)?;
            store.update_paragraphs(renumbered);
            Ok(Effect::Paragraphs)
        }
        Event::SetTitle { id, title } => patch_one(store, *id, |p| p.title = title.clone()),
        Event::SetLocked { id, locked } => patch_one(store, *id, |p| p.locked = Some(*locked)),
        Event::SetKind { id, kind } => patch_one(store, *id, |p| p.kind = *kind),
        Event::UpdateParagraphs { paragraphs } => {
            store.update_paragraphs(paragraphs.clone());
            Ok(Effect::Paragraphs)
        }
        Event::UpdateMapSettings { settings } => {
            store.update_map_settings(settings.clone());
            Ok(Effect::Settings)
        }
        Event::Close => {
            store.close();
            Ok(Effect::Closed)
        }
    }
}
