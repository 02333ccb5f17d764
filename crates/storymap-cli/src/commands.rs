use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::path::Path;
use storymap_backdrop::{Backdrop, encode_data_uri, mime_for_extension};
use storymap_core::{Paragraph, ParagraphId, ParagraphKind};
use storymap_events::renumber;
use storymap_graph::{derive_graph, migrate_legacy_positions};
use storymap_project::Project;
use storymap_search::{NodeSearch, SearchMatch};

/// Structural summary of a project.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Stats {
    pub paragraphs: usize,
    pub links: usize,
    pub finals: usize,
    pub unpositioned: usize,
    pub legacy_positions: usize,
    /// `(source, raw target)` for actions whose target is not a paragraph.
    pub dangling: Vec<(ParagraphId, String)>,
}

pub fn stats(project: &Project) -> Stats {
    let paragraphs = &project.file.paragraphs;
    let graph = derive_graph(paragraphs, None);
    let ids: HashSet<ParagraphId> = paragraphs.iter().map(|p| p.id).collect();

    let mut stats = Stats {
        paragraphs: paragraphs.len(),
        links: graph.links.len(),
        finals: paragraphs
            .iter()
            .filter(|p| p.kind == ParagraphKind::Final)
            .count(),
        unpositioned: paragraphs.iter().filter(|p| !p.has_position()).count(),
        legacy_positions: project.file.map_settings.positions.len(),
        ..Default::default()
    };
    for paragraph in paragraphs {
        for action in &paragraph.actions {
            if action.target.trim().is_empty() {
                continue;
            }
            let alive = action.target_id().is_some_and(|id| ids.contains(&id));
            if !alive {
                stats.dangling.push((paragraph.id, action.target.clone()));
            }
        }
    }
    stats
}

pub fn search(paragraphs: &[Paragraph], query: &str, limit: usize) -> Vec<SearchMatch> {
    let graph = derive_graph(paragraphs, None);
    NodeSearch::new(limit).search(&graph.nodes, query)
}

/// Fold legacy positions into the paragraphs. Returns how many moved.
pub fn migrate(project: &mut Project) -> usize {
    let Some(migration) =
        migrate_legacy_positions(&project.file.paragraphs, &project.file.map_settings)
    else {
        return 0;
    };
    project.file.paragraphs = migration.paragraphs;
    project.file.map_settings = migration.settings;
    migration.migrated
}

pub fn renumber_paragraph(project: &mut Project, from: i64, to: i64) -> Result<()> {
    if from <= 0 || to <= 0 {
        bail!("paragraph numbers must be positive");
    }
    let (from, to) = (ParagraphId(from), ParagraphId(to));
    project.file.paragraphs = renumber(&project.file.paragraphs, from, to)?;
    Ok(())
}

/// Embed `image` as the map backdrop, or clear it when `None`.
pub fn set_backdrop(project: &mut Project, image: Option<&Path>) -> Result<()> {
    let settings = &mut project.file.map_settings;
    let Some(path) = image else {
        settings.background_image = None;
        settings.image_adjustments.original_aspect_ratio = None;
        return Ok(());
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let backdrop =
        Backdrop::from_bytes(&bytes).with_context(|| format!("decoding {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    settings.background_image = Some(encode_data_uri(mime_for_extension(ext), &bytes));
    settings.image_adjustments.original_aspect_ratio = Some(backdrop.aspect_ratio());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storymap_core::{Action, LegacyPosition, MapSettings};
    use storymap_project::ProjectFile;

    fn project() -> Project {
        let mut map_settings = MapSettings::default();
        map_settings
            .positions
            .insert("3".into(), LegacyPosition { x: 40.0, y: 50.0 });
        Project {
            file: ProjectFile {
                name: "Forest".into(),
                paragraphs: vec![
                    Paragraph::new(ParagraphId(1), "Edge of the forest")
                        .with_action(Action::new("path", "2"))
                        .with_action(Action::new("river", "9"))
                        .with_position(0.0, 0.0),
                    Paragraph::new(ParagraphId(2), "Clearing")
                        .with_action(Action::new("", ""))
                        .with_position(200.0, 0.0),
                    Paragraph::new(ParagraphId(3), "Witch hut").with_kind(ParagraphKind::Final),
                ],
                map_settings,
            },
            path: "forest.json".into(),
        }
    }

    #[test]
    fn test_stats_counts_structure() {
        let stats = stats(&project());
        assert_eq!(stats.paragraphs, 3);
        assert_eq!(stats.links, 1);
        assert_eq!(stats.finals, 1);
        assert_eq!(stats.unpositioned, 1);
        assert_eq!(stats.legacy_positions, 1);
        assert_eq!(stats.dangling, vec![(ParagraphId(1), "9".to_string())]);
    }

    #[test]
    fn test_search_finds_title() {
        let results = search(&project().file.paragraphs, "witch", 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, ParagraphId(3));
    }

    #[test]
    fn test_migrate_moves_legacy_positions() {
        let mut project = project();
        assert_eq!(migrate(&mut project), 1);
        let hut = &project.file.paragraphs[2];
        assert_eq!((hut.x, hut.y), (Some(40.0), Some(50.0)));
        assert!(project.file.map_settings.positions.is_empty());
        assert_eq!(migrate(&mut project), 0);
    }

    #[test]
    fn test_renumber_rejects_collision_and_retargets() {
        let mut project = project();
        assert!(renumber_paragraph(&mut project, 2, 3).is_err());
        assert!(renumber_paragraph(&mut project, 2, 0).is_err());
        renumber_paragraph(&mut project, 2, 20).unwrap();
        assert_eq!(project.file.paragraphs[1].id, ParagraphId(20));
        assert_eq!(project.file.paragraphs[0].actions[0].target, "20");
    }

    #[test]
    fn test_backdrop_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let mut project = project();
        assert!(set_backdrop(&mut project, Some(&path)).is_err());
        assert!(project.file.map_settings.background_image.is_none());

        project.file.map_settings.background_image = Some("data:image/png;base64,AAAA".into());
        set_backdrop(&mut project, None).unwrap();
        assert!(project.file.map_settings.background_image.is_none());
    }
}
