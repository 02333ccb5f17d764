use storymap_core::{MapSettings, Paragraph};

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyMigration {
    pub paragraphs: Vec<Paragraph>,
    /// Same settings with the positions map emptied.
    pub settings: MapSettings,
    /// How many paragraphs picked up a position.
    pub migrated: usize,
}

/// Fold the old `positions` map into per-paragraph coordinates.
///
/// Paragraphs that already carry a position keep it. Returns `None` when
/// there is nothing to migrate.
pub fn migrate_legacy_positions(paragraphs: &[Paragraph], settings: &MapSettings) -> Option<LegacyMigration> {
    if !settings.has_legacy_positions() {
        return None;
    }
    let mut migrated = 0;
    let paragraphs = paragraphs
        .iter()
        .map(|paragraph| {
            let mut paragraph = paragraph.clone();
            if !paragraph.has_position()
                && let Some(pos) = settings.positions.get(&paragraph.id.to_string())
            {
                paragraph.x = Some(pos.x);
                paragraph.y = Some(pos.y);
                migrated += 1;
            }
            paragraph
        })
        .collect();
    let mut settings = settings.clone();
    settings.positions.clear();
    tracing::info!(migrated, "migrated legacy map positions");
    Some(LegacyMigration {
        paragraphs,
        settings,
        migrated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use storymap_core::{LegacyPosition, ParagraphId};

    #[test]
    fn test_positions_fill_missing_coordinates() {
        let paragraphs = vec![
            Paragraph::new(ParagraphId(1), "a"),
            Paragraph::new(ParagraphId(2), "b").with_position(5.0, 6.0),
            Paragraph::new(ParagraphId(3), "c"),
        ];
        let mut settings = MapSettings::default();
        settings.positions.insert("1".into(), LegacyPosition { x: 100.0, y: 200.0 });
        settings.positions.insert("2".into(), LegacyPosition { x: 900.0, y: 900.0 });
        settings.positions.insert("77".into(), LegacyPosition { x: 1.0, y: 1.0 });

        let result = migrate_legacy_positions(&paragraphs, &settings).unwrap();
        assert_eq!(result.migrated, 1);
        assert_eq!((result.paragraphs[0].x, result.paragraphs[0].y), (Some(100.0), Some(200.0)));
        assert_eq!((result.paragraphs[1].x, result.paragraphs[1].y), (Some(5.0), Some(6.0)));
        assert!(!result.paragraphs[2].has_position());
        assert!(!result.settings.has_legacy_positions());
    }

    #[test]
    fn test_nothing_to_migrate() {
        let paragraphs = vec![Paragraph::new(ParagraphId(1), "a")];
        assert!(migrate_legacy_positions(&paragraphs, &MapSettings::default()).is_none());
    }
}
