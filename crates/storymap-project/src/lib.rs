use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use storymap_core::{MapSettings, Paragraph};
use storymap_events::ParagraphStore;

pub mod store;

pub use store::InMemoryStore;

/// On-disk project: the paragraph list plus map settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub map_settings: MapSettings,
}

pub struct Project {
    pub file: ProjectFile,
    pub path: PathBuf,
}

impl Project {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read project {}", path.display()))?;
        let file: ProjectFile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse project {}", path.display()))?;
        tracing::info!(
            "Loaded project {:?} ({} paragraphs)",
            path,
            file.paragraphs.len()
        );
        Ok(Self { file, path })
    }

    pub fn save(&self) -> Result<()> {
        self.save_as(&self.path)
    }

    pub fn save_as(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&self.file)?;
        fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("Saved project to {:?}", path);
        Ok(())
    }

    /// Hand the contents to a store the map can mutate.
    pub fn into_store(self) -> (InMemoryStore, PathBuf) {
        let store = InMemoryStore::new(self.file.paragraphs, self.file.map_settings);
        (store, self.path)
    }

    /// Take the store's current contents back for saving.
    pub fn from_store(name: String, store: &InMemoryStore, path: PathBuf) -> Self {
        Self {
            file: ProjectFile {
                name,
                paragraphs: store.paragraphs().to_vec(),
                map_settings: store.map_settings().clone(),
            },
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storymap_core::{Action, ParagraphId};
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("book.json");
        let project = Project {
            file: ProjectFile {
                name: "Dungeon".into(),
                paragraphs: vec![
                    Paragraph::new(ParagraphId(1), "Gate")
                        .with_action(Action::new("enter", "2"))
                        .with_position(10.0, 20.0),
                    Paragraph::new(ParagraphId(2), "Hall"),
                ],
                map_settings: MapSettings::default(),
            },
            path: path.clone(),
        };
        project.save().unwrap();

        let loaded = Project::load(&path).unwrap();
        assert_eq!(loaded.file, project.file);
    }

    #[test]
    fn test_load_reads_external_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.json");
        fs::write(
            &path,
            r#"{
                "paragraphs": [
                    {"id": 1, "title": "Start", "type": "node",
                     "actions": [{"text": "go", "N.Par.": "2"}], "x": 5, "y": 6},
                    {"id": 2, "title": "End", "type": "final"}
                ],
                "mapSettings": {"positions": {"2": {"x": 100, "y": 200}}}
            }"#,
        )
        .unwrap();
        let project = Project::load(&path).unwrap();
        assert_eq!(project.file.paragraphs.len(), 2);
        assert_eq!(project.file.paragraphs[0].actions[0].target, "2");
        assert!(project.file.map_settings.has_legacy_positions());
    }

    #[test]
    fn test_load_missing_file_fails_with_context() {
        let dir = tempdir().unwrap();
        let err = match Project::load(dir.path().join("nope.json")) {
            Ok(_) => panic!("expected an error"),
            Err(err) => err,
        };
        assert!(err.to_string().contains("failed to read project"));
    }
}
