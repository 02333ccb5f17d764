use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storymap_graph::StoryMapSettings;

/// How many entries the recent-projects list keeps.
const MAX_RECENT_PROJECTS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub ui_scale: f32,
    pub dark_mode: bool,
    pub auto_open_last_project: bool,
    pub last_opened_project: Option<PathBuf>,
    pub recent_projects: Vec<PathBuf>,
    pub notifications: NotificationSettings,
    pub story_map: StoryMapSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub show_edit_requests: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            show_edit_requests: true,
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            ui_scale: 1.0,
            dark_mode: true,
            auto_open_last_project: true,
            last_opened_project: None,
            recent_projects: Vec::new(),
            notifications: NotificationSettings::default(),
            story_map: StoryMapSettings::default(),
        }
    }
}

impl AppSettings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("storymap").join("settings.json"))
    }

    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Read settings from `path`, falling back to defaults on any failure.
    pub fn load_from(path: &Path) -> Self {
        tracing::info!("Loading settings from {:?}", path);
        if !path.exists() {
            tracing::info!("Settings file not found, using defaults");
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => return settings,
                Err(e) => tracing::error!("Failed to parse settings: {}", e),
            },
            Err(e) => tracing::error!("Failed to read settings file: {}", e),
        }
        Self::default()
    }

    pub fn save(&self) {
        let Some(path) = Self::default_path() else {
            return;
        };
        if let Err(e) = self.save_to(&path) {
            tracing::error!("Failed to save settings: {:#}", e);
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Move `path` to the front of the recent list and remember it as last opened.
    pub fn remember_project(&mut self, path: &Path) {
        self.recent_projects.retain(|p| p != path);
        self.recent_projects.insert(0, path.to_path_buf());
        self.recent_projects.truncate(MAX_RECENT_PROJECTS);
        self.last_opened_project = Some(path.to_path_buf());
    }

    /// Project to reopen at startup, if it still exists.
    pub fn startup_project(&self) -> Option<PathBuf> {
        if !self.auto_open_last_project {
            return None;
        }
        self.last_opened_project
            .iter()
            .chain(self.recent_projects.iter())
            .find(|p| p.is_file())
            .cloned()
    }
}
