use eframe::egui;
use egui_notify::{Anchor, Toast, Toasts};
use std::time::{Duration, Instant};

/// Identical messages inside this window are shown once.
const DEDUP_WINDOW: Duration = Duration::from_secs(2);
const MAX_RECENT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    fn duration(self) -> Duration {
        match self {
            Self::Info => Duration::from_secs(3),
            Self::Success => Duration::from_secs(4),
            Self::Warning => Duration::from_secs(5),
            Self::Error => Duration::from_secs(8),
        }
    }
}

/// Toast feedback for rejected edits, saves and backdrop failures.
pub struct NotificationManager {
    toasts: Toasts,
    recent: Vec<(String, Instant)>,
    pub enabled: bool,
}

impl NotificationManager {
    pub fn new() -> Self {
        let toasts = Toasts::new()
            .with_anchor(Anchor::BottomLeft)
            .with_margin(egui::vec2(8.0, 8.0));
        Self {
            toasts,
            recent: Vec::new(),
            enabled: true,
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let message = message.into();
        if !self.enabled || self.is_duplicate(&message) {
            return;
        }
        self.recent.push((message.clone(), Instant::now()));
        if self.recent.len() > MAX_RECENT {
            self.recent.remove(0);
        }

        let mut toast = match level {
            NotificationLevel::Info => Toast::info(&message),
            NotificationLevel::Success => Toast::success(&message),
            NotificationLevel::Warning => Toast::warning(&message),
            NotificationLevel::Error => Toast::error(&message),
        };
        toast.duration(Some(level.duration()));
        self.toasts.add(toast);
    }

    fn is_duplicate(&mut self, message: &str) -> bool {
        let now = Instant::now();
        self.recent
            .retain(|(_, at)| now.duration_since(*at) < DEDUP_WINDOW);
        self.recent.iter().any(|(msg, _)| msg == message)
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message);
    }

    /// Call once per frame.
    pub fn show(&mut self, ctx: &egui::Context) {
        self.toasts.show(ctx);
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}
