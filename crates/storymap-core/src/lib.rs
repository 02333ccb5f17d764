use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
pub mod map_settings;

pub use error::{Result, StoryMapError};
pub use map_settings::{ImageAdjustments, LegacyPosition, MapSettings};

/// Author-assigned paragraph number. Unique, but not necessarily contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParagraphId(pub i64);

impl fmt::Display for ParagraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ParagraphId {
    /// Parse the string form stored in an action target.
    ///
    /// Any integer that fits an id parses, so existing paragraphs numbered 0
    /// or below can still be linked. Empty and non-numeric inputs yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse::<i64>().ok().map(Self)
    }

    /// Parse a number typed by the author for a new or renumbered paragraph.
    /// Only positive numbers are handed out.
    pub fn parse_new(text: &str) -> Option<Self> {
        Self::parse(text).filter(|id| id.0 > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParagraphKind {
    #[default]
    Normal,
    Node,
    Final,
}

impl ParagraphKind {
    pub const ALL: [ParagraphKind; 3] = [Self::Normal, Self::Node, Self::Final];

    /// Human-readable label, also matched by search.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Node => "Node",
            Self::Final => "Final",
        }
    }
}

/// A reader choice: descriptive text plus the string form of the target id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub text: String,
    /// Empty means "no link yet".
    #[serde(rename = "N.Par.", default)]
    pub target: String,
}

impl Action {
    pub fn new(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target: target.into(),
        }
    }

    pub fn linking_to(target: ParagraphId) -> Self {
        Self::new(String::new(), target.to_string())
    }

    pub fn target_id(&self) -> Option<ParagraphId> {
        ParagraphId::parse(&self.target)
    }
}

/// Canonical paragraph as held by the external store, with its spatial hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub id: ParagraphId,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: ParagraphKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incoming_connections: Vec<ParagraphId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outgoing_connections: Vec<ParagraphId>,
}

impl Paragraph {
    pub fn new(id: ParagraphId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            kind: ParagraphKind::Normal,
            content: String::new(),
            actions: Vec::new(),
            x: None,
            y: None,
            locked: None,
            note: None,
            incoming_connections: Vec::new(),
            outgoing_connections: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: ParagraphKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    pub fn has_position(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.locked.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!(ParagraphId::parse("12"), Some(ParagraphId(12)));
        assert_eq!(ParagraphId::parse(" 7 "), Some(ParagraphId(7)));
        assert_eq!(ParagraphId::parse(""), None);
        assert_eq!(ParagraphId::parse("abc"), None);
        assert_eq!(ParagraphId::parse("2x"), None);
        assert_eq!(ParagraphId::parse("0"), Some(ParagraphId(0)));
        assert_eq!(ParagraphId::parse("-3"), Some(ParagraphId(-3)));
    }

    #[test]
    fn test_parse_new_number_is_positive() {
        assert_eq!(ParagraphId::parse_new(" 9 "), Some(ParagraphId(9)));
        assert_eq!(ParagraphId::parse_new("0"), None);
        assert_eq!(ParagraphId::parse_new("-3"), None);
        assert_eq!(ParagraphId::parse_new("x"), None);
    }

    #[test]
    fn test_paragraph_json_shape() {
        let json = r#"{
            "id": 1,
            "title": "Start",
            "type": "node",
            "content": "You wake up.",
            "actions": [{ "text": "go", "N.Par.": "2" }, { "text": "wait", "N.Par.": "" }],
            "x": 120.5,
            "y": 40,
            "locked": true
        }"#;
        let paragraph: Paragraph = serde_json::from_str(json).unwrap();
        assert_eq!(paragraph.id, ParagraphId(1));
        assert_eq!(paragraph.kind, ParagraphKind::Node);
        assert_eq!(paragraph.actions[0].target_id(), Some(ParagraphId(2)));
        assert_eq!(paragraph.actions[1].target_id(), None);
        assert!(paragraph.is_locked());
        assert!(paragraph.has_position());

        let back = serde_json::to_value(&paragraph).unwrap();
        assert_eq!(back["actions"][0]["N.Par."], "2");
        assert_eq!(back["type"], "node");
    }

    #[test]
    fn test_minimal_paragraph_defaults() {
        let paragraph: Paragraph = serde_json::from_str(r#"{ "id": 9 }"#).unwrap();
        assert_eq!(paragraph.kind, ParagraphKind::Normal);
        assert!(!paragraph.is_locked());
        assert!(!paragraph.has_position());
        assert!(paragraph.actions.is_empty());
    }
}
