use crate::ParagraphId;
use thiserror::Error;

/// Failures the Story Map recovers from locally.
///
/// None of these are fatal: the caller rejects the offending input and keeps
/// the previous state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoryMapError {
    #[error("paragraph {to} already exists, cannot renumber {from}")]
    RenumberCollision { from: ParagraphId, to: ParagraphId },
    #[error("unknown paragraph {0}")]
    UnknownParagraph(ParagraphId),
    #[error("invalid paragraph number: {0:?}")]
    InvalidParagraphNumber(String),
    #[error("degenerate geometry: {width}x{height}")]
    DegenerateGeometry { width: f32, height: f32 },
}

pub type Result<T> = std::result::Result<T, StoryMapError>;
