use crate::geometry::{CubicBezier, Vec2};
use crate::model::Node;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkStyle {
    Straight,
    #[default]
    Curved,
}

impl LinkStyle {
    pub fn label(self) -> &'static str {
        match self {
            Self::Straight => "Straight",
            Self::Curved => "Curved",
        }
    }
}

const MIN_HANDLE: f32 = 40.0;
const MAX_HANDLE: f32 = 260.0;
const LOOP_REACH: f32 = 60.0;

/// Path from `start` to `end`, leaving and entering horizontally when curved.
pub fn route(start: Vec2, end: Vec2, style: LinkStyle) -> CubicBezier {
    match style {
        LinkStyle::Straight => CubicBezier::line(start, end),
        LinkStyle::Curved => {
            let handle = ((end.x - start.x).abs() * 0.5).clamp(MIN_HANDLE, MAX_HANDLE);
            CubicBezier {
                start,
                control1: start + Vec2::new(handle, 0.0),
                control2: end - Vec2::new(handle, 0.0),
                end,
            }
        }
    }
}

/// Map-space path of a link: source connector to target inlet.
///
/// A paragraph linking to itself arcs over its own node whatever the style.
pub fn link_curve(source: &Node, target: &Node, style: LinkStyle) -> CubicBezier {
    if source.id == target.id {
        return loop_curve(source);
    }
    route(source.connector(), target.inlet(), style)
}

fn loop_curve(node: &Node) -> CubicBezier {
    let lift = Vec2::new(0.0, node.size().y + LOOP_REACH);
    let start = node.connector();
    let end = node.inlet();
    CubicBezier {
        start,
        control1: start + Vec2::new(LOOP_REACH, 0.0) - lift,
        control2: end - Vec2::new(LOOP_REACH, 0.0) - lift,
        end,
    }
}

/// The dashed path drawn while a link gesture is in flight.
pub fn preview_curve(source: &Node, pointer: Vec2, style: LinkStyle) -> CubicBezier {
    route(source.connector(), pointer, style)
}
