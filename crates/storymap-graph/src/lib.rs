//! Story Map engine: derived node/link model, viewport and minimap
//! projections, hit testing and the pointer gesture state machine.

pub mod context_menu;
pub mod geometry;
pub mod hit_tester;
pub mod interaction;
pub mod link_path;
pub mod migration;
pub mod minimap;
pub mod model;
pub mod settings;
pub mod story_map;
pub mod viewport;

pub use context_menu::{ContextMenu, NodeInspector};
pub use geometry::{CubicBezier, Rect, Vec2};
pub use hit_tester::{HitResult, HitTester};
pub use interaction::{GestureCommit, GestureContext, GestureState, InteractionController};
pub use link_path::LinkStyle;
pub use migration::{LegacyMigration, migrate_legacy_positions};
pub use minimap::{MiniMap, MiniMapNavigator};
pub use model::{Link, Node, StoryGraph, derive_graph, footprint};
pub use settings::StoryMapSettings;
pub use story_map::StoryMap;
pub use viewport::Viewport;
