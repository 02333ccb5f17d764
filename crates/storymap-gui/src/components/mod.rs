pub mod backdrop;
pub mod canvas;
pub mod context_menu;
pub mod minimap;
pub mod notifications;
pub mod palette;
pub mod search_bar;
pub mod toolbar;
