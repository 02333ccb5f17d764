#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use eframe::egui;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod app;
mod components;
mod settings;

use app::StoryMapApp;

fn main() -> eframe::Result<()> {
    // RUST_LOG=storymap_graph=debug shows rebuilds and rejected events.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let project = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title("Story Map"),
        ..Default::default()
    };

    eframe::run_native(
        "Story Map",
        options,
        Box::new(|cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(StoryMapApp::new(cc, project)))
        }),
    )
}
