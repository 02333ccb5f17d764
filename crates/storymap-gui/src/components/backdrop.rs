use super::canvas::BackdropTexture;
use anyhow::{Context, Result};
use eframe::egui;
use std::path::Path;
use std::time::{Duration, Instant};
use storymap_backdrop::{
    AdjustmentDebouncer, Backdrop, BackdropCompositor, display_size, encode_data_uri,
    mime_for_extension,
};
use storymap_core::{ImageAdjustments, MapSettings};
use storymap_graph::{StoryMap, Vec2};

pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Owns the decoded backdrop, its GPU texture and the adjustment sliders.
pub struct BackdropLayer {
    compositor: BackdropCompositor,
    debouncer: AdjustmentDebouncer,
    texture: Option<(egui::TextureHandle, ImageAdjustments)>,
    /// Slider state; ahead of the map settings while an edit is debounced.
    editing: ImageAdjustments,
    pub window_open: bool,
}

impl BackdropLayer {
    pub fn new(debounce: Duration) -> Self {
        Self {
            compositor: BackdropCompositor::new(),
            debouncer: AdjustmentDebouncer::new(debounce),
            texture: None,
            editing: ImageAdjustments::default(),
            window_open: false,
        }
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        if self.debouncer.delay() != debounce {
            self.debouncer = AdjustmentDebouncer::new(debounce);
        }
    }

    pub fn has_image(&self) -> bool {
        self.compositor.has_source()
    }

    /// Follow the map settings: decode a new source, flush settled slider
    /// edits into the map, and re-upload the texture when the look changed.
    pub fn sync(&mut self, ctx: &egui::Context, map: &mut StoryMap) -> storymap_backdrop::Result<()> {
        let now = Instant::now();
        if let Some(settled) = self.debouncer.poll(now) {
            map.set_image_adjustments(settled);
        }
        if let Some(remaining) = self.debouncer.remaining(now) {
            ctx.request_repaint_after(remaining);
        } else {
            self.editing = map.map_settings().image_adjustments.clone();
        }

        let settings = map.map_settings();
        let decoded = self.compositor.set_source(settings.background_image.as_deref());
        if decoded.is_err() || !self.compositor.has_source() {
            self.texture = None;
            return decoded;
        }
        self.refresh_texture(ctx, settings);
        Ok(())
    }

    fn refresh_texture(&mut self, ctx: &egui::Context, settings: &MapSettings) {
        let adjustments = &settings.image_adjustments;
        if matches!(&self.texture, Some((_, adj)) if adj == adjustments) {
            return;
        }
        let Some(image) = self.compositor.render(adjustments) else {
            return;
        };
        let size = [image.width() as usize, image.height() as usize];
        let color = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
        let texture = ctx.load_texture("story_map_backdrop", color, egui::TextureOptions::LINEAR);
        self.texture = Some((texture, adjustments.clone()));
    }

    /// Texture plus the map area it covers, for the canvas.
    pub fn texture(&self, settings: &MapSettings) -> Option<BackdropTexture<'_>> {
        let (texture, _) = self.texture.as_ref()?;
        let source = self.compositor.source()?;
        let (w, h) = display_size(&settings.image_adjustments, source.image.dimensions());
        Some(BackdropTexture {
            texture,
            map_size: Vec2::new(w, h),
        })
    }

    /// Read an image from disk and make it the map backdrop.
    pub fn upload(&mut self, path: &Path, map: &mut StoryMap) -> Result<()> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let backdrop = Backdrop::from_bytes(&bytes)
            .with_context(|| format!("decoding {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let uri = encode_data_uri(mime_for_extension(ext), &bytes);
        tracing::info!(
            path = %path.display(),
            width = backdrop.image.width(),
            height = backdrop.image.height(),
            "backdrop uploaded"
        );
        map.set_background(Some(uri), Some(backdrop.aspect_ratio()));
        Ok(())
    }

    pub fn remove(&mut self, map: &mut StoryMap) {
        map.set_background(None, None);
        self.texture = None;
    }

    /// Floating window with the adjustment sliders.
    pub fn window(&mut self, ctx: &egui::Context) {
        let mut open = self.window_open;
        let before = self.editing.clone();
        egui::Window::new("Backdrop")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| adjustment_controls(ui, &mut self.editing));
        self.window_open = open;
        if self.editing != before {
            self.debouncer.push(self.editing.clone(), Instant::now());
        }
    }
}

fn adjustment_controls(ui: &mut egui::Ui, adj: &mut ImageAdjustments) {
    ui.add(egui::Slider::new(&mut adj.contrast, 0.0..=200.0).text("Contrast"));
    ui.add(egui::Slider::new(&mut adj.brightness, 0.0..=200.0).text("Brightness"));
    ui.add(egui::Slider::new(&mut adj.transparency, 0.0..=100.0).text("Transparency"));
    ui.add(egui::Slider::new(&mut adj.black_and_white, 0.0..=100.0).text("Black & white"));
    ui.add(egui::Slider::new(&mut adj.sharpness, 0.0..=100.0).text("Sharpness"));
    ui.separator();

    let mut width = adj.width;
    let mut height = adj.height;
    ui.horizontal(|ui| {
        ui.label("Size");
        if ui
            .add(egui::DragValue::new(&mut width).range(0.0..=20_000.0).suffix(" w"))
            .changed()
        {
            adj.set_width(width);
        }
        if ui
            .add(egui::DragValue::new(&mut height).range(0.0..=20_000.0).suffix(" h"))
            .changed()
        {
            adj.set_height(height);
        }
    });
    ui.checkbox(&mut adj.maintain_aspect_ratio, "Keep aspect ratio");
    if ui.button("Reset").clicked() {
        let ratio = adj.original_aspect_ratio;
        *adj = ImageAdjustments {
            original_aspect_ratio: ratio,
            ..Default::default()
        };
    }
}
