//! Map backdrop: data-URI images with adjustable filters.

pub mod data_uri;
pub mod debounce;
pub mod error;
pub mod filters;

pub use data_uri::{decode_data_uri, encode_data_uri, mime_for_extension};
pub use debounce::AdjustmentDebouncer;
pub use error::{BackdropError, Result};
pub use filters::{compose, display_size, target_size};

use image::RgbaImage;
use storymap_core::ImageAdjustments;

/// A decoded backdrop image.
#[derive(Debug, Clone)]
pub struct Backdrop {
    pub image: RgbaImage,
}

impl Backdrop {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self { image })
    }

    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let (mime, bytes) = decode_data_uri(uri)?;
        let backdrop = Self::from_bytes(&bytes)?;
        tracing::debug!(
            %mime,
            width = backdrop.image.width(),
            height = backdrop.image.height(),
            "backdrop decoded"
        );
        Ok(backdrop)
    }

    /// Width / height, captured when the image is uploaded.
    pub fn aspect_ratio(&self) -> f32 {
        self.image.width() as f32 / self.image.height().max(1) as f32
    }
}

/// Decodes the current backdrop once and caches the last rendered result.
///
/// Rendering never touches node positions; the output is purely visual.
#[derive(Default)]
pub struct BackdropCompositor {
    source_uri: Option<String>,
    source: Option<Backdrop>,
    rendered: Option<(ImageAdjustments, RgbaImage)>,
}

impl BackdropCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the source image. Unchanged URIs are not decoded again.
    ///
    /// A URI that fails to decode clears the backdrop and returns the error.
    pub fn set_source(&mut self, uri: Option<&str>) -> Result<()> {
        if self.source_uri.as_deref() == uri {
            return Ok(());
        }
        self.source_uri = uri.map(str::to_string);
        self.rendered = None;
        self.source = None;
        if let Some(uri) = uri {
            match Backdrop::from_data_uri(uri) {
                Ok(backdrop) => self.source = Some(backdrop),
                Err(err) => {
                    tracing::warn!("backdrop ignored: {}", err);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    pub fn source(&self) -> Option<&Backdrop> {
        self.source.as_ref()
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Rendered image for `adjustments`, recomputed only when they change.
    pub fn render(&mut self, adjustments: &ImageAdjustments) -> Option<&RgbaImage> {
        let source = self.source.as_ref()?;
        let stale = !matches!(&self.rendered, Some((adj, _)) if adj == adjustments);
        if stale {
            tracing::debug!("re-rendering backdrop");
            self.rendered = Some((adjustments.clone(), compose(&source.image, adjustments)));
        }
        self.rendered.as_ref().map(|(_, image)| image)
    }

    /// Adjustments the cached image was built with.
    pub fn rendered_with(&self) -> Option<&ImageAdjustments> {
        self.rendered.as_ref().map(|(adj, _)| adj)
    }
}
