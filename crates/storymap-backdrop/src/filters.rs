use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use storymap_core::ImageAdjustments;

/// Largest side a rendered backdrop is resampled to, in pixels.
pub const MAX_RENDER_SIDE: u32 = 4096;

/// Size the backdrop covers on the map, in map units.
///
/// Zero width/height fall back to the source size; with one side set and the
/// aspect ratio locked, the other side follows the original ratio.
pub fn display_size(adj: &ImageAdjustments, natural: (u32, u32)) -> (f32, f32) {
    let (nw, nh) = (natural.0 as f32, natural.1 as f32);
    let ratio = adj
        .original_aspect_ratio
        .filter(|r| *r > 0.0)
        .unwrap_or(nw / nh.max(1.0));
    match (adj.width > 0.0, adj.height > 0.0) {
        (true, true) => (adj.width, adj.height),
        (true, false) if adj.maintain_aspect_ratio => (adj.width, adj.width / ratio),
        (false, true) if adj.maintain_aspect_ratio => (adj.height * ratio, adj.height),
        (true, false) => (adj.width, nh),
        (false, true) => (nw, adj.height),
        (false, false) => (nw, nh),
    }
}

/// Pixel size the backdrop is resampled to: the display size, capped.
pub fn target_size(adj: &ImageAdjustments, natural: (u32, u32)) -> (u32, u32) {
    let (w, h) = display_size(adj, natural);
    let scale = (MAX_RENDER_SIDE as f32 / w.max(h)).min(1.0);
    (
        ((w * scale).round() as u32).max(1),
        ((h * scale).round() as u32).max(1),
    )
}

/// Apply every adjustment to `source`.
///
/// Resampling runs first so the per-pixel filters work on the final size.
pub fn compose(source: &RgbaImage, adj: &ImageAdjustments) -> RgbaImage {
    let size = target_size(adj, source.dimensions());
    let mut out = if size == source.dimensions() {
        source.clone()
    } else {
        imageops::resize(source, size.0, size.1, FilterType::Triangle)
    };

    if adj.sharpness > 0.0 {
        let sigma = 0.5 + adj.sharpness.clamp(0.0, 100.0) / 100.0 * 2.5;
        out = imageops::unsharpen(&out, sigma, 0);
    }

    if !adj.is_neutral() {
        let brightness = adj.brightness.max(0.0) / 100.0;
        let contrast = adj.contrast.max(0.0) / 100.0;
        let gray = adj.black_and_white.clamp(0.0, 100.0) / 100.0;
        let alpha = 1.0 - adj.transparency.clamp(0.0, 100.0) / 100.0;
        for pixel in out.pixels_mut() {
            *pixel = filter_pixel(*pixel, brightness, contrast, gray, alpha);
        }
    }
    out
}

fn filter_pixel(pixel: Rgba<u8>, brightness: f32, contrast: f32, gray: f32, alpha: f32) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    let mut rgb = [r, g, b].map(|c| c as f32 / 255.0 * brightness);
    for c in &mut rgb {
        *c = (*c - 0.5) * contrast + 0.5;
    }
    if gray > 0.0 {
        let luma = 0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2];
        for c in &mut rgb {
            *c += (luma - *c) * gray;
        }
    }
    let [r, g, b] = rgb.map(to_u8);
    Rgba([r, g, b, to_u8(a as f32 / 255.0 * alpha)])
}

fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    #[test]
    fn test_neutral_adjustments_leave_pixels() {
        let src = solid(4, 2, [10, 200, 30, 255]);
        let out = compose(&src, &ImageAdjustments::default());
        assert_eq!(out, src);
    }

    #[test]
    fn test_transparency_scales_alpha() {
        let adj = ImageAdjustments {
            transparency: 50.0,
            ..Default::default()
        };
        let out = compose(&solid(2, 2, [100, 100, 100, 255]), &adj);
        assert_eq!(out.get_pixel(0, 0).0, [100, 100, 100, 128]);
    }

    #[test]
    fn test_full_black_and_white_is_gray() {
        let adj = ImageAdjustments {
            black_and_white: 100.0,
            ..Default::default()
        };
        let out = compose(&solid(1, 1, [255, 0, 0, 255]), &adj);
        let [r, g, b, _] = out.get_pixel(0, 0).0;
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(r, 54);
    }

    #[test]
    fn test_brightness_and_contrast() {
        let dark = ImageAdjustments {
            brightness: 0.0,
            ..Default::default()
        };
        assert_eq!(compose(&solid(1, 1, [90, 90, 90, 255]), &dark).get_pixel(0, 0).0, [0, 0, 0, 255]);

        let flat = ImageAdjustments {
            contrast: 0.0,
            ..Default::default()
        };
        assert_eq!(
            compose(&solid(1, 1, [10, 240, 90, 255]), &flat).get_pixel(0, 0).0,
            [128, 128, 128, 255]
        );
    }

    #[test]
    fn test_target_size_follows_aspect_ratio() {
        let mut adj = ImageAdjustments {
            original_aspect_ratio: Some(2.0),
            ..Default::default()
        };
        assert_eq!(target_size(&adj, (400, 200)), (400, 200));
        adj.width = 1000.0;
        assert_eq!(target_size(&adj, (400, 200)), (1000, 500));
        adj.maintain_aspect_ratio = false;
        assert_eq!(target_size(&adj, (400, 200)), (1000, 200));
        adj.height = 300.0;
        assert_eq!(target_size(&adj, (400, 200)), (1000, 300));
    }

    #[test]
    fn test_target_size_is_capped() {
        let adj = ImageAdjustments {
            width: 10_000.0,
            height: 5_000.0,
            ..Default::default()
        };
        assert_eq!(display_size(&adj, (100, 50)), (10_000.0, 5_000.0));
        assert_eq!(target_size(&adj, (100, 50)), (MAX_RENDER_SIDE, MAX_RENDER_SIDE / 2));
    }

    #[test]
    fn test_resize_changes_dimensions() {
        let adj = ImageAdjustments {
            width: 8.0,
            height: 4.0,
            ..Default::default()
        };
        let out = compose(&solid(4, 2, [1, 2, 3, 255]), &adj);
        assert_eq!(out.dimensions(), (8, 4));
    }

    #[test]
    fn test_sharpen_keeps_flat_image() {
        let adj = ImageAdjustments {
            sharpness: 80.0,
            ..Default::default()
        };
        let src = solid(6, 6, [120, 120, 120, 255]);
        let out = compose(&src, &adj);
        assert_eq!(out.dimensions(), src.dimensions());
        for px in out.pixels() {
            assert!(px.0[0].abs_diff(120) <= 1);
        }
    }
}
