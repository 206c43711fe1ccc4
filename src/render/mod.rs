//! Welcome/goodbye card rendering.
//!
//! Rendering is a capability: handlers ask for a card and fall back to a
//! plain text message when the renderer reports it produced nothing. The
//! greeting text itself always travels in the Telegram caption, so the
//! image layer never needs font rasterization.

use std::path::Path;

use anyhow::{Context, Result};
use image::{imageops, ImageBuffer, Rgba, RgbaImage};

use crate::utils::parse_hex_color;

const CARD_WIDTH: u32 = 800;
const CARD_HEIGHT: u32 = 400;
const STRIPE_HEIGHT: u32 = 12;

/// Inputs for one card.
#[derive(Debug, Clone)]
pub struct CardSpec {
    /// `#RRGGBB` accent color.
    pub text_color: Option<String>,
    /// Path of a stored background image; None renders a solid fill.
    pub background: Option<String>,
}

/// Card-image capability.
///
/// `Ok(None)` means "no image available, send text instead"; it is the
/// normal answer of [`DisabledRenderer`] and of failures the renderer
/// chooses to absorb.
pub trait CardRenderer: Send + Sync {
    fn render(&self, spec: &CardSpec) -> Result<Option<Vec<u8>>>;
}

/// No-op renderer for deployments without image support.
pub struct DisabledRenderer;

impl CardRenderer for DisabledRenderer {
    fn render(&self, _spec: &CardSpec) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// PNG card renderer: background (stored asset or dark solid) plus an
/// accent stripe in the configured color.
pub struct ImageCardRenderer;

const DEFAULT_BG: Rgba<u8> = Rgba([24, 26, 32, 255]);
const DEFAULT_ACCENT: Rgba<u8> = Rgba([255, 255, 255, 255]);

impl ImageCardRenderer {
    fn base_image(&self, background: Option<&str>) -> RgbaImage {
        if let Some(path) = background {
            if let Ok(img) = image::open(Path::new(path)) {
                return imageops::resize(
                    &img.to_rgba8(),
                    CARD_WIDTH,
                    CARD_HEIGHT,
                    imageops::FilterType::Triangle,
                );
            }
        }
        ImageBuffer::from_pixel(CARD_WIDTH, CARD_HEIGHT, DEFAULT_BG)
    }
}

impl CardRenderer for ImageCardRenderer {
    fn render(&self, spec: &CardSpec) -> Result<Option<Vec<u8>>> {
        let mut canvas = self.base_image(spec.background.as_deref());

        let accent = spec
            .text_color
            .as_deref()
            .and_then(parse_hex_color)
            .map(|[r, g, b]| Rgba([r, g, b, 255]))
            .unwrap_or(DEFAULT_ACCENT);

        for y in (CARD_HEIGHT - STRIPE_HEIGHT)..CARD_HEIGHT {
            for x in 0..CARD_WIDTH {
                canvas.put_pixel(x, y, accent);
            }
        }

        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(canvas)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .context("card encode failed")?;
        Ok(Some(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_renderer_yields_nothing() {
        let spec = CardSpec {
            text_color: Some("#FF0000".to_string()),
            background: None,
        };
        assert!(DisabledRenderer.render(&spec).unwrap().is_none());
    }

    #[test]
    fn test_renders_png_with_solid_background() {
        let spec = CardSpec {
            text_color: Some("#00FF00".to_string()),
            background: None,
        };
        let bytes = ImageCardRenderer.render(&spec).unwrap().unwrap();
        // PNG magic.
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

        let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (CARD_WIDTH, CARD_HEIGHT));
        // Stripe carries the accent color.
        assert_eq!(*img.get_pixel(0, CARD_HEIGHT - 1), Rgba([0, 255, 0, 255]));
        // Body carries the default fill.
        assert_eq!(*img.get_pixel(0, 0), DEFAULT_BG);
    }

    #[test]
    fn test_missing_background_falls_back_to_solid() {
        let spec = CardSpec {
            text_color: None,
            background: Some("/nonexistent/bg.png".to_string()),
        };
        let bytes = ImageCardRenderer.render(&spec).unwrap().unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(*img.get_pixel(10, 10), DEFAULT_BG);
    }
}
