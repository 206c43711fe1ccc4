//! NSFW photo screening.
//!
//! Heuristic skin-tone pixel-ratio estimator. This is deliberately the
//! simple strategy: no model inference, just RGB-space skin detection
//! sampled over the image. Chat-level overrides can tune or disable it.

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use teloxide::prelude::*;
use teloxide::types::Message;
use tracing::debug;

use crate::config::NsfwConfig;
use crate::database::models::NsfwOverrides;

/// Cap on sampled pixels per image.
const MAX_SAMPLED_PIXELS: u32 = 20_000;

/// Effective screening settings after applying chat overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveNsfw {
    pub enabled: bool,
    pub threshold: f32,
    pub delete_on_detect: bool,
    pub notify_user: bool,
}

pub fn effective(global: &NsfwConfig, overrides: &NsfwOverrides) -> EffectiveNsfw {
    EffectiveNsfw {
        enabled: overrides.enabled.unwrap_or(global.enabled),
        threshold: overrides.threshold.unwrap_or(global.threshold),
        delete_on_detect: overrides.delete_on_detect.unwrap_or(global.delete_on_detect),
        notify_user: overrides.notify_user.unwrap_or(global.notify_user),
    }
}

fn is_skin_pixel(r: u8, g: u8, b: u8) -> bool {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    r > 95 && g > 40 && b > 20 && (max - min) > 15 && r > g && r > b && (r - g) > 15
}

/// Fraction of sampled pixels matching the skin-tone rule.
///
/// Samples on a fixed grid so large images cost the same as small ones.
pub fn skin_ratio(img: &DynamicImage) -> f32 {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return 0.0;
    }

    let total = w as u64 * h as u64;
    let mut step = 1u32;
    while total / (step as u64 * step as u64) > MAX_SAMPLED_PIXELS as u64 {
        step += 1;
    }

    let rgb = img.to_rgb8();
    let mut sampled = 0u32;
    let mut skin = 0u32;
    let mut y = 0;
    while y < h {
        let mut x = 0;
        while x < w {
            let p = rgb.get_pixel(x, y);
            if is_skin_pixel(p[0], p[1], p[2]) {
                skin += 1;
            }
            sampled += 1;
            x += step;
        }
        y += step;
    }

    skin as f32 / sampled as f32
}

pub struct NsfwScanner {
    http: reqwest::Client,
    bot_token: String,
    global: NsfwConfig,
}

impl NsfwScanner {
    pub fn new(http: reqwest::Client, bot_token: String, global: NsfwConfig) -> Self {
        Self {
            http,
            bot_token,
            global,
        }
    }

    pub fn settings_for(&self, overrides: &NsfwOverrides) -> EffectiveNsfw {
        effective(&self.global, overrides)
    }

    /// Download the largest photo of a message and compute its skin ratio.
    ///
    /// Returns None when the message has no photo.
    pub async fn measure<B>(&self, bot: &B, msg: &Message) -> Result<Option<f32>>
    where
        B: Requester,
        B::Err: std::error::Error + Send + Sync + 'static,
    {
        let Some(photos) = msg.photo() else {
            return Ok(None);
        };
        let Some(photo) = photos.last() else {
            return Ok(None);
        };

        let file = bot
            .get_file(photo.file.id.clone())
            .await
            .context("get_file failed")?;
        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot_token, file.path
        );
        let bytes = self
            .http
            .get(&url)
            .send()
            .await
            .context("photo download failed")?
            .error_for_status()?
            .bytes()
            .await?;

        let img = image::load_from_memory(&bytes).context("photo decode failed")?;
        let ratio = skin_ratio(&img);
        debug!(
            "NSFW scan: chat={} msg={} ratio={:.3}",
            msg.chat.id,
            msg.id.0,
            ratio
        );
        Ok(Some(ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(w: u32, h: u32, color: [u8; 3]) -> DynamicImage {
        let mut img = RgbImage::new(w, h);
        for p in img.pixels_mut() {
            *p = Rgb(color);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_skin_rule() {
        // Typical skin tone.
        assert!(is_skin_pixel(210, 160, 130));
        // Gray: no channel spread.
        assert!(!is_skin_pixel(128, 128, 128));
        // Green-dominant.
        assert!(!is_skin_pixel(90, 200, 90));
    }

    #[test]
    fn test_solid_skin_image_ratio_is_one() {
        let img = solid(64, 64, [210, 160, 130]);
        assert!(skin_ratio(&img) > 0.99);
    }

    #[test]
    fn test_solid_blue_image_ratio_is_zero() {
        let img = solid(64, 64, [20, 40, 200]);
        assert_eq!(skin_ratio(&img), 0.0);
    }

    #[test]
    fn test_half_skin_image() {
        let mut img = RgbImage::new(100, 100);
        for (_, y, p) in img.enumerate_pixels_mut() {
            *p = if y < 50 {
                Rgb([210, 160, 130])
            } else {
                Rgb([20, 40, 200])
            };
        }
        let ratio = skin_ratio(&DynamicImage::ImageRgb8(img));
        assert!((ratio - 0.5).abs() < 0.05, "ratio was {}", ratio);
    }

    #[test]
    fn test_large_image_sampling_bounded() {
        // 1000x1000 = 1M pixels; sampling must still finish quickly and
        // produce the right answer.
        let img = solid(1000, 1000, [210, 160, 130]);
        assert!(skin_ratio(&img) > 0.99);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let global = NsfwConfig {
            enabled: true,
            threshold: 0.42,
            delete_on_detect: true,
            notify_user: true,
        };
        let eff = effective(
            &global,
            &NsfwOverrides {
                enabled: Some(false),
                threshold: Some(0.8),
                delete_on_detect: None,
                notify_user: None,
            },
        );
        assert!(!eff.enabled);
        assert_eq!(eff.threshold, 0.8);
        assert!(eff.delete_on_detect);
    }
}
