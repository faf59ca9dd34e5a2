use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use std::path::{Path, PathBuf};

use super::canvas::Canvas;
use crate::settings::Rgb;

/// Fonts probed when no `--font` is given.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub struct TextOverlay {
    font: Font,
    font_size: f32,
}

impl TextOverlay {
    /// Load the font at `path`, or the first system font found. `font_size` is in pixels.
    pub fn new(font_size: f32, path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => find_system_font().context("No usable system font found; pass --font")?,
        };
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read font: {}", path.display()))?;
        Self::from_bytes(font_size, bytes)
            .with_context(|| format!("Failed to parse font: {}", path.display()))
    }

    pub fn from_bytes(font_size: f32, bytes: Vec<u8>) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(Self { font, font_size })
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Composite text onto the canvas with its top-left corner at pixel `(x, y)`.
    pub fn composite(&self, canvas: &mut Canvas, text: &str, x: i32, y: i32, color: Rgb, alpha: f32) {
        let mut cursor_x = x;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, self.font_size);
            let glyph_y = y + self.font_size as i32 - metrics.height as i32 - metrics.ymin;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    let a = coverage as f32 / 255.0 * alpha;
                    canvas.blend_pixel(
                        cursor_x + metrics.xmin + gx as i32,
                        glyph_y + gy as i32,
                        color,
                        a,
                    );
                }
            }

            cursor_x += metrics.advance_width.round() as i32;
        }
    }

    /// Measure the width of rendered text in pixels.
    pub fn measure_width(&self, text: &str) -> u32 {
        let width: f32 = text
            .chars()
            .map(|ch| self.font.metrics(ch, self.font_size).advance_width)
            .sum();
        width.ceil() as u32
    }
}

fn find_system_font() -> Option<PathBuf> {
    SYSTEM_FONTS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}
