use anyhow::{Context, Result};
use rand::RngCore;
use std::path::Path;

use super::canvas::Canvas;
use super::overlay;
use super::text::TextOverlay;
use crate::audio::bands::BandEnergy;
use crate::patterns::{self, PatternContext};
use crate::settings::{RenderConfig, Rgb};

/// One rendered RGBA raster.
#[derive(Clone, Debug)]
pub struct Frame {
    pub index: usize,
    pub time_index: usize,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// Strokes and shapes drawn by the pattern itself, excluding overlays.
    pub strokes: usize,
}

impl Frame {
    pub fn save_png(&self, path: &Path) -> Result<()> {
        image::save_buffer(
            path,
            &self.pixels,
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )
        .with_context(|| format!("Failed to write frame {} to {}", self.index, path.display()))
    }
}

/// Draws grid, pattern and title for one configuration.
pub struct PatternRenderer {
    config: RenderConfig,
    title: Option<TextOverlay>,
}

impl PatternRenderer {
    /// A title font that fails to load only disables the title.
    pub fn new(config: RenderConfig, font: Option<&Path>) -> Self {
        let title = config.title.visible_text().and_then(|_| {
            let px = config.title.size * config.geometry.dpi / 72.0;
            match TextOverlay::new(px, font) {
                Ok(overlay) => Some(overlay),
                Err(err) => {
                    log::warn!("Title disabled: {:#}", err);
                    None
                }
            }
        });
        Self::with_overlay(config, title)
    }

    pub fn with_overlay(config: RenderConfig, title: Option<TextOverlay>) -> Self {
        Self { config, title }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render one frame. An unknown `pattern` draws only the overlays.
    pub fn render(
        &self,
        pattern: &str,
        energy: BandEnergy,
        time_index: usize,
        rng: &mut dyn RngCore,
    ) -> Frame {
        let config = &self.config;
        let geometry = &config.geometry;
        let limits = geometry.limits();
        let mut canvas = Canvas::new(
            geometry.width,
            geometry.height,
            limits,
            geometry.dpi,
            config.colors.background,
        );

        if config.effects.grid {
            overlay::draw_grid(&mut canvas, grid_color(config.colors.background));
        }
        if config.effects.special_grid {
            overlay::draw_special_grid(&mut canvas, &config.colors);
        }

        let before = canvas.shape_count();
        match patterns::lookup(pattern) {
            Some(kind) => {
                let ctx = PatternContext {
                    energy,
                    time_index,
                    colors: &config.colors,
                    effects: &config.effects,
                    xlim: limits.0,
                    ylim: limits.1,
                };
                kind.draw(&mut canvas, &ctx, rng);
            }
            None => log::debug!("Unknown pattern '{}', drawing overlays only", pattern),
        }
        let strokes = canvas.shape_count() - before;

        if let Some(ref title) = self.title {
            overlay::draw_title(&mut canvas, title, &config.title);
        }

        Frame {
            index: 0,
            time_index,
            width: canvas.width(),
            height: canvas.height(),
            pixels: canvas.into_pixels(),
            strokes,
        }
    }
}

/// White lines on dark backgrounds, black on light ones.
fn grid_color(background: Rgb) -> Rgb {
    let [r, g, b] = background.0;
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma < 128.0 {
        Rgb::WHITE
    } else {
        Rgb::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AspectRatio, Geometry};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_config() -> RenderConfig {
        RenderConfig {
            geometry: Geometry::custom(AspectRatio::Widescreen, 96, 54, 72.0),
            ..RenderConfig::default()
        }
    }

    #[test]
    fn same_inputs_without_randomness_are_pixel_identical() {
        let renderer = PatternRenderer::with_overlay(small_config(), None);
        let energy = BandEnergy::new(0.8, 0.4, 1.1);
        for id in patterns::identifiers() {
            let a = renderer.render(id, energy, 42, &mut ChaCha8Rng::seed_from_u64(1));
            let b = renderer.render(id, energy, 42, &mut ChaCha8Rng::seed_from_u64(2));
            assert_eq!(a.pixels, b.pixels, "{} is not reproducible", id);
        }
    }

    #[test]
    fn unknown_pattern_keeps_overlays() {
        let mut config = small_config();
        config.effects.grid = true;
        let renderer = PatternRenderer::with_overlay(config.clone(), None);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let frame = renderer.render("nonexistent", BandEnergy::splat(1.0), 3, &mut rng);
        assert_eq!(frame.strokes, 0);
        assert!(frame.pixels.chunks(4).any(|p| p[..3] != [0, 0, 0]));

        config.effects.grid = false;
        let bare = PatternRenderer::with_overlay(config, None).render("nonexistent", BandEnergy::splat(1.0), 3, &mut rng);
        assert_eq!(bare.strokes, 0);
        assert!(bare.pixels.chunks(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn title_survives_unknown_pattern() {
        let mut config = small_config();
        config.geometry = Geometry::custom(AspectRatio::Widescreen, 320, 180, 72.0);
        config.title.text = Some("Night Drive".into());
        let renderer = PatternRenderer::new(config, None);
        if renderer.title.is_none() {
            // No system font on this machine
            return;
        }
        let frame = renderer.render("nonexistent", BandEnergy::splat(1.0), 0, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(frame.strokes, 0);
        assert!(frame.pixels.chunks(4).any(|p| p[..3] != [0, 0, 0]));
    }

    #[test]
    fn frame_matches_geometry() {
        let renderer = PatternRenderer::with_overlay(small_config(), None);
        let frame = renderer.render("classic", BandEnergy::splat(0.5), 0, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!((frame.width, frame.height), (96, 54));
        assert_eq!(frame.pixels.len(), 96 * 54 * 4);
        assert!(frame.strokes > 0);
    }

    #[test]
    fn grid_color_contrasts_background() {
        assert_eq!(grid_color(Rgb::BLACK), Rgb::WHITE);
        assert_eq!(grid_color(Rgb::WHITE), Rgb::BLACK);
    }

    #[test]
    fn saves_png() {
        let renderer = PatternRenderer::with_overlay(small_config(), None);
        let frame = renderer.render("sine", BandEnergy::splat(0.5), 0, &mut ChaCha8Rng::seed_from_u64(0));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        frame.save_png(&path).unwrap();
        let back = image::open(&path).unwrap().into_rgba8();
        assert_eq!(back.dimensions(), (96, 54));
        assert_eq!(back.into_raw(), frame.pixels);
    }
}
