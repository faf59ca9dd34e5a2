use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::PatternContext;
use crate::audio::bands::FrequencyBand;
use crate::render::canvas::Canvas;

/// Number of items for a band: `base` at the floor, growing with energy.
fn scatter_count(level: f32, intensity: f32, base: usize, per_unit: f32) -> usize {
    base + (level.clamp(0.0, 2.0) * intensity * per_unit).round() as usize
}

/// Fixed layout source for item `i` of a band, independent of the jitter rng.
fn layout_rng(band: FrequencyBand, i: usize, salt: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(((band.index() as u64) << 32) ^ ((i as u64) << 8) ^ salt)
}

pub fn draw_blocks(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
    // (base count, extra per unit energy, size share of the short side, drift rate, alpha)
    let layout = [
        (1usize, 5.0, 0.16, 0.002, 0.35),
        (2, 10.0, 0.08, 0.005, 0.45),
        (4, 24.0, 0.035, 0.012, 0.6),
    ];
    let short = ctx.xlim.min(ctx.ylim);

    for band in FrequencyBand::ALL {
        let (base, per_unit, size_share, drift, alpha) = layout[band.index()];
        let level = ctx.level(band);
        let n = scatter_count(level, ctx.effects.intensity, base, per_unit);
        let t = ctx.time_index as f32 * ctx.effects.speed * drift;
        for i in 0..n {
            let mut layout = layout_rng(band, i, 1);
            let (home_x, home_y): (f32, f32) = (layout.gen(), layout.gen());
            let size = short * size_share * (0.5 + level.min(1.5)) * (0.6 + 0.8 * layout.gen::<f32>());
            let aspect = 0.5 + layout.gen::<f32>();
            let w = size * aspect;
            let h = size / aspect;
            let x = ((home_x + t + ctx.jitter(rng, 0.1)).rem_euclid(1.0)) * (ctx.xlim - w);
            let y = ((home_y + t * 0.5 + ctx.jitter(rng, 0.1)).rem_euclid(1.0)) * (ctx.ylim - h);
            ctx.block(canvas, x, y, w, h, ctx.color(band), ctx.alpha(alpha));
        }
    }
}

/// Straight segments parallel to one axis, spread over the other.
fn draw_lines(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore, horizontal: bool) {
    // (base count, extra per unit energy, width pt, drift rate, alpha)
    let layout = [
        (2usize, 3.0, 5.0, 0.01, 0.8),
        (4, 6.0, 2.5, 0.025, 0.65),
        (6, 14.0, 1.0, 0.06, 0.55),
    ];
    let (span, depth) = if horizontal {
        (ctx.xlim, ctx.ylim)
    } else {
        (ctx.ylim, ctx.xlim)
    };

    for band in FrequencyBand::ALL {
        let (base, per_unit, width, drift, alpha) = layout[band.index()];
        let level = ctx.level(band);
        let n = scatter_count(level, ctx.effects.intensity, base, per_unit);
        let t = ctx.time_index as f32 * ctx.effects.speed * drift;
        // Louder bands draw longer segments
        let length = span * (0.25 + 0.75 * (level * ctx.effects.intensity).min(1.0));
        for i in 0..n {
            let mut layout = layout_rng(band, i, 2);
            let along = (i as f32 + layout.gen::<f32>()) / n as f32;
            let pos = (along + t + ctx.jitter(rng, 0.05)).rem_euclid(1.0) * depth;
            let start = layout.gen::<f32>() * (span - length) + ctx.jitter(rng, span * 0.05);
            let (a, b) = if horizontal {
                ((start, pos), (start + length, pos))
            } else {
                ((pos, start), (pos, start + length))
            };
            ctx.stroke(canvas, &[a, b], ctx.color(band), width * level, ctx.alpha(alpha));
        }
    }
}

pub fn draw_horizontal_lines(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
    draw_lines(canvas, ctx, rng, true);
}

pub fn draw_vertical_lines(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
    draw_lines(canvas, ctx, rng, false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::bands::BandEnergy;
    use crate::settings::{Colors, Effects};

    #[test]
    fn scatter_count_grows_with_energy() {
        assert_eq!(scatter_count(0.0, 1.0, 4, 24.0), 4);
        assert!(scatter_count(1.0, 1.0, 4, 24.0) > scatter_count(0.5, 1.0, 4, 24.0));
        assert_eq!(scatter_count(50.0, 1.0, 4, 24.0), scatter_count(2.0, 1.0, 4, 24.0));
    }

    #[test]
    fn layout_is_fixed_per_item_and_varies_across_items() {
        let first: [f32; 4] = {
            let mut r = layout_rng(FrequencyBand::High, 3, 1);
            [r.gen(), r.gen(), r.gen(), r.gen()]
        };
        let again: [f32; 4] = {
            let mut r = layout_rng(FrequencyBand::High, 3, 1);
            [r.gen(), r.gen(), r.gen(), r.gen()]
        };
        assert_eq!(first, again);
        assert!(first.iter().all(|v| (0.0..1.0).contains(v)));
        assert_ne!(layout_rng(FrequencyBand::High, 4, 1).gen::<f32>(), first[0]);
        assert_ne!(layout_rng(FrequencyBand::Mid, 3, 1).gen::<f32>(), first[0]);
    }

    #[test]
    fn blocks_without_randomness_leave_injected_rng_untouched() {
        let colors = Colors::default();
        let effects = Effects::default();
        let ctx = PatternContext {
            energy: BandEnergy::splat(1.0),
            time_index: 7,
            colors: &colors,
            effects: &effects,
            xlim: 16.0,
            ylim: 9.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut canvas = Canvas::new(64, 36, (16.0, 9.0), 72.0, colors.background);
        draw_blocks(&mut canvas, &ctx, &mut rng);
        draw_horizontal_lines(&mut canvas, &ctx, &mut rng);
        assert_eq!(rng.get_word_pos(), 0);
        assert!(canvas.shape_count() > 0);
    }

    #[test]
    fn louder_high_band_draws_more_blocks() {
        let colors = Colors::default();
        let effects = Effects::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut count = |high: f32| {
            let ctx = PatternContext {
                energy: BandEnergy::new(0.1, 0.1, high),
                time_index: 5,
                colors: &colors,
                effects: &effects,
                xlim: 10.0,
                ylim: 10.0,
            };
            let mut canvas = Canvas::new(40, 40, (10.0, 10.0), 72.0, colors.background);
            draw_blocks(&mut canvas, &ctx, &mut rng);
            canvas.shape_count()
        };
        assert!(count(1.0) > count(0.1));
    }
}
