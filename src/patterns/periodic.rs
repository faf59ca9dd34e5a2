use rand::RngCore;
use std::f32::consts::TAU;

use super::PatternContext;
use crate::audio::bands::FrequencyBand;
use crate::render::canvas::Canvas;

/// Layout of one band's stroke family for the basic waveforms.
struct Family {
    band: FrequencyBand,
    strokes: usize,
    /// First baseline and spacing, as fractions of ylim.
    base: f32,
    spacing: f32,
    phase_rate: f32,
    width_pt: f32,
    alpha: f32,
}

const FAMILIES: [Family; 3] = [
    Family {
        band: FrequencyBand::Low,
        strokes: 3,
        base: 0.2,
        spacing: 0.25,
        phase_rate: 1.0,
        width_pt: 5.0,
        alpha: 0.8,
    },
    Family {
        band: FrequencyBand::Mid,
        strokes: 4,
        base: 0.15,
        spacing: 0.2,
        phase_rate: 1.5,
        width_pt: 3.0,
        alpha: 0.7,
    },
    Family {
        band: FrequencyBand::High,
        strokes: 5,
        base: 0.1,
        spacing: 0.18,
        phase_rate: 2.0,
        width_pt: 1.5,
        alpha: 0.9,
    },
];

/// Shared driver: `shape(band, i, t)` returns the waveform value in `[-1, 1]`
/// for stroke `i` at angle `t`; `freq(band, i)` gives cycles across the canvas.
fn draw_family(
    canvas: &mut Canvas,
    ctx: &PatternContext,
    rng: &mut dyn RngCore,
    samples: usize,
    freq: impl Fn(FrequencyBand, usize) -> f32,
    shape: impl Fn(FrequencyBand, usize, f32) -> f32,
) {
    let xs = ctx.xs(samples);
    for family in &FAMILIES {
        let band = family.band;
        let amp = ctx.amplitude(band);
        let phase = ctx.phase(family.phase_rate);
        for i in 0..family.strokes {
            let y0 = ctx.ylim * (family.base + i as f32 * family.spacing)
                + ctx.jitter(rng, ctx.ylim * 0.05);
            let f = freq(band, i);
            let shift = ctx.jitter(rng, 1.0);
            let points: Vec<(f32, f32)> = xs
                .iter()
                .map(|&x| {
                    let t = TAU * f * x / ctx.xlim + phase + shift;
                    (x, y0 + amp * shape(band, i, t))
                })
                .collect();
            ctx.stroke(
                canvas,
                &points,
                ctx.color(band),
                family.width_pt * ctx.level(band),
                ctx.alpha(family.alpha),
            );
        }
    }
}

pub fn draw_sine(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
    draw_family(
        canvas,
        ctx,
        rng,
        800,
        |band, i| match band {
            FrequencyBand::Low => 0.3 * (i + 1) as f32 * 0.7,
            FrequencyBand::Mid => 0.8 * (i + 1) as f32 * 0.9,
            FrequencyBand::High => 1.5 * (i + 1) as f32 * 1.2,
        },
        |_, _, t| t.sin(),
    );
}

/// +1 for the first `duty` fraction of each period, -1 for the rest.
pub fn square_wave(t: f32, duty: f32) -> f32 {
    if t.rem_euclid(TAU) < TAU * duty {
        1.0
    } else {
        -1.0
    }
}

/// Ramp from -1 to 1 over each period, centered on zero.
pub fn sawtooth_wave(t: f32) -> f32 {
    let cycles = t / TAU;
    2.0 * (cycles - (cycles + 0.5).floor())
}

pub fn draw_square(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
    draw_family(
        canvas,
        ctx,
        rng,
        1000,
        |band, i| match band {
            FrequencyBand::Low => 0.2 + i as f32 * 0.15,
            FrequencyBand::Mid => 0.5 + i as f32 * 0.25,
            FrequencyBand::High => 1.2 + i as f32 * 0.4,
        },
        |band, i, t| {
            let duty = match band {
                FrequencyBand::Low => 0.3 + i as f32 * 0.1,
                FrequencyBand::Mid => 0.4,
                FrequencyBand::High => 0.2 + i as f32 * 0.05,
            };
            square_wave(t, duty)
        },
    );
}

pub fn draw_sawtooth(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
    draw_family(
        canvas,
        ctx,
        rng,
        1200,
        |band, i| match band {
            FrequencyBand::Low => 0.15 + i as f32 * 0.1,
            FrequencyBand::Mid => 0.4 + i as f32 * 0.2,
            FrequencyBand::High => 0.9 + i as f32 * 0.35,
        },
        |_, _, t| sawtooth_wave(t),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_wave_respects_duty_cycle() {
        assert_eq!(square_wave(0.1, 0.5), 1.0);
        assert_eq!(square_wave(TAU * 0.6, 0.5), -1.0);
        assert_eq!(square_wave(TAU * 0.25, 0.2), -1.0);
        assert_eq!(square_wave(-0.1, 0.5), -1.0);
        assert_eq!(square_wave(TAU + 0.1, 0.5), 1.0);
    }

    #[test]
    fn sawtooth_ramps_and_resets() {
        assert!(sawtooth_wave(0.0).abs() < 1e-6);
        assert!((sawtooth_wave(TAU * 0.25) - 0.5).abs() < 1e-5);
        assert!((sawtooth_wave(TAU * 0.49) - 0.98).abs() < 1e-4);
        assert!((sawtooth_wave(TAU * 0.51) + 0.98).abs() < 1e-4);
    }

    #[test]
    fn high_band_is_densest_and_thinnest() {
        let (low, mid, high) = (&FAMILIES[0], &FAMILIES[1], &FAMILIES[2]);
        assert!(low.strokes < mid.strokes && mid.strokes < high.strokes);
        assert!(low.width_pt > mid.width_pt && mid.width_pt > high.width_pt);
        assert!(low.phase_rate < mid.phase_rate && mid.phase_rate < high.phase_rate);
    }
}
