use rand::RngCore;
use std::f32::consts::TAU;

use super::PatternContext;
use crate::audio::bands::{BandEnergy, FrequencyBand};
use crate::render::canvas::Canvas;

const SAMPLES: usize = 600;

/// Stroke counts for the classic pattern, `[low, mid, high]`. Each count
/// grows with its band's energy.
pub fn classic_layer_counts(energy: &BandEnergy) -> [usize; 3] {
    let scaled = |v: f32, base: usize, per_unit: f32| base + (v.clamp(0.0, 2.0) * per_unit).floor() as usize;
    [
        scaled(energy.low, 2, 2.0),
        scaled(energy.mid, 3, 4.0),
        scaled(energy.high, 5, 10.0),
    ]
}

pub fn draw_classic(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
    let counts = classic_layer_counts(&ctx.energy);
    let xs = ctx.xs(SAMPLES);

    // (cycles base, cycles step, phase rate, amplitude share of ylim, width pt, alpha)
    let layout = [
        (0.5, 0.25, 0.6, 0.12, 6.0, 0.8),
        (1.2, 0.4, 1.2, 0.07, 3.0, 0.6),
        (2.5, 0.8, 2.2, 0.04, 1.2, 0.5),
    ];

    for band in FrequencyBand::ALL {
        let n = counts[band.index()];
        let (f0, df, rate, amp_share, width, alpha) = layout[band.index()];
        let amp = ctx.amplitude(band) * ctx.ylim * amp_share;
        let phase = ctx.phase(rate);
        for i in 0..n {
            let center = ctx.ylim * (i as f32 + 0.5) / n as f32 + ctx.jitter(rng, ctx.ylim * 0.04);
            let f = f0 + df * i as f32;
            let offset = i as f32 * 0.9 + ctx.jitter(rng, 0.8);
            let points: Vec<(f32, f32)> = xs
                .iter()
                .map(|&x| (x, center + amp * (TAU * f * x / ctx.xlim + phase + offset).sin()))
                .collect();
            ctx.stroke(canvas, &points, ctx.color(band), width * ctx.level(band), ctx.alpha(alpha));
        }
    }
}

pub fn draw_interference(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
    let xs = ctx.xs(SAMPLES);

    // (strokes, carrier cycles, detune, phase rate, width pt, alpha)
    let layout = [
        (2usize, 1.0, 0.15, 0.5, 5.0, 0.75),
        (3, 2.5, 0.3, 1.1, 2.5, 0.65),
        (5, 5.0, 0.6, 2.0, 1.0, 0.55),
    ];

    for band in FrequencyBand::ALL {
        let (n, carrier, detune, rate, width, alpha) = layout[band.index()];
        let amp = ctx.amplitude(band) * ctx.ylim * 0.1;
        let phase = ctx.phase(rate);
        for i in 0..n {
            let center = ctx.ylim * (0.2 + 0.6 * (i as f32 + 0.5) / n as f32)
                + ctx.jitter(rng, ctx.ylim * 0.04);
            let fa = carrier * (1.0 + 0.15 * i as f32);
            let fb = fa + detune;
            let skew = ctx.jitter(rng, 1.0);
            let points: Vec<(f32, f32)> = xs
                .iter()
                .map(|&x| {
                    let u = TAU * x / ctx.xlim;
                    // Two close frequencies running in opposite directions beat into nodes
                    let y = 0.5 * ((fa * u + phase + skew).sin() + (fb * u - phase).sin());
                    (x, center + amp * y)
                })
                .collect();
            ctx.stroke(canvas, &points, ctx.color(band), width * ctx.level(band), ctx.alpha(alpha));
        }
    }
}

pub fn draw_flowing_layers(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
    let xs = ctx.xs(SAMPLES);

    // Low band owns the bottom stratum, high band the top one.
    // (strokes, cycles, phase rate, width pt, alpha)
    let layout = [
        (3usize, 0.6, 0.4, 5.0, 0.8),
        (5, 1.4, 0.9, 2.5, 0.65),
        (8, 3.0, 1.8, 1.0, 0.5),
    ];

    for band in FrequencyBand::ALL {
        let (n, cycles, rate, width, alpha) = layout[band.index()];
        let stratum = ctx.ylim / 3.0;
        let bottom = stratum * band.index() as f32;
        let amp = ctx.amplitude(band) * stratum * 0.3;
        let phase = ctx.phase(rate);
        for i in 0..n {
            let base = bottom + stratum * (i as f32 + 0.5) / n as f32 + ctx.jitter(rng, stratum * 0.1);
            let lag = i as f32 * 0.35 + ctx.jitter(rng, 0.6);
            // Later lines in a stratum fade out
            let fade = 1.0 - 0.5 * i as f32 / n as f32;
            let points: Vec<(f32, f32)> = xs
                .iter()
                .map(|&x| {
                    let u = TAU * cycles * x / ctx.xlim;
                    let y = (u + phase - lag).sin() + 0.5 * (2.3 * u - 0.7 * phase + lag).sin();
                    (x, base + amp * y / 1.5)
                })
                .collect();
            ctx.stroke(
                canvas,
                &points,
                ctx.color(band),
                width * ctx.level(band),
                ctx.alpha(alpha * fade),
            );
        }
    }
}
