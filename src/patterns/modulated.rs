use rand::RngCore;
use std::f32::consts::TAU;

use super::PatternContext;
use crate::audio::bands::FrequencyBand;
use crate::render::canvas::Canvas;

const SAMPLES: usize = 900;

struct Voice {
    strokes: usize,
    carrier: f32,
    modulator: f32,
    phase_rate: f32,
    width_pt: f32,
    alpha: f32,
}

const VOICES: [Voice; 3] = [
    Voice {
        strokes: 2,
        carrier: 1.5,
        modulator: 0.25,
        phase_rate: 0.6,
        width_pt: 5.0,
        alpha: 0.8,
    },
    Voice {
        strokes: 3,
        carrier: 4.0,
        modulator: 0.6,
        phase_rate: 1.3,
        width_pt: 2.5,
        alpha: 0.7,
    },
    Voice {
        strokes: 4,
        carrier: 9.0,
        modulator: 1.4,
        phase_rate: 2.4,
        width_pt: 1.0,
        alpha: 0.6,
    },
];

fn lane(ctx: &PatternContext, band: FrequencyBand, i: usize, strokes: usize) -> f32 {
    // Interleave the bands so every lane mixes all three colors
    let slot = i * 3 + band.index();
    let slots = strokes.max(1) * 3;
    ctx.ylim * (0.1 + 0.8 * (slot as f32 + 0.5) / slots as f32)
}

pub fn draw_amplitude_modulated(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
    let xs = ctx.xs(SAMPLES);
    for band in FrequencyBand::ALL {
        let voice = &VOICES[band.index()];
        let amp = ctx.amplitude(band) * ctx.ylim * 0.08;
        let depth = ctx.level(band).clamp(0.0, 1.0);
        let phase = ctx.phase(voice.phase_rate);
        for i in 0..voice.strokes {
            let center = lane(ctx, band, i, voice.strokes) + ctx.jitter(rng, ctx.ylim * 0.04);
            let shift = ctx.jitter(rng, 1.0);
            let points: Vec<(f32, f32)> = xs
                .iter()
                .map(|&x| {
                    let u = TAU * x / ctx.xlim;
                    let envelope = 1.0 + depth * (voice.modulator * u + 0.3 * phase + i as f32).sin();
                    let carrier = (voice.carrier * (1.0 + 0.2 * i as f32) * u + phase + shift).sin();
                    (x, center + amp * 0.5 * envelope * carrier)
                })
                .collect();
            ctx.stroke(
                canvas,
                &points,
                ctx.color(band),
                voice.width_pt * ctx.level(band),
                ctx.alpha(voice.alpha),
            );
        }
    }
}

pub fn draw_frequency_modulated(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
    let xs = ctx.xs(SAMPLES);
    for band in FrequencyBand::ALL {
        let voice = &VOICES[band.index()];
        let amp = ctx.amplitude(band) * ctx.ylim * 0.06;
        // Modulation index follows band energy
        let beta = ctx.amplitude(band) * 3.0;
        let phase = ctx.phase(voice.phase_rate);
        for i in 0..voice.strokes {
            let center = lane(ctx, band, i, voice.strokes) + ctx.jitter(rng, ctx.ylim * 0.04);
            let shift = ctx.jitter(rng, 1.0);
            let points: Vec<(f32, f32)> = xs
                .iter()
                .map(|&x| {
                    let u = TAU * x / ctx.xlim;
                    let m = beta * (voice.modulator * u + 0.5 * phase + i as f32).sin();
                    (x, center + amp * (voice.carrier * u + m + phase + shift).sin())
                })
                .collect();
            ctx.stroke(
                canvas,
                &points,
                ctx.color(band),
                voice.width_pt * ctx.level(band),
                ctx.alpha(voice.alpha),
            );
        }
    }
}

pub fn draw_reflected(canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
    let xs = ctx.xs(SAMPLES);
    let baseline = ctx.ylim * 0.5;
    for band in FrequencyBand::ALL {
        let voice = &VOICES[band.index()];
        let amp = ctx.amplitude(band) * ctx.ylim * 0.07;
        let phase = ctx.phase(voice.phase_rate);
        for i in 0..voice.strokes {
            // Low band hugs the baseline, high band reaches furthest out
            let reach = ctx.ylim * (0.05 + 0.1 * band.index() as f32 + 0.04 * i as f32)
                + ctx.jitter(rng, ctx.ylim * 0.03);
            let shift = ctx.jitter(rng, 1.0);
            let upper: Vec<(f32, f32)> = xs
                .iter()
                .map(|&x| {
                    let u = TAU * voice.carrier * (1.0 + 0.25 * i as f32) * x / ctx.xlim;
                    (x, baseline + reach + amp * (u + phase + shift).sin())
                })
                .collect();
            let lower: Vec<(f32, f32)> = upper.iter().map(|&(x, y)| (x, 2.0 * baseline - y)).collect();

            let color = ctx.color(band);
            let width = voice.width_pt * ctx.level(band);
            ctx.stroke(canvas, &upper, color, width, ctx.alpha(voice.alpha));
            // The reflection is drawn a little fainter
            ctx.stroke(canvas, &lower, color, width, ctx.alpha(voice.alpha * 0.6));
        }
    }
    canvas.line(
        (0.0, baseline),
        (ctx.xlim, baseline),
        ctx.colors.high,
        0.5,
        ctx.alpha(0.25),
    );
}
