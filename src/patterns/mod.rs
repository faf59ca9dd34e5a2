//! Drawing strategies that turn band energy into strokes.
//!
//! Every strategy follows the same band mapping: the low band gets the widest,
//! slowest and heaviest strokes, the mid band sits in between, and the high
//! band gets the fastest, thinnest and most numerous ones.

mod geometric;
mod modulated;
mod periodic;
pub mod waves;

use rand::{Rng, RngCore};

use crate::audio::bands::{BandEnergy, FrequencyBand};
use crate::render::canvas::Canvas;
use crate::settings::{Colors, Effects, Rgb};

/// Input shared by every strategy for one frame.
pub struct PatternContext<'a> {
    pub energy: BandEnergy,
    pub time_index: usize,
    pub colors: &'a Colors,
    pub effects: &'a Effects,
    pub xlim: f32,
    pub ylim: f32,
}

impl PatternContext<'_> {
    pub fn level(&self, band: FrequencyBand) -> f32 {
        self.energy.get(band)
    }

    pub fn color(&self, band: FrequencyBand) -> Rgb {
        match band {
            FrequencyBand::Low => self.colors.low,
            FrequencyBand::Mid => self.colors.mid,
            FrequencyBand::High => self.colors.high,
        }
    }

    /// Stroke amplitude for a band: energy scaled by the intensity effect.
    pub fn amplitude(&self, band: FrequencyBand) -> f32 {
        self.level(band) * self.effects.intensity
    }

    /// Phase offset at this time index, scaled by a per-band rate.
    pub fn phase(&self, rate: f32) -> f32 {
        self.time_index as f32 * self.effects.speed * rate
    }

    pub fn alpha(&self, schedule: f32) -> f32 {
        (schedule * self.effects.alpha).clamp(0.0, 1.0)
    }

    /// Random offset in `[-scale, scale] * randomness`. The generator is
    /// not touched when randomness is zero, which keeps frames reproducible.
    pub fn jitter(&self, rng: &mut dyn RngCore, scale: f32) -> f32 {
        if self.effects.randomness <= 0.0 {
            return 0.0;
        }
        rng.gen_range(-1.0f32..=1.0) * self.effects.randomness * scale
    }

    /// Evenly spaced x coordinates across the canvas.
    pub fn xs(&self, samples: usize) -> Vec<f32> {
        let n = samples.max(2);
        (0..n).map(|i| self.xlim * i as f32 / (n - 1) as f32).collect()
    }

    /// Stroke a polyline, preceded by a faint wide halo when glow is on.
    pub fn stroke(&self, canvas: &mut Canvas, points: &[(f32, f32)], color: Rgb, width_pt: f32, alpha: f32) {
        if self.effects.glow {
            canvas.polyline(points, color, width_pt * 3.0 + 2.0, alpha * 0.2);
        }
        canvas.polyline(points, color, width_pt, alpha);
    }

    pub fn block(&self, canvas: &mut Canvas, x: f32, y: f32, w: f32, h: f32, color: Rgb, alpha: f32) {
        if self.effects.glow {
            let pad = w.min(h) * 0.25;
            canvas.fill_rect(x - pad, y - pad, w + 2.0 * pad, h + 2.0 * pad, color, alpha * 0.2);
        }
        canvas.fill_rect(x, y, w, h, color, alpha);
    }
}

pub type PatternFn = fn(&mut Canvas, &PatternContext, &mut dyn RngCore);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Classic,
    Interference,
    FlowingLayers,
    Sine,
    Square,
    Sawtooth,
    AmplitudeModulated,
    FrequencyModulated,
    Reflected,
    Blocks,
    HorizontalLines,
    VerticalLines,
}

struct PatternEntry {
    kind: PatternKind,
    id: &'static str,
    display_name: &'static str,
    description: &'static str,
    draw: PatternFn,
}

const PATTERNS: &[PatternEntry] = &[
    PatternEntry {
        kind: PatternKind::Classic,
        id: "classic",
        display_name: "Classic Waves",
        description: "Stacked sinusoids; stroke count follows band energy",
        draw: waves::draw_classic,
    },
    PatternEntry {
        kind: PatternKind::Interference,
        id: "interference",
        display_name: "Structured Interference",
        description: "Pairs of close frequencies beating against each other",
        draw: waves::draw_interference,
    },
    PatternEntry {
        kind: PatternKind::FlowingLayers,
        id: "flowing-layers",
        display_name: "Flowing Layers",
        description: "Horizontal strata, one band per layer",
        draw: waves::draw_flowing_layers,
    },
    PatternEntry {
        kind: PatternKind::Sine,
        id: "sine",
        display_name: "Pure Sine",
        description: "Clean minimal sinusoids",
        draw: periodic::draw_sine,
    },
    PatternEntry {
        kind: PatternKind::Square,
        id: "square",
        display_name: "Square Waves",
        description: "Hard transitions with per-stroke duty cycles",
        draw: periodic::draw_square,
    },
    PatternEntry {
        kind: PatternKind::Sawtooth,
        id: "sawtooth",
        display_name: "Sawtooth Waves",
        description: "Ramps with abrupt resets",
        draw: periodic::draw_sawtooth,
    },
    PatternEntry {
        kind: PatternKind::AmplitudeModulated,
        id: "amplitude-modulated",
        display_name: "Amplitude Modulated",
        description: "Carriers whose envelope breathes with the band",
        draw: modulated::draw_amplitude_modulated,
    },
    PatternEntry {
        kind: PatternKind::FrequencyModulated,
        id: "frequency-modulated",
        display_name: "Frequency Modulated",
        description: "Carriers whose spacing squeezes with the band",
        draw: modulated::draw_frequency_modulated,
    },
    PatternEntry {
        kind: PatternKind::Reflected,
        id: "reflected",
        display_name: "Reflected Waves",
        description: "Waves mirrored about a central baseline",
        draw: modulated::draw_reflected,
    },
    PatternEntry {
        kind: PatternKind::Blocks,
        id: "blocks",
        display_name: "Random Blocks",
        description: "Scattered rectangles sized and counted by band",
        draw: geometric::draw_blocks,
    },
    PatternEntry {
        kind: PatternKind::HorizontalLines,
        id: "horizontal-lines",
        display_name: "Horizontal Lines",
        description: "Drifting horizontal segments",
        draw: geometric::draw_horizontal_lines,
    },
    PatternEntry {
        kind: PatternKind::VerticalLines,
        id: "vertical-lines",
        display_name: "Vertical Lines",
        description: "Drifting vertical segments",
        draw: geometric::draw_vertical_lines,
    },
];

/// Identifiers kept from earlier releases.
const ALIASES: &[(&str, PatternKind)] = &[
    ("waves", PatternKind::Classic),
    ("flowing", PatternKind::FlowingLayers),
];

impl PatternKind {
    pub const ALL: [PatternKind; 12] = [
        PatternKind::Classic,
        PatternKind::Interference,
        PatternKind::FlowingLayers,
        PatternKind::Sine,
        PatternKind::Square,
        PatternKind::Sawtooth,
        PatternKind::AmplitudeModulated,
        PatternKind::FrequencyModulated,
        PatternKind::Reflected,
        PatternKind::Blocks,
        PatternKind::HorizontalLines,
        PatternKind::VerticalLines,
    ];

    fn entry(self) -> &'static PatternEntry {
        PATTERNS
            .iter()
            .find(|e| e.kind == self)
            .unwrap_or(&PATTERNS[0])
    }

    pub fn id(self) -> &'static str {
        self.entry().id
    }

    pub fn display_name(self) -> &'static str {
        self.entry().display_name
    }

    pub fn description(self) -> &'static str {
        self.entry().description
    }

    pub fn draw(self, canvas: &mut Canvas, ctx: &PatternContext, rng: &mut dyn RngCore) {
        (self.entry().draw)(canvas, ctx, rng)
    }
}

/// Resolve an identifier (or legacy alias) to a strategy.
pub fn lookup(id: &str) -> Option<PatternKind> {
    let id = id.trim();
    PATTERNS
        .iter()
        .find(|e| e.id.eq_ignore_ascii_case(id))
        .map(|e| e.kind)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(id))
                .map(|(_, kind)| *kind)
        })
}

pub fn identifiers() -> impl Iterator<Item = &'static str> {
    PATTERNS.iter().map(|e| e.id)
}

pub fn aliases() -> impl Iterator<Item = (&'static str, PatternKind)> {
    ALIASES.iter().copied()
}
