use serde::{Deserialize, Serialize};

use super::bands::{BandEnergy, FrequencyBand};

/// Minimum normalized intensity, so silent passages still draw something.
pub const ENERGY_FLOOR: f32 = 0.1;

/// Lowest level the decibel policy distinguishes, relative to the loudest band peak.
const DB_RANGE: f32 = 80.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationPolicy {
    /// Divide by each band's peak over the whole signal.
    #[default]
    Peak,
    /// Map decibels in `[-80, 0]` relative to the loudest band peak onto `[0, 1]`.
    Decibel,
}

/// Turns raw spectrogram band energy into floored drawing intensities.
#[derive(Clone, Debug)]
pub struct BandNormalizer {
    policy: NormalizationPolicy,
    peaks: BandEnergy,
    floor: f32,
}

impl BandNormalizer {
    pub fn new(policy: NormalizationPolicy, peaks: BandEnergy) -> Self {
        Self {
            policy,
            peaks,
            floor: ENERGY_FLOOR,
        }
    }

    pub fn normalize(&self, raw: BandEnergy) -> BandEnergy {
        match self.policy {
            NormalizationPolicy::Peak => {
                raw.map(|band, value| normalize(value, self.peaks.get(band), self.floor))
            }
            NormalizationPolicy::Decibel => {
                let reference = self.peaks.max_component();
                raw.map(|_, value| normalize_db(value, reference, self.floor))
            }
        }
    }
}

/// `raw / peak`, floored. A zero peak reads as zero before the floor applies.
/// There is no upper clamp.
pub fn normalize(raw: f32, peak: f32, floor: f32) -> f32 {
    let value = if peak > 0.0 { raw / peak } else { 0.0 };
    if value.is_finite() {
        value.max(floor)
    } else {
        floor
    }
}

fn normalize_db(raw: f32, reference: f32, floor: f32) -> f32 {
    if reference <= 0.0 || raw <= 0.0 {
        return floor;
    }
    let db = (20.0 * (raw / reference).log10()).max(-DB_RANGE);
    let value = (db + DB_RANGE) / DB_RANGE;
    if value.is_finite() {
        value.max(floor)
    } else {
        floor
    }
}

/// Percentage share of each band in the total tracked energy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ColorShares {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

/// Running per-band energy totals for one render job.
#[derive(Clone, Debug, Default)]
pub struct ColorEnergyAccumulator {
    totals: [f64; 3],
    grand_total: f64,
    frames: usize,
}

impl ColorEnergyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, energy: &BandEnergy) {
        for band in FrequencyBand::ALL {
            self.totals[band.index()] += energy.get(band) as f64;
        }
        self.grand_total += energy.sum() as f64;
        self.frames += 1;
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    #[cfg(test)]
    pub fn total(&self, band: FrequencyBand) -> f64 {
        self.totals[band.index()]
    }

    pub fn percentages(&self) -> ColorShares {
        if self.grand_total <= 0.0 {
            return ColorShares::default();
        }
        let share = |band: FrequencyBand| (self.totals[band.index()] / self.grand_total * 100.0) as f32;
        ColorShares {
            low: share(FrequencyBand::Low),
            mid: share(FrequencyBand::Mid),
            high: share(FrequencyBand::High),
        }
    }
}
