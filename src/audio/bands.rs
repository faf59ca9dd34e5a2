use serde::Serialize;

/// The three fixed frequency bands that drive the visuals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyBand {
    Low,
    Mid,
    High,
}

impl FrequencyBand {
    pub const ALL: [FrequencyBand; 3] = [FrequencyBand::Low, FrequencyBand::Mid, FrequencyBand::High];

    /// Inclusive `(lower, upper)` edges in Hz.
    pub fn range(self) -> (f32, f32) {
        match self {
            FrequencyBand::Low => (20.0, 250.0),
            FrequencyBand::Mid => (250.0, 4_000.0),
            FrequencyBand::High => (4_000.0, 20_000.0),
        }
    }

    /// A frequency sitting exactly on a shared edge belongs to the lower band,
    /// so the bands never overlap.
    pub fn contains(self, hz: f32) -> bool {
        let (lo, hi) = self.range();
        match self {
            FrequencyBand::Low => hz >= lo && hz <= hi,
            FrequencyBand::Mid | FrequencyBand::High => hz > lo && hz <= hi,
        }
    }

    pub fn index(self) -> usize {
        match self {
            FrequencyBand::Low => 0,
            FrequencyBand::Mid => 1,
            FrequencyBand::High => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FrequencyBand::Low => "low",
            FrequencyBand::Mid => "mid",
            FrequencyBand::High => "high",
        }
    }

    /// Spectrogram bin indices whose center frequency falls inside this band.
    pub fn bins(self, frequencies: &[f32]) -> Vec<usize> {
        frequencies
            .iter()
            .enumerate()
            .filter(|(_, &hz)| self.contains(hz))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Per-band scalar triple. Raw values come straight from the spectrogram;
/// normalized values are floored by `BandNormalizer`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BandEnergy {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

impl BandEnergy {
    pub const ZERO: BandEnergy = BandEnergy { low: 0.0, mid: 0.0, high: 0.0 };

    pub fn new(low: f32, mid: f32, high: f32) -> Self {
        Self { low, mid, high }
    }

    #[cfg(test)]
    pub fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }

    pub fn get(&self, band: FrequencyBand) -> f32 {
        match band {
            FrequencyBand::Low => self.low,
            FrequencyBand::Mid => self.mid,
            FrequencyBand::High => self.high,
        }
    }

    pub fn map(self, mut f: impl FnMut(FrequencyBand, f32) -> f32) -> Self {
        Self {
            low: f(FrequencyBand::Low, self.low),
            mid: f(FrequencyBand::Mid, self.mid),
            high: f(FrequencyBand::High, self.high),
        }
    }

    pub fn sum(&self) -> f32 {
        self.low + self.mid + self.high
    }

    pub fn max_component(&self) -> f32 {
        self.low.max(self.mid).max(self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_edges_belong_to_lower_band() {
        assert!(FrequencyBand::Low.contains(250.0));
        assert!(!FrequencyBand::Mid.contains(250.0));
        assert!(FrequencyBand::Mid.contains(4_000.0));
        assert!(!FrequencyBand::High.contains(4_000.0));
    }

    #[test]
    fn out_of_range_frequencies_are_dropped() {
        for band in FrequencyBand::ALL {
            assert!(!band.contains(10.0));
            assert!(!band.contains(21_000.0));
        }
    }

    #[test]
    fn bin_sets_are_disjoint() {
        let freqs: Vec<f32> = (0..=1024).map(|k| k as f32 * 44_100.0 / 2048.0).collect();
        let low = FrequencyBand::Low.bins(&freqs);
        let mid = FrequencyBand::Mid.bins(&freqs);
        let high = FrequencyBand::High.bins(&freqs);
        assert!(!low.is_empty() && !mid.is_empty() && !high.is_empty());
        assert!(low.iter().all(|b| !mid.contains(b) && !high.contains(b)));
        assert!(mid.iter().all(|b| !high.contains(b)));
        assert!(low.len() + mid.len() + high.len() < freqs.len());
    }

    #[test]
    fn map_visits_bands_in_order() {
        let e = BandEnergy::new(1.0, 2.0, 3.0).map(|band, v| v * (band.index() + 1) as f32);
        assert_eq!(e, BandEnergy::new(1.0, 4.0, 9.0));
        assert_eq!(e.sum(), 14.0);
        assert_eq!(e.max_component(), 9.0);
    }
}
