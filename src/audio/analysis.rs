use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use super::bands::{BandEnergy, FrequencyBand};
use super::decode::AudioSignal;

pub const FFT_SIZE: usize = 2048;
pub const HOP_SIZE: usize = 512;

/// Magnitude spectrogram with its time and frequency axes.
pub struct Spectrogram {
    /// `columns[t][k]` is the magnitude of bin `k` in column `t`.
    columns: Vec<Vec<f32>>,
    times: Vec<f32>,
    frequencies: Vec<f32>,
}

impl Spectrogram {
    pub fn compute(signal: &AudioSignal) -> Self {
        let samples = signal.samples();
        let sr = signal.sample_rate().max(1) as f32;
        let num_columns = 1 + samples.len() / HOP_SIZE;
        let hann = hann_window(FFT_SIZE);

        let columns: Vec<Vec<f32>> = (0..num_columns)
            .into_par_iter()
            .map_init(
                || FftPlanner::<f32>::new().plan_fft_forward(FFT_SIZE),
                |fft, t| {
                    // Centered frame, zero-padded past either end of the signal
                    let start = (t * HOP_SIZE) as isize - (FFT_SIZE / 2) as isize;
                    let mut buffer: Vec<Complex<f32>> = (0..FFT_SIZE)
                        .map(|i| {
                            let idx = start + i as isize;
                            let s = if idx >= 0 && (idx as usize) < samples.len() {
                                samples[idx as usize]
                            } else {
                                0.0
                            };
                            Complex::new(s * hann[i], 0.0)
                        })
                        .collect();

                    fft.process(&mut buffer);

                    buffer[..=FFT_SIZE / 2].iter().map(|c| c.norm()).collect()
                },
            )
            .collect();

        let times = (0..num_columns).map(|t| (t * HOP_SIZE) as f32 / sr).collect();
        let frequencies = (0..=FFT_SIZE / 2).map(|k| k as f32 * sr / FFT_SIZE as f32).collect();

        Self { columns, times, frequencies }
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn times(&self) -> &[f32] {
        &self.times
    }

    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    pub fn column(&self, t: usize) -> Option<&[f32]> {
        self.columns.get(t).map(Vec::as_slice)
    }
}

/// Owns the signal and its spectrogram, and answers per-column band energy.
pub struct SpectralAnalyzer {
    signal: AudioSignal,
    spectrogram: Spectrogram,
    band_bins: [Vec<usize>; 3],
    peaks: BandEnergy,
}

impl SpectralAnalyzer {
    pub fn new(signal: AudioSignal) -> Self {
        let spectrogram = Spectrogram::compute(&signal);
        let freqs = spectrogram.frequencies();
        let band_bins = FrequencyBand::ALL.map(|band| band.bins(freqs));

        let mut analyzer = Self {
            signal,
            spectrogram,
            band_bins,
            peaks: BandEnergy::ZERO,
        };

        for band in FrequencyBand::ALL {
            if analyzer.band_bins(band).is_empty() {
                log::warn!(
                    "Band '{}' has no spectrogram bins at {}Hz; it will stay at the floor",
                    band.name(),
                    analyzer.signal.sample_rate()
                );
            }
        }

        analyzer.peaks = analyzer.compute_peaks();

        log::info!(
            "Spectrogram: {} columns, peaks low={:.3} mid={:.3} high={:.3}",
            analyzer.num_columns(),
            analyzer.peaks.low,
            analyzer.peaks.mid,
            analyzer.peaks.high
        );

        analyzer
    }

    fn compute_peaks(&self) -> BandEnergy {
        (0..self.num_columns())
            .map(|t| self.energy_at(t))
            .fold(BandEnergy::ZERO, |acc, e| {
                BandEnergy::new(acc.low.max(e.low), acc.mid.max(e.mid), acc.high.max(e.high))
            })
    }

    /// Mean magnitude per band in column `time_index`. Past the last column
    /// every band reads zero; a band without bins also reads zero.
    pub fn energy_at(&self, time_index: usize) -> BandEnergy {
        let Some(column) = self.spectrogram.column(time_index) else {
            return BandEnergy::ZERO;
        };

        let mean = |bins: &[usize]| -> f32 {
            if bins.is_empty() {
                return 0.0;
            }
            let sum: f32 = bins.iter().map(|&k| column[k]).sum();
            let value = sum / bins.len() as f32;
            if value.is_finite() {
                value
            } else {
                0.0
            }
        };

        BandEnergy::new(
            mean(self.band_bins(FrequencyBand::Low)),
            mean(self.band_bins(FrequencyBand::Mid)),
            mean(self.band_bins(FrequencyBand::High)),
        )
    }

    /// Per-band maximum of `energy_at` across the whole signal.
    pub fn band_peaks(&self) -> BandEnergy {
        self.peaks
    }

    /// Index of the column closest to `seconds`, clamped to the last column.
    pub fn nearest_column(&self, seconds: f32) -> usize {
        let sr = self.signal.sample_rate().max(1) as f32;
        let idx = (seconds.max(0.0) * sr / HOP_SIZE as f32).round() as usize;
        idx.min(self.spectrogram.num_columns().saturating_sub(1))
    }

    /// Time of the last spectrogram column in seconds.
    pub fn last_time(&self) -> f32 {
        self.spectrogram.times().last().copied().unwrap_or(0.0)
    }

    pub fn num_columns(&self) -> usize {
        self.spectrogram.num_columns()
    }

    pub fn signal(&self) -> &AudioSignal {
        &self.signal
    }

    #[cfg(test)]
    pub fn spectrogram(&self) -> &Spectrogram {
        &self.spectrogram
    }

    fn band_bins(&self, band: FrequencyBand) -> &[usize] {
        &self.band_bins[band.index()]
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn tone(freq: f32, seconds: f32, sample_rate: u32) -> AudioSignal {
        let n = (seconds * sample_rate as f32) as usize;
        let samples = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect();
        AudioSignal::new(samples, sample_rate)
    }

    #[test]
    fn axes_follow_window_and_hop() {
        let analyzer = SpectralAnalyzer::new(tone(440.0, 1.0, 44_100));
        assert_eq!(analyzer.num_columns(), 1 + 44_100 / HOP_SIZE);
        assert_eq!(analyzer.spectrogram().frequencies().len(), FFT_SIZE / 2 + 1);
        let times = analyzer.spectrogram().times();
        assert!((times[1] - HOP_SIZE as f32 / 44_100.0).abs() < 1e-6);
        assert!(analyzer.last_time() <= analyzer.signal().duration());
    }

    #[test]
    fn tone_lands_in_its_band() {
        let analyzer = SpectralAnalyzer::new(tone(100.0, 1.0, 44_100));
        let e = analyzer.energy_at(40);
        assert!(e.low > e.mid * 5.0);
        assert!(e.low > e.high * 5.0);

        let analyzer = SpectralAnalyzer::new(tone(8_000.0, 1.0, 44_100));
        let e = analyzer.energy_at(40);
        assert!(e.high > e.low);
        assert!(e.high > e.mid);
    }

    #[test]
    fn energy_is_finite_and_non_negative() {
        let analyzer = SpectralAnalyzer::new(tone(1_000.0, 0.5, 22_050));
        for t in 0..analyzer.num_columns() {
            let e = analyzer.energy_at(t);
            for v in [e.low, e.mid, e.high] {
                assert!(v.is_finite());
                assert!(v >= 0.0);
            }
        }
    }

    #[test]
    fn past_the_end_reads_zero() {
        let analyzer = SpectralAnalyzer::new(tone(440.0, 0.5, 44_100));
        let n = analyzer.num_columns();
        assert_eq!(analyzer.energy_at(n), BandEnergy::ZERO);
        assert_eq!(analyzer.energy_at(n + 1_000), BandEnergy::ZERO);
    }

    #[test]
    fn empty_high_band_reads_zero() {
        // 8 kHz sample rate tops out at 4 kHz, so the high band owns no bins
        let analyzer = SpectralAnalyzer::new(tone(440.0, 0.5, 8_000));
        assert!(analyzer.band_bins(FrequencyBand::High).is_empty());
        assert_eq!(analyzer.energy_at(3).high, 0.0);
        assert_eq!(analyzer.band_peaks().high, 0.0);
    }

    #[test]
    fn nearest_column_rounds_and_clamps() {
        let analyzer = SpectralAnalyzer::new(tone(440.0, 1.0, 44_100));
        let step = HOP_SIZE as f32 / 44_100.0;
        assert_eq!(analyzer.nearest_column(0.0), 0);
        assert_eq!(analyzer.nearest_column(step * 10.4), 10);
        assert_eq!(analyzer.nearest_column(step * 10.6), 11);
        assert_eq!(analyzer.nearest_column(100.0), analyzer.num_columns() - 1);
    }

    #[test]
    fn silence_has_zero_peaks() {
        let analyzer = SpectralAnalyzer::new(AudioSignal::new(vec![0.0; 22_050], 22_050));
        assert_eq!(analyzer.band_peaks(), BandEnergy::ZERO);
    }
}
