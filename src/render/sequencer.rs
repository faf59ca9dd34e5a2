use anyhow::{Context, Result};
use rand::RngCore;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::frame::{Frame, PatternRenderer};
use crate::audio::analysis::SpectralAnalyzer;
use crate::audio::bands::BandEnergy;
use crate::audio::normalize::{BandNormalizer, ColorEnergyAccumulator, NormalizationPolicy};

/// Frames written to disk by one batch job, in playback order.
pub struct PersistedFrames {
    pub paths: Vec<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub accumulator: ColorEnergyAccumulator,
}

/// Walks the spectrogram at a fixed frame rate and renders each frame.
pub struct FrameSequencer<'a> {
    analyzer: &'a SpectralAnalyzer,
    renderer: &'a PatternRenderer,
    normalizer: BandNormalizer,
    pattern: &'a str,
    fps: u32,
    duration: f32,
}

impl<'a> FrameSequencer<'a> {
    /// `duration` limits the render to the first seconds of the signal.
    pub fn new(
        analyzer: &'a SpectralAnalyzer,
        renderer: &'a PatternRenderer,
        pattern: &'a str,
        fps: u32,
        duration: Option<f32>,
        policy: NormalizationPolicy,
    ) -> Self {
        let full = analyzer.signal().duration();
        let duration = duration.map_or(full, |d| d.clamp(0.0, full));
        Self {
            analyzer,
            renderer,
            normalizer: BandNormalizer::new(policy, analyzer.band_peaks()),
            pattern,
            fps: fps.max(1),
            duration,
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn total_frames(&self) -> usize {
        (self.duration * self.fps as f32).floor() as usize
    }

    /// Seconds between consecutive frames on the spectrogram time axis.
    pub fn time_step(&self) -> f32 {
        let total = self.total_frames();
        if total == 0 {
            return 0.0;
        }
        self.duration.min(self.analyzer.last_time()) / total as f32
    }

    pub fn frame_time(&self, index: usize) -> f32 {
        index as f32 * self.time_step()
    }

    /// Spectrogram column for a frame; also the pattern's time index.
    pub fn column_for(&self, index: usize) -> usize {
        self.analyzer.nearest_column(self.frame_time(index))
    }

    pub fn energy_at_column(&self, column: usize) -> BandEnergy {
        self.normalizer.normalize(self.analyzer.energy_at(column))
    }

    pub fn render_frame(&self, index: usize, rng: &mut dyn RngCore) -> Frame {
        let column = self.column_for(index);
        self.render_column(index, column, self.energy_at_column(column), rng)
    }

    /// Single preview frame at an arbitrary time.
    pub fn render_at(&self, seconds: f32, rng: &mut dyn RngCore) -> Frame {
        let column = self.analyzer.nearest_column(seconds);
        let index = (seconds.max(0.0) * self.fps as f32) as usize;
        self.render_column(index, column, self.energy_at_column(column), rng)
    }

    fn render_column(&self, index: usize, column: usize, energy: BandEnergy, rng: &mut dyn RngCore) -> Frame {
        let mut frame = self.renderer.render(self.pattern, energy, column, rng);
        frame.index = index;
        log::debug!(
            "Frame {} (column {}): low={:.3} mid={:.3} high={:.3}, {} strokes",
            index,
            column,
            energy.low,
            energy.mid,
            energy.high,
            frame.strokes
        );
        frame
    }

    /// Paced playback: one frame, hand it over, sleep `1/fps`, then check
    /// `cancel`. Returns the number of frames shown.
    pub fn play(
        &self,
        rng: &mut dyn RngCore,
        cancel: &AtomicBool,
        mut on_frame: impl FnMut(&Frame),
    ) -> usize {
        let delay = Duration::from_secs_f32(1.0 / self.fps as f32);
        let total = self.total_frames();
        let mut shown = 0;

        for index in 0..total {
            if cancel.load(Ordering::Relaxed) {
                log::info!("Playback cancelled after {} of {} frames", shown, total);
                break;
            }
            let frame = self.render_frame(index, rng);
            on_frame(&frame);
            shown += 1;
            std::thread::sleep(delay);
        }

        shown
    }

    /// Render every frame to `dir` as PNG, tracking band energy. Stops at the
    /// first failure since a missing frame would break the video.
    pub fn persist(
        &self,
        dir: &Path,
        rng: &mut dyn RngCore,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<PersistedFrames> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create frame directory: {}", dir.display()))?;

        let total = self.total_frames();
        let geometry = &self.renderer.config().geometry;
        let mut accumulator = ColorEnergyAccumulator::new();
        let mut paths = Vec::with_capacity(total);

        for index in 0..total {
            let column = self.column_for(index);
            let energy = self.energy_at_column(column);
            let frame = self.render_column(index, column, energy, rng);
            accumulator.track(&energy);

            let path = dir.join(format!("frame_{:06}.png", index));
            frame.save_png(&path)?;
            paths.push(path);
            progress(index + 1, total);
        }
        log::debug!("Tracked band energy over {} frames", accumulator.frames());

        Ok(PersistedFrames {
            paths,
            width: geometry.width,
            height: geometry.height,
            accumulator,
        })
    }
}
