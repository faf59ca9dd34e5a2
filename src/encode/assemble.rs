use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::Encoder;
use crate::audio::decode::AudioSignal;
use crate::audio::normalize::ColorShares;
use crate::render::sequencer::PersistedFrames;

/// Finished, muxed video held in memory.
#[derive(Debug)]
pub struct VideoFile {
    pub bytes: Vec<u8>,
    pub total_frames: usize,
    pub shares: ColorShares,
}

/// One video job. Frames and intermediates live in a temporary directory
/// that is removed when the assembler is dropped, whatever the outcome.
pub struct VideoAssembler<E: Encoder> {
    encoder: E,
    work_dir: TempDir,
}

impl<E: Encoder> VideoAssembler<E> {
    pub fn new(encoder: E) -> Result<Self> {
        let work_dir = tempfile::Builder::new()
            .prefix("audioline-")
            .tempdir()
            .context("Failed to create temporary job directory")?;
        Ok(Self { encoder, work_dir })
    }

    fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    /// Where the sequencer should persist frames for this job.
    pub fn frame_dir(&self) -> PathBuf {
        self.work_dir().join("frames")
    }

    pub fn assemble(
        self,
        frames: PersistedFrames,
        fps: u32,
        audio: &AudioSignal,
        duration: f32,
    ) -> Result<VideoFile> {
        let dir = self.work_dir();
        let video_path = dir.join("video.mp4");
        let audio_path = dir.join("audio.wav");
        let output_path = dir.join("output.mp4");
        let total_frames = frames.paths.len();

        log::info!("Encoding {} frames at {}fps...", total_frames, fps);
        let mut sink = self
            .encoder
            .open_video(&video_path, frames.width, frames.height, fps)?;
        for path in &frames.paths {
            let image = image::open(path)
                .with_context(|| format!("Failed to read frame {}", path.display()))?
                .into_rgba8();
            if image.dimensions() != (frames.width, frames.height) {
                anyhow::bail!(
                    "Frame {} is {}x{}, expected {}x{}",
                    path.display(),
                    image.width(),
                    image.height(),
                    frames.width,
                    frames.height
                );
            }
            sink.write_frame(image.as_raw())?;
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove frame {}", path.display()))?;
        }
        sink.finish()?;

        let segment = peak_normalize(audio.segment(duration));
        write_wav(&audio_path, &segment, audio.sample_rate())?;

        log::info!("Muxing audio...");
        self.encoder.mux(&video_path, &audio_path, &output_path)?;

        let bytes = std::fs::read(&output_path)
            .with_context(|| format!("Failed to read muxed video {}", output_path.display()))?;

        Ok(VideoFile {
            bytes,
            total_frames,
            shares: frames.accumulator.percentages(),
        })
    }
}

/// Scale so the loudest sample reaches full scale. Silence stays silent.
pub fn peak_normalize(samples: &[f32]) -> Vec<f32> {
    let peak = samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
    if peak <= f32::EPSILON {
        log::warn!("Audio segment is silent");
        return samples.to_vec();
    }
    samples.iter().map(|&s| s / peak).collect()
}

pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer.write_sample(v)?;
    }
    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::analysis::SpectralAnalyzer;
    use crate::audio::normalize::NormalizationPolicy;
    use crate::encode::{EncoderError, FrameSink};
    use crate::render::frame::PatternRenderer;
    use crate::render::sequencer::FrameSequencer;
    use crate::settings::{AspectRatio, Geometry, RenderConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        frames: usize,
        frame_bytes: usize,
        wav_samples: usize,
        wav_peak: i16,
    }

    struct FakeEncoder {
        recorded: Arc<Mutex<Recorded>>,
        fail_mux: Option<String>,
    }

    struct FakeSink {
        output: PathBuf,
        recorded: Arc<Mutex<Recorded>>,
    }

    impl FrameSink for FakeSink {
        fn write_frame(&mut self, rgba: &[u8]) -> Result<(), EncoderError> {
            let mut r = self.recorded.lock().unwrap();
            r.frames += 1;
            r.frame_bytes += rgba.len();
            Ok(())
        }

        fn finish(self: Box<Self>) -> Result<(), EncoderError> {
            std::fs::write(&self.output, b"video")?;
            Ok(())
        }
    }

    impl Encoder for FakeEncoder {
        fn open_video(&self, output: &Path, _: u32, _: u32, _: u32) -> Result<Box<dyn FrameSink>, EncoderError> {
            Ok(Box::new(FakeSink {
                output: output.to_path_buf(),
                recorded: Arc::clone(&self.recorded),
            }))
        }

        fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), EncoderError> {
            if let Some(ref stderr) = self.fail_mux {
                return Err(EncoderError::Failed {
                    status: Some(1),
                    stderr: stderr.clone(),
                });
            }
            let mut reader = hound::WavReader::open(audio).unwrap();
            let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
            {
                let mut r = self.recorded.lock().unwrap();
                r.wav_samples = samples.len();
                r.wav_peak = samples.iter().map(|s| s.saturating_abs()).max().unwrap_or(0);
            }
            let mut bytes = std::fs::read(video)?;
            bytes.extend_from_slice(b"+audio");
            std::fs::write(output, bytes)?;
            Ok(())
        }
    }

    fn job(fail_mux: Option<&str>) -> (FakeEncoder, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let encoder = FakeEncoder {
            recorded: Arc::clone(&recorded),
            fail_mux: fail_mux.map(String::from),
        };
        (encoder, recorded)
    }

    fn quiet_tone() -> AudioSignal {
        let sr = 8_000;
        let samples = (0..2 * sr)
            .map(|i| 0.25 * (std::f32::consts::TAU * 440.0 * i as f32 / sr as f32).sin())
            .collect();
        AudioSignal::new(samples, sr as u32)
    }

    fn render_into(assembler: &VideoAssembler<FakeEncoder>, analyzer: &SpectralAnalyzer) -> PersistedFrames {
        let renderer = PatternRenderer::with_overlay(
            RenderConfig {
                geometry: Geometry::custom(AspectRatio::Square, 16, 16, 72.0),
                ..RenderConfig::default()
            },
            None,
        );
        let seq = FrameSequencer::new(analyzer, &renderer, "classic", 10, Some(1.0), NormalizationPolicy::Peak);
        seq.persist(&assembler.frame_dir(), &mut ChaCha8Rng::seed_from_u64(0), |_, _| {})
            .unwrap()
    }

    #[test]
    fn assembles_frames_and_audio() {
        let analyzer = SpectralAnalyzer::new(quiet_tone());
        let (encoder, recorded) = job(None);
        let assembler = VideoAssembler::new(encoder).unwrap();
        let work_dir = assembler.work_dir().to_path_buf();
        let frames = render_into(&assembler, &analyzer);

        let video = assembler.assemble(frames, 10, analyzer.signal(), 1.0).unwrap();
        assert_eq!(video.bytes, b"video+audio");
        assert_eq!(video.total_frames, 10);
        let total = video.shares.low + video.shares.mid + video.shares.high;
        assert!((total - 100.0).abs() < 1e-3);

        let r = recorded.lock().unwrap();
        assert_eq!(r.frames, 10);
        assert_eq!(r.frame_bytes, 10 * 16 * 16 * 4);
        assert_eq!(r.wav_samples, 8_000);
        // Quiet input is brought up to full scale
        assert!(r.wav_peak > 32_000);
        assert!(!work_dir.exists());
    }

    #[test]
    fn encoder_failure_cleans_up_and_keeps_stderr() {
        let analyzer = SpectralAnalyzer::new(quiet_tone());
        let stderr = "Unknown encoder 'aac'\nConversion failed!";
        let (encoder, _) = job(Some(stderr));
        let assembler = VideoAssembler::new(encoder).unwrap();
        let work_dir = assembler.work_dir().to_path_buf();
        let frames = render_into(&assembler, &analyzer);
        assert!(work_dir.join("frames").exists());

        let err = assembler.assemble(frames, 10, analyzer.signal(), 1.0).unwrap_err();
        match err.downcast_ref::<EncoderError>() {
            Some(EncoderError::Failed { stderr: captured, .. }) => assert_eq!(captured, stderr),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!work_dir.exists());
    }

    #[test]
    fn peak_normalize_scales_to_unit() {
        let out = peak_normalize(&[0.1, -0.5, 0.25]);
        assert_eq!(out, vec![0.2, -1.0, 0.5]);
    }

    #[test]
    fn peak_normalize_leaves_silence() {
        assert_eq!(peak_normalize(&[0.0; 4]), vec![0.0; 4]);
        assert!(peak_normalize(&[]).is_empty());
    }
}
