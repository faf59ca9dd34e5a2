use clap::Parser;
use std::path::PathBuf;

use crate::audio::normalize::NormalizationPolicy;
use crate::settings::{AspectRatio, HorizontalAnchor, ResolutionTier, VerticalAnchor};

#[derive(Parser, Debug)]
#[command(name = "audioline", about = "Procedural line patterns driven by audio, rendered to video")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Output video file
    #[arg(short, long, default_value = "output.mp4")]
    pub output: PathBuf,

    /// Pattern identifier (see --list-patterns)
    #[arg(short, long, default_value = "classic")]
    pub pattern: String,

    /// Aspect ratio
    #[arg(long, value_enum, default_value_t = AspectRatio::Widescreen)]
    pub aspect: AspectRatio,

    /// Resolution tier
    #[arg(long, value_enum, default_value_t = ResolutionTier::FullHd)]
    pub quality: ResolutionTier,

    /// Frames per second (5, 10, 12, 15, 20, 24, 25 or 30)
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Dots per inch; stroke widths scale with it
    #[arg(long, default_value_t = 100.0)]
    pub dpi: f32,

    #[arg(long, default_value = "#FF0000")]
    pub low_color: String,

    #[arg(long, default_value = "#0000FF")]
    pub mid_color: String,

    #[arg(long, default_value = "#FFFFFF")]
    pub high_color: String,

    #[arg(long, default_value = "#000000")]
    pub background: String,

    /// Amplitude multiplier (0-5]
    #[arg(long, default_value_t = 1.0)]
    pub intensity: f32,

    /// Phase advance per time index [0-2]
    #[arg(long, default_value_t = 0.1)]
    pub speed: f32,

    /// Random jitter [0-1]; 0 gives identical frames for identical input
    #[arg(long, default_value_t = 0.0)]
    pub randomness: f32,

    /// Stroke opacity multiplier [0-1]
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f32,

    /// Soft halo behind every stroke
    #[arg(long)]
    pub glow: bool,

    /// Faint reference grid
    #[arg(long)]
    pub grid: bool,

    /// Three-column grid tinted by band color
    #[arg(long)]
    pub special_grid: bool,

    /// Title text overlay
    #[arg(long)]
    pub title: Option<String>,

    /// Title size in points
    #[arg(long, default_value_t = 28.0)]
    pub title_size: f32,

    #[arg(long, default_value = "#FFFFFF")]
    pub title_color: String,

    #[arg(long, value_enum, default_value_t = HorizontalAnchor::Center)]
    pub title_x: HorizontalAnchor,

    #[arg(long, value_enum, default_value_t = VerticalAnchor::Top)]
    pub title_y: VerticalAnchor,

    /// Path to a TTF/OTF font for the title
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Seed for the random jitter source
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Render only the first N seconds
    #[arg(long)]
    pub duration: Option<f32>,

    /// Write a single PNG frame at this time (seconds) to --output and exit
    #[arg(long)]
    pub preview_at: Option<f32>,

    /// Live playback: overwrite this PNG with each frame at the frame rate
    #[arg(long)]
    pub live: Option<PathBuf>,

    /// Also write the generation report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// How raw band energy is scaled
    #[arg(long, value_enum, default_value_t = NormalizationPolicy::Peak)]
    pub normalization: NormalizationPolicy,

    /// FFmpeg video codec
    #[arg(long, default_value = "libx264")]
    pub codec: String,

    /// FFmpeg pixel format
    #[arg(long, default_value = "yuv420p")]
    pub pix_fmt: String,

    /// H.264 CRF quality (0-51, lower = better)
    #[arg(long, default_value_t = 18)]
    pub crf: u32,

    /// Config file (default: audioline.toml, then the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// List available patterns and exit
    #[arg(long)]
    pub list_patterns: bool,
}
