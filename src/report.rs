use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::audio::normalize::{ColorShares, NormalizationPolicy};
use crate::patterns::PatternKind;
use crate::settings::{Colors, Effects, RenderConfig, ResolutionTier};

/// Summary of one finished video job.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub input: String,
    pub title: Option<String>,
    pub duration_secs: f32,
    pub sample_rate: u32,
    pub width: u32,
    pub height: u32,
    pub aspect: &'static str,
    pub quality: &'static str,
    pub fps: u32,
    pub total_frames: usize,
    pub pattern: &'static str,
    pub pattern_name: &'static str,
    pub normalization: NormalizationPolicy,
    pub effects: Effects,
    pub colors: Colors,
    pub shares: ColorShares,
}

/// Job facts that are not part of the render configuration.
pub struct JobSummary<'a> {
    pub input: &'a Path,
    pub duration_secs: f32,
    pub sample_rate: u32,
    pub fps: u32,
    pub total_frames: usize,
    pub quality: ResolutionTier,
    pub normalization: NormalizationPolicy,
    pub shares: ColorShares,
}

impl GenerationReport {
    pub fn new(job: JobSummary<'_>, pattern: PatternKind, config: &RenderConfig) -> Self {
        let input = job
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| job.input.display().to_string());
        Self {
            input,
            title: config.title.visible_text().map(String::from),
            duration_secs: job.duration_secs,
            sample_rate: job.sample_rate,
            width: config.geometry.width,
            height: config.geometry.height,
            aspect: config.geometry.aspect.label(),
            quality: job.quality.label(),
            fps: job.fps,
            total_frames: job.total_frames,
            pattern: pattern.id(),
            pattern_name: pattern.display_name(),
            normalization: job.normalization,
            effects: config.effects,
            colors: config.colors,
            shares: job.shares,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generation report")?;
        writeln!(f, "  Input:        {}", self.input)?;
        if let Some(ref title) = self.title {
            writeln!(f, "  Title:        {}", title)?;
        }
        writeln!(
            f,
            "  Audio:        {:.2}s @ {} Hz",
            self.duration_secs, self.sample_rate
        )?;
        writeln!(
            f,
            "  Video:        {}x{} ({}, {}) @ {}fps, {} frames",
            self.width, self.height, self.aspect, self.quality, self.fps, self.total_frames
        )?;
        writeln!(f, "  Pattern:      {} ({})", self.pattern_name, self.pattern)?;
        writeln!(f, "  Normalization: {:?}", self.normalization)?;
        let e = &self.effects;
        writeln!(
            f,
            "  Effects:      intensity {:.2}, speed {:.2}, randomness {:.2}, alpha {:.2}",
            e.intensity, e.speed, e.randomness, e.alpha
        )?;
        writeln!(
            f,
            "                glow {}, grid {}, special grid {}",
            on_off(e.glow),
            on_off(e.grid),
            on_off(e.special_grid)
        )?;
        writeln!(
            f,
            "  Colors:       low {} {:5.1}%, mid {} {:5.1}%, high {} {:5.1}%",
            self.colors.low, self.shares.low, self.colors.mid, self.shares.mid, self.colors.high, self.shares.high
        )?;
        write!(f, "  Background:   {}", self.colors.background)
    }
}
