use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::normalize::NormalizationPolicy;
use crate::cli::Cli;
use crate::settings::{parse_choice, AspectRatio, ConfigError, HorizontalAnchor, ResolutionTier, VerticalAnchor};

/// Optional TOML overrides. Every key is optional; a key only applies when
/// the matching CLI flag was left at its default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub colors: ColorConfig,
    #[serde(default)]
    pub effects: EffectsConfig,
    #[serde(default)]
    pub title: TitleConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub fps: Option<u32>,
    pub quality: Option<String>,
    pub aspect: Option<String>,
    pub dpi: Option<f32>,
    pub codec: Option<String>,
    pub crf: Option<u32>,
    pub pix_fmt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorConfig {
    pub low: Option<String>,
    pub mid: Option<String>,
    pub high: Option<String>,
    pub background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectsConfig {
    pub intensity: Option<f32>,
    pub speed: Option<f32>,
    pub randomness: Option<f32>,
    pub alpha: Option<f32>,
    pub glow: Option<bool>,
    pub grid: Option<bool>,
    pub special_grid: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TitleConfig {
    pub text: Option<String>,
    pub size: Option<f32>,
    pub color: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
    pub font: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioConfig {
    pub normalization: Option<NormalizationPolicy>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Explicit path, else `audioline.toml` in the working directory, else
/// `~/.config/audioline/config.toml`, else the platform config directory.
pub fn find_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("audioline.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("audioline").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("audioline").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

fn merge<T: PartialEq>(target: &mut T, default: T, value: Option<T>) {
    if let Some(value) = value {
        if *target == default {
            *target = value;
        }
    }
}

fn merge_flag(target: &mut bool, value: Option<bool>) {
    if !*target {
        *target = value.unwrap_or(false);
    }
}

impl Config {
    /// Fill CLI flags still at their defaults from this config.
    pub fn merge_into(self, cli: &mut Cli) -> Result<(), ConfigError> {
        let Config {
            output,
            colors,
            effects,
            title,
            audio,
        } = self;

        merge(&mut cli.fps, 30, output.fps);
        merge(&mut cli.dpi, 100.0, output.dpi);
        merge(&mut cli.crf, 18, output.crf);
        merge(&mut cli.codec, "libx264".into(), output.codec);
        merge(&mut cli.pix_fmt, "yuv420p".into(), output.pix_fmt);
        if let Some(ref quality) = output.quality {
            merge(&mut cli.quality, ResolutionTier::FullHd, Some(parse_choice("quality", quality)?));
        }
        if let Some(ref aspect) = output.aspect {
            merge(&mut cli.aspect, AspectRatio::Widescreen, Some(parse_choice("aspect", aspect)?));
        }

        merge(&mut cli.low_color, "#FF0000".into(), colors.low);
        merge(&mut cli.mid_color, "#0000FF".into(), colors.mid);
        merge(&mut cli.high_color, "#FFFFFF".into(), colors.high);
        merge(&mut cli.background, "#000000".into(), colors.background);

        merge(&mut cli.intensity, 1.0, effects.intensity);
        merge(&mut cli.speed, 0.1, effects.speed);
        merge(&mut cli.randomness, 0.0, effects.randomness);
        merge(&mut cli.alpha, 1.0, effects.alpha);
        merge_flag(&mut cli.glow, effects.glow);
        merge_flag(&mut cli.grid, effects.grid);
        merge_flag(&mut cli.special_grid, effects.special_grid);

        if cli.title.is_none() {
            cli.title = title.text;
        }
        if cli.font.is_none() {
            cli.font = title.font;
        }
        merge(&mut cli.title_size, 28.0, title.size);
        merge(&mut cli.title_color, "#FFFFFF".into(), title.color);
        if let Some(ref x) = title.x {
            merge(&mut cli.title_x, HorizontalAnchor::Center, Some(parse_choice("title x", x)?));
        }
        if let Some(ref y) = title.y {
            merge(&mut cli.title_y, VerticalAnchor::Top, Some(parse_choice("title y", y)?));
        }

        merge(&mut cli.normalization, NormalizationPolicy::Peak, audio.normalization);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(toml_text: &str) -> Config {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn config_fills_defaults_only() {
        let config = parse(
            r##"
            [output]
            fps = 24
            aspect = "1:1"

            [colors]
            low = "#00FF00"

            [effects]
            glow = true
            intensity = 2.0

            [title]
            text = "From config"
            y = "bottom"

            [audio]
            normalization = "decibel"
            "##,
        );
        let mut cli = Cli::try_parse_from(["audioline", "in.wav", "--intensity", "3"]).unwrap();
        config.merge_into(&mut cli).unwrap();

        assert_eq!(cli.fps, 24);
        assert_eq!(cli.aspect, AspectRatio::Square);
        assert_eq!(cli.low_color, "#00FF00");
        assert!(cli.glow);
        assert_eq!(cli.intensity, 3.0);
        assert_eq!(cli.title.as_deref(), Some("From config"));
        assert_eq!(cli.title_y, VerticalAnchor::Bottom);
        assert_eq!(cli.normalization, NormalizationPolicy::Decibel);
    }

    #[test]
    fn cli_flags_win_over_config() {
        let config = parse("[title]\ntext = \"config\"\n[output]\nfps = 12\n");
        let mut cli = Cli::try_parse_from(["audioline", "--title", "cli", "--fps", "20"]).unwrap();
        config.merge_into(&mut cli).unwrap();
        assert_eq!(cli.title.as_deref(), Some("cli"));
        assert_eq!(cli.fps, 20);
    }

    #[test]
    fn unknown_choice_is_a_config_error() {
        let config = parse("[output]\naspect = \"4:3\"\n");
        let mut cli = Cli::try_parse_from(["audioline"]).unwrap();
        assert!(matches!(
            config.merge_into(&mut cli),
            Err(ConfigError::Unknown { name: "aspect", .. })
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("[effects]\nsparkle = true\n").is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audioline.toml");
        std::fs::write(&path, "[effects]\ngrid = true\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.effects.grid, Some(true));
        assert_eq!(find_config_path(Some(path.as_path())), Some(path));
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
