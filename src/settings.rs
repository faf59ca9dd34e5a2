use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Frame rates the renderer accepts.
pub const SUPPORTED_FPS: &[u32] = &[5, 10, 12, 15, 20, 24, 25, 30];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid color '{0}', expected #RRGGBB")]
    Color(String),
    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("unsupported frame rate {0}, expected one of 5, 10, 12, 15, 20, 24, 25, 30")]
    Fps(u32),
    #[error("unknown {name} '{value}'")]
    Unknown { name: &'static str, value: String },
}

/// An sRGB color parsed from `#RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    pub const WHITE: Rgb = Rgb([255, 255, 255]);
}

impl FromStr for Rgb {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ConfigError::Color(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ConfigError::Color(s.to_string()))
        };
        Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Colors {
    pub low: Rgb,
    pub mid: Rgb,
    pub high: Rgb,
    pub background: Rgb,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            low: Rgb([0xFF, 0x00, 0x00]),
            mid: Rgb([0x00, 0x00, 0xFF]),
            high: Rgb::WHITE,
            background: Rgb::BLACK,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Effects {
    /// Amplitude multiplier applied to every band.
    pub intensity: f32,
    /// Phase advance per time index.
    pub speed: f32,
    /// 0 disables random jitter entirely.
    pub randomness: f32,
    /// Multiplier on each pattern's own alpha schedule.
    pub alpha: f32,
    pub glow: bool,
    pub grid: bool,
    pub special_grid: bool,
}

impl Default for Effects {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            speed: 0.1,
            randomness: 0.0,
            alpha: 1.0,
            glow: false,
            grid: false,
            special_grid: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
pub enum AspectRatio {
    #[default]
    #[value(name = "16:9")]
    #[serde(rename = "16:9")]
    Widescreen,
    #[value(name = "1:1")]
    #[serde(rename = "1:1")]
    Square,
    #[value(name = "9:16")]
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Drawing-space extent `(xlim, ylim)`.
    pub fn limits(self) -> (f32, f32) {
        match self {
            AspectRatio::Widescreen => (16.0, 9.0),
            AspectRatio::Square => (10.0, 10.0),
            AspectRatio::Portrait => (9.0, 16.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "9:16",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
pub enum ResolutionTier {
    #[value(name = "720p")]
    #[serde(rename = "720p")]
    Hd,
    #[default]
    #[value(name = "1080p")]
    #[serde(rename = "1080p")]
    FullHd,
    #[value(name = "4k")]
    #[serde(rename = "4k")]
    Uhd,
}

impl ResolutionTier {
    fn short_side(self) -> u32 {
        match self {
            ResolutionTier::Hd => 720,
            ResolutionTier::FullHd => 1080,
            ResolutionTier::Uhd => 2160,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResolutionTier::Hd => "720p",
            ResolutionTier::FullHd => "1080p",
            ResolutionTier::Uhd => "4k",
        }
    }

    /// Pixel `(width, height)` for this tier at the given aspect ratio.
    pub fn dimensions(self, aspect: AspectRatio) -> (u32, u32) {
        let short = self.short_side();
        let long = short * 16 / 9;
        match aspect {
            AspectRatio::Widescreen => (long, short),
            AspectRatio::Square => (short, short),
            AspectRatio::Portrait => (short, long),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Geometry {
    pub aspect: AspectRatio,
    pub width: u32,
    pub height: u32,
    pub dpi: f32,
}

impl Geometry {
    pub fn new(aspect: AspectRatio, tier: ResolutionTier, dpi: f32) -> Self {
        let (width, height) = tier.dimensions(aspect);
        Self { aspect, width, height, dpi }
    }

    /// Arbitrary pixel size, used for thumbnails and tests.
    pub fn custom(aspect: AspectRatio, width: u32, height: u32, dpi: f32) -> Self {
        Self { aspect, width, height, dpi }
    }

    pub fn limits(&self) -> (f32, f32) {
        self.aspect.limits()
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(AspectRatio::default(), ResolutionTier::default(), 100.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAnchor {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    #[default]
    Top,
    Bottom,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TitleSettings {
    pub text: Option<String>,
    /// Font size in points.
    pub size: f32,
    pub color: Rgb,
    pub horizontal: HorizontalAnchor,
    pub vertical: VerticalAnchor,
}

impl Default for TitleSettings {
    fn default() -> Self {
        Self {
            text: None,
            size: 28.0,
            color: Rgb::WHITE,
            horizontal: HorizontalAnchor::default(),
            vertical: VerticalAnchor::default(),
        }
    }
}

impl TitleSettings {
    /// Text to draw, if any non-blank title was set.
    pub fn visible_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Everything one frame or one job needs besides the audio. Never mutated by the renderer.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RenderConfig {
    pub colors: Colors,
    pub effects: Effects,
    pub geometry: Geometry,
    pub title: TitleSettings,
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.effects;
        check_range("intensity", e.intensity, 0.01, 5.0)?;
        check_range("speed", e.speed, 0.0, 2.0)?;
        check_range("randomness", e.randomness, 0.0, 1.0)?;
        check_range("alpha", e.alpha, 0.0, 1.0)?;
        check_range("title size", self.title.size, 1.0, 400.0)?;
        check_range("dpi", self.geometry.dpi, 36.0, 600.0)?;
        if self.geometry.width == 0 || self.geometry.height == 0 {
            return Err(ConfigError::OutOfRange {
                name: "resolution",
                value: 0.0,
                min: 1.0,
                max: f32::MAX,
            });
        }
        Ok(())
    }
}

pub fn validate_fps(fps: u32) -> Result<u32, ConfigError> {
    if SUPPORTED_FPS.contains(&fps) {
        Ok(fps)
    } else {
        Err(ConfigError::Fps(fps))
    }
}

/// Parse one of the CLI enum choices from a config-file string.
pub fn parse_choice<T: clap::ValueEnum>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    <T as clap::ValueEnum>::from_str(value.trim(), true).map_err(|_| ConfigError::Unknown {
        name,
        value: value.to_string(),
    })
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, value, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!("#FF8000".parse::<Rgb>().unwrap(), Rgb([255, 128, 0]));
        assert_eq!("00ff00".parse::<Rgb>().unwrap(), Rgb([0, 255, 0]));
        assert_eq!(Rgb([1, 2, 255]).to_string(), "#0102FF");
        assert!("#FFF".parse::<Rgb>().is_err());
        assert!("#GG0000".parse::<Rgb>().is_err());
        assert!("#ÿÿÿ".parse::<Rgb>().is_err());
    }

    #[test]
    fn tier_dimensions_follow_aspect() {
        assert_eq!(ResolutionTier::FullHd.dimensions(AspectRatio::Widescreen), (1920, 1080));
        assert_eq!(ResolutionTier::Hd.dimensions(AspectRatio::Square), (720, 720));
        assert_eq!(ResolutionTier::Uhd.dimensions(AspectRatio::Portrait), (2160, 3840));
        assert_eq!(ResolutionTier::Hd.dimensions(AspectRatio::Widescreen), (1280, 720));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(RenderConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_effects() {
        let mut config = RenderConfig::default();
        config.effects.randomness = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { name: "randomness", .. })
        ));

        let mut config = RenderConfig::default();
        config.effects.alpha = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn fps_must_be_in_fixed_set() {
        assert_eq!(validate_fps(20), Ok(20));
        assert_eq!(validate_fps(29), Err(ConfigError::Fps(29)));
    }

    #[test]
    fn parses_choices_by_label() {
        assert_eq!(parse_choice::<AspectRatio>("aspect", "9:16"), Ok(AspectRatio::Portrait));
        assert_eq!(parse_choice::<ResolutionTier>("quality", "4K"), Ok(ResolutionTier::Uhd));
        assert_eq!(parse_choice::<VerticalAnchor>("title y", "bottom"), Ok(VerticalAnchor::Bottom));
        assert!(matches!(
            parse_choice::<HorizontalAnchor>("title x", "middle"),
            Err(ConfigError::Unknown { name: "title x", .. })
        ));
    }

    #[test]
    fn blank_title_is_hidden() {
        let mut title = TitleSettings::default();
        assert_eq!(title.visible_text(), None);
        title.text = Some("   ".into());
        assert_eq!(title.visible_text(), None);
        title.text = Some(" Night Drive ".into());
        assert_eq!(title.visible_text(), Some("Night Drive"));
    }
}
