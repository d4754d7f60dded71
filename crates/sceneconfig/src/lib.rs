use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Upper bound on reveal panels; matches the overlay uniform array length.
pub const MAX_PANELS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Easing curves available to the reveal timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Easing {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "power2.out")]
    Power2Out,
    #[default]
    #[serde(rename = "power3.out")]
    Power3Out,
    #[serde(rename = "power3.inOut")]
    Power3InOut,
    #[serde(rename = "smoothstep")]
    Smoothstep,
}

impl Easing {
    /// Maps linear progress onto the curve. Input is clamped to `[0, 1]`.
    pub fn sample(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::Power2Out => 1.0 - (1.0 - t).powi(2),
            Easing::Power3Out => 1.0 - (1.0 - t).powi(3),
            Easing::Power3InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::Smoothstep => t * t * (3.0 - 2.0 * t),
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Easing::Linear => "linear",
            Easing::Power2Out => "power2.out",
            Easing::Power3Out => "power3.out",
            Easing::Power3InOut => "power3.inOut",
            Easing::Smoothstep => "smoothstep",
        })
    }
}

impl FromStr for Easing {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linear" | "none" => Ok(Easing::Linear),
            "power2.out" | "quad.out" => Ok(Easing::Power2Out),
            "power3.out" | "cubic.out" => Ok(Easing::Power3Out),
            "power3.inout" | "cubic.inout" => Ok(Easing::Power3InOut),
            "smoothstep" => Ok(Easing::Smoothstep),
            other => Err(format!(
                "unknown easing '{other}'; expected linear, power2.out, power3.out, power3.inOut, or smoothstep"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Easing {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub pointer: PointerSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub reveal: RevealSettings,
    #[serde(default = "default_panels")]
    pub panels: Vec<Panel>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PointerSettings {
    /// Fraction of the remaining distance covered per frame.
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            smoothing: default_smoothing(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DisplaySettings {
    #[serde(default = "default_max_pixel_ratio")]
    pub max_pixel_ratio: f32,
    #[serde(default)]
    pub fps: Option<f32>,
    #[serde(default, deserialize_with = "deserialize_antialias_opt")]
    pub antialias: Option<AntialiasSetting>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            max_pixel_ratio: default_max_pixel_ratio(),
            fps: None,
            antialias: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RevealSettings {
    /// Time for the loader bar to grow to full width.
    #[serde(default = "default_bar_fill", deserialize_with = "deserialize_duration")]
    pub bar_fill: Duration,
    /// Loader fade-out after the bar is full.
    #[serde(
        default = "default_loader_fade",
        deserialize_with = "deserialize_duration"
    )]
    pub loader_fade: Duration,
    /// Per-panel reveal length.
    #[serde(
        default = "default_reveal_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub duration: Duration,
    /// Delay between consecutive panel reveals.
    #[serde(default = "default_stagger", deserialize_with = "deserialize_duration")]
    pub stagger: Duration,
    /// Initial downward offset of each panel in logical pixels.
    #[serde(default = "default_rise")]
    pub rise: f32,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default = "default_bar_easing")]
    pub bar_easing: Easing,
}

impl RevealSettings {
    /// Total length of the loader and panel sequence, or `None` when it
    /// does not fit in a `Duration`.
    pub fn sequence_length(&self, panel_count: usize) -> Option<Duration> {
        let hidden_at = self.bar_fill.checked_add(self.loader_fade)?;
        match panel_count {
            0 => Some(hidden_at),
            count => {
                let last = u32::try_from(count - 1).ok()?;
                hidden_at
                    .checked_add(self.stagger.checked_mul(last)?)?
                    .checked_add(self.duration)
            }
        }
    }
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            bar_fill: default_bar_fill(),
            loader_fade: default_loader_fade(),
            duration: default_reveal_duration(),
            stagger: default_stagger(),
            rise: default_rise(),
            easing: Easing::default(),
            bar_easing: default_bar_easing(),
        }
    }
}

/// Overlay rectangle in normalised window coordinates (top-left origin).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Panel {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_panel_color")]
    pub color: [f32; 4],
    /// Brightness added while hovered once the scene is loaded.
    #[serde(default = "default_hover")]
    pub hover: f32,
}

impl Panel {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            color: default_panel_color(),
            hover: default_hover(),
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

fn default_version() -> u32 {
    1
}

fn default_smoothing() -> f32 {
    0.05
}

fn default_max_pixel_ratio() -> f32 {
    2.0
}

fn default_bar_fill() -> Duration {
    Duration::from_millis(1200)
}

fn default_loader_fade() -> Duration {
    Duration::from_millis(1000)
}

fn default_reveal_duration() -> Duration {
    Duration::from_millis(1200)
}

fn default_stagger() -> Duration {
    Duration::from_millis(150)
}

fn default_rise() -> f32 {
    40.0
}

fn default_bar_easing() -> Easing {
    Easing::Linear
}

fn default_panel_color() -> [f32; 4] {
    [0.85, 0.85, 0.88, 0.10]
}

fn default_hover() -> f32 {
    0.06
}

fn default_panels() -> Vec<Panel> {
    vec![
        Panel::new(0.10, 0.30, 0.45, 0.08),
        Panel::new(0.10, 0.42, 0.35, 0.04),
        Panel::new(0.10, 0.52, 0.15, 0.05),
    ]
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn deserialize_antialias_opt<'de, D>(deserializer: D) -> Result<Option<AntialiasSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    let result = match helper {
        None => None,
        Some(Helper::Str(raw)) => Some(parse_antialias(&raw).map_err(de::Error::custom)?),
        Some(Helper::Num(value)) => {
            if value < 0 {
                return Err(de::Error::custom("antialias value must be non-negative"));
            }
            let raw = value.to_string();
            Some(parse_antialias(&raw).map_err(de::Error::custom)?)
        }
    };
    Ok(result)
}

fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" | "0" => Ok(AntialiasSetting::Off),
        "2" => Ok(AntialiasSetting::Samples2),
        "4" => Ok(AntialiasSetting::Samples4),
        "8" => Ok(AntialiasSetting::Samples8),
        "16" => Ok(AntialiasSetting::Samples16),
        other => Err(format!("invalid antialias setting '{other}'")),
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            pointer: PointerSettings::default(),
            display: DisplaySettings::default(),
            reveal: RevealSettings::default(),
            panels: default_panels(),
        }
    }
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads and validates a config file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        let smoothing = self.pointer.smoothing;
        if !(smoothing > 0.0 && smoothing <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "pointer.smoothing must be in (0, 1], got {smoothing}"
            )));
        }

        if !(self.display.max_pixel_ratio.is_finite() && self.display.max_pixel_ratio > 0.0) {
            return Err(ConfigError::Invalid(
                "display.max_pixel_ratio must be greater than zero".into(),
            ));
        }

        if let Some(fps) = self.display.fps {
            if fps < 0.0 {
                return Err(ConfigError::Invalid("display.fps must be >= 0".into()));
            }
        }

        if self.reveal.duration.is_zero() {
            return Err(ConfigError::Invalid(
                "reveal.duration must be greater than zero".into(),
            ));
        }

        if self.reveal.sequence_length(self.panels.len()).is_none() {
            return Err(ConfigError::Invalid(
                "reveal durations are too long to schedule".into(),
            ));
        }

        if !self.reveal.rise.is_finite() {
            return Err(ConfigError::Invalid("reveal.rise must be finite".into()));
        }

        if self.panels.len() > MAX_PANELS {
            return Err(ConfigError::Invalid(format!(
                "at most {MAX_PANELS} panels are supported, found {}",
                self.panels.len()
            )));
        }

        for (index, panel) in self.panels.iter().enumerate() {
            if panel.width <= 0.0 || panel.height <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "panel {index} must have a positive width and height"
                )));
            }
            let inside = |v: f32| (0.0..=1.0).contains(&v);
            if !inside(panel.x)
                || !inside(panel.y)
                || !inside(panel.x + panel.width)
                || !inside(panel.y + panel.height)
            {
                return Err(ConfigError::Invalid(format!(
                    "panel {index} must lie within the unit square"
                )));
            }
            if panel.color.iter().any(|c| !inside(*c)) {
                return Err(ConfigError::Invalid(format!(
                    "panel {index} color components must be in [0, 1]"
                )));
            }
        }

        Ok(())
    }
}
