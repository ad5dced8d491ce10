use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use crate::controller::{Axis, ResumeMode};
use crate::model::TorusParameters;

/// Element ids the web host looks up on the hosting page
#[derive(Debug, Clone, PartialEq)]
pub struct PageBindings {
    pub canvas: &'static str,
    /// `<img>` used as the donut texture when present
    pub texture_image: &'static str,
    pub sliders: [(Axis, &'static str); 3],
    /// Tried in order; the first element found is bound
    pub play_buttons: &'static [&'static str],
}

impl Default for PageBindings {
    fn default() -> Self {
        Self {
            canvas: "game-surface",
            texture_image: "dougnut",
            sliders: [(Axis::X, "x-slider"), (Axis::Y, "y-slider"), (Axis::Z, "z-slider")],
            play_buttons: &["playbutton", "play-button"],
        }
    }
}

/// Runtime configuration. Every field has a default; `from_env` overrides
/// the ones set through `DONUT_*` environment variables.
#[derive(Debug, Clone)]
pub struct DonutConfig {
    pub torus: TorusParameters,
    /// Seconds per full revolution
    pub rotation_period: f64,
    pub resume_mode: ResumeMode,
    /// Image to map onto the donut; a painted texture is used when unset
    pub texture_path: Option<PathBuf>,
    pub slider_range: RangeInclusive<f32>,
    pub toggle_key: String,
    pub clear_color: wgpu::Color,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub page: PageBindings,
}

impl Default for DonutConfig {
    fn default() -> Self {
        Self {
            torus: TorusParameters::default(),
            rotation_period: 6.0,
            resume_mode: ResumeMode::WallClock,
            texture_path: None,
            slider_range: -5.0..=5.0,
            toggle_key: "a".to_string(),
            clear_color: wgpu::Color { r: 0.75, g: 0.85, b: 0.8, a: 1.0 },
            width: 800,
            height: 600,
            title: "Donut".to_string(),
            page: PageBindings::default(),
        }
    }
}

impl DonutConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Malformed values are
    /// logged and replaced by the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let torus = TorusParameters {
            rings: parse_or(&lookup, "DONUT_RINGS", defaults.torus.rings),
            sides: parse_or(&lookup, "DONUT_SIDES", defaults.torus.sides),
            donut_radius: parse_or(&lookup, "DONUT_RADIUS", defaults.torus.donut_radius),
            tube_radius: parse_or(&lookup, "DONUT_TUBE_RADIUS", defaults.torus.tube_radius),
        };

        let mut rotation_period = parse_or(&lookup, "DONUT_PERIOD", defaults.rotation_period);
        if !(rotation_period.is_finite() && rotation_period > 0.0) {
            tracing::warn!(rotation_period, "DONUT_PERIOD must be positive, using default");
            rotation_period = defaults.rotation_period;
        }

        Self {
            torus,
            rotation_period,
            resume_mode: parse_or(&lookup, "DONUT_RESUME", defaults.resume_mode),
            texture_path: lookup("DONUT_TEXTURE").filter(|p| !p.is_empty()).map(PathBuf::from),
            ..defaults
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "ignoring malformed value");
                default
            }
        },
    }
}
