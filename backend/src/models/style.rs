//! Visualization styles: value range plus an ordered color ramp.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// RGB color with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = PipelineError;

    /// Parses `#RRGGBB`, `RRGGBB` or one of the CSS color names used by the
    /// map palettes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(named) = named_color(&s.to_ascii_lowercase()) {
            return Ok(named);
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(PipelineError::InvalidStyle(format!("unknown color '{}'", s)));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| PipelineError::InvalidStyle(format!("unknown color '{}'", s)))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "black" => Rgb::new(0, 0, 0),
        "white" => Rgb::new(255, 255, 255),
        "red" => RED,
        "orange" => Rgb::new(255, 165, 0),
        "yellow" => YELLOW,
        "lime" => Rgb::new(0, 255, 0),
        "green" => GREEN,
        "darkgreen" => DARK_GREEN,
        "brown" => BROWN,
        "blue" => Rgb::new(0, 0, 255),
        _ => return None,
    };
    Some(rgb)
}

/// Serialized form of a [`VisualizationStyle`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSpec {
    pub min: f64,
    pub max: f64,
    pub palette: Vec<String>,
}

/// Maps single-band values to colors.
///
/// Values at or below `min` take the first palette color, values at or above
/// `max` the last; in between, colors are interpolated linearly between
/// evenly spaced stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StyleSpec", into = "StyleSpec")]
pub struct VisualizationStyle {
    min: f64,
    max: f64,
    palette: Vec<Rgb>,
}

impl VisualizationStyle {
    pub fn new(min: f64, max: f64, palette: Vec<Rgb>) -> Result<Self, PipelineError> {
        if !(min.is_finite() && max.is_finite()) || min >= max {
            return Err(PipelineError::InvalidStyle(format!(
                "range must satisfy min < max, got [{}, {}]",
                min, max
            )));
        }
        if palette.is_empty() {
            return Err(PipelineError::InvalidStyle("palette is empty".to_string()));
        }
        Ok(Self { min, max, palette })
    }

    fn from_names(min: f64, max: f64, names: &[&str]) -> Result<Self, PipelineError> {
        let palette = names
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<Rgb>, _>>()?;
        Self::new(min, max, palette)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn palette(&self) -> &[Rgb] {
        &self.palette
    }

    /// Color for a valid (non no-data) value.
    pub fn color_at(&self, value: f64) -> Rgb {
        let last = self.palette.len() - 1;
        let t = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        if last == 0 || t.is_nan() {
            return self.palette[0];
        }
        let pos = t * last as f64;
        let lower = (pos.floor() as usize).min(last - 1);
        self.palette[lower].lerp(self.palette[lower + 1], pos - lower as f64)
    }

    /// NDVI ramp of the plain map endpoint.
    pub fn ndvi() -> Self {
        Self::preset(0.2, 0.8, &[BROWN, YELLOW, GREEN])
    }

    /// NDRE ramp of the plain map endpoint.
    pub fn ndre() -> Self {
        Self::preset(0.1, 0.5, &[RED, YELLOW, DARK_GREEN])
    }

    /// Vegetation vigor ramp used on the agricultural map.
    pub fn ndvi_vigor() -> Self {
        Self::preset(0.2, 0.8, &VIGOR_RAMP)
    }

    /// Red (stress) to green (healthy) ramp used on the agricultural map.
    pub fn ndre_health() -> Self {
        Self::preset(
            0.1,
            0.5,
            &[
                RED,
                Rgb::new(0xFF, 0xA5, 0x00),
                YELLOW,
                Rgb::new(0x00, 0xFF, 0x00),
                GREEN,
            ],
        )
    }

    fn preset(min: f64, max: f64, palette: &[Rgb]) -> Self {
        Self {
            min,
            max,
            palette: palette.to_vec(),
        }
    }
}

const RED: Rgb = Rgb::new(255, 0, 0);
const YELLOW: Rgb = Rgb::new(255, 255, 0);
const GREEN: Rgb = Rgb::new(0, 128, 0);
const DARK_GREEN: Rgb = Rgb::new(0, 100, 0);
const BROWN: Rgb = Rgb::new(165, 42, 42);

const VIGOR_RAMP: [Rgb; 16] = [
    Rgb::new(0xCE, 0x7E, 0x45),
    Rgb::new(0xDF, 0x92, 0x3D),
    Rgb::new(0xF1, 0xB5, 0x55),
    Rgb::new(0xFC, 0xD1, 0x63),
    Rgb::new(0x99, 0xB7, 0x18),
    Rgb::new(0x74, 0xA9, 0x01),
    Rgb::new(0x66, 0xA0, 0x00),
    Rgb::new(0x52, 0x94, 0x00),
    Rgb::new(0x3E, 0x86, 0x01),
    Rgb::new(0x20, 0x74, 0x01),
    Rgb::new(0x05, 0x62, 0x01),
    Rgb::new(0x00, 0x4C, 0x00),
    Rgb::new(0x02, 0x3B, 0x01),
    Rgb::new(0x01, 0x2E, 0x01),
    Rgb::new(0x01, 0x1D, 0x01),
    Rgb::new(0x01, 0x13, 0x01),
];

impl TryFrom<StyleSpec> for VisualizationStyle {
    type Error = PipelineError;

    fn try_from(spec: StyleSpec) -> Result<Self, Self::Error> {
        let names: Vec<&str> = spec.palette.iter().map(String::as_str).collect();
        Self::from_names(spec.min, spec.max, &names)
    }
}

impl From<VisualizationStyle> for StyleSpec {
    fn from(style: VisualizationStyle) -> Self {
        Self {
            min: style.min,
            max: style.max,
            palette: style.palette.iter().map(Rgb::to_string).collect(),
        }
    }
}
