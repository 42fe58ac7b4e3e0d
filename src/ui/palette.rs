// src/ui/palette.rs
//! Colour ramps for map layers.
//!
//! A palette is a list of colour names or hex codes spread evenly over
//! `[min, max]` and interpolated linearly between neighbours.

use crate::error::{EeiError, Result};
use crate::raster::{is_nodata, Raster};

use super::widgets::VisParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("black", Rgb::new(0, 0, 0)),
    ("white", Rgb::new(255, 255, 255)),
    ("red", Rgb::new(255, 0, 0)),
    ("green", Rgb::new(0, 128, 0)),
    ("lime", Rgb::new(0, 255, 0)),
    ("blue", Rgb::new(0, 0, 255)),
    ("yellow", Rgb::new(255, 255, 0)),
    ("cyan", Rgb::new(0, 255, 255)),
    ("magenta", Rgb::new(255, 0, 255)),
    ("orange", Rgb::new(255, 165, 0)),
    ("purple", Rgb::new(128, 0, 128)),
    ("brown", Rgb::new(165, 42, 42)),
    ("gray", Rgb::new(128, 128, 128)),
    ("grey", Rgb::new(128, 128, 128)),
];

/// Parse a CSS colour name or a `RRGGBB` / `#RRGGBB` hex code
pub fn parse_color(spec: &str) -> Result<Rgb> {
    let lowered = spec.trim().to_ascii_lowercase();
    if let Some((_, rgb)) = NAMED_COLORS.iter().find(|(name, _)| *name == lowered) {
        return Ok(*rgb);
    }

    let hex = lowered.trim_start_matches('#');
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    if hex.len() == 6 && hex.is_ascii() {
        if let (Some(r), Some(g), Some(b)) = (channel(0), channel(2), channel(4)) {
            return Ok(Rgb::new(r, g, b));
        }
    }

    Err(EeiError::ConfigInvalid {
        key: "palette".to_string(),
        reason: format!("unknown colour {spec:?}"),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn from_names(names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Err(EeiError::ConfigInvalid {
                key: "palette".to_string(),
                reason: "palette needs at least one colour".to_string(),
            });
        }
        let colors = names
            .iter()
            .map(|name| parse_color(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { colors })
    }

    /// Colour at normalized position `t`, clamped to `[0, 1]`
    pub fn evaluate(&self, t: f64) -> Rgb {
        let last = self.colors.len() - 1;
        if last == 0 || t <= 0.0 || t.is_nan() {
            return self.colors[0];
        }
        if t >= 1.0 {
            return self.colors[last];
        }

        let position = t * last as f64;
        let index = position.floor() as usize;
        let ratio = position - index as f64;
        let (a, b) = (self.colors[index], self.colors[index + 1]);
        let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * ratio).round() as u8;

        Rgb::new(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b))
    }
}

/// Colour a raster into row-major RGBA; NoData is fully transparent
pub fn raster_to_rgba(raster: &Raster, vis: &VisParams) -> Result<Vec<u8>> {
    let palette = Palette::from_names(&vis.palette)?;
    let range = vis.max - vis.min;
    let inv_range = if range.abs() > f64::EPSILON { 1.0 / range } else { 1.0 };

    let mut rgba = vec![0u8; raster.data().len() * 4];
    for (pixel, &value) in rgba.chunks_exact_mut(4).zip(raster.data()) {
        if is_nodata(value) {
            continue;
        }
        let Rgb { r, g, b } = palette.evaluate((value as f64 - vis.min) * inv_range);
        pixel.copy_from_slice(&[r, g, b, 255]);
    }
    Ok(rgba)
}
