//! Colormap tables and scalar-to-color lookup.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::{Vec3, Vec4};

use crate::error::{Error, Result};

const TABLE_ROWS: usize = 256;

/// Maps `value` to a row of `table`.
///
/// The value is clamped to `[vmin, vmax]` and mapped linearly onto rows `0..table.len()`,
/// truncating to the lower row. A NaN value yields a NaN color so callers can substitute.
#[inline]
pub fn scalar_to_color(value: f32, table: &[[f32; 4]], vmin: f32, vmax: f32) -> Vec4 {
    if value.is_nan() || table.is_empty() {
        return Vec4::NAN;
    }
    let last = table.len() - 1;
    let value = value.max(vmin).min(vmax);
    let index = ((value - vmin) / (vmax - vmin) * last as f32) as usize;
    Vec4::from_array(table[index.min(last)])
}

/// Lookup table of RGBA rows with its scalar range and NaN fallback.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Colormap {
    /// RGBA rows, lowest value first.
    pub table: Vec<[f32; 4]>,
    pub vmin: f32,
    pub vmax: f32,
    /// Color used where the lookup produced NaN.
    pub nan_color: Vec3,
    /// Opacity used where the lookup produced NaN.
    pub nan_opacity: f32,
    /// Selects the opaque kernel branch.
    pub opaque: bool,
}

impl Colormap {
    /// Wraps an explicit table. The map is opaque when every row has alpha `>= 1`.
    pub fn new(table: Vec<[f32; 4]>, vmin: f32, vmax: f32) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::InvalidConfig("colormap table is empty".into()));
        }
        if vmin.is_nan() || vmax.is_nan() || vmin > vmax {
            return Err(Error::InvalidConfig(format!(
                "colormap range [{vmin}, {vmax}] is invalid"
            )));
        }
        let opaque = table.iter().all(|row| row[3] >= 1.0);
        Ok(Self {
            table,
            vmin,
            vmax,
            nan_color: Vec3::ZERO,
            nan_opacity: 0.0,
            opaque,
        })
    }

    /// Classic blue-cyan-yellow-red ramp.
    pub fn jet(vmin: f32, vmax: f32) -> Result<Self> {
        let ramp = |t: f32, center: f32| (1.5 - (4.0 * t - center).abs()).clamp(0.0, 1.0);
        Self::new(
            table_from_fn(|t| [ramp(t, 3.0), ramp(t, 2.0), ramp(t, 1.0), 1.0]),
            vmin,
            vmax,
        )
    }

    /// Black to white ramp.
    pub fn gray(vmin: f32, vmax: f32) -> Result<Self> {
        Self::new(table_from_fn(|t| [t, t, t, 1.0]), vmin, vmax)
    }

    /// Looks a colormap up by name (`"jet"`, `"gray"`/`"grey"`).
    pub fn named(name: &str, vmin: f32, vmax: f32) -> Result<Self> {
        match name {
            "jet" => Self::jet(vmin, vmax),
            "gray" | "grey" => Self::gray(vmin, vmax),
            other => Err(Error::InvalidConfig(format!("unknown colormap '{other}'"))),
        }
    }

    /// Single-row map painting everything one color.
    pub fn solid(rgb: impl Into<mint::Vector3<f32>>, opacity: f32) -> Self {
        let rgb = Vec3::from(rgb.into());
        Self {
            table: vec![rgb.extend(opacity).to_array()],
            vmin: 0.0,
            vmax: 1.0,
            nan_color: rgb,
            nan_opacity: opacity,
            opaque: opacity >= 1.0,
        }
    }

    /// Replaces every row's alpha and updates the opaque flag.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        for row in &mut self.table {
            row[3] = opacity;
        }
        self.opaque = opacity >= 1.0;
        self
    }

    /// Sets the NaN fallback color and opacity.
    pub fn with_nan(mut self, rgb: impl Into<mint::Vector3<f32>>, opacity: f32) -> Self {
        self.nan_color = Vec3::from(rgb.into());
        self.nan_opacity = opacity;
        self
    }

    /// Raw lookup; NaN in, NaN out.
    #[inline]
    pub fn lookup(&self, value: f32) -> Vec4 {
        scalar_to_color(value, &self.table, self.vmin, self.vmax)
    }

    /// Lookup with the NaN fallback substituted.
    #[inline]
    pub fn color(&self, value: f32) -> Vec4 {
        let color = self.lookup(value);
        if color.is_nan() {
            self.nan_color.extend(self.nan_opacity)
        } else {
            color
        }
    }

    /// First row, the color of a solid map.
    #[inline]
    pub fn first(&self) -> Vec4 {
        Vec4::from_array(self.table[0])
    }
}

fn table_from_fn(f: impl Fn(f32) -> [f32; 4]) -> Vec<[f32; 4]> {
    (0..TABLE_ROWS)
        .map(|i| f(i as f32 / (TABLE_ROWS - 1) as f32))
        .collect()
}
