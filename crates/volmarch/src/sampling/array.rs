//! Dense scalar grids and the volume data source.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::Vec3;

use crate::error::{Error, Result};
use crate::sampling::interpolate::{sample_gradient, sample_gradient_grid, sample_trilinear};

/// Dense C-order 3D array of `f32`, indexed as `array[i, j, k]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Array3 {
    data: Vec<f32>,
    shape: [usize; 3],
}

/// Number of elements of a grid with `shape`.
///
/// Fails when an axis is empty or the product does not fit in `usize`.
fn element_count(shape: [usize; 3]) -> Result<usize> {
    if shape.contains(&0) {
        return Err(Error::InvalidVolume(format!(
            "every axis must be non-empty, got shape {shape:?}"
        )));
    }
    shape
        .iter()
        .try_fold(1usize, |acc, n| acc.checked_mul(*n))
        .ok_or_else(|| Error::InvalidVolume(format!("shape {shape:?} is too large")))
}

impl Array3 {
    /// Wraps `data` with the given shape.
    ///
    /// Fails when an axis is empty or the data length does not match the shape.
    pub fn new(data: Vec<f32>, shape: [usize; 3]) -> Result<Self> {
        let expected = element_count(shape)?;
        if data.len() != expected {
            return Err(Error::InvalidVolume(format!(
                "shape {shape:?} needs {expected} values but {} were given",
                data.len()
            )));
        }
        Ok(Self { data, shape })
    }

    /// Array of zeros.
    pub fn zeros(shape: [usize; 3]) -> Result<Self> {
        Self::new(vec![0.0; element_count(shape)?], shape)
    }

    /// Builds an array by evaluating `f(i, j, k)` for every index.
    pub fn from_fn<F>(shape: [usize; 3], mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize, usize) -> f32,
    {
        let mut data = Vec::with_capacity(element_count(shape)?);
        for i in 0..shape[0] {
            for j in 0..shape[1] {
                for k in 0..shape[2] {
                    data.push(f(i, j, k));
                }
            }
        }
        Self::new(data, shape)
    }

    /// Adapts little-endian raw bytes of element type `dtype` into an `f32` array.
    ///
    /// Accepted element types: `f32`, `f64`, `u8`, `u16`, `u32`, `i16`, `i32`. Anything else is
    /// rejected with [`Error::UnsupportedInput`], as is a byte length that does not divide
    /// into whole elements.
    pub fn from_le_bytes(bytes: &[u8], dtype: &str, shape: [usize; 3]) -> Result<Self> {
        fn convert<const N: usize>(bytes: &[u8], f: impl Fn([u8; N]) -> f32) -> Vec<f32> {
            bytes
                .chunks_exact(N)
                .map(|chunk| {
                    let mut raw = [0u8; N];
                    raw.copy_from_slice(chunk);
                    f(raw)
                })
                .collect()
        }

        let width = match dtype {
            "f32" | "u32" | "i32" => 4,
            "f64" => 8,
            "u16" | "i16" => 2,
            "u8" => 1,
            other => {
                return Err(Error::UnsupportedInput(format!(
                    "element type '{other}' cannot be adapted to f32"
                )))
            }
        };
        if bytes.len() % width != 0 {
            return Err(Error::UnsupportedInput(format!(
                "{} bytes is not a whole number of '{dtype}' elements",
                bytes.len()
            )));
        }

        let data = match dtype {
            "f32" => convert::<4>(bytes, f32::from_le_bytes),
            "u32" => convert::<4>(bytes, |b| u32::from_le_bytes(b) as f32),
            "i32" => convert::<4>(bytes, |b| i32::from_le_bytes(b) as f32),
            "f64" => convert::<8>(bytes, |b| f64::from_le_bytes(b) as f32),
            "u16" => convert::<2>(bytes, |b| u16::from_le_bytes(b) as f32),
            "i16" => convert::<2>(bytes, |b| i16::from_le_bytes(b) as f32),
            _ => bytes.iter().map(|b| *b as f32).collect(),
        };
        Self::new(data, shape)
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at an in-bounds index. Panics outside the grid.
    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f32 {
        let [_, ny, nz] = self.shape;
        self.data[(i * ny + j) * nz + k]
    }

    /// Smallest and largest finite values, or `None` if the array holds no finite value.
    pub fn finite_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// A dense scalar field placed in world space.
///
/// `origin` is the world position of index `(0, 0, 0)` and `spacing` the voxel size per axis.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    pub array: Array3,
    pub spacing: Vec3,
    pub origin: Vec3,
}

impl Volume {
    /// Creates a volume, rejecting non-positive or non-finite spacing.
    pub fn new(
        array: Array3,
        spacing: impl Into<mint::Vector3<f32>>,
        origin: impl Into<mint::Vector3<f32>>,
    ) -> Result<Self> {
        let spacing = Vec3::from(spacing.into());
        let origin = Vec3::from(origin.into());
        if !spacing.is_finite() || spacing.min_element() <= 0.0 {
            return Err(Error::InvalidVolume(format!(
                "spacing must be positive and finite, got {spacing}"
            )));
        }
        if !origin.is_finite() {
            return Err(Error::InvalidVolume(format!(
                "origin must be finite, got {origin}"
            )));
        }
        Ok(Self {
            array,
            spacing,
            origin,
        })
    }

    /// Volume with unit spacing at the world origin.
    pub fn from_array(array: Array3) -> Self {
        Self {
            array,
            spacing: Vec3::ONE,
            origin: Vec3::ZERO,
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        self.array.shape()
    }

    /// World-space bounding box `(lower, upper)` with `upper = origin + spacing * shape`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let [nx, ny, nz] = self.shape();
        let extent = Vec3::new(nx as f32, ny as f32, nz as f32) * self.spacing;
        (self.origin, self.origin + extent)
    }

    /// Smallest voxel edge, the marching step of the grid kernels.
    pub fn min_spacing(&self) -> f32 {
        self.spacing.min_element()
    }

    /// Finite `(min, max)` of the samples, `None` when nothing is finite.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.array.finite_range()
    }

    /// Trilinear sample at a world position.
    #[inline]
    pub fn sample(&self, position: Vec3) -> f32 {
        sample_trilinear(&self.array, self.spacing, self.origin, position)
    }

    /// Gradient by central differences of the interpolated field.
    #[inline]
    pub fn gradient(&self, position: Vec3) -> Vec3 {
        sample_gradient(&self.array, self.spacing, self.origin, position)
    }

    /// Gradient from raw grid neighbors with boundary-normal fallback.
    #[inline]
    pub fn gradient_grid(&self, position: Vec3) -> Vec3 {
        sample_gradient_grid(&self.array, self.spacing, self.origin, position)
    }
}
