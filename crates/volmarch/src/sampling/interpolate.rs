//! Trilinear interpolation and gradient estimation over an [`Array3`] placed in world space.
use glam::Vec3;

use crate::sampling::Array3;

/// Value at `(i, j, k)` with each index clamped independently to `[0, dim - 1]`.
#[inline]
pub fn clamp_index(array: &Array3, i: isize, j: isize, k: isize) -> f32 {
    let [nx, ny, nz] = array.shape();
    let clamp = |v: isize, n: usize| v.clamp(0, n as isize - 1) as usize;
    array.get(clamp(i, nx), clamp(j, ny), clamp(k, nz))
}

/// Integer cell of a floored grid coordinate, clamped to `[-1, dim]` per axis.
///
/// Anything beyond one cell outside the grid samples the same border values, so clamping
/// first keeps far positions from overflowing the index arithmetic.
#[inline]
fn cell_index(array: &Array3, base: Vec3) -> (isize, isize, isize) {
    let [nx, ny, nz] = array.shape();
    let cell = |v: f32, n: usize| v.clamp(-1.0, n as f32) as isize;
    (cell(base.x, nx), cell(base.y, ny), cell(base.z, nz))
}

/// Blends eight corner values with fractional offsets `d`.
///
/// Corners are ordered `v000, v100, v010, v110, v001, v101, v011, v111` where the digits are
/// the x, y, z offsets.
#[inline]
pub fn trilinear(v: [f32; 8], d: Vec3) -> f32 {
    let v00 = v[0] * (1.0 - d.x) + v[1] * d.x;
    let v10 = v[2] * (1.0 - d.x) + v[3] * d.x;
    let v01 = v[4] * (1.0 - d.x) + v[5] * d.x;
    let v11 = v[6] * (1.0 - d.x) + v[7] * d.x;
    let v0 = v00 * (1.0 - d.y) + v10 * d.y;
    let v1 = v01 * (1.0 - d.y) + v11 * d.y;
    v0 * (1.0 - d.z) + v1 * d.z
}

/// Samples `array` at a world `position` by trilinear interpolation.
///
/// Out-of-grid corners are handled by [`clamp_index`]. NaN inputs propagate.
#[inline]
pub fn sample_trilinear(array: &Array3, spacing: Vec3, origin: Vec3, position: Vec3) -> f32 {
    let grid = (position - origin) / spacing;
    let base = grid.floor();
    let d = grid - base;
    let (i, j, k) = cell_index(array, base);

    trilinear(
        [
            clamp_index(array, i, j, k),
            clamp_index(array, i + 1, j, k),
            clamp_index(array, i, j + 1, k),
            clamp_index(array, i + 1, j + 1, k),
            clamp_index(array, i, j, k + 1),
            clamp_index(array, i + 1, j, k + 1),
            clamp_index(array, i, j + 1, k + 1),
            clamp_index(array, i + 1, j + 1, k + 1),
        ],
        d,
    )
}

/// Gradient by central differences of the interpolated field at half-voxel offsets.
///
/// Continuous wherever the interpolant is, including near the grid boundary.
pub fn sample_gradient(array: &Array3, spacing: Vec3, origin: Vec3, position: Vec3) -> Vec3 {
    let sample = |p: Vec3| sample_trilinear(array, spacing, origin, p);
    let half = spacing * 0.5;

    let dx = sample(position + Vec3::X * half.x) - sample(position - Vec3::X * half.x);
    let dy = sample(position + Vec3::Y * half.y) - sample(position - Vec3::Y * half.y);
    let dz = sample(position + Vec3::Z * half.z) - sample(position - Vec3::Z * half.z);

    Vec3::new(dx, dy, dz) / spacing
}

/// Gradient from the raw grid neighbors of the cell containing `position`.
///
/// When the cell index is the first or last along an axis the unit outward normal of that face
/// is returned instead (checked x, then y, then z). Not continuous at the boundary.
pub fn sample_gradient_grid(array: &Array3, spacing: Vec3, origin: Vec3, position: Vec3) -> Vec3 {
    let (i, j, k) = cell_index(array, ((position - origin) / spacing).floor());
    let [nx, ny, nz] = array.shape().map(|n| n as isize);

    if i <= 0 {
        return Vec3::NEG_X;
    } else if i >= nx - 1 {
        return Vec3::X;
    } else if j <= 0 {
        return Vec3::NEG_Y;
    } else if j >= ny - 1 {
        return Vec3::Y;
    } else if k <= 0 {
        return Vec3::NEG_Z;
    } else if k >= nz - 1 {
        return Vec3::Z;
    }

    let (i, j, k) = (i as usize, j as usize, k as usize);
    Vec3::new(
        array.get(i + 1, j, k) - array.get(i - 1, j, k),
        array.get(i, j + 1, k) - array.get(i, j - 1, k),
        array.get(i, j, k + 1) - array.get(i, j, k - 1),
    ) / (2.0 * spacing)
}
