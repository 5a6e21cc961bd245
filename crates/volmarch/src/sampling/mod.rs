//! Sampling utilities over regular 3D grids.
//!
//! Pure functions: clamped indexing, trilinear interpolation, two gradient estimators and the
//! ray/box slab test. [`Array3`] and [`Volume`] hold the data these functions read.
pub mod array;
pub mod interpolate;
pub mod intersect;

pub use array::{Array3, Volume};
pub use interpolate::{
    clamp_index, sample_gradient, sample_gradient_grid, sample_trilinear, trilinear,
};
pub use intersect::ray_intersect_box;
