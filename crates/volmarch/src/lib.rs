#![forbid(unsafe_code)]
//! volmarch: CPU-parallel ray marching of scalar volumes, isosurfaces and signed distance
//! geometry, composited with weighted blended order-independent transparency.
//!
//! Modules:
//! - screen: per-pixel opaque and transparency buffers, compositing into an image
//! - sampling: dense grids, trilinear sampling, gradients, ray/box intersection
//! - geometry: SDF primitives, boolean and affine combinators, compiled programs and caching
//! - render: camera, colormaps, the volume, contour and geometry kernels, ordered draw lists
pub mod error;
pub mod geometry;
pub mod render;
pub mod sampling;
pub mod screen;

/// Convenient re-exports for common types. Import with `use volmarch::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{
        CompileOptions, CompiledKernel, DistanceField, Geometry, KernelCache, SdfCompiler,
        SdfNode, SdfProgram,
    };
    pub use crate::render::{
        render_contour, render_contour_into, render_geometry, render_geometry_cached,
        render_geometry_cached_into, render_geometry_into, render_volume, render_volume_into,
        Camera, Colormap, ContourOptions, Draw, DrawList, EventSink, FnSink, GradientMode,
        RenderEvent, RenderEventKind, VecSink, VolumeOptions,
    };
    pub use crate::sampling::{Array3, Volume};
    pub use crate::screen::{Image, ScreenBuffer};
}
