//! Sphere tracing of signed distance geometry.
//!
//! The kernel is generic over [`DistanceField`], so the tree-walking [`Geometry`] and a
//! cached [`CompiledKernel`] each get their own specialized march loop.
use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::{DistanceField, Geometry, KernelCache};
use crate::render::camera::Camera;
use crate::render::color::Colormap;
use crate::render::{check_buffer, prepare_buffer, shade};
use crate::screen::{wboit_weight, ScreenBuffer};

fn default_color() -> Colormap {
    Colormap::solid([1.0, 1.0, 1.0], 1.0)
}

/// Renders `geometry` with a solid `color` (default opaque white).
///
/// Only the first row of the colormap is used. The march starts at the camera and is bounded
/// by `camera.max_depth`; the geometry's bounding box is not consulted.
pub fn render_geometry(
    geometry: &Geometry,
    camera: &Camera,
    color: Option<&Colormap>,
    buffer: Option<ScreenBuffer>,
) -> Result<ScreenBuffer> {
    let mut buffer = prepare_buffer(camera, buffer)?;
    render_geometry_into(geometry, camera, color, &mut buffer)?;
    Ok(buffer)
}

/// Renders `geometry` into an existing buffer, which is left unchanged on error.
pub fn render_geometry_into(
    geometry: &Geometry,
    camera: &Camera,
    color: Option<&Colormap>,
    buffer: &mut ScreenBuffer,
) -> Result<()> {
    check_buffer(camera, buffer)?;
    let fallback;
    let color = match color {
        Some(color) => color,
        None => {
            fallback = default_color();
            &fallback
        }
    };
    warn_rotated_bounds(geometry);

    debug!(
        "Geometry kernel: {}x{} pixels, {} primitives, opaque {}.",
        buffer.width(),
        buffer.height(),
        geometry.node().primitive_count(),
        color.opaque
    );
    geometry_kernel(geometry, geometry.distance_threshold(), camera, color, buffer);
    Ok(())
}

/// Like [`render_geometry`], but evaluates a compiled program taken from `cache`.
pub fn render_geometry_cached(
    geometry: &Geometry,
    camera: &Camera,
    color: Option<&Colormap>,
    cache: &mut KernelCache,
    buffer: Option<ScreenBuffer>,
) -> Result<ScreenBuffer> {
    let mut buffer = prepare_buffer(camera, buffer)?;
    render_geometry_cached_into(geometry, camera, color, cache, &mut buffer)?;
    Ok(buffer)
}

/// Like [`render_geometry_into`], but evaluates a compiled program taken from `cache`.
///
/// The program is compiled before any pixel is written, so a compile error leaves `buffer`
/// unchanged.
pub fn render_geometry_cached_into(
    geometry: &Geometry,
    camera: &Camera,
    color: Option<&Colormap>,
    cache: &mut KernelCache,
    buffer: &mut ScreenBuffer,
) -> Result<()> {
    check_buffer(camera, buffer)?;
    let fallback;
    let color = match color {
        Some(color) => color,
        None => {
            fallback = default_color();
            &fallback
        }
    };
    let kernel = cache.get_or_compile(geometry, color.opaque)?;
    warn_rotated_bounds(geometry);

    debug!(
        "Compiled geometry kernel: {}x{} pixels, {} instructions, opaque {}.",
        buffer.width(),
        buffer.height(),
        kernel.program().instrs().len(),
        kernel.opaque()
    );
    geometry_kernel(&*kernel, geometry.distance_threshold(), camera, color, buffer);
    Ok(())
}

fn warn_rotated_bounds(geometry: &Geometry) {
    if geometry.node().has_rotation() {
        warn!("Geometry contains a rotation; its bounding box may not enclose the shape.");
    }
}

pub(crate) fn geometry_kernel<F: DistanceField>(
    field: &F,
    distance_threshold: f32,
    camera: &Camera,
    color: &Colormap,
    buffer: &mut ScreenBuffer,
) {
    let rgba = color.first();
    let rgb = rgba.truncate();
    let opaque = color.opaque;
    let max_depth = camera.max_depth;

    buffer.for_each_pixel_mut(|x, y, mut pixel| {
        let mut ray = camera.ray(x, y);

        while ray.distance < max_depth {
            let step = field.distance(ray.position).abs();
            ray.advance(step);
            if ray.distance > pixel.depth() {
                return;
            }
            if step >= distance_threshold {
                continue;
            }

            let (normal, intensity) = shade(field.gradient(ray.position), ray.direction);
            if opaque {
                pixel.write_opaque(rgb * intensity, ray.distance, normal);
                return;
            }
            let weight = wboit_weight(ray.distance, max_depth);
            pixel.accumulate_transparent(rgba, weight, intensity, 1.0);

            // Walk through the surface band before resuming sphere tracing.
            let mut inside = step;
            while inside < distance_threshold && ray.distance < max_depth {
                ray.advance(distance_threshold);
                inside = field.distance(ray.position).abs();
            }
        }
    });
}
