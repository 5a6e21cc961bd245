//! Ray-marching kernels and their render entry points.
//!
//! Every entry point takes an optional [`ScreenBuffer`]; when none is given a buffer is
//! created from the [`Camera`]. The buffer is returned so several draws can be chained into
//! one image, each testing against the depth left by the previous ones.
//!
//! The `*_into` variants draw into a borrowed buffer instead. They validate every input before
//! touching a pixel, so a failed draw keeps whatever the buffer already holds.
//!
//! Typical usage:
//! - [`render_volume`], [`render_contour`], [`render_geometry`] for single draws
//! - [`DrawList`] for an explicit ordered sequence of draws on one buffer

pub mod camera;
pub mod color;
pub mod contour;
pub mod draw;
pub mod events;
pub mod geometry;
pub mod volume;

use glam::Vec3;

pub use camera::{Camera, Ray};
pub use color::{scalar_to_color, Colormap};
pub use contour::{render_contour, render_contour_into, ContourOptions, GradientMode};
pub use draw::{Draw, DrawList};
pub use events::{EventSink, FnSink, RenderEvent, RenderEventKind, VecSink};
pub use geometry::{
    render_geometry, render_geometry_cached, render_geometry_cached_into, render_geometry_into,
};
pub use volume::{render_volume, render_volume_into, VolumeOptions};

use crate::error::{Error, Result};
use crate::screen::ScreenBuffer;

/// Validates the camera and checks that `buffer` matches its resolution.
pub(crate) fn check_buffer(camera: &Camera, buffer: &ScreenBuffer) -> Result<()> {
    camera.validate()?;
    if buffer.height() != camera.height || buffer.width() != camera.width {
        return Err(Error::InvalidConfig(format!(
            "screen buffer is {}x{} but the camera renders {}x{}",
            buffer.height(),
            buffer.width(),
            camera.height,
            camera.width
        )));
    }
    Ok(())
}

/// Validates the camera and returns the buffer to draw into.
pub(crate) fn prepare_buffer(camera: &Camera, buffer: Option<ScreenBuffer>) -> Result<ScreenBuffer> {
    match buffer {
        Some(buffer) => {
            check_buffer(camera, &buffer)?;
            Ok(buffer)
        }
        None => {
            camera.validate()?;
            ScreenBuffer::from_camera(camera)
        }
    }
}

/// Unit normal and view-facing intensity `|n · d|` for a raw gradient.
///
/// A zero gradient gives a zero normal and zero intensity.
#[inline]
pub(crate) fn shade(gradient: Vec3, direction: Vec3) -> (Vec3, f32) {
    let normal = gradient.normalize_or_zero();
    (normal, normal.dot(direction).abs())
}
