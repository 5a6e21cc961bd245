//! Direct volume rendering of a scalar field.
//!
//! The field is always treated as transparent: every step inside the volume box contributes
//! one weighted fragment, scaled by the step length.
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::render::camera::Camera;
use crate::render::color::Colormap;
use crate::render::{check_buffer, prepare_buffer};
use crate::sampling::{ray_intersect_box, Volume};
use crate::screen::{wboit_weight, ScreenBuffer};

/// Per-draw options of [`render_volume`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VolumeOptions {
    /// Colormap for the samples. Defaults to jet over the volume's finite range.
    pub colormap: Option<Colormap>,
    /// Marching step. Defaults to the smallest voxel edge.
    pub step_size: Option<f32>,
}

impl VolumeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = Some(colormap);
        self
    }

    pub fn with_step_size(mut self, step_size: f32) -> Self {
        self.step_size = Some(step_size);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(step) = self.step_size {
            if !(step.is_finite() && step > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "step size must be positive, got {step}"
                )));
            }
        }
        Ok(())
    }
}

/// Jet over the finite range of `volume`, the default colormap of scalar draws.
pub(crate) fn default_colormap(volume: &Volume) -> Result<Colormap> {
    match volume.min_max() {
        Some((lo, hi)) => {
            if lo == hi {
                warn!("Scalar field is constant ({}); colormap range is empty.", lo);
            }
            Colormap::jet(lo, hi)
        }
        None => {
            warn!("Scalar field has no finite samples; using colormap range [0, 1].");
            Colormap::jet(0.0, 1.0)
        }
    }
}

/// Renders `volume` into `buffer` (or a new buffer sized to `camera`).
pub fn render_volume(
    volume: &Volume,
    camera: &Camera,
    options: &VolumeOptions,
    buffer: Option<ScreenBuffer>,
) -> Result<ScreenBuffer> {
    options.validate()?;
    let mut buffer = prepare_buffer(camera, buffer)?;
    render_volume_into(volume, camera, options, &mut buffer)?;
    Ok(buffer)
}

/// Renders `volume` into an existing buffer.
///
/// All inputs are validated before the first pixel is touched, so on error `buffer` is
/// unchanged.
pub fn render_volume_into(
    volume: &Volume,
    camera: &Camera,
    options: &VolumeOptions,
    buffer: &mut ScreenBuffer,
) -> Result<()> {
    options.validate()?;
    check_buffer(camera, buffer)?;
    let colormap = match &options.colormap {
        Some(colormap) => colormap.clone(),
        None => default_colormap(volume)?,
    };
    let step_size = options.step_size.unwrap_or_else(|| volume.min_spacing());

    debug!(
        "Volume kernel: {}x{} pixels, shape {:?}, step {}.",
        buffer.width(),
        buffer.height(),
        volume.shape(),
        step_size
    );
    volume_kernel(volume, camera, &colormap, step_size, buffer);
    Ok(())
}

pub(crate) fn volume_kernel(
    volume: &Volume,
    camera: &Camera,
    colormap: &Colormap,
    step_size: f32,
    buffer: &mut ScreenBuffer,
) {
    let (lower, upper) = volume.bounds();
    let max_depth = camera.max_depth;

    buffer.for_each_pixel_mut(|x, y, mut pixel| {
        let mut ray = camera.ray(x, y);
        let (t0, t1) = ray_intersect_box(lower, upper, ray.origin, ray.direction);
        if t0 > t1 {
            return;
        }
        ray.seek(t0);

        let steps = ((t1 - t0) / step_size) as usize;
        for _ in 0..steps {
            if ray.distance > pixel.depth() {
                break;
            }
            let color = colormap.color(volume.sample(ray.position));
            let weight = wboit_weight(ray.distance, max_depth);
            pixel.accumulate_transparent(color, weight, step_size, step_size);
            ray.advance(step_size);
        }
    });
}
