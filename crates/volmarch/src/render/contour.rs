//! Isosurface rendering of a scalar field.
//!
//! The ray marches the volume box at the smallest voxel edge, watching the sign of
//! `value - threshold`. Each sign flip is a crossing, refined by linear interpolation between
//! the two straddling samples.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::render::camera::Camera;
use crate::render::color::Colormap;
use crate::render::volume::default_colormap;
use crate::render::{check_buffer, prepare_buffer, shade};
use crate::sampling::{ray_intersect_box, Volume};
use crate::screen::{wboit_weight, ScreenBuffer};

/// Gradient estimator used for contour normals.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GradientMode {
    /// Raw grid neighbors with outward face normals on the border voxels.
    #[default]
    Grid,
    /// Central differences of the interpolated field at half-voxel offsets.
    Interpolated,
}

/// Per-draw options of [`render_contour`].
#[derive(Clone, Debug, PartialEq)]
pub struct ContourOptions<'a> {
    /// Iso-value of the surface.
    pub threshold: f32,
    pub gradient: GradientMode,
    /// Field sampled at each crossing for color. Without one the surface is colored at `0`.
    pub color_field: Option<&'a Volume>,
    /// Defaults to solid white without a color field, jet over its range with one.
    pub colormap: Option<Colormap>,
}

impl<'a> ContourOptions<'a> {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            gradient: GradientMode::default(),
            color_field: None,
            colormap: None,
        }
    }

    pub fn with_gradient(mut self, gradient: GradientMode) -> Self {
        self.gradient = gradient;
        self
    }

    pub fn with_color_field(mut self, field: &'a Volume) -> Self {
        self.color_field = Some(field);
        self
    }

    pub fn with_colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = Some(colormap);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "contour threshold must be finite, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Colormap the draw will use.
    pub fn resolve_colormap(&self) -> Result<Colormap> {
        match (&self.colormap, self.color_field) {
            (Some(colormap), _) => Ok(colormap.clone()),
            (None, Some(field)) => default_colormap(field),
            (None, None) => Ok(Colormap::solid([1.0, 1.0, 1.0], 1.0)),
        }
    }
}

/// Renders the `options.threshold` isosurface of `volume`.
pub fn render_contour(
    volume: &Volume,
    camera: &Camera,
    options: &ContourOptions<'_>,
    buffer: Option<ScreenBuffer>,
) -> Result<ScreenBuffer> {
    options.validate()?;
    let mut buffer = prepare_buffer(camera, buffer)?;
    render_contour_into(volume, camera, options, &mut buffer)?;
    Ok(buffer)
}

/// Renders the isosurface into an existing buffer, which is left unchanged on error.
pub fn render_contour_into(
    volume: &Volume,
    camera: &Camera,
    options: &ContourOptions<'_>,
    buffer: &mut ScreenBuffer,
) -> Result<()> {
    options.validate()?;
    check_buffer(camera, buffer)?;
    let colormap = options.resolve_colormap()?;

    debug!(
        "Contour kernel: {}x{} pixels, shape {:?}, threshold {}, opaque {}.",
        buffer.width(),
        buffer.height(),
        volume.shape(),
        options.threshold,
        colormap.opaque
    );
    contour_kernel(volume, camera, options, &colormap, buffer);
    Ok(())
}

pub(crate) fn contour_kernel(
    volume: &Volume,
    camera: &Camera,
    options: &ContourOptions<'_>,
    colormap: &Colormap,
    buffer: &mut ScreenBuffer,
) {
    let (lower, upper) = volume.bounds();
    let step_size = volume.min_spacing();
    let threshold = options.threshold;
    let max_depth = camera.max_depth;
    let opaque = colormap.opaque;

    buffer.for_each_pixel_mut(|x, y, mut pixel| {
        let mut ray = camera.ray(x, y);
        let (t0, t1) = ray_intersect_box(lower, upper, ray.origin, ray.direction);
        if t0 > t1 {
            return;
        }
        ray.seek(t0);

        let mut value = volume.sample(ray.position);
        let mut sign = if value > threshold { 1.0 } else { -1.0 };

        let steps = ((t1 - t0) / step_size) as usize;
        for _ in 0..steps {
            if ray.distance > pixel.depth() {
                return;
            }

            let next_position = ray.position + ray.direction * step_size;
            let next_value = volume.sample(next_position);

            if (next_value - threshold) * sign < 0.0 {
                sign = -sign;

                let t = (threshold - value) / (next_value - value);
                let crossing = ray.position + ray.direction * (t * step_size);
                let depth = ray.distance + t * step_size;

                let gradient = match options.gradient {
                    GradientMode::Grid => volume.gradient_grid(crossing),
                    GradientMode::Interpolated => volume.gradient(crossing),
                };
                let (normal, intensity) = shade(gradient, ray.direction);

                let scalar = options.color_field.map_or(0.0, |field| field.sample(crossing));
                let color = colormap.color(scalar);

                if opaque {
                    pixel.write_opaque(color.truncate() * intensity, depth, normal);
                    return;
                }
                let weight = wboit_weight(depth, max_depth);
                pixel.accumulate_transparent(color, weight, intensity, 1.0);
            }

            value = next_value;
            ray.advance(step_size);
        }
    });
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::sampling::Array3;

    const N: usize = 64;
    const RADIUS: f32 = 16.0;

    /// `1` inside a sphere of radius 16 centered in a 64³ grid, `0` outside.
    fn sphere_volume() -> Volume {
        let c = N as f32 / 2.0;
        let array = Array3::from_fn([N, N, N], |i, j, k| {
            let p = Vec3::new(i as f32, j as f32, k as f32) - Vec3::splat(c);
            if p.length() <= RADIUS {
                1.0
            } else {
                0.0
            }
        })
        .unwrap();
        Volume::new(array, [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]).unwrap()
    }

    fn camera(distance: f32, size: usize) -> Camera {
        let c = N as f32 / 2.0;
        Camera::new([c, c, c - distance], [c, c, c], [0.0, 1.0, 0.0])
            .with_resolution(size, size)
            .with_max_depth(400.0)
    }

    #[test]
    fn sphere_silhouette_matches_projected_radius() {
        let volume = sphere_volume();
        let size = 128;
        let distance = 100.0;
        let buffer = render_contour(
            &volume,
            &camera(distance, size),
            &ContourOptions::new(0.5),
            None,
        )
        .unwrap();

        let hits = buffer
            .depth_buffer()
            .iter()
            .filter(|d| d.is_finite())
            .count();
        let measured = (hits as f32 / std::f32::consts::PI).sqrt();

        // Silhouette of a sphere seen from `distance`, with pixels of 1/h world units on the
        // image plane one unit ahead.
        let tangent = RADIUS / (distance * distance - RADIUS * RADIUS).sqrt();
        let expected = tangent * size as f32;
        // One voxel at the sphere's distance, in pixels.
        let voxel_px = size as f32 / (distance - RADIUS);
        assert!(
            (measured - expected).abs() <= voxel_px + 1.0,
            "measured radius {measured}, expected {expected}"
        );

        let mid = size / 2;
        assert!(buffer.depth(mid, mid).is_finite());
        assert!(buffer.depth(0, 0).is_infinite());
        assert!(buffer.depth(size - 1, size - 1).is_infinite());

        // Center depth is close to the near pole of the sphere.
        assert!((buffer.depth(mid, mid) - (distance - RADIUS)).abs() < 1.5);
        // Solid white facing the camera; the field increases towards +z there.
        assert!(buffer.opaque_color(mid, mid).x > 0.9);
        assert!(buffer.normal(mid, mid).z > 0.9);
    }

    #[test]
    fn both_gradient_modes_agree_away_from_borders() {
        let volume = sphere_volume();
        let cam = camera(100.0, 32);
        let grid = render_contour(&volume, &cam, &ContourOptions::new(0.5), None).unwrap();
        let smooth = render_contour(
            &volume,
            &cam,
            &ContourOptions::new(0.5).with_gradient(GradientMode::Interpolated),
            None,
        )
        .unwrap();

        assert_eq!(grid.depth(16, 16), smooth.depth(16, 16));
        assert!(grid.normal(16, 16).dot(smooth.normal(16, 16)) > 0.9);
    }

    #[test]
    fn transparent_contour_accumulates_front_and_back() {
        let volume = sphere_volume();
        let cam = camera(100.0, 16);
        let options = ContourOptions::new(0.5)
            .with_colormap(Colormap::solid([0.0, 1.0, 0.0], 0.5));
        let buffer = render_contour(&volume, &cam, &options, None).unwrap();

        // Two crossings through the center, each multiplying revealage by about 0.5.
        let r = buffer.revealage(8, 8);
        assert!(r < 0.35 && r > 0.2, "revealage {r}");
        assert!(buffer.transparent_accum(8, 8).y > 0.0);
        assert_eq!(buffer.depth(8, 8), f32::INFINITY);
    }

    #[test]
    fn color_field_drives_the_colormap() {
        let volume = sphere_volume();
        let field = Volume::new(
            Array3::from_fn([N, N, N], |_, _, _| 10.0).unwrap(),
            [1.0, 1.0, 1.0],
            [0.0, 0.0, 0.0],
        )
        .unwrap();
        let options = ContourOptions::new(0.5)
            .with_color_field(&field)
            .with_colormap(Colormap::gray(0.0, 10.0).unwrap());
        let buffer = render_contour(&volume, &camera(100.0, 16), &options, None).unwrap();
        let c = buffer.opaque_color(8, 8);
        assert!(c.x > 0.9 && (c.x - c.y).abs() < 1e-6);
    }

    #[test]
    fn default_colormap_depends_on_color_field() {
        let field = sphere_volume();
        let plain = ContourOptions::new(0.5).resolve_colormap().unwrap();
        assert!(plain.opaque);
        assert_eq!(plain.first(), glam::Vec4::ONE);

        let colored = ContourOptions::new(0.5)
            .with_color_field(&field)
            .resolve_colormap()
            .unwrap();
        assert_eq!((colored.vmin, colored.vmax), (0.0, 1.0));
    }

    #[test]
    fn rejects_non_finite_threshold() {
        let volume = sphere_volume();
        let err = render_contour(
            &volume,
            &camera(100.0, 8),
            &ContourOptions::new(f32::NAN),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
