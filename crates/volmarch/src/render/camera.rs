//! Camera parameters and the per-pixel primary ray.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::Vec3;

use crate::error::{Error, Result};

/// Pinhole camera consumed by every kernel.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// World-space eye position.
    pub position: Vec3,
    /// Point the camera looks at.
    pub focal_point: Vec3,
    /// Approximate up direction; re-orthogonalized per ray.
    pub view_up: Vec3,
    /// Marching bound and normalization distance for transparency weights.
    pub max_depth: f32,
    /// Image height in pixels.
    pub height: usize,
    /// Image width in pixels.
    pub width: usize,
    /// Background color written into new screen buffers.
    pub background: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -5.0),
            focal_point: Vec3::ZERO,
            view_up: Vec3::Y,
            max_depth: 100.0,
            height: 256,
            width: 256,
            background: Vec3::ZERO,
        }
    }
}

impl Camera {
    /// Creates a camera looking from `position` at `focal_point`.
    pub fn new(
        position: impl Into<mint::Vector3<f32>>,
        focal_point: impl Into<mint::Vector3<f32>>,
        view_up: impl Into<mint::Vector3<f32>>,
    ) -> Self {
        Self {
            position: Vec3::from(position.into()),
            focal_point: Vec3::from(focal_point.into()),
            view_up: Vec3::from(view_up.into()),
            ..Default::default()
        }
    }

    /// Sets the image resolution.
    pub fn with_resolution(mut self, height: usize, width: usize) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    /// Sets the maximum marching depth.
    pub fn with_max_depth(mut self, max_depth: f32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the background color.
    pub fn with_background(mut self, rgb: impl Into<mint::Vector3<f32>>) -> Self {
        self.background = Vec3::from(rgb.into());
        self
    }

    /// Validates the camera, returning an error if it cannot produce rays.
    pub fn validate(&self) -> Result<()> {
        if self.height == 0 || self.width == 0 {
            return Err(Error::InvalidConfig(format!(
                "camera resolution must be non-zero, got {}x{}",
                self.height, self.width
            )));
        }
        if !(self.max_depth > 0.0) {
            return Err(Error::InvalidConfig("max_depth must be > 0".into()));
        }
        let forward = self.focal_point - self.position;
        if forward.length_squared() <= f32::EPSILON {
            return Err(Error::InvalidConfig(
                "focal_point must differ from position".into(),
            ));
        }
        if forward.cross(self.view_up).length_squared() <= f32::EPSILON {
            return Err(Error::InvalidConfig(
                "view_up must not be parallel to the viewing direction".into(),
            ));
        }
        Ok(())
    }

    /// Unit direction of the primary ray through pixel `(x, y)`.
    ///
    /// Builds a right-handed basis (`right = forward x up`, `up' = right x forward`), places the
    /// image plane one unit ahead and offsets by `s = (x - w/2) / h` along `right` and
    /// `t = (y - h/2) / h` along `up'`.
    #[inline]
    pub fn ray_direction(&self, x: usize, y: usize) -> Vec3 {
        let forward = (self.focal_point - self.position).normalize();
        let right = forward.cross(self.view_up).normalize();
        let up = right.cross(forward);

        let (h, w) = (self.height as f32, self.width as f32);
        let aspect_ratio = w / h;
        let fov_scale = std::f32::consts::FRAC_PI_4.tan();
        let s = (x as f32 - w / 2.0) / w * aspect_ratio * fov_scale;
        let t = (y as f32 - h / 2.0) / h * fov_scale;

        let center = self.position + forward;
        let on_plane = center + s * right + t * up;
        (on_plane - self.position).normalize()
    }

    /// Primary ray through pixel `(x, y)`.
    #[inline]
    pub fn ray(&self, x: usize, y: usize) -> Ray {
        Ray::new(self.position, self.ray_direction(x, y))
    }
}

/// Transient per-pixel ray state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Distance marched from the origin so far.
    pub distance: f32,
    /// Current position, `origin + direction * distance`.
    pub position: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            distance: 0.0,
            position: origin,
        }
    }

    /// Point at distance `t` along the ray.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Jumps to distance `t` from the origin.
    #[inline]
    pub fn seek(&mut self, t: f32) {
        self.distance = t;
        self.position = self.at(t);
    }

    /// Advances by `step` along the direction.
    #[inline]
    pub fn advance(&mut self, step: f32) {
        self.distance += step;
        self.position += self.direction * step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new([0.0, 0.0, -10.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0])
            .with_resolution(64, 128)
            .with_max_depth(50.0)
    }

    fn approx_eq(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn validate_rejects_misconfiguration() {
        assert!(camera().validate().is_ok());
        assert!(matches!(
            camera().with_resolution(0, 4).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(camera().with_max_depth(0.0).validate().is_err());
        assert!(camera().with_max_depth(f32::NAN).validate().is_err());

        let mut same = camera();
        same.focal_point = same.position;
        assert!(same.validate().is_err());

        let parallel = Camera::new([0.0, 0.0, -10.0], [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
        assert!(parallel.validate().is_err());
    }

    #[test]
    fn center_pixel_looks_at_focal_point() {
        let cam = camera();
        approx_eq(cam.ray_direction(64, 32), Vec3::Z);
    }

    #[test]
    fn directions_are_unit_length() {
        let cam = camera();
        for (x, y) in [(0, 0), (127, 63), (10, 50), (100, 3)] {
            assert!((cam.ray_direction(x, y).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn basis_is_right_handed() {
        let cam = camera();
        // forward = +z, up = +y, so right = z x y = -x.
        let d = cam.ray_direction(127, 32);
        assert!(d.x < 0.0);
        assert!(d.y.abs() < 1e-6);

        // Larger internal rows look up.
        let d = cam.ray_direction(64, 63);
        assert!(d.y > 0.0);
        assert!(d.x.abs() < 1e-6);
    }

    #[test]
    fn horizontal_offsets_are_aspect_corrected() {
        let cam = camera();
        // One pixel step in x and in y subtend the same offset on the image plane.
        let right = cam.ray_direction(65, 32);
        let up = cam.ray_direction(64, 33);
        assert!((right.x.abs() - up.y.abs()).abs() < 1e-6);
        assert!((right.x.abs() / right.z - 1.0 / 64.0).abs() < 1e-6);
    }

    #[test]
    fn ray_seek_and_advance() {
        let mut ray = Ray::new(Vec3::ZERO, Vec3::X);
        ray.seek(2.0);
        assert_eq!(ray.position, Vec3::new(2.0, 0.0, 0.0));
        ray.advance(0.5);
        assert_eq!(ray.distance, 2.5);
        assert_eq!(ray.position, Vec3::new(2.5, 0.0, 0.0));
    }
}
