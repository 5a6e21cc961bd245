//! Signed distance functions of the primitive shapes.
//!
//! Formulas follow the usual closed forms for spheres, box frames, capped cones and
//! capped cylinders (see Inigo Quilez, "distance functions").
use glam::{Vec2, Vec3};

#[inline]
pub fn sphere(p: Vec3, center: Vec3, radius: f32) -> f32 {
    (p - center).length() - radius
}

/// Hollow box edges of the box `[lower, upper]` with edge half-thickness `thickness`.
pub fn box_frame(p: Vec3, lower: Vec3, upper: Vec3, thickness: f32) -> f32 {
    let size = upper - lower;
    let center = lower + size / 2.0;
    let p = (p - center).abs() - size / 2.0;
    let q = (p + Vec3::splat(thickness)).abs() - Vec3::splat(thickness);

    let edge = |a: f32, b: f32, c: f32| {
        Vec3::new(a, b, c).max(Vec3::ZERO).length() + a.max(b.max(c)).min(0.0)
    };
    let e_x = edge(p.x, q.y, q.z);
    let e_y = edge(q.x, p.y, q.z);
    let e_z = edge(q.x, q.y, p.z);
    e_x.min(e_y).min(e_z)
}

/// Cone with its apex at `center`, opening downwards along `-y` for `height`.
///
/// `sin_cos` is `(sin, cos)` of the half-angle.
pub fn cone(p: Vec3, center: Vec3, sin_cos: Vec2, height: f32) -> f32 {
    let p = p - center;
    let q = Vec2::new(height * sin_cos.x / sin_cos.y, -height);
    let w = Vec2::new(Vec2::new(p.x, p.z).length(), p.y);

    let a = w - q * (w.dot(q) / q.dot(q)).clamp(0.0, 1.0);
    let b = w - q * Vec2::new((w.x / q.x).clamp(0.0, 1.0), 1.0);
    let k = q.y.signum();
    let d = a.dot(a).min(b.dot(b));
    let s = (k * (w.x * q.y - w.y * q.x)).max(k * (w.y - q.y));
    d.sqrt() * s.signum()
}

/// Capped cylinder around the y axis with the given radius and half-height.
pub fn cylinder(p: Vec3, center: Vec3, radius: f32, half_height: f32) -> f32 {
    let p = p - center;
    let d = Vec2::new(p.x, p.z).length() - radius;
    let h = p.y.abs() - half_height;
    d.max(h).min(0.0) + Vec2::new(d.max(0.0), h.max(0.0)).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn sphere_is_signed_euclidean_distance() {
        let c = Vec3::new(1.0, 2.0, 3.0);
        approx_eq(sphere(c, c, 2.0), -2.0);
        approx_eq(sphere(c + Vec3::X * 5.0, c, 2.0), 3.0);
    }

    #[test]
    fn cylinder_distances_on_each_side() {
        approx_eq(cylinder(Vec3::ZERO, Vec3::ZERO, 1.0, 2.0), -1.0);
        approx_eq(cylinder(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO, 1.0, 2.0), 2.0);
        approx_eq(cylinder(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, 1.0, 2.0), 3.0);
        approx_eq(
            cylinder(Vec3::new(4.0, 6.0, 0.0), Vec3::ZERO, 1.0, 2.0),
            (9.0f32 + 16.0).sqrt(),
        );
    }

    #[test]
    fn box_frame_is_hollow() {
        let lower = Vec3::splat(-1.0);
        let upper = Vec3::splat(1.0);
        // Center of the box is far from every edge.
        assert!(box_frame(Vec3::ZERO, lower, upper, 0.1) > 0.5);
        // A corner lies inside the frame.
        assert!(box_frame(Vec3::splat(0.95), lower, upper, 0.1) < 0.0);
        // Middle of an edge lies inside the frame.
        assert!(box_frame(Vec3::new(0.0, 0.95, 0.95), lower, upper, 0.1) < 0.0);
        // Middle of a face is outside the frame.
        assert!(box_frame(Vec3::new(0.0, 0.0, 1.0), lower, upper, 0.1) > 0.0);
    }

    #[test]
    fn cone_contains_points_below_apex() {
        let angle = std::f32::consts::FRAC_PI_6;
        let sc = Vec2::new(angle.sin(), angle.cos());
        assert!(cone(Vec3::new(0.0, -0.5, 0.0), Vec3::ZERO, sc, 1.0) < 0.0);
        assert!(cone(Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO, sc, 1.0) > 0.0);
        assert!(cone(Vec3::new(0.0, -1.5, 0.0), Vec3::ZERO, sc, 1.0) > 0.0);
        approx_eq(cone(Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO, sc, 1.0), 0.5);
    }
}
