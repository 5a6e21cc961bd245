//! Ray / axis-aligned box intersection.
use glam::Vec3;

/// Slab test of a ray against the box `[box_min, box_max]`.
///
/// Returns `(t0, t1)` with `t0 = max(0, max_axis(min(tmin, tmax)))` and
/// `t1 = min_axis(max(tmin, tmax))`. The ray misses when `t0 > t1`. Zero direction components
/// divide to signed infinities.
#[inline]
pub fn ray_intersect_box(box_min: Vec3, box_max: Vec3, origin: Vec3, direction: Vec3) -> (f32, f32) {
    let inv = Vec3::ONE / direction;
    let t_lo = (box_min - origin) * inv;
    let t_hi = (box_max - origin) * inv;

    let near = t_lo.min(t_hi);
    let far = t_lo.max(t_hi);

    let t0 = near.max_element().max(0.0);
    let t1 = far.min_element();
    (t0, t1)
}
