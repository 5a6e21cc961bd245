//! Single-pixel write access and the weighted blended transparency rule.
use glam::{Vec3, Vec4};

/// Weight of a transparent fragment at `distance` along the ray.
///
/// `1 / ((distance / max_depth)^2 + 1)`, so nearer fragments contribute more.
#[inline]
pub fn wboit_weight(distance: f32, max_depth: f32) -> f32 {
    let normalized = distance / max_depth;
    1.0 / (normalized * normalized + 1.0)
}

/// Mutable view of one pixel's slice of every stateful buffer.
///
/// Fields are only reachable through the write rules below, so depth only changes with an
/// opaque write and revealage never increases.
pub struct PixelMut<'a> {
    pub(crate) opaque_color: &'a mut Vec3,
    pub(crate) depth: &'a mut f32,
    pub(crate) normal: &'a mut Vec3,
    pub(crate) transparent_accum: &'a mut Vec3,
    pub(crate) revealage: &'a mut f32,
}

impl PixelMut<'_> {
    /// Current opaque depth of this pixel.
    #[inline]
    pub fn depth(&self) -> f32 {
        *self.depth
    }

    #[inline]
    pub fn revealage(&self) -> f32 {
        *self.revealage
    }

    /// Overwrites the opaque layer.
    #[inline]
    pub fn write_opaque(&mut self, color: Vec3, depth: f32, normal: Vec3) {
        *self.opaque_color = color;
        *self.depth = depth;
        *self.normal = normal;
    }

    /// Accumulates one transparent fragment.
    ///
    /// Adds `rgb * weight * alpha * color_scale` to the accumulated color and multiplies
    /// revealage by `1 - alpha * weight * coverage_scale`, clamped to `[0, 1]`.
    #[inline]
    pub fn accumulate_transparent(
        &mut self,
        color: Vec4,
        weight: f32,
        color_scale: f32,
        coverage_scale: f32,
    ) {
        let alpha = color.w;
        *self.transparent_accum += color.truncate() * (weight * alpha * color_scale);
        let factor = (1.0 - alpha * weight * coverage_scale).clamp(0.0, 1.0);
        *self.revealage *= factor;
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    struct Slot {
        opaque: Vec3,
        depth: f32,
        normal: Vec3,
        accum: Vec3,
        revealage: f32,
    }

    impl Slot {
        fn new() -> Self {
            Self {
                opaque: Vec3::ZERO,
                depth: f32::INFINITY,
                normal: Vec3::ZERO,
                accum: Vec3::ZERO,
                revealage: 1.0,
            }
        }

        fn view(&mut self) -> PixelMut<'_> {
            PixelMut {
                opaque_color: &mut self.opaque,
                depth: &mut self.depth,
                normal: &mut self.normal,
                transparent_accum: &mut self.accum,
                revealage: &mut self.revealage,
            }
        }
    }

    #[test]
    fn weight_is_one_at_camera_and_half_at_max_depth() {
        assert_eq!(wboit_weight(0.0, 10.0), 1.0);
        assert!((wboit_weight(10.0, 10.0) - 0.5).abs() < 1e-6);
        assert!(wboit_weight(2.0, 10.0) > wboit_weight(8.0, 10.0));
    }

    #[test]
    fn write_opaque_overwrites_layer() {
        let mut slot = Slot::new();
        slot.view()
            .write_opaque(Vec3::new(0.5, 0.25, 1.0), 4.0, Vec3::Y);
        assert_eq!(slot.opaque, Vec3::new(0.5, 0.25, 1.0));
        assert_eq!(slot.depth, 4.0);
        assert_eq!(slot.normal, Vec3::Y);
    }

    #[test]
    fn accumulate_matches_blending_rule() {
        let mut slot = Slot::new();
        let weight = wboit_weight(5.0, 10.0);
        slot.view()
            .accumulate_transparent(Vec4::new(1.0, 0.5, 0.0, 0.5), weight, 0.8, 1.0);

        assert!((slot.accum.x - weight * 0.5 * 0.8).abs() < 1e-6);
        assert!((slot.accum.y - 0.5 * weight * 0.5 * 0.8).abs() < 1e-6);
        assert_eq!(slot.accum.z, 0.0);
        assert!((slot.revealage - (1.0 - 0.5 * weight)).abs() < 1e-6);
    }

    #[test]
    fn revealage_never_increases_for_any_fragment() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut slot = Slot::new();

        for _ in 0..500 {
            let before = slot.revealage;
            let color = Vec4::new(
                rng.random::<f32>(),
                rng.random::<f32>(),
                rng.random::<f32>(),
                rng.random::<f32>(),
            );
            let distance = rng.random::<f32>() * 200.0;
            let scale = rng.random::<f32>() * 4.0;
            slot.view()
                .accumulate_transparent(color, wboit_weight(distance, 100.0), scale, scale);
            assert!(slot.revealage <= before);
            assert!((0.0..=1.0).contains(&slot.revealage));
        }
    }

    #[test]
    fn coverage_above_one_clamps_revealage_to_zero() {
        let mut slot = Slot::new();
        slot.view()
            .accumulate_transparent(Vec4::new(1.0, 1.0, 1.0, 1.0), 1.0, 1.0, 3.0);
        assert_eq!(slot.revealage, 0.0);
        assert_eq!(slot.view().revealage(), 0.0);
    }
}
