//! Signed distance geometry: primitives, boolean combinators and transforms.
//!
//! A [`Geometry`] couples an [`SdfNode`] tree with a conservative bounding box and the
//! distance under which a march step counts as a surface hit. Geometries are immutable;
//! every combinator returns a new value sharing its operands.
//!
//! ```
//! use glam::Vec3;
//! use volmarch::geometry::Geometry;
//!
//! let a = Geometry::sphere(1.0, Vec3::ZERO).unwrap();
//! let b = Geometry::sphere(1.0, Vec3::X).unwrap();
//! let both = &a + &b;
//! assert!(both.sdf(Vec3::X) < 0.0);
//! ```

pub mod cache;
pub mod compiler;
pub mod node;
pub mod primitives;
pub mod program;

use std::ops::{Add, BitAnd, Sub};
use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};
use tracing::{debug, warn};

pub use cache::{CompiledKernel, KernelCache};
pub use compiler::{CompileOptions, SdfCompiler};
pub use node::{BoxFrameParams, ConeParams, CylinderParams, Primitive, SdfNode, SphereParams};
pub use program::{Instr, SdfProgram};

use crate::error::{Error, Result};

/// Step used by the central difference in [`DistanceField::gradient`].
pub const DERIVATIVE_EPSILON: f32 = 0.001;

/// Anything that can be evaluated as a signed distance field.
///
/// The geometry kernel is generic over this trait, so each implementation gets its own
/// monomorphized march loop.
pub trait DistanceField: Sync {
    fn distance(&self, p: Vec3) -> f32;

    /// Central differences with step [`DERIVATIVE_EPSILON`], left unscaled.
    ///
    /// Only the direction is meaningful; kernels normalize before shading.
    fn gradient(&self, p: Vec3) -> Vec3 {
        let e = DERIVATIVE_EPSILON;
        let dx = self.distance(p + Vec3::X * e) - self.distance(p - Vec3::X * e);
        let dy = self.distance(p + Vec3::Y * e) - self.distance(p - Vec3::Y * e);
        let dz = self.distance(p + Vec3::Z * e) - self.distance(p - Vec3::Z * e);
        Vec3::new(dx, dy, dz)
    }
}

impl DistanceField for SdfNode {
    #[inline]
    fn distance(&self, p: Vec3) -> f32 {
        self.eval(p)
    }
}

/// Signed distance geometry with bounds and hit threshold.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    node: Arc<SdfNode>,
    lower_bound: Vec3,
    upper_bound: Vec3,
    distance_threshold: f32,
}

impl Geometry {
    /// Wraps an existing tree. `distance_threshold` must be positive and finite.
    pub fn new(
        node: impl Into<Arc<SdfNode>>,
        lower_bound: Vec3,
        upper_bound: Vec3,
        distance_threshold: f32,
    ) -> Result<Self> {
        if !(distance_threshold.is_finite() && distance_threshold > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "distance threshold must be positive, got {distance_threshold}"
            )));
        }
        if !lower_bound.is_finite() || !upper_bound.is_finite() {
            return Err(Error::InvalidConfig("geometry bounds must be finite".into()));
        }
        Ok(Self {
            node: node.into(),
            lower_bound,
            upper_bound,
            distance_threshold,
        })
    }

    fn from_primitive(prim: Primitive, lower: Vec3, upper: Vec3, threshold: f32) -> Result<Self> {
        if !prim.is_well_formed() {
            return Err(Error::InvalidConfig(format!(
                "malformed primitive parameters: {prim:?}"
            )));
        }
        Self::new(SdfNode::Primitive(prim), lower, upper, threshold)
    }

    pub fn sphere(radius: f32, center: Vec3) -> Result<Self> {
        Self::from_primitive(
            Primitive::Sphere(SphereParams { radius, center }),
            center - Vec3::splat(radius),
            center + Vec3::splat(radius),
            radius / 100.0,
        )
    }

    /// Edges of the box `[lower, upper]`, each `thickness` thick.
    pub fn box_frame(lower: Vec3, upper: Vec3, thickness: f32) -> Result<Self> {
        Self::from_primitive(
            Primitive::BoxFrame(BoxFrameParams {
                lower,
                upper,
                thickness,
            }),
            lower,
            upper,
            thickness / 100.0,
        )
    }

    /// Cone with its apex at `center` and half-angle given as `(sin, cos)`.
    pub fn cone(sin_cos: Vec2, height: f32, center: Vec3) -> Result<Self> {
        Self::from_primitive(
            Primitive::Cone(ConeParams {
                sin_cos,
                height,
                center,
            }),
            center - Vec3::splat(height),
            center + Vec3::splat(height),
            height / 100.0,
        )
    }

    /// Y-aligned cylinder of the given radius and half-height.
    pub fn cylinder(radius: f32, height: f32, center: Vec3) -> Result<Self> {
        let extent = Vec3::new(radius, height, radius);
        Self::from_primitive(
            Primitive::Cylinder(CylinderParams {
                radius,
                height,
                center,
            }),
            center - extent,
            center + extent,
            radius / 100.0,
        )
    }

    /// Arrow along `+y`: a shaft of half-height `height` topped by a cone head.
    pub fn arrow(height: f32, center: Vec3) -> Result<Self> {
        let radius = height / 10.0;
        let shaft = Self::cylinder(radius, height, Vec3::ZERO)?;
        let head_angle = radius.atan2(height / 3.0);
        let head = Self::cone(
            Vec2::new(head_angle.sin(), head_angle.cos()),
            height,
            Vec3::new(0.0, 1.5 * height, 0.0),
        )?;
        let arrow = (&shaft + &head).translate(center);
        Self::new(arrow.node, arrow.lower_bound, arrow.upper_bound, radius / 100.0)
    }

    pub fn node(&self) -> &Arc<SdfNode> {
        &self.node
    }

    pub fn lower_bound(&self) -> Vec3 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> Vec3 {
        self.upper_bound
    }

    pub fn distance_threshold(&self) -> f32 {
        self.distance_threshold
    }

    /// Returns a copy with a different hit threshold.
    pub fn with_distance_threshold(&self, distance_threshold: f32) -> Result<Self> {
        Self::new(
            self.node.clone(),
            self.lower_bound,
            self.upper_bound,
            distance_threshold,
        )
    }

    pub fn sdf(&self, p: Vec3) -> f32 {
        self.node.eval(p)
    }

    /// Unscaled central difference gradient, see [`DistanceField::gradient`].
    pub fn derivative(&self, p: Vec3) -> Vec3 {
        DistanceField::gradient(self, p)
    }

    pub fn union(&self, other: &Geometry) -> Geometry {
        Geometry {
            node: Arc::new(SdfNode::Union(self.node.clone(), other.node.clone())),
            lower_bound: self.lower_bound.min(other.lower_bound),
            upper_bound: self.upper_bound.max(other.upper_bound),
            distance_threshold: self.distance_threshold.min(other.distance_threshold),
        }
    }

    /// Removes `other` from `self`. Bounds and threshold stay those of `self`.
    pub fn difference(&self, other: &Geometry) -> Geometry {
        Geometry {
            node: Arc::new(SdfNode::Difference(self.node.clone(), other.node.clone())),
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
            distance_threshold: self.distance_threshold,
        }
    }

    /// Bounds are the overlap of both boxes.
    pub fn intersection(&self, other: &Geometry) -> Geometry {
        Geometry {
            node: Arc::new(SdfNode::Intersection(self.node.clone(), other.node.clone())),
            lower_bound: self.lower_bound.max(other.lower_bound),
            upper_bound: self.upper_bound.min(other.upper_bound),
            distance_threshold: self.distance_threshold.min(other.distance_threshold),
        }
    }

    pub fn translate(&self, offset: Vec3) -> Geometry {
        Geometry {
            node: Arc::new(SdfNode::Translate {
                node: self.node.clone(),
                offset,
            }),
            lower_bound: self.lower_bound + offset,
            upper_bound: self.upper_bound + offset,
            distance_threshold: self.distance_threshold,
        }
    }

    /// Rotates by `angle` radians about `axis`.
    ///
    /// The bounding box is inherited from the unrotated shape and may no longer enclose it.
    /// The geometry kernel marches without consulting the box, so rotated parts still render.
    pub fn rotate(&self, angle: f32, axis: Vec3) -> Geometry {
        let axis = axis.normalize_or_zero();
        let rotation = if axis == Vec3::ZERO || !angle.is_finite() {
            warn!(
                "Degenerate rotation (axis {:?}, angle {}); using identity.",
                axis, angle
            );
            Quat::IDENTITY
        } else {
            Quat::from_axis_angle(axis, angle)
        };
        debug!("Rotated geometry keeps its unrotated bounding box.");
        Geometry {
            node: Arc::new(SdfNode::Rotate {
                node: self.node.clone(),
                rotation,
            }),
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
            distance_threshold: self.distance_threshold,
        }
    }
}

impl DistanceField for Geometry {
    #[inline]
    fn distance(&self, p: Vec3) -> f32 {
        self.node.eval(p)
    }
}

impl Add for &Geometry {
    type Output = Geometry;

    fn add(self, rhs: &Geometry) -> Geometry {
        self.union(rhs)
    }
}

impl Add for Geometry {
    type Output = Geometry;

    fn add(self, rhs: Geometry) -> Geometry {
        self.union(&rhs)
    }
}

impl Sub for &Geometry {
    type Output = Geometry;

    fn sub(self, rhs: &Geometry) -> Geometry {
        self.difference(rhs)
    }
}

impl Sub for Geometry {
    type Output = Geometry;

    fn sub(self, rhs: Geometry) -> Geometry {
        self.difference(&rhs)
    }
}

impl BitAnd for &Geometry {
    type Output = Geometry;

    fn bitand(self, rhs: &Geometry) -> Geometry {
        self.intersection(rhs)
    }
}

impl BitAnd for Geometry {
    type Output = Geometry;

    fn bitand(self, rhs: Geometry) -> Geometry {
        self.intersection(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_point(rng: &mut StdRng, extent: f32) -> Vec3 {
        Vec3::new(
            rng.random::<f32>() * 2.0 - 1.0,
            rng.random::<f32>() * 2.0 - 1.0,
            rng.random::<f32>() * 2.0 - 1.0,
        ) * extent
    }

    #[test]
    fn sphere_bounds_and_threshold() {
        let s = Geometry::sphere(2.0, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(s.lower_bound(), Vec3::new(-1.0, -2.0, -2.0));
        assert_eq!(s.upper_bound(), Vec3::new(3.0, 2.0, 2.0));
        assert!((s.distance_threshold() - 0.02).abs() < 1e-7);
    }

    #[test]
    fn rejects_bad_threshold_and_parameters() {
        let s = Geometry::sphere(1.0, Vec3::ZERO).unwrap();
        assert!(matches!(
            s.with_distance_threshold(0.0),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Geometry::sphere(f32::NAN, Vec3::ZERO),
            Err(Error::InvalidConfig(_))
        ));
        assert!(Geometry::sphere(0.0, Vec3::ZERO).is_err());
    }

    #[test]
    fn union_is_min_of_operands() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = Geometry::sphere(1.0, Vec3::ZERO).unwrap();
        let b = Geometry::sphere(1.5, Vec3::new(2.0, 1.0, 0.0)).unwrap();
        let u = &a + &b;
        for _ in 0..200 {
            let p = random_point(&mut rng, 4.0);
            assert_eq!(u.sdf(p), a.sdf(p).min(b.sdf(p)));
        }
        assert_eq!(u.lower_bound(), a.lower_bound().min(b.lower_bound()));
        assert_eq!(u.upper_bound(), a.upper_bound().max(b.upper_bound()));
        assert_eq!(u.distance_threshold(), 0.01);
    }

    #[test]
    fn difference_and_intersection_rules() {
        let a = Geometry::sphere(2.0, Vec3::ZERO).unwrap();
        let b = Geometry::sphere(1.0, Vec3::X * 2.0).unwrap();
        let d = &a - &b;
        let i = &a & &b;
        let p = Vec3::new(1.5, 0.0, 0.0);
        assert_eq!(d.sdf(p), a.sdf(p).max(-b.sdf(p)));
        assert_eq!(i.sdf(p), a.sdf(p).max(b.sdf(p)));
        assert_eq!(d.lower_bound(), a.lower_bound());
        assert_eq!(d.upper_bound(), a.upper_bound());
        assert_eq!(i.lower_bound(), Vec3::new(1.0, -1.0, -1.0));
        assert_eq!(i.upper_bound(), Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(i.distance_threshold(), b.distance_threshold());
    }

    #[test]
    fn difference_keeps_threshold_of_minuend() {
        let a = Geometry::sphere(2.0, Vec3::ZERO).unwrap();
        let cutter = Geometry::sphere(0.5, Vec3::ZERO).unwrap();
        let d = &a - &cutter;
        assert_eq!(d.distance_threshold(), a.distance_threshold());
        assert_eq!((&cutter - &a).distance_threshold(), cutter.distance_threshold());
    }

    #[test]
    fn translate_shifts_bounds() {
        let s = Geometry::sphere(1.0, Vec3::ZERO)
            .unwrap()
            .translate(Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(s.lower_bound(), Vec3::new(-1.0, -1.0, 4.0));
        assert!((s.sdf(Vec3::new(0.0, 0.0, 5.0)) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn rotate_keeps_unrotated_bounds() {
        let s = Geometry::sphere(0.5, Vec3::X * 3.0).unwrap();
        let r = s.rotate(std::f32::consts::FRAC_PI_2, Vec3::Z);
        assert_eq!(r.lower_bound(), s.lower_bound());
        assert_eq!(r.upper_bound(), s.upper_bound());
        // The rotated sphere now sits on +y, outside the inherited box.
        assert!(r.sdf(Vec3::Y * 3.0) < 0.0);
        let p = Vec3::Y * 3.0;
        let inside = p.cmpge(r.lower_bound()).all() && p.cmple(r.upper_bound()).all();
        assert!(!inside);
    }

    #[test]
    fn degenerate_rotation_is_identity() {
        let s = Geometry::sphere(1.0, Vec3::X).unwrap();
        let r = s.rotate(1.0, Vec3::ZERO);
        assert_eq!(r.sdf(Vec3::X), s.sdf(Vec3::X));
    }

    #[test]
    fn derivative_of_sphere_points_outwards() {
        let s = Geometry::sphere(1.0, Vec3::ZERO).unwrap();
        let g = s.derivative(Vec3::new(2.0, 0.0, 0.0));
        assert!((g.normalize() - Vec3::X).length() < 1e-2);
        assert!((g.length() - 2.0 * DERIVATIVE_EPSILON).abs() < 1e-4);
        let g = s.derivative(Vec3::new(0.0, -1.0, 1.0));
        assert!((g.normalize() - Vec3::new(0.0, -1.0, 1.0).normalize()).length() < 1e-2);
    }

    #[test]
    fn arrow_has_shaft_and_head() {
        let a = Geometry::arrow(1.0, Vec3::new(0.0, 0.0, 2.0)).unwrap();
        // Shaft center.
        assert!(a.sdf(Vec3::new(0.0, 0.0, 2.0)) < 0.0);
        // Inside the head but wider than the shaft.
        assert!(a.sdf(Vec3::new(0.2, 0.6, 2.0)) < 0.0);
        // Beside the shaft.
        assert!(a.sdf(Vec3::new(0.5, -0.5, 2.0)) > 0.0);
        assert!((a.distance_threshold() - 0.001).abs() < 1e-7);
        assert!(a.upper_bound().y >= 2.5 - 1e-6);
    }
}
