use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};

use super::primitives;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SphereParams {
    pub radius: f32,
    pub center: Vec3,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxFrameParams {
    pub lower: Vec3,
    pub upper: Vec3,
    pub thickness: f32,
}

/// Apex-up cone. `sin_cos` holds `(sin, cos)` of the half-angle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConeParams {
    pub sin_cos: Vec2,
    pub height: f32,
    pub center: Vec3,
}

/// Y-aligned cylinder; `height` is the half-height.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CylinderParams {
    pub radius: f32,
    pub height: f32,
    pub center: Vec3,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "params"))]
pub enum Primitive {
    Sphere(SphereParams),
    BoxFrame(BoxFrameParams),
    Cone(ConeParams),
    Cylinder(CylinderParams),
}

impl Primitive {
    #[inline]
    pub fn distance(&self, p: Vec3) -> f32 {
        match self {
            Primitive::Sphere(s) => primitives::sphere(p, s.center, s.radius),
            Primitive::BoxFrame(b) => primitives::box_frame(p, b.lower, b.upper, b.thickness),
            Primitive::Cone(c) => primitives::cone(p, c.center, c.sin_cos, c.height),
            Primitive::Cylinder(c) => primitives::cylinder(p, c.center, c.radius, c.height),
        }
    }

    /// Every parameter is finite and sizes are non-negative.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Primitive::Sphere(s) => s.radius.is_finite() && s.radius >= 0.0 && s.center.is_finite(),
            Primitive::BoxFrame(b) => {
                b.lower.is_finite()
                    && b.upper.is_finite()
                    && b.thickness.is_finite()
                    && b.thickness >= 0.0
            }
            Primitive::Cone(c) => {
                c.sin_cos.is_finite()
                    && c.sin_cos.y != 0.0
                    && c.height.is_finite()
                    && c.height > 0.0
                    && c.center.is_finite()
            }
            Primitive::Cylinder(c) => {
                c.radius.is_finite()
                    && c.radius >= 0.0
                    && c.height.is_finite()
                    && c.height >= 0.0
                    && c.center.is_finite()
            }
        }
    }
}

/// Tree of signed distance operations.
///
/// Children are shared through `Arc`, so combining geometries never copies subtrees.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "params"))]
pub enum SdfNode {
    Primitive(Primitive),
    Union(Arc<SdfNode>, Arc<SdfNode>),
    Difference(Arc<SdfNode>, Arc<SdfNode>),
    Intersection(Arc<SdfNode>, Arc<SdfNode>),
    Translate { node: Arc<SdfNode>, offset: Vec3 },
    /// Rotation of the child shape. Evaluation samples the child at `rotation⁻¹ · p`.
    Rotate { node: Arc<SdfNode>, rotation: Quat },
}

impl SdfNode {
    /// Tree-walking evaluation.
    pub fn eval(&self, p: Vec3) -> f32 {
        match self {
            SdfNode::Primitive(prim) => prim.distance(p),
            SdfNode::Union(a, b) => a.eval(p).min(b.eval(p)),
            SdfNode::Difference(a, b) => a.eval(p).max(-b.eval(p)),
            SdfNode::Intersection(a, b) => a.eval(p).max(b.eval(p)),
            SdfNode::Translate { node, offset } => node.eval(p - *offset),
            SdfNode::Rotate { node, rotation } => node.eval(rotation.inverse() * p),
        }
    }

    pub fn primitive_count(&self) -> usize {
        match self {
            SdfNode::Primitive(_) => 1,
            SdfNode::Union(a, b) | SdfNode::Difference(a, b) | SdfNode::Intersection(a, b) => {
                a.primitive_count() + b.primitive_count()
            }
            SdfNode::Translate { node, .. } | SdfNode::Rotate { node, .. } => {
                node.primitive_count()
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            SdfNode::Primitive(_) => 1,
            SdfNode::Union(a, b) | SdfNode::Difference(a, b) | SdfNode::Intersection(a, b) => {
                1 + a.depth().max(b.depth())
            }
            SdfNode::Translate { node, .. } | SdfNode::Rotate { node, .. } => 1 + node.depth(),
        }
    }

    /// Whether any node below (and including) this one is a rotation.
    pub fn has_rotation(&self) -> bool {
        match self {
            SdfNode::Primitive(_) => false,
            SdfNode::Union(a, b) | SdfNode::Difference(a, b) | SdfNode::Intersection(a, b) => {
                a.has_rotation() || b.has_rotation()
            }
            SdfNode::Translate { node, .. } => node.has_rotation(),
            SdfNode::Rotate { .. } => true,
        }
    }
}

impl From<Primitive> for SdfNode {
    fn from(value: Primitive) -> Self {
        SdfNode::Primitive(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(radius: f32, center: Vec3) -> Arc<SdfNode> {
        Arc::new(SdfNode::Primitive(Primitive::Sphere(SphereParams {
            radius,
            center,
        })))
    }

    #[test]
    fn combinators_follow_min_max_rules() {
        let a = sphere(1.0, Vec3::ZERO);
        let b = sphere(1.0, Vec3::X);
        let p = Vec3::new(2.0, 0.0, 0.0);
        let (da, db) = (a.eval(p), b.eval(p));

        assert_eq!(SdfNode::Union(a.clone(), b.clone()).eval(p), da.min(db));
        assert_eq!(SdfNode::Difference(a.clone(), b.clone()).eval(p), da.max(-db));
        assert_eq!(SdfNode::Intersection(a, b).eval(p), da.max(db));
    }

    #[test]
    fn translate_moves_the_shape() {
        let node = SdfNode::Translate {
            node: sphere(1.0, Vec3::ZERO),
            offset: Vec3::new(0.0, 3.0, 0.0),
        };
        assert!((node.eval(Vec3::new(0.0, 3.0, 0.0)) + 1.0).abs() < 1e-6);
        assert!((node.eval(Vec3::ZERO) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn rotate_samples_child_at_inverse_rotation() {
        let node = SdfNode::Rotate {
            node: sphere(0.5, Vec3::X * 2.0),
            rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        };
        // +x rotated a quarter turn about z lands on +y.
        assert!((node.eval(Vec3::Y * 2.0) + 0.5).abs() < 1e-5);
        assert!(node.eval(Vec3::X * 2.0) > 1.0);
    }

    #[test]
    fn counts_and_depth() {
        let u = SdfNode::Union(
            sphere(1.0, Vec3::ZERO),
            Arc::new(SdfNode::Translate {
                node: sphere(1.0, Vec3::ZERO),
                offset: Vec3::ONE,
            }),
        );
        assert_eq!(u.primitive_count(), 2);
        assert_eq!(u.depth(), 3);
        assert!(!u.has_rotation());

        let r = SdfNode::Union(
            sphere(1.0, Vec3::ZERO),
            Arc::new(SdfNode::Rotate {
                node: sphere(1.0, Vec3::X),
                rotation: Quat::from_rotation_y(1.0),
            }),
        );
        assert!(r.has_rotation());
    }
}
