//! Flattened, stack-based form of an [`SdfNode`](crate::geometry::SdfNode) tree.
//!
//! A [`SdfProgram`] is a postfix instruction list produced by
//! [`SdfCompiler`](crate::geometry::compiler::SdfCompiler). Evaluation keeps a value stack
//! and a point stack on the call stack, so it neither recurses nor allocates.
use glam::{Affine3A, Vec3};

use super::node::Primitive;
use super::DistanceField;

/// Upper bound on both the value stack and the point stack of a program.
pub const MAX_STACK_DEPTH: usize = 32;

#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    /// Push the distance of the primitive at the current point.
    Primitive(Primitive),
    /// Pop `b`, pop `a`, push `min(a, b)`.
    Union,
    /// Pop `b`, pop `a`, push `max(a, b)`.
    Intersection,
    /// Pop `b`, pop `a`, push `max(a, -b)`.
    Difference,
    /// Pop `a`, pop `b`, push `max(a, -b)`. Emitted when the subtracted operand ran first.
    DifferenceSwapped,
    /// Push the current point mapped through the given inverse transform.
    PushPoint(Affine3A),
    /// Restore the previous point.
    PopPoint,
}

/// Compiled signed distance program.
#[derive(Clone, Debug, PartialEq)]
pub struct SdfProgram {
    pub(crate) instrs: Vec<Instr>,
    pub(crate) value_depth: usize,
    pub(crate) point_depth: usize,
}

impl SdfProgram {
    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// Maximum number of values live at once during evaluation.
    pub fn value_depth(&self) -> usize {
        self.value_depth
    }

    /// Maximum number of nested point transforms, the root point included.
    pub fn point_depth(&self) -> usize {
        self.point_depth
    }

    pub fn eval(&self, p: Vec3) -> f32 {
        let mut values = [0.0f32; MAX_STACK_DEPTH];
        let mut points = [Vec3::ZERO; MAX_STACK_DEPTH];
        let mut vsp = 0usize;
        let mut psp = 0usize;
        points[0] = p;

        for instr in &self.instrs {
            match instr {
                Instr::Primitive(prim) => {
                    values[vsp] = prim.distance(points[psp]);
                    vsp += 1;
                }
                Instr::Union => {
                    vsp -= 1;
                    values[vsp - 1] = values[vsp - 1].min(values[vsp]);
                }
                Instr::Intersection => {
                    vsp -= 1;
                    values[vsp - 1] = values[vsp - 1].max(values[vsp]);
                }
                Instr::Difference => {
                    vsp -= 1;
                    values[vsp - 1] = values[vsp - 1].max(-values[vsp]);
                }
                Instr::DifferenceSwapped => {
                    vsp -= 1;
                    values[vsp - 1] = values[vsp].max(-values[vsp - 1]);
                }
                Instr::PushPoint(inverse) => {
                    points[psp + 1] = inverse.transform_point3(points[psp]);
                    psp += 1;
                }
                Instr::PopPoint => {
                    psp -= 1;
                }
            }
        }

        values[0]
    }
}

impl DistanceField for SdfProgram {
    #[inline]
    fn distance(&self, p: Vec3) -> f32 {
        self.eval(p)
    }
}
