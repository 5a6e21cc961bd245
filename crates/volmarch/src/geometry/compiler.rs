//! Compiler from [`SdfNode`] trees into flat [`SdfProgram`]s.
//!
//! The compiler validates every primitive and transform, folds chains of translations and
//! rotations into a single affine map, and orders the operands of each combinator so the
//! value stack stays shallow (the larger subtree runs first).
//!
//! Typical usage:
//! - [`SdfCompiler`] with [`SdfCompiler::compile`]
use glam::Affine3A;

use crate::error::{Error, Result};
use crate::geometry::node::SdfNode;
use crate::geometry::program::{Instr, SdfProgram, MAX_STACK_DEPTH};

/// Options for compiling a geometry tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompileOptions {
    /// Merge directly nested translations and rotations into one point transform.
    pub fold_transforms: bool,
    /// Emit the operand with the deeper stack requirement first.
    pub reorder_operands: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            fold_transforms: true,
            reorder_operands: true,
        }
    }
}

/// Compiler for signed distance trees.
pub struct SdfCompiler;

impl SdfCompiler {
    /// Compiles `node` into an [`SdfProgram`], applying the given options.
    pub fn compile(node: &SdfNode, opts: &CompileOptions) -> Result<SdfProgram> {
        let mut emitter = Emitter {
            instrs: Vec::new(),
            opts,
        };
        emitter.emit(node, None)?;

        let (value_depth, point_depth) = stack_depths(&emitter.instrs)?;
        if value_depth > MAX_STACK_DEPTH || point_depth > MAX_STACK_DEPTH {
            return Err(Error::Compile(format!(
                "Geometry needs a stack of {} values and {} points; the limit is {}",
                value_depth, point_depth, MAX_STACK_DEPTH
            )));
        }

        Ok(SdfProgram {
            instrs: emitter.instrs,
            value_depth,
            point_depth,
        })
    }
}

struct Emitter<'a> {
    instrs: Vec<Instr>,
    opts: &'a CompileOptions,
}

impl Emitter<'_> {
    /// Emits `node`, evaluated at the current point mapped through `pending` when present.
    fn emit(&mut self, node: &SdfNode, pending: Option<Affine3A>) -> Result<()> {
        match node {
            SdfNode::Translate { node: child, offset } => {
                if !offset.is_finite() {
                    return Err(Error::Compile(format!(
                        "Translation offset {:?} is not finite",
                        offset
                    )));
                }
                self.emit_transformed(child, Affine3A::from_translation(-*offset), pending)
            }
            SdfNode::Rotate {
                node: child,
                rotation,
            } => {
                if !rotation.is_finite() || !rotation.is_normalized() {
                    return Err(Error::Compile(format!(
                        "Rotation {:?} is not a unit quaternion",
                        rotation
                    )));
                }
                self.emit_transformed(child, Affine3A::from_quat(rotation.inverse()), pending)
            }
            SdfNode::Primitive(prim) => {
                if !prim.is_well_formed() {
                    return Err(Error::Compile(format!(
                        "Primitive {:?} has malformed parameters",
                        prim
                    )));
                }
                self.with_point(pending, |e| {
                    e.instrs.push(Instr::Primitive(prim.clone()));
                    Ok(())
                })
            }
            SdfNode::Union(a, b) => {
                self.with_point(pending, |e| e.emit_binary(a, b, Instr::Union, Instr::Union))
            }
            SdfNode::Intersection(a, b) => self.with_point(pending, |e| {
                e.emit_binary(a, b, Instr::Intersection, Instr::Intersection)
            }),
            SdfNode::Difference(a, b) => self.with_point(pending, |e| {
                e.emit_binary(a, b, Instr::Difference, Instr::DifferenceSwapped)
            }),
        }
    }

    fn emit_transformed(
        &mut self,
        child: &SdfNode,
        inverse: Affine3A,
        pending: Option<Affine3A>,
    ) -> Result<()> {
        if self.opts.fold_transforms {
            let combined = match pending {
                Some(outer) => inverse * outer,
                None => inverse,
            };
            self.emit(child, Some(combined))
        } else {
            self.with_point(pending, |e| {
                e.instrs.push(Instr::PushPoint(inverse));
                e.emit(child, None)?;
                e.instrs.push(Instr::PopPoint);
                Ok(())
            })
        }
    }

    fn emit_binary(
        &mut self,
        a: &SdfNode,
        b: &SdfNode,
        in_order: Instr,
        swapped: Instr,
    ) -> Result<()> {
        if self.opts.reorder_operands && value_need(b) > value_need(a) {
            self.emit(b, None)?;
            self.emit(a, None)?;
            self.instrs.push(swapped);
        } else {
            self.emit(a, None)?;
            self.emit(b, None)?;
            self.instrs.push(in_order);
        }
        Ok(())
    }

    fn with_point(
        &mut self,
        pending: Option<Affine3A>,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        match pending {
            Some(transform) if transform != Affine3A::IDENTITY => {
                self.instrs.push(Instr::PushPoint(transform));
                body(self)?;
                self.instrs.push(Instr::PopPoint);
                Ok(())
            }
            _ => body(self),
        }
    }
}

/// Value stack slots needed to evaluate `node` when the deeper operand runs first.
fn value_need(node: &SdfNode) -> usize {
    match node {
        SdfNode::Primitive(_) => 1,
        SdfNode::Translate { node, .. } | SdfNode::Rotate { node, .. } => value_need(node),
        SdfNode::Union(a, b) | SdfNode::Difference(a, b) | SdfNode::Intersection(a, b) => {
            let (na, nb) = (value_need(a), value_need(b));
            if na == nb {
                na + 1
            } else {
                na.max(nb)
            }
        }
    }
}

fn stack_depths(instrs: &[Instr]) -> Result<(usize, usize)> {
    let mut values = 0usize;
    let mut points = 1usize;
    let mut max_values = 0usize;
    let mut max_points = 1usize;

    for instr in instrs {
        match instr {
            Instr::Primitive(_) => {
                values += 1;
                max_values = max_values.max(values);
            }
            Instr::Union | Instr::Intersection | Instr::Difference | Instr::DifferenceSwapped => {
                if values < 2 {
                    return Err(Error::Compile("Combinator is missing an operand".into()));
                }
                values -= 1;
            }
            Instr::PushPoint(_) => {
                points += 1;
                max_points = max_points.max(points);
            }
            Instr::PopPoint => {
                if points < 2 {
                    return Err(Error::Compile("Unbalanced point transform".into()));
                }
                points -= 1;
            }
        }
    }

    if values != 1 {
        return Err(Error::Compile(format!(
            "Program leaves {} values on the stack",
            values
        )));
    }

    Ok((max_values, max_points))
}
