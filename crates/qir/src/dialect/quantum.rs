//! `quantum` dialect: qubit allocation, gates, and measurement.
//!
//! Gates are in value-semantics form: each gate consumes a qubit value and
//! produces the qubit after the gate, so a circuit on one qubit is a chain
//! of definitions.

use super::{DialectOp, dialect_op};
use crate::context::{IrContext, OperationDataBuilder};
use crate::kind::OpKind;
use crate::refs::{OpRef, ValueRef};
use crate::types::{Axis, Location, Type};

dialect_op! {
    Alloc => Alloc
}

dialect_op! {
    /// `quantum.rotate %angle, %qubit {axis}`: operand 0 is the angle,
    /// operand 1 the input qubit.
    Rotate => Rotate
}

dialect_op! {
    Hadamard => Hadamard
}

dialect_op! {
    PauliX => PauliX
}

dialect_op! {
    PauliZ => PauliZ
}

dialect_op! {
    Measure => Measure
}

pub const ROTATE_ANGLE: usize = 0;
pub const ROTATE_QUBIT: usize = 1;

impl Alloc {
    pub fn builder(location: Location) -> OperationDataBuilder {
        OperationDataBuilder::new(location, OpKind::Alloc).result(Type::Qubit)
    }
}

impl Rotate {
    pub fn builder(
        location: Location,
        axis: Axis,
        angle: ValueRef,
        qubit: ValueRef,
    ) -> OperationDataBuilder {
        OperationDataBuilder::new(location, OpKind::Rotate)
            .operand(angle)
            .operand(qubit)
            .attr("axis", axis)
            .result(Type::Qubit)
    }

    pub fn angle(&self, ctx: &IrContext) -> ValueRef {
        ctx.op_operand(self.0, ROTATE_ANGLE)
    }

    pub fn qubit(&self, ctx: &IrContext) -> ValueRef {
        ctx.op_operand(self.0, ROTATE_QUBIT)
    }

    pub fn axis(&self, ctx: &IrContext) -> Axis {
        ctx.attr(self.0, "axis")
            .and_then(|a| a.as_axis())
            .unwrap_or_else(|| panic!("quantum.rotate {} is missing its axis", self.0))
    }

    pub fn result(&self, ctx: &IrContext) -> ValueRef {
        ctx.op_result(self.0, 0)
    }
}

impl Measure {
    pub fn builder(location: Location, qubit: ValueRef) -> OperationDataBuilder {
        OperationDataBuilder::new(location, OpKind::Measure)
            .operand(qubit)
            .result(Type::I1)
    }
}

/// Builder for a single-qubit gate without parameters (`h`, `x`, `z`).
pub fn gate_builder(location: Location, kind: OpKind, qubit: ValueRef) -> OperationDataBuilder {
    debug_assert!(
        matches!(kind, OpKind::Hadamard | OpKind::PauliX | OpKind::PauliZ),
        "gate_builder: {kind} is not a parameterless single-qubit gate",
    );
    OperationDataBuilder::new(location, kind)
        .operand(qubit)
        .result(Type::Qubit)
}

/// Input qubit of a parameterless gate.
pub fn gate_input(ctx: &IrContext, op: OpRef) -> ValueRef {
    ctx.op_operand(op, 0)
}

/// Follow `value` to its defining operation if that operation is a `T`.
pub fn defined_by<T: DialectOp>(ctx: &IrContext, value: ValueRef) -> Option<T> {
    let op = ctx.defining_op(value)?;
    T::from_op(ctx, op)
}
