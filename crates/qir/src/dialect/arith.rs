//! `arith` dialect: classical angle arithmetic.

use super::dialect_op;
use crate::context::{IrContext, OperationDataBuilder};
use crate::kind::OpKind;
use crate::refs::ValueRef;
use crate::types::{Location, Type};

dialect_op! {
    /// `arith.constf {value} : f64`
    ConstF => ConstF
}

dialect_op! {
    /// `arith.addf %lhs, %rhs : f64`
    AddF => AddF
}

impl ConstF {
    pub fn builder(location: Location, value: f64) -> OperationDataBuilder {
        OperationDataBuilder::new(location, OpKind::ConstF)
            .attr("value", value)
            .result(Type::F64)
    }

    pub fn value(&self, ctx: &IrContext) -> f64 {
        ctx.attr(self.0, "value")
            .and_then(|a| a.as_f64())
            .unwrap_or_else(|| panic!("arith.constf {} is missing its float value", self.0))
    }

    pub fn result(&self, ctx: &IrContext) -> ValueRef {
        ctx.op_result(self.0, 0)
    }
}

impl AddF {
    pub fn builder(location: Location, lhs: ValueRef, rhs: ValueRef) -> OperationDataBuilder {
        OperationDataBuilder::new(location, OpKind::AddF)
            .operand(lhs)
            .operand(rhs)
            .result(Type::F64)
    }

    pub fn lhs(&self, ctx: &IrContext) -> ValueRef {
        ctx.op_operand(self.0, 0)
    }

    pub fn rhs(&self, ctx: &IrContext) -> ValueRef {
        ctx.op_operand(self.0, 1)
    }

    pub fn result(&self, ctx: &IrContext) -> ValueRef {
        ctx.op_result(self.0, 0)
    }
}
