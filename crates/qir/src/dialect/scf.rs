//! `scf` dialect: structured control flow.

use super::dialect_op;
use crate::context::{IrContext, OperationDataBuilder};
use crate::kind::OpKind;
use crate::refs::{RegionRef, ValueRef};
use crate::types::{Location, Type};

dialect_op! {
    /// `scf.if %cond { ... }`: executes its region when the condition holds.
    If => If
}

dialect_op! {
    Yield => Yield
}

impl If {
    pub fn builder(
        location: Location,
        cond: ValueRef,
        result_types: &[Type],
        body: RegionRef,
    ) -> OperationDataBuilder {
        OperationDataBuilder::new(location, OpKind::If)
            .operand(cond)
            .results(result_types.iter().copied())
            .region(body)
    }

    pub fn cond(&self, ctx: &IrContext) -> ValueRef {
        ctx.op_operand(self.0, 0)
    }

    pub fn body(&self, ctx: &IrContext) -> RegionRef {
        ctx.op(self.0).regions[0]
    }
}

impl Yield {
    pub fn builder(location: Location, values: &[ValueRef]) -> OperationDataBuilder {
        OperationDataBuilder::new(location, OpKind::Yield).operands(values.iter().copied())
    }
}
