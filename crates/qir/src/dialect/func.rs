//! `func` dialect.

use super::dialect_op;
use crate::context::{IrContext, OperationDataBuilder};
use crate::kind::OpKind;
use crate::refs::{BlockRef, RegionRef, ValueRef};
use crate::types::Location;

dialect_op! {
    /// `func.func @name`: a single-region function whose entry block
    /// arguments are the function parameters.
    Func => Func
}

dialect_op! {
    Return => Return
}

impl Func {
    pub fn builder(location: Location, name: &str, body: RegionRef) -> OperationDataBuilder {
        OperationDataBuilder::new(location, OpKind::Func)
            .attr("sym_name", name)
            .region(body)
    }

    pub fn name<'c>(&self, ctx: &'c IrContext) -> &'c str {
        ctx.attr(self.0, "sym_name")
            .and_then(|a| a.as_str())
            .unwrap_or("<unnamed>")
    }

    pub fn body(&self, ctx: &IrContext) -> RegionRef {
        ctx.op(self.0).regions[0]
    }

    pub fn entry_block(&self, ctx: &IrContext) -> BlockRef {
        ctx.region(self.body(ctx)).blocks[0]
    }

    pub fn args<'c>(&self, ctx: &'c IrContext) -> &'c [ValueRef] {
        ctx.block_args(self.entry_block(ctx))
    }
}

impl Return {
    pub fn builder(location: Location, values: &[ValueRef]) -> OperationDataBuilder {
        OperationDataBuilder::new(location, OpKind::Return).operands(values.iter().copied())
    }
}
