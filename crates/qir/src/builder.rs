//! Convenience construction of function bodies.
//!
//! ```
//! use qir::builder::build_func;
//! use qir::{Axis, IrContext, Type};
//!
//! let mut ctx = IrContext::new();
//! let (func, _) = build_func(&mut ctx, "main", &[Type::Qubit], |b, args| {
//!     let angle = b.constf(0.25);
//!     let q = b.rotate(Axis::Z, angle, args[0]);
//!     b.ret(&[q]);
//! });
//! assert_eq!(func.name(&ctx), "main");
//! ```

use smallvec::{SmallVec, smallvec};

use crate::context::{BlockData, IrContext, OperationDataBuilder, RegionData};
use crate::dialect::func::Func;
use crate::dialect::{DialectOp, arith, func, quantum, scf};
use crate::kind::OpKind;
use crate::refs::{BlockRef, OpRef, ValueRef};
use crate::types::{Axis, Location, Span, Type};

/// Appends operations to the end of one block.
pub struct BlockBuilder<'c> {
    ctx: &'c mut IrContext,
    block: BlockRef,
    location: Location,
}

impl<'c> BlockBuilder<'c> {
    pub fn new(ctx: &'c mut IrContext, block: BlockRef, location: Location) -> Self {
        Self {
            ctx,
            block,
            location,
        }
    }

    pub fn ctx(&self) -> &IrContext {
        &*self.ctx
    }

    pub fn block(&self) -> BlockRef {
        self.block
    }

    /// Location attached to subsequently built operations.
    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// Build an operation from raw parts and append it.
    pub fn op(&mut self, builder: OperationDataBuilder) -> OpRef {
        let data = builder.build(self.ctx);
        let op = self.ctx.create_op(data);
        self.ctx.push_op(self.block, op);
        op
    }

    fn single(&mut self, builder: OperationDataBuilder) -> ValueRef {
        let op = self.op(builder);
        self.ctx.op_result(op, 0)
    }

    pub fn alloc(&mut self) -> ValueRef {
        self.single(quantum::Alloc::builder(self.location))
    }

    pub fn constf(&mut self, value: f64) -> ValueRef {
        self.single(arith::ConstF::builder(self.location, value))
    }

    pub fn addf(&mut self, lhs: ValueRef, rhs: ValueRef) -> ValueRef {
        self.single(arith::AddF::builder(self.location, lhs, rhs))
    }

    pub fn rotate(&mut self, axis: Axis, angle: ValueRef, qubit: ValueRef) -> ValueRef {
        self.single(quantum::Rotate::builder(self.location, axis, angle, qubit))
    }

    pub fn h(&mut self, qubit: ValueRef) -> ValueRef {
        self.single(quantum::gate_builder(self.location, OpKind::Hadamard, qubit))
    }

    pub fn x(&mut self, qubit: ValueRef) -> ValueRef {
        self.single(quantum::gate_builder(self.location, OpKind::PauliX, qubit))
    }

    pub fn z(&mut self, qubit: ValueRef) -> ValueRef {
        self.single(quantum::gate_builder(self.location, OpKind::PauliZ, qubit))
    }

    pub fn measure(&mut self, qubit: ValueRef) -> ValueRef {
        self.single(quantum::Measure::builder(self.location, qubit))
    }

    pub fn ret(&mut self, values: &[ValueRef]) -> OpRef {
        self.op(func::Return::builder(self.location, values))
    }

    pub fn yield_(&mut self, values: &[ValueRef]) -> OpRef {
        self.op(scf::Yield::builder(self.location, values))
    }

    /// Append an `scf.if` whose single-block body is filled by `body`.
    pub fn if_(
        &mut self,
        cond: ValueRef,
        result_types: &[Type],
        body: impl FnOnce(&mut BlockBuilder<'_>),
    ) -> (OpRef, SmallVec<[ValueRef; 2]>) {
        let location = self.location;
        let inner = self.ctx.create_block(BlockData {
            location,
            args: vec![],
            ops: SmallVec::new(),
            parent_region: None,
        });
        body(&mut BlockBuilder::new(&mut *self.ctx, inner, location));
        let region = self.ctx.create_region(RegionData {
            location,
            blocks: smallvec![inner],
            parent_op: None,
        });
        let op = self.op(scf::If::builder(location, cond, result_types, region));
        (op, self.ctx.op_results(op).into())
    }
}

/// Location used for operations built without source information.
pub fn unknown_location(ctx: &mut IrContext) -> Location {
    let path = ctx.paths.intern("<unknown>");
    Location::new(path, Span::default())
}

/// Build a detached `func.func` with a single-block body.
///
/// `body` receives the entry block's arguments; its return value is passed
/// through to the caller.
pub fn build_func<R>(
    ctx: &mut IrContext,
    name: &str,
    arg_types: &[Type],
    body: impl FnOnce(&mut BlockBuilder<'_>, &[ValueRef]) -> R,
) -> (Func, R) {
    let location = unknown_location(ctx);
    let entry = ctx.create_block(BlockData {
        location,
        args: arg_types.to_vec(),
        ops: SmallVec::new(),
        parent_region: None,
    });
    let args: SmallVec<[ValueRef; 4]> = ctx.block_args(entry).into();
    let out = body(&mut BlockBuilder::new(ctx, entry, location), &args);
    let region = ctx.create_region(RegionData {
        location,
        blocks: smallvec![entry],
        parent_op: None,
    });
    let data = Func::builder(location, name, region).build(ctx);
    let op = ctx.create_op(data);
    (Func::wrap(op), out)
}
