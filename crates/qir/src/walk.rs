//! Recursive operation traversal utilities.
//!
//! Provides `walk_*` functions for traversing nested operations in the arena
//! in pre-order (an operation before the operations nested in its regions).

use std::ops::ControlFlow;

use crate::context::IrContext;
use crate::dialect::DialectOp;
use crate::refs::{BlockRef, OpRef, RegionRef};

/// Controls whether to descend into children during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Continue walking and descend into nested regions.
    Advance,
    /// Skip the nested regions of the current operation.
    Skip,
}

/// Walk all operations in a region recursively.
pub fn walk_region<B>(
    ctx: &IrContext,
    region: RegionRef,
    f: &mut dyn FnMut(OpRef) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    for &block in &ctx.region(region).blocks {
        walk_block(ctx, block, f)?;
    }
    ControlFlow::Continue(())
}

/// Walk all operations in a block recursively.
pub fn walk_block<B>(
    ctx: &IrContext,
    block: BlockRef,
    f: &mut dyn FnMut(OpRef) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    for &op in &ctx.block(block).ops {
        walk_op(ctx, op, f)?;
    }
    ControlFlow::Continue(())
}

/// Walk an operation and its nested regions recursively.
pub fn walk_op<B>(
    ctx: &IrContext,
    op: OpRef,
    f: &mut dyn FnMut(OpRef) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    match f(op) {
        ControlFlow::Break(b) => return ControlFlow::Break(b),
        ControlFlow::Continue(WalkAction::Skip) => return ControlFlow::Continue(()),
        ControlFlow::Continue(WalkAction::Advance) => {}
    }
    for &region in &ctx.op(op).regions {
        walk_region(ctx, region, f)?;
    }
    ControlFlow::Continue(())
}

/// Walk operations of a specific dialect type nested under `root`.
pub fn walk_typed<T, B>(
    ctx: &IrContext,
    root: OpRef,
    f: &mut dyn FnMut(T) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()>
where
    T: DialectOp,
{
    walk_nested(ctx, root, &mut |op| match T::from_op(ctx, op) {
        Some(typed) => f(typed),
        None => ControlFlow::Continue(WalkAction::Advance),
    })
}

/// Walk every operation nested in the regions of `root`, excluding `root` itself.
pub fn walk_nested<B>(
    ctx: &IrContext,
    root: OpRef,
    f: &mut dyn FnMut(OpRef) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    for &region in &ctx.op(root).regions {
        walk_region(ctx, region, f)?;
    }
    ControlFlow::Continue(())
}

/// Collect every operation nested under `root` in pre-order.
pub fn collect_nested_ops(ctx: &IrContext, root: OpRef) -> Vec<OpRef> {
    let mut ops = Vec::new();
    let _ = walk_nested::<()>(ctx, root, &mut |op| {
        ops.push(op);
        ControlFlow::Continue(WalkAction::Advance)
    });
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_func;
    use crate::dialect::quantum::Rotate;
    use crate::kind::OpKind;
    use crate::types::Axis;

    #[test]
    fn collect_visits_nested_regions_in_pre_order() {
        let mut ctx = IrContext::new();
        let (f, _) = build_func(&mut ctx, "main", &[], |b, _| {
            let q = b.alloc();
            let m = b.measure(q);
            b.if_(m, &[], |inner| {
                let c = inner.constf(0.5);
                inner.yield_(&[c]);
            });
            b.ret(&[]);
        });

        let kinds: Vec<OpKind> = collect_nested_ops(&ctx, f.op_ref())
            .into_iter()
            .map(|op| ctx.op_kind(op))
            .collect();
        assert_eq!(
            kinds,
            vec![
                OpKind::Alloc,
                OpKind::Measure,
                OpKind::If,
                OpKind::ConstF,
                OpKind::Yield,
                OpKind::Return,
            ]
        );
    }

    #[test]
    fn skip_does_not_descend() {
        let mut ctx = IrContext::new();
        let (f, _) = build_func(&mut ctx, "main", &[], |b, _| {
            let q = b.alloc();
            let m = b.measure(q);
            b.if_(m, &[], |inner| {
                inner.constf(1.0);
                inner.yield_(&[]);
            });
            b.ret(&[]);
        });

        let mut seen = 0;
        let _ = walk_nested::<()>(&ctx, f.op_ref(), &mut |op| {
            seen += 1;
            if ctx.op_kind(op) == OpKind::If {
                ControlFlow::Continue(WalkAction::Skip)
            } else {
                ControlFlow::Continue(WalkAction::Advance)
            }
        });
        assert_eq!(seen, 4);
    }

    #[test]
    fn walk_typed_finds_rotations_and_breaks_early() {
        let mut ctx = IrContext::new();
        let (f, r2) = build_func(&mut ctx, "main", &[], |b, _| {
            let q = b.alloc();
            let a = b.constf(0.1);
            let r1 = b.rotate(Axis::Z, a, q);
            let r2 = b.rotate(Axis::X, a, r1);
            b.ret(&[r2]);
            r2
        });
        let r2_op = ctx.defining_op(r2).unwrap();

        let found = walk_typed::<Rotate, OpRef>(&ctx, f.op_ref(), &mut |rot| {
            if rot.axis(&ctx) == Axis::X {
                ControlFlow::Break(rot.op_ref())
            } else {
                ControlFlow::Continue(WalkAction::Advance)
            }
        });
        assert_eq!(found, ControlFlow::Break(r2_op));
    }
}
