//! Constant folding for classical angle arithmetic.

use crate::context::IrContext;
use crate::dialect::DialectOp;
use crate::dialect::arith::{AddF, ConstF};
use crate::dialect::quantum::defined_by;
use crate::refs::OpRef;
use crate::rewrite::{PatternRewriter, RewriteError};

/// Value of `op` if it is an `arith.addf` whose operands are both constants.
pub fn constant_sum(ctx: &IrContext, op: OpRef) -> Option<f64> {
    let add = AddF::from_op(ctx, op)?;
    let lhs = defined_by::<ConstF>(ctx, add.lhs(ctx))?;
    let rhs = defined_by::<ConstF>(ctx, add.rhs(ctx))?;
    Some(lhs.value(ctx) + rhs.value(ctx))
}

/// Replace `op` by a constant if it folds. Returns whether it did.
pub fn try_fold(rewriter: &mut PatternRewriter<'_>, op: OpRef) -> Result<bool, RewriteError> {
    let Some(value) = constant_sum(rewriter.ctx(), op) else {
        return Ok(false);
    };
    let location = rewriter.ctx().op(op).location;
    let folded = rewriter.insert_before(op, ConstF::builder(location, value));
    let result = rewriter.ctx().op_result(folded, 0);
    rewriter.replace_op_with_values(op, &[result])?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_func;
    use crate::rewrite::NoopListener;

    #[test]
    fn folds_sum_of_constants() {
        let mut ctx = IrContext::new();
        let (_, sum) = build_func(&mut ctx, "f", &[], |b, _| {
            let a = b.constf(0.25);
            let c = b.constf(0.5);
            let s = b.addf(a, c);
            b.ret(&[s]);
            s
        });
        let add = ctx.defining_op(sum).unwrap();
        assert_eq!(constant_sum(&ctx, add), Some(0.75));

        let mut listener = NoopListener;
        let mut rw = PatternRewriter::new(&mut ctx, &mut listener);
        assert!(try_fold(&mut rw, add).unwrap());
        assert!(!ctx.is_live(add));
    }

    #[test]
    fn leaves_non_constant_operands() {
        let mut ctx = IrContext::new();
        let (_, sum) = build_func(&mut ctx, "f", &[crate::types::Type::F64], |b, args| {
            let a = b.constf(0.25);
            let s = b.addf(a, args[0]);
            b.ret(&[s]);
            s
        });
        let add = ctx.defining_op(sum).unwrap();
        assert_eq!(constant_sum(&ctx, add), None);
    }
}
