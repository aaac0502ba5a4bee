//! Hadamard identities.
//!
//! - `h(h(q))` is `q`
//! - `h(x(h(q)))` is `z(q)`

use qir::dialect::quantum::{self, gate_input};
use qir::rewrite::{MatchOutcome, PatternBenefit, PatternRewriter, RewriteError, RewritePattern};
use qir::{IrContext, OpKind, OpRef, ValueRef};

/// The gate of kind `kind` defining `value`, if it lives in the same region
/// as `user` and `value` has no other use.
fn sole_feeding_gate(ctx: &IrContext, value: ValueRef, kind: OpKind, user: OpRef) -> Option<OpRef> {
    let def = ctx.defining_op(value)?;
    (ctx.op_kind(def) == kind
        && ctx.use_count(value) == 1
        && ctx.parent_region(def) == ctx.parent_region(user))
    .then_some(def)
}

/// Removes two adjacent Hadamard gates on the same qubit.
#[derive(Clone, Copy, Debug, Default)]
pub struct CancelHadamardPair;

impl RewritePattern for CancelHadamardPair {
    fn root_kind(&self) -> OpKind {
        OpKind::Hadamard
    }

    fn benefit(&self) -> PatternBenefit {
        PatternBenefit(2)
    }

    fn name(&self) -> &'static str {
        "cancel-hadamard-pair"
    }

    fn match_and_rewrite(
        &self,
        op: OpRef,
        rewriter: &mut PatternRewriter<'_>,
    ) -> Result<MatchOutcome, RewriteError> {
        let ctx = rewriter.ctx();
        let Some(first) = sole_feeding_gate(ctx, gate_input(ctx, op), OpKind::Hadamard, op)
        else {
            return Ok(MatchOutcome::NoMatch);
        };
        let input = gate_input(ctx, first);
        let output = ctx.op_result(op, 0);

        rewriter.replace_all_uses_with(output, input);
        rewriter.erase_op(op)?;
        rewriter.erase_op(first)?;
        Ok(MatchOutcome::Applied)
    }
}

/// Replaces an X gate conjugated by Hadamards with a Z gate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConjugateXByHadamard;

impl RewritePattern for ConjugateXByHadamard {
    fn root_kind(&self) -> OpKind {
        OpKind::Hadamard
    }

    fn benefit(&self) -> PatternBenefit {
        PatternBenefit(3)
    }

    fn name(&self) -> &'static str {
        "conjugate-x-by-hadamard"
    }

    fn match_and_rewrite(
        &self,
        op: OpRef,
        rewriter: &mut PatternRewriter<'_>,
    ) -> Result<MatchOutcome, RewriteError> {
        let ctx = rewriter.ctx();
        let Some(x) = sole_feeding_gate(ctx, gate_input(ctx, op), OpKind::PauliX, op) else {
            return Ok(MatchOutcome::NoMatch);
        };
        let Some(first) = sole_feeding_gate(ctx, gate_input(ctx, x), OpKind::Hadamard, op) else {
            return Ok(MatchOutcome::NoMatch);
        };
        let input = gate_input(ctx, first);
        let location = ctx.op(op).location;

        let z = rewriter.insert_before(op, quantum::gate_builder(location, OpKind::PauliZ, input));
        let z_out = rewriter.ctx().op_result(z, 0);
        rewriter.replace_op_with_values(op, &[z_out])?;
        rewriter.erase_op(x)?;
        rewriter.erase_op(first)?;
        Ok(MatchOutcome::Applied)
    }
}
