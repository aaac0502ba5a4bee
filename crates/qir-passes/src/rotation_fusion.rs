//! Rotation fusion.
//!
//! ```text
//! %q1 = quantum.rotate %a, %q0      // op1
//! %q2 = quantum.rotate %b, %q1      // op2
//! ```
//!
//! becomes
//!
//! ```text
//! %s  = arith.addf %a, %b
//! %q2 = quantum.rotate %s, %q0
//! ```
//!
//! `op2` is updated in place, so its result value and every use of it
//! survive; `op1` is erased.

use qir::dialect::DialectOp;
use qir::dialect::arith::AddF;
use qir::dialect::quantum::{ROTATE_ANGLE, ROTATE_QUBIT, Rotate, defined_by};
use qir::rewrite::{MatchOutcome, PatternRewriter, RewriteError, RewritePattern};
use qir::{OpKind, OpRef};

/// Whether fusion requires both rotations to share an axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisPolicy {
    /// Only fuse rotations about the same axis.
    #[default]
    RequireSame,
    /// Fuse regardless of axis, keeping the second rotation's axis.
    Ignore,
}

/// Fuses a rotation into the rotation that produced its input qubit.
#[derive(Clone, Copy, Debug, Default)]
pub struct FoldRotation {
    axis_policy: AxisPolicy,
}

impl FoldRotation {
    pub fn new(axis_policy: AxisPolicy) -> Self {
        Self { axis_policy }
    }
}

impl RewritePattern for FoldRotation {
    fn root_kind(&self) -> OpKind {
        OpKind::Rotate
    }

    fn name(&self) -> &'static str {
        "fold-rotation"
    }

    fn match_and_rewrite(
        &self,
        op: OpRef,
        rewriter: &mut PatternRewriter<'_>,
    ) -> Result<MatchOutcome, RewriteError> {
        let ctx = rewriter.ctx();
        let Some(op2) = Rotate::from_op(ctx, op) else {
            return Ok(MatchOutcome::NoMatch);
        };
        let Some(op1) = defined_by::<Rotate>(ctx, op2.qubit(ctx)) else {
            return Ok(MatchOutcome::NoMatch);
        };
        let first = op1.op_ref();

        if ctx.parent_region(first) != ctx.parent_region(op) {
            tracing::trace!(%first, %op, "rotations live in different regions");
            return Ok(MatchOutcome::NoMatch);
        }
        if self.axis_policy == AxisPolicy::RequireSame && op1.axis(ctx) != op2.axis(ctx) {
            return Ok(MatchOutcome::NoMatch);
        }
        // Anything else reading the intermediate qubit would be left dangling.
        if ctx.use_count(op1.result(ctx)) != 1 {
            return Ok(MatchOutcome::NoMatch);
        }
        // The sum is placed before op1, so op2's angle must already exist there.
        let second_angle = op2.angle(ctx);
        if !ctx.is_available_at(second_angle, first) {
            tracing::trace!(%first, %op, "second angle defined after the first rotation");
            return Ok(MatchOutcome::NoMatch);
        }

        let location = ctx.op(first).location;
        let first_angle = op1.angle(ctx);
        let input = op1.qubit(ctx);

        let add = rewriter.insert_before(first, AddF::builder(location, first_angle, second_angle));
        let sum = rewriter.ctx().op_result(add, 0);

        let mut update = rewriter.start_root_update(op);
        update.set_operand(ROTATE_ANGLE, sum);
        update.set_operand(ROTATE_QUBIT, input);
        update.finalize();

        rewriter.erase_op(first)?;
        Ok(MatchOutcome::Applied)
    }
}
