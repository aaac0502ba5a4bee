//! Structural validation of the IR under a root operation.
//!
//! Two checks:
//!
//! 1. **Dominance**: every operand is available where it is used, i.e.
//!    defined by an earlier live operation of an enclosing block, or an
//!    argument of an enclosing block.
//!
//! 2. **Use-chain consistency**: the use-chain stored in `IrContext`
//!    exactly matches the actual operands of every operation, one entry per
//!    operand slot.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::ControlFlow;

use crate::context::IrContext;
use crate::refs::{OpRef, ValueDef, ValueRef};
use crate::walk::{self, WalkAction};

/// An operand that is not available at its user.
pub struct DominanceError {
    pub user: OpRef,
    pub operand_index: usize,
    pub description: String,
}

impl fmt::Display for DominanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "operand #{} of {} references {}",
            self.operand_index, self.user, self.description
        )
    }
}

/// Describes a use-chain inconsistency.
pub struct UseChainError {
    pub message: String,
}

impl fmt::Display for UseChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of validation.
#[derive(Default)]
pub struct ValidationResult {
    pub dominance_errors: Vec<DominanceError>,
    pub use_chain_errors: Vec<UseChainError>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.dominance_errors.is_empty() && self.use_chain_errors.is_empty()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return write!(f, "validation passed");
        }
        if !self.dominance_errors.is_empty() {
            writeln!(
                f,
                "{} unavailable operand(s) found:",
                self.dominance_errors.len()
            )?;
            for err in &self.dominance_errors {
                writeln!(f, "  - {err}")?;
            }
        }
        if !self.use_chain_errors.is_empty() {
            writeln!(
                f,
                "{} use-chain error(s) found:",
                self.use_chain_errors.len()
            )?;
            for err in &self.use_chain_errors {
                writeln!(f, "  - {err}")?;
            }
        }
        Ok(())
    }
}

fn describe_value(ctx: &IrContext, v: ValueRef) -> String {
    match ctx.value_def(v) {
        ValueDef::OpResult(op, idx) if ctx.is_live(op) => {
            format!("{v} (result #{idx} of {op}, {})", ctx.op_kind(op))
        }
        ValueDef::OpResult(op, idx) => format!("{v} (result #{idx} of erased {op})"),
        ValueDef::BlockArg(block, idx) => format!("{v} (arg #{idx} of {block})"),
    }
}

// ============================================================================
// Dominance
// ============================================================================

/// Check that every operand nested under `root` is available at its user.
pub fn validate_dominance(ctx: &IrContext, root: OpRef) -> ValidationResult {
    let mut errors = Vec::new();
    let _ = walk::walk_nested::<()>(ctx, root, &mut |op| {
        for (idx, &operand) in ctx.op_operands(op).iter().enumerate() {
            if !ctx.is_available_at(operand, op) {
                errors.push(DominanceError {
                    user: op,
                    operand_index: idx,
                    description: describe_value(ctx, operand),
                });
            }
        }
        ControlFlow::Continue(WalkAction::Advance)
    });
    ValidationResult {
        dominance_errors: errors,
        use_chain_errors: vec![],
    }
}

// ============================================================================
// Use-chain consistency
// ============================================================================

/// Validate that the use-chain stored in `IrContext` matches the actual operands.
///
/// Checks three things:
/// 1. For every operand of every op, there must be a corresponding entry in `uses(operand)`.
/// 2. For every use in the use-chain, the referenced op must be live and its
///    operand must point back.
/// 3. The use count of every value equals the number of operand slots
///    referencing it, so duplicate entries are caught.
pub fn validate_use_chains(ctx: &IrContext, root: OpRef) -> ValidationResult {
    let mut errors = Vec::new();

    let mut actual_uses: HashSet<(ValueRef, OpRef, u32)> = HashSet::new();
    let mut slot_counts: HashMap<ValueRef, usize> = HashMap::new();
    let mut checked_values: HashSet<ValueRef> = HashSet::new();
    let _ = walk::walk_op::<()>(ctx, root, &mut |op| {
        for (idx, &operand) in ctx.op_operands(op).iter().enumerate() {
            actual_uses.insert((operand, op, idx as u32));
            *slot_counts.entry(operand).or_default() += 1;
            checked_values.insert(operand);
        }
        checked_values.extend(ctx.op_results(op).iter().copied());
        for &region in &ctx.op(op).regions {
            for &block in &ctx.region(region).blocks {
                checked_values.extend(ctx.block_args(block).iter().copied());
            }
        }
        ControlFlow::Continue(WalkAction::Advance)
    });

    // Direction 1: actual operand -> use-chain entry must exist
    for &(val, op, idx) in &actual_uses {
        let found = ctx
            .uses(val)
            .iter()
            .any(|u| u.user == op && u.operand_index == idx);
        if !found {
            errors.push(UseChainError {
                message: format!(
                    "operand #{idx} of {op} ({}) uses {val} but no use-chain entry exists",
                    ctx.op_kind(op),
                ),
            });
        }
    }

    // Direction 2: use-chain entry -> actual operand must exist
    for &val in &checked_values {
        for u in ctx.uses(val) {
            if !ctx.is_live(u.user) {
                errors.push(UseChainError {
                    message: format!(
                        "use-chain entry for {val} claims use by erased {}",
                        u.user
                    ),
                });
            } else if !actual_uses.contains(&(val, u.user, u.operand_index)) {
                errors.push(UseChainError {
                    message: format!(
                        "use-chain entry for {val} claims use by {} operand #{}, \
                         but no such operand exists",
                        u.user, u.operand_index,
                    ),
                });
            }
        }

        // Direction 3: one entry per operand slot
        let slots = slot_counts.get(&val).copied().unwrap_or(0);
        let count = ctx.use_count(val);
        if count != slots {
            errors.push(UseChainError {
                message: format!(
                    "use count of {val} is {count} but {slots} operand slot(s) reference it"
                ),
            });
        }
    }

    ValidationResult {
        dominance_errors: vec![],
        use_chain_errors: errors,
    }
}

/// Run both validations and combine results.
pub fn validate_all(ctx: &IrContext, root: OpRef) -> ValidationResult {
    let dominance = validate_dominance(ctx, root);
    let uses = validate_use_chains(ctx, root);
    ValidationResult {
        dominance_errors: dominance.dominance_errors,
        use_chain_errors: uses.use_chain_errors,
    }
}

/// Debug-only validation that panics on any error.
///
/// Only runs under `cfg!(debug_assertions)`. Useful for checkpoints after
/// a pass.
pub fn debug_assert_valid(ctx: &IrContext, root: OpRef, pass_name: &str) {
    if !cfg!(debug_assertions) {
        return;
    }
    let result = validate_all(ctx, root);
    if !result.is_ok() {
        panic!("IR validation failed after `{pass_name}`:\n{result}");
    }
}
