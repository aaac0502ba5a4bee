//! PatternRewriter: the only mutation path for an already-built graph.
//!
//! Every mutation goes straight into the [`IrContext`] and is reported to a
//! [`RewriteListener`], so the worklist driver sees each change as it
//! happens. Operand edits on an existing operation are grouped into a
//! [`RootUpdate`] transaction, observed as a single change.

use smallvec::SmallVec;

use super::error::RewriteError;
use super::listener::RewriteListener;
use crate::context::{IrContext, OperationDataBuilder};
use crate::refs::{OpRef, ValueRef};
use crate::walk;

/// Mutation interface handed to a pattern for one application.
pub struct PatternRewriter<'a> {
    ctx: &'a mut IrContext,
    listener: &'a mut dyn RewriteListener,
    mutated: bool,
}

impl<'a> PatternRewriter<'a> {
    pub fn new(ctx: &'a mut IrContext, listener: &'a mut dyn RewriteListener) -> Self {
        Self {
            ctx,
            listener,
            mutated: false,
        }
    }

    /// Read access to the IR.
    pub fn ctx(&self) -> &IrContext {
        &*self.ctx
    }

    /// Whether any mutation has been performed through this rewriter.
    pub fn mutated(&self) -> bool {
        self.mutated
    }

    // === Insertion ===

    /// Build a new operation and insert it immediately before `anchor`.
    pub fn insert_before(&mut self, anchor: OpRef, builder: OperationDataBuilder) -> OpRef {
        let data = builder.build(self.ctx);
        let op = self.ctx.create_op(data);
        self.ctx.insert_op_before(anchor, op);
        self.mutated = true;
        self.listener.op_inserted(self.ctx, op);
        op
    }

    // === In-place update ===

    /// Open a root-update transaction on `op`.
    pub fn start_root_update(&mut self, op: OpRef) -> RootUpdate<'_, 'a> {
        assert!(
            self.ctx.is_live(op),
            "start_root_update: operation {op} has been erased"
        );
        RootUpdate {
            rewriter: self,
            op,
            saved: SmallVec::new(),
            open: true,
        }
    }

    /// Replace one operand as a single-step root update.
    pub fn set_operand(&mut self, op: OpRef, index: usize, value: ValueRef) {
        let mut update = self.start_root_update(op);
        update.set_operand(index, value);
        update.finalize();
    }

    // === Replacement and erasure ===

    /// Redirect every use of `old` to `new`.
    pub fn replace_all_uses_with(&mut self, old: ValueRef, new: ValueRef) {
        if old == new {
            return;
        }
        let mut users: SmallVec<[OpRef; 4]> = SmallVec::new();
        for u in self.ctx.uses(old) {
            if !users.contains(&u.user) {
                users.push(u.user);
            }
        }
        if users.is_empty() {
            return;
        }
        self.ctx.replace_all_uses(old, new);
        self.mutated = true;
        self.listener.uses_replaced(self.ctx, old, &users);
    }

    /// Erase `op` together with everything nested in its regions.
    ///
    /// Fails without touching the IR if any result of `op` is still used.
    pub fn erase_op(&mut self, op: OpRef) -> Result<(), RewriteError> {
        assert!(
            self.ctx.is_live(op),
            "erase_op: operation {op} has already been erased"
        );
        let uses = self.ctx.result_use_count(op);
        if uses > 0 {
            return Err(RewriteError::EraseWithLiveUses {
                op,
                kind: self.ctx.op_kind(op),
                uses,
            });
        }
        for nested in walk::collect_nested_ops(self.ctx, op) {
            self.listener.op_erasing(self.ctx, nested);
        }
        self.listener.op_erasing(self.ctx, op);
        self.ctx.erase_op(op);
        self.mutated = true;
        Ok(())
    }

    /// Replace each result of `op` with the matching value, then erase `op`.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have one entry per result.
    pub fn replace_op_with_values(
        &mut self,
        op: OpRef,
        values: &[ValueRef],
    ) -> Result<(), RewriteError> {
        let results: SmallVec<[ValueRef; 2]> = self.ctx.op_results(op).into();
        assert_eq!(
            results.len(),
            values.len(),
            "replace_op_with_values: {op} has {} result(s), got {} replacement(s)",
            results.len(),
            values.len(),
        );
        for (&old, &new) in results.iter().zip(values) {
            self.replace_all_uses_with(old, new);
        }
        self.erase_op(op)
    }
}

/// An open root-update transaction on one operation.
///
/// Operand edits apply immediately, so the transaction's own reads see them,
/// but the listener hears about them only once, on [`finalize`](Self::finalize).
/// [`cancel`](Self::cancel) restores every touched operand. Dropping an open
/// transaction finalizes it, except while unwinding from a panic, where it
/// rolls back.
pub struct RootUpdate<'r, 'a> {
    rewriter: &'r mut PatternRewriter<'a>,
    op: OpRef,
    /// Original value of each touched operand slot.
    saved: SmallVec<[(usize, ValueRef); 2]>,
    open: bool,
}

impl RootUpdate<'_, '_> {
    pub fn op(&self) -> OpRef {
        self.op
    }

    pub fn ctx(&self) -> &IrContext {
        &*self.rewriter.ctx
    }

    pub fn set_operand(&mut self, index: usize, value: ValueRef) {
        let ctx = &mut *self.rewriter.ctx;
        let old = ctx.op_operand(self.op, index);
        if !self.saved.iter().any(|&(i, _)| i == index) {
            self.saved.push((index, old));
        }
        ctx.set_operand(self.op, index, value);
    }

    /// Commit, notifying the listener once if any operand actually changed.
    pub fn finalize(mut self) {
        self.commit();
    }

    /// Roll every touched operand back to its original value.
    pub fn cancel(mut self) {
        self.rollback();
    }

    fn commit(&mut self) {
        self.open = false;
        let ctx = &*self.rewriter.ctx;
        let changed = self
            .saved
            .iter()
            .any(|&(i, old)| ctx.op_operand(self.op, i) != old);
        if changed {
            self.rewriter.mutated = true;
            self.rewriter.listener.op_root_updated(self.rewriter.ctx, self.op);
        }
    }

    fn rollback(&mut self) {
        self.open = false;
        for (index, old) in self.saved.drain(..).rev() {
            self.rewriter.ctx.set_operand(self.op, index, old);
        }
    }
}

impl Drop for RootUpdate<'_, '_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        if std::thread::panicking() {
            self.rollback();
        } else {
            self.commit();
        }
    }
}
