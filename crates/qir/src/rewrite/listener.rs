//! Change notifications emitted by the rewriter.

use crate::context::IrContext;
use crate::refs::{OpRef, ValueRef};

/// Observer of IR mutations performed through a
/// [`PatternRewriter`](super::PatternRewriter).
///
/// Every callback runs while the IR is consistent: after an insertion or a
/// committed root update, and before an erasure (so operands of the doomed
/// operation can still be read).
pub trait RewriteListener {
    fn op_inserted(&mut self, _ctx: &IrContext, _op: OpRef) {}

    /// A root-update transaction on `op` committed with at least one change.
    fn op_root_updated(&mut self, _ctx: &IrContext, _op: OpRef) {}

    /// `op` is about to be erased. Called for nested operations too.
    fn op_erasing(&mut self, _ctx: &IrContext, _op: OpRef) {}

    /// Every use of `old` was redirected; `users` are the rewired operations.
    fn uses_replaced(&mut self, _ctx: &IrContext, _old: ValueRef, _users: &[OpRef]) {}
}

/// Listener that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl RewriteListener for NoopListener {}
