//! Greedy worklist driver.
//!
//! Applies a [`FrozenPatternSet`] to every operation nested under a root
//! until nothing changes. Rewrites are observed through the
//! [`RewriteListener`] interface, so the operations they touch are
//! re-examined right away instead of on the next sweep.
//!
//! A sweep seeds the worklist with every live operation in pre-order and
//! drains it. Sweeps repeat while the previous one changed something, so a
//! converged run always ends with one sweep that changed nothing.
//!
//! When the rewrite budget runs out, a stale worklist entry does not mean
//! there is work left. The driver replays one sweep on a copy of the
//! context and only reports [`DriverStatus::RewriteLimit`] if that copy
//! still changes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cranelift_entity::SecondaryMap;

use super::error::RewriteError;
use super::listener::{NoopListener, RewriteListener};
use super::pattern::MatchOutcome;
use super::pattern_set::FrozenPatternSet;
use super::rewriter::PatternRewriter;
use crate::context::IrContext;
use crate::fold;
use crate::refs::{OpRef, ValueRef};
use crate::validation;
use crate::walk;

// ============================================================================
// Configuration
// ============================================================================

/// Applications allowed per seeded operation in one sweep when
/// [`DriverConfig::max_rewrites`] is `None`.
pub const SWEEP_REWRITE_FACTOR: usize = 32;

/// Cooperative cancellation shared with the host.
///
/// The driver only looks at the flag between two applications, never in the
/// middle of one.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds and switches for one driver run.
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Maximum number of sweeps over the root.
    pub max_iterations: usize,
    /// Maximum number of applied rewrites, folds and dead-op removals included.
    ///
    /// With `None` each sweep stops after [`SWEEP_REWRITE_FACTOR`]
    /// applications per seeded operation, so `max_iterations` still bounds
    /// the run.
    pub max_rewrites: Option<usize>,
    /// Fold constant arithmetic before trying patterns.
    pub fold: bool,
    /// Erase side-effect free operations whose results are unused.
    pub remove_dead_ops: bool,
    /// Check use-chains and dominance after every application.
    pub verify_each_rewrite: bool,
    pub cancel: Option<CancelFlag>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_rewrites: Some(10_000),
            fold: true,
            remove_dead_ops: true,
            verify_each_rewrite: false,
            cancel: None,
        }
    }
}

impl DriverConfig {
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_max_rewrites(mut self, n: Option<usize>) -> Self {
        self.max_rewrites = n;
        self
    }

    pub fn with_fold(mut self, fold: bool) -> Self {
        self.fold = fold;
        self
    }

    pub fn with_remove_dead_ops(mut self, remove: bool) -> Self {
        self.remove_dead_ops = remove;
        self
    }

    pub fn with_verify_each_rewrite(mut self, verify: bool) -> Self {
        self.verify_each_rewrite = verify;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// How a driver run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverStatus {
    /// A full sweep found nothing to do.
    Converged,
    /// `max_iterations` sweeps all made changes.
    IterationLimit,
    /// The rewrite budget ran out while some operation could still be rewritten.
    RewriteLimit,
    /// The cancel flag was raised.
    Cancelled,
}

/// Result of a driver run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriverOutcome {
    pub status: DriverStatus,
    /// Number of sweeps performed.
    pub iterations: usize,
    /// Total number of applications.
    pub rewrites: usize,
}

impl DriverOutcome {
    pub fn converged(&self) -> bool {
        self.status == DriverStatus::Converged
    }
}

// ============================================================================
// Worklist
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OpState {
    /// Never seen by this run.
    #[default]
    Untracked,
    Queued,
    InProgress,
    Settled,
    Erased,
}

/// LIFO worklist with per-operation state.
///
/// An operation may sit on the stack more than once; only an entry popped
/// while the state is `Queued` is dispatched.
struct Worklist {
    stack: Vec<OpRef>,
    state: SecondaryMap<OpRef, OpState>,
}

impl Worklist {
    fn new() -> Self {
        Self {
            stack: Vec::new(),
            state: SecondaryMap::new(),
        }
    }

    fn push(&mut self, op: OpRef) {
        if self.state[op] == OpState::Erased {
            return;
        }
        self.state[op] = OpState::Queued;
        self.stack.push(op);
        tracing::trace!(%op, "queued");
    }

    fn push_definer(&mut self, ctx: &IrContext, value: ValueRef) {
        if let Some(def) = ctx.defining_op(value)
            && ctx.is_live(def)
        {
            self.push(def);
        }
    }

    fn pop(&mut self) -> Option<OpRef> {
        while let Some(op) = self.stack.pop() {
            if self.state[op] == OpState::Queued {
                return Some(op);
            }
        }
        None
    }

    fn has_pending(&self) -> bool {
        self.stack.iter().any(|&op| self.state[op] == OpState::Queued)
    }
}

impl RewriteListener for Worklist {
    fn op_inserted(&mut self, _ctx: &IrContext, op: OpRef) {
        self.push(op);
    }

    fn op_root_updated(&mut self, ctx: &IrContext, op: OpRef) {
        self.push(op);
        for user in ctx.users(op) {
            self.push(user);
        }
    }

    fn op_erasing(&mut self, ctx: &IrContext, op: OpRef) {
        self.state[op] = OpState::Erased;
        for &operand in ctx.op_operands(op) {
            self.push_definer(ctx, operand);
        }
    }

    fn uses_replaced(&mut self, ctx: &IrContext, old: ValueRef, users: &[OpRef]) {
        for &user in users {
            self.push(user);
        }
        self.push_definer(ctx, old);
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Apply `patterns` to every operation nested under `root` until fixpoint.
///
/// `root` itself is never dispatched. Reaching a bound is reported through
/// [`DriverStatus`]; an `Err` means a rewrite contract was broken and the
/// IR may be in any state.
pub fn apply_patterns_greedily(
    ctx: &mut IrContext,
    root: OpRef,
    patterns: &FrozenPatternSet,
    config: &DriverConfig,
) -> Result<DriverOutcome, RewriteError> {
    let mut driver = GreedyRewriteDriver {
        patterns,
        config,
        worklist: Worklist::new(),
        rewrites: 0,
    };
    driver.run(ctx, root)
}

struct GreedyRewriteDriver<'p> {
    patterns: &'p FrozenPatternSet,
    config: &'p DriverConfig,
    worklist: Worklist,
    rewrites: usize,
}

/// What stopped a sweep early.
enum Interrupt {
    RewriteLimit,
    /// The budget ran out exactly at the fixpoint.
    Settled,
    Cancelled,
}

impl GreedyRewriteDriver<'_> {
    fn run(&mut self, ctx: &mut IrContext, root: OpRef) -> Result<DriverOutcome, RewriteError> {
        let mut iterations = 0;
        while iterations < self.config.max_iterations {
            iterations += 1;
            let before = self.rewrites;
            if let Some(interrupt) = self.sweep(ctx, root)? {
                let status = match interrupt {
                    Interrupt::RewriteLimit => {
                        tracing::warn!(rewrites = self.rewrites, "rewrite limit reached");
                        DriverStatus::RewriteLimit
                    }
                    Interrupt::Settled => DriverStatus::Converged,
                    Interrupt::Cancelled => DriverStatus::Cancelled,
                };
                return Ok(self.outcome(status, iterations));
            }
            let changes = self.rewrites - before;
            tracing::debug!(iteration = iterations, changes, "sweep finished");
            if changes == 0 {
                return Ok(self.outcome(DriverStatus::Converged, iterations));
            }
        }
        tracing::warn!(
            iterations,
            rewrites = self.rewrites,
            "no fixpoint within the iteration limit"
        );
        Ok(self.outcome(DriverStatus::IterationLimit, iterations))
    }

    fn outcome(&self, status: DriverStatus, iterations: usize) -> DriverOutcome {
        DriverOutcome {
            status,
            iterations,
            rewrites: self.rewrites,
        }
    }

    fn sweep(&mut self, ctx: &mut IrContext, root: OpRef) -> Result<Option<Interrupt>, RewriteError> {
        let seeded = walk::collect_nested_ops(ctx, root);
        let sweep_cap = match self.config.max_rewrites {
            Some(_) => None,
            None => Some(seeded.len().max(1) * SWEEP_REWRITE_FACTOR),
        };
        let start = self.rewrites;
        for op in seeded.into_iter().rev() {
            self.worklist.push(op);
        }

        loop {
            if self.config.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                tracing::debug!("cancelled");
                return Ok(Some(Interrupt::Cancelled));
            }
            if self
                .config
                .max_rewrites
                .is_some_and(|max| self.rewrites >= max)
            {
                if !self.worklist.has_pending() {
                    return Ok(None);
                }
                return Ok(Some(if self.would_change(ctx, root)? {
                    Interrupt::RewriteLimit
                } else {
                    Interrupt::Settled
                }));
            }
            if sweep_cap.is_some_and(|cap| self.rewrites - start >= cap) {
                tracing::debug!(rewrites = self.rewrites - start, "sweep cap reached");
                self.worklist.stack.clear();
                return Ok(None);
            }
            let Some(op) = self.worklist.pop() else {
                return Ok(None);
            };
            if !ctx.is_live(op) {
                return Err(RewriteError::StaleDispatch { op });
            }

            self.worklist.state[op] = OpState::InProgress;
            let applied = dispatch(self.patterns, self.config, ctx, &mut self.worklist, op)?;
            if self.worklist.state[op] == OpState::InProgress {
                self.worklist.state[op] = OpState::Settled;
            }

            if let Some(name) = applied {
                self.rewrites += 1;
                if self.config.verify_each_rewrite {
                    let result = validation::validate_all(ctx, root);
                    if !result.is_ok() {
                        return Err(RewriteError::CorruptUseChain {
                            pattern: name,
                            details: result.to_string(),
                        });
                    }
                }
            }
        }
    }

    /// Whether one more sweep would change anything.
    ///
    /// Runs on a copy of `ctx` and stops at the first application.
    fn would_change(&self, ctx: &IrContext, root: OpRef) -> Result<bool, RewriteError> {
        tracing::trace!("replaying a sweep on a copy of the IR");
        let mut scratch = ctx.clone();
        let mut listener = NoopListener;
        for op in walk::collect_nested_ops(&scratch, root) {
            if dispatch(self.patterns, self.config, &mut scratch, &mut listener, op)?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Try dead-op removal, folding, then patterns on `op`.
///
/// Returns the name of whatever changed the IR.
fn dispatch(
    patterns: &FrozenPatternSet,
    config: &DriverConfig,
    ctx: &mut IrContext,
    listener: &mut dyn RewriteListener,
    op: OpRef,
) -> Result<Option<&'static str>, RewriteError> {
    let kind = ctx.op_kind(op);

    if config.remove_dead_ops && kind.is_pure() && ctx.result_use_count(op) == 0 {
        let mut rewriter = PatternRewriter::new(ctx, &mut *listener);
        rewriter.erase_op(op)?;
        tracing::debug!(%op, %kind, "erased dead operation");
        return Ok(Some("dead-op-removal"));
    }

    if config.fold {
        let mut rewriter = PatternRewriter::new(ctx, &mut *listener);
        if fold::try_fold(&mut rewriter, op)? {
            tracing::debug!(%op, %kind, "folded");
            return Ok(Some("constant-folding"));
        }
    }

    for pattern in patterns.patterns_for(kind) {
        let mut rewriter = PatternRewriter::new(ctx, &mut *listener);
        let outcome = pattern.match_and_rewrite(op, &mut rewriter)?;
        let mutated = rewriter.mutated();
        match outcome {
            MatchOutcome::Applied if mutated => {
                tracing::debug!(pattern = pattern.name(), %op, %kind, "applied");
                return Ok(Some(pattern.name()));
            }
            MatchOutcome::NoMatch if mutated => {
                return Err(RewriteError::MutatedWithoutMatch {
                    pattern: pattern.name(),
                    op,
                });
            }
            _ => {
                tracing::trace!(pattern = pattern.name(), %op, "no match");
            }
        }
    }
    Ok(None)
}
