//! Behavior of the greedy worklist driver with small synthetic patterns.

use std::cell::RefCell;
use std::rc::Rc;

use qir::builder::build_func;
use qir::dialect::func::Func;
use qir::dialect::quantum::{self, gate_input};
use qir::printer::print_op;
use qir::rewrite::{
    CancelFlag, DriverConfig, DriverStatus, MatchOutcome, PatternBenefit, PatternRewriter,
    RewriteError, RewritePattern, RewritePatternSet, SWEEP_REWRITE_FACTOR,
    apply_patterns_greedily,
};
use qir::validation::validate_all;
use qir::{DialectOp, IrContext, OpKind, OpRef};

/// Rewrites one single-qubit gate kind into another.
struct Retarget {
    name: &'static str,
    from: OpKind,
    to: OpKind,
    benefit: u16,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl RewritePattern for Retarget {
    fn root_kind(&self) -> OpKind {
        self.from
    }

    fn benefit(&self) -> PatternBenefit {
        PatternBenefit(self.benefit)
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn match_and_rewrite(
        &self,
        op: OpRef,
        rewriter: &mut PatternRewriter<'_>,
    ) -> Result<MatchOutcome, RewriteError> {
        let ctx = rewriter.ctx();
        let location = ctx.op(op).location;
        let input = gate_input(ctx, op);
        let new_op = rewriter.insert_before(op, quantum::gate_builder(location, self.to, input));
        let result = rewriter.ctx().op_result(new_op, 0);
        rewriter.replace_op_with_values(op, &[result])?;
        self.log.borrow_mut().push(self.name);
        Ok(MatchOutcome::Applied)
    }
}

fn retarget(
    name: &'static str,
    from: OpKind,
    to: OpKind,
    benefit: u16,
    log: &Rc<RefCell<Vec<&'static str>>>,
) -> Retarget {
    Retarget {
        name,
        from,
        to,
        benefit,
        log: Rc::clone(log),
    }
}

/// `q = alloc; q = h q; return q`
fn single_h(ctx: &mut IrContext) -> Func {
    build_func(ctx, "main", &[], |b, _| {
        let q = b.alloc();
        let q = b.h(q);
        b.ret(&[q]);
    })
    .0
}

#[test]
fn higher_benefit_pattern_wins() {
    let mut ctx = IrContext::new();
    let f = single_h(&mut ctx);
    let log = Rc::new(RefCell::new(Vec::new()));
    let patterns = RewritePatternSet::new()
        .add(retarget("h-to-x", OpKind::Hadamard, OpKind::PauliX, 1, &log))
        .add(retarget("h-to-z", OpKind::Hadamard, OpKind::PauliZ, 2, &log))
        .freeze();

    let outcome =
        apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &DriverConfig::default()).unwrap();

    assert_eq!(outcome.status, DriverStatus::Converged);
    assert_eq!(outcome.rewrites, 1);
    assert_eq!(*log.borrow(), ["h-to-z"]);
    insta::assert_snapshot!(print_op(&ctx, f.op_ref()), @r"
    func.func @main() {
      %0 = quantum.alloc : qubit
      %1 = quantum.z %0 : qubit
      func.return %1
    }
    ");
}

#[test]
fn equal_benefit_keeps_declaration_order() {
    let mut ctx = IrContext::new();
    let f = single_h(&mut ctx);
    let log = Rc::new(RefCell::new(Vec::new()));
    let patterns = RewritePatternSet::new()
        .add(retarget("h-to-x", OpKind::Hadamard, OpKind::PauliX, 1, &log))
        .add(retarget("h-to-z", OpKind::Hadamard, OpKind::PauliZ, 1, &log))
        .freeze();

    apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &DriverConfig::default()).unwrap();
    assert_eq!(*log.borrow(), ["h-to-x"]);
}

#[test]
fn oscillating_patterns_stop_at_rewrite_limit() {
    let mut ctx = IrContext::new();
    let f = single_h(&mut ctx);
    let log = Rc::new(RefCell::new(Vec::new()));
    let patterns = RewritePatternSet::new()
        .add(retarget("h-to-x", OpKind::Hadamard, OpKind::PauliX, 1, &log))
        .add(retarget("x-to-h", OpKind::PauliX, OpKind::Hadamard, 1, &log))
        .freeze();
    let config = DriverConfig::default()
        .with_max_iterations(100)
        .with_max_rewrites(Some(25));

    let outcome = apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &config).unwrap();

    assert_eq!(outcome.status, DriverStatus::RewriteLimit);
    assert_eq!(outcome.rewrites, 25);
    assert_eq!(outcome.iterations, 1);
    // The graph is still well formed when the driver gives up.
    assert!(validate_all(&ctx, f.op_ref()).is_ok());
}

#[test]
fn oscillating_patterns_without_rewrite_limit_stop_at_iteration_limit() {
    let mut ctx = IrContext::new();
    let f = single_h(&mut ctx);
    let log = Rc::new(RefCell::new(Vec::new()));
    let patterns = RewritePatternSet::new()
        .add(retarget("h-to-x", OpKind::Hadamard, OpKind::PauliX, 1, &log))
        .add(retarget("x-to-h", OpKind::PauliX, OpKind::Hadamard, 1, &log))
        .freeze();
    let config = DriverConfig::default()
        .with_max_iterations(3)
        .with_max_rewrites(None);

    let outcome = apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &config).unwrap();

    assert_eq!(outcome.status, DriverStatus::IterationLimit);
    assert_eq!(outcome.iterations, 3);
    // alloc, the gate and the return are seeded in every sweep.
    assert_eq!(outcome.rewrites, 3 * 3 * SWEEP_REWRITE_FACTOR);
    assert!(validate_all(&ctx, f.op_ref()).is_ok());
}

#[test]
fn budget_spent_on_the_last_rewrite_still_converges() {
    let mut ctx = IrContext::new();
    let f = single_h(&mut ctx);
    let log = Rc::new(RefCell::new(Vec::new()));
    let patterns = RewritePatternSet::new()
        .add(retarget("h-to-z", OpKind::Hadamard, OpKind::PauliZ, 1, &log))
        .freeze();
    let config = DriverConfig::default().with_max_rewrites(Some(1));

    let outcome = apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &config).unwrap();

    assert_eq!(outcome.status, DriverStatus::Converged);
    assert_eq!(outcome.rewrites, 1);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(*log.borrow(), ["h-to-z"]);
    insta::assert_snapshot!(print_op(&ctx, f.op_ref()), @r"
    func.func @main() {
      %0 = quantum.alloc : qubit
      %1 = quantum.z %0 : qubit
      func.return %1
    }
    ");
}

#[test]
fn iteration_limit_is_reported_when_last_sweep_changed_something() {
    let mut ctx = IrContext::new();
    let f = single_h(&mut ctx);
    let log = Rc::new(RefCell::new(Vec::new()));
    let patterns = RewritePatternSet::new()
        .add(retarget("h-to-z", OpKind::Hadamard, OpKind::PauliZ, 1, &log))
        .freeze();
    let config = DriverConfig::default().with_max_iterations(1);

    let outcome = apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &config).unwrap();

    assert_eq!(outcome.status, DriverStatus::IterationLimit);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.rewrites, 1);
}

#[test]
fn settled_graph_is_a_fixpoint() {
    let mut ctx = IrContext::new();
    let f = single_h(&mut ctx);
    let log = Rc::new(RefCell::new(Vec::new()));
    let patterns = RewritePatternSet::new()
        .add(retarget("h-to-z", OpKind::Hadamard, OpKind::PauliZ, 1, &log))
        .freeze();
    let config = DriverConfig::default();

    let first = apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &config).unwrap();
    assert_eq!(first.iterations, 2);
    let printed = print_op(&ctx, f.op_ref());

    let second = apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &config).unwrap();
    assert_eq!(second.status, DriverStatus::Converged);
    assert_eq!(second.iterations, 1);
    assert_eq!(second.rewrites, 0);
    assert_eq!(print_op(&ctx, f.op_ref()), printed);
}

/// Erases the operation following its root when that is an unused constant.
struct EraseNextConst {
    visited: Rc<RefCell<Vec<(OpRef, bool)>>>,
}

impl RewritePattern for EraseNextConst {
    fn root_kind(&self) -> OpKind {
        OpKind::ConstF
    }

    fn match_and_rewrite(
        &self,
        op: OpRef,
        rewriter: &mut PatternRewriter<'_>,
    ) -> Result<MatchOutcome, RewriteError> {
        let ctx = rewriter.ctx();
        self.visited.borrow_mut().push((op, ctx.is_live(op)));
        let Some(block) = ctx.op(op).parent_block else {
            return Ok(MatchOutcome::NoMatch);
        };
        let ops = &ctx.block(block).ops;
        let Some(pos) = ops.iter().position(|&o| o == op) else {
            return Ok(MatchOutcome::NoMatch);
        };
        let Some(&next) = ops.get(pos + 1) else {
            return Ok(MatchOutcome::NoMatch);
        };
        if ctx.op_kind(next) != OpKind::ConstF || ctx.result_use_count(next) != 0 {
            return Ok(MatchOutcome::NoMatch);
        }
        rewriter.erase_op(next)?;
        Ok(MatchOutcome::Applied)
    }
}

#[test]
fn erased_operations_are_never_dispatched() {
    let mut ctx = IrContext::new();
    let (f, consts) = build_func(&mut ctx, "main", &[], |b, _| {
        let consts: Vec<_> = (0..4).map(|i| b.constf(i as f64)).collect();
        b.ret(&[]);
        consts
    });
    let const_ops: Vec<OpRef> = consts
        .iter()
        .map(|&v| ctx.defining_op(v).unwrap())
        .collect();
    let visited = Rc::new(RefCell::new(Vec::new()));
    let patterns = RewritePatternSet::new()
        .add(EraseNextConst {
            visited: Rc::clone(&visited),
        })
        .freeze();
    let config = DriverConfig::default().with_remove_dead_ops(false);

    let outcome = apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &config).unwrap();

    assert!(outcome.converged());
    assert_eq!(outcome.rewrites, 3);
    assert!(visited.borrow().iter().all(|&(_, live)| live));
    let seen: Vec<OpRef> = visited.borrow().iter().map(|&(op, _)| op).collect();
    assert!(!seen.contains(&const_ops[1]));
    assert!(!seen.contains(&const_ops[3]));
    assert!(ctx.is_live(const_ops[0]));
    assert!(const_ops[1..].iter().all(|&op| !ctx.is_live(op)));
}

/// Inserts an operation and then claims it did not match.
struct Liar;

impl RewritePattern for Liar {
    fn root_kind(&self) -> OpKind {
        OpKind::Hadamard
    }

    fn name(&self) -> &'static str {
        "liar"
    }

    fn match_and_rewrite(
        &self,
        op: OpRef,
        rewriter: &mut PatternRewriter<'_>,
    ) -> Result<MatchOutcome, RewriteError> {
        let location = rewriter.ctx().op(op).location;
        rewriter.insert_before(op, qir::dialect::arith::ConstF::builder(location, 1.0));
        Ok(MatchOutcome::NoMatch)
    }
}

#[test]
fn mutation_without_match_aborts() {
    let mut ctx = IrContext::new();
    let f = single_h(&mut ctx);
    let h = qir::walk::collect_nested_ops(&ctx, f.op_ref())
        .into_iter()
        .find(|&op| ctx.op_kind(op) == OpKind::Hadamard)
        .unwrap();
    let patterns = RewritePatternSet::new().add(Liar).freeze();

    let err = apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &DriverConfig::default())
        .unwrap_err();
    assert_eq!(
        err,
        RewriteError::MutatedWithoutMatch {
            pattern: "liar",
            op: h
        }
    );
}

/// Erases its root without redirecting the uses first.
struct EraseInPlace;

impl RewritePattern for EraseInPlace {
    fn root_kind(&self) -> OpKind {
        OpKind::Hadamard
    }

    fn match_and_rewrite(
        &self,
        op: OpRef,
        rewriter: &mut PatternRewriter<'_>,
    ) -> Result<MatchOutcome, RewriteError> {
        rewriter.erase_op(op)?;
        Ok(MatchOutcome::Applied)
    }
}

#[test]
fn erasing_a_used_operation_is_a_contract_violation() {
    let mut ctx = IrContext::new();
    let f = single_h(&mut ctx);
    let patterns = RewritePatternSet::new().add(EraseInPlace).freeze();

    let err = apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &DriverConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        RewriteError::EraseWithLiveUses {
            kind: OpKind::Hadamard,
            uses: 1,
            ..
        }
    ));
    assert!(validate_all(&ctx, f.op_ref()).is_ok());
}

#[test]
fn raised_cancel_flag_stops_before_any_rewrite() {
    let mut ctx = IrContext::new();
    let f = single_h(&mut ctx);
    let log = Rc::new(RefCell::new(Vec::new()));
    let patterns = RewritePatternSet::new()
        .add(retarget("h-to-z", OpKind::Hadamard, OpKind::PauliZ, 1, &log))
        .freeze();
    let cancel = CancelFlag::new();
    cancel.cancel();
    let config = DriverConfig::default().with_cancel(cancel);

    let outcome = apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &config).unwrap();

    assert_eq!(outcome.status, DriverStatus::Cancelled);
    assert_eq!(outcome.rewrites, 0);
    assert!(log.borrow().is_empty());
}

#[test]
fn constants_fold_and_dead_arithmetic_disappears() {
    let mut ctx = IrContext::new();
    let (f, _) = build_func(&mut ctx, "main", &[], |b, _| {
        let q = b.alloc();
        let a = b.constf(0.25);
        let c = b.constf(0.5);
        let sum = b.addf(a, c);
        let unused = b.constf(9.0);
        b.addf(unused, unused);
        let q = b.rotate(qir::Axis::Y, sum, q);
        b.ret(&[q]);
    });
    let patterns = RewritePatternSet::new().freeze();
    let config = DriverConfig::default().with_verify_each_rewrite(true);

    let outcome = apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &config).unwrap();

    assert!(outcome.converged());
    insta::assert_snapshot!(print_op(&ctx, f.op_ref()), @r"
    func.func @main() {
      %0 = quantum.alloc : qubit
      %1 = arith.constf {value = 0.75} : f64
      %2 = quantum.rotate %1, %0 {axis = y} : qubit
      func.return %2
    }
    ");
}

#[test]
fn gates_are_not_removed_as_dead() {
    let mut ctx = IrContext::new();
    let (f, _) = build_func(&mut ctx, "main", &[], |b, _| {
        let q = b.alloc();
        b.h(q);
        b.ret(&[]);
    });
    let patterns = RewritePatternSet::new().freeze();

    let outcome =
        apply_patterns_greedily(&mut ctx, f.op_ref(), &patterns, &DriverConfig::default()).unwrap();

    assert_eq!(outcome.rewrites, 0);
    let kinds: Vec<OpKind> = qir::walk::collect_nested_ops(&ctx, f.op_ref())
        .into_iter()
        .map(|op| ctx.op_kind(op))
        .collect();
    assert_eq!(kinds, [OpKind::Alloc, OpKind::Hadamard, OpKind::Return]);
}

#[test]
fn typed_wrapper_round_trips_through_from_op() {
    let mut ctx = IrContext::new();
    let f = single_h(&mut ctx);
    assert_eq!(Func::from_op(&ctx, f.op_ref()), Some(f));
    assert_eq!(quantum::Rotate::from_op(&ctx, f.op_ref()), None);
}
