//! End-to-end behavior of the quantum-hx pass.

use qir::builder::build_func;
use qir::dialect::quantum::Rotate;
use qir::printer::print_op;
use qir::rewrite::{CancelFlag, DriverConfig, DriverStatus};
use qir::validation::validate_all;
use qir::walk::collect_nested_ops;
use qir::{Axis, DialectOp, IrContext, OpKind, OpRef, Type};
use qir_passes::{AxisPolicy, PassFailure, QuantumHxPass};

fn count_kind(ctx: &IrContext, root: OpRef, kind: OpKind) -> usize {
    collect_nested_ops(ctx, root)
        .into_iter()
        .filter(|&op| ctx.op_kind(op) == kind)
        .count()
}

#[test]
fn two_rotations_fuse_into_one() {
    let mut ctx = IrContext::new();
    let (f, first) = build_func(&mut ctx, "main", &[], |b, _| {
        let q0 = b.alloc();
        let phi1 = b.constf(0.25);
        let phi2 = b.constf(0.5);
        let q1 = b.rotate(Axis::Z, phi1, q0);
        let q2 = b.rotate(Axis::Z, phi2, q1);
        b.ret(&[q2]);
        q1
    });
    let op1 = ctx.defining_op(first).unwrap();

    let report = QuantumHxPass::default().run(&mut ctx, f.op_ref()).unwrap();

    assert!(!ctx.is_live(op1));
    assert!(report.rewrites >= 1);
    insta::assert_snapshot!(print_op(&ctx, f.op_ref()), @r"
    func.func @main() {
      %0 = quantum.alloc : qubit
      %1 = arith.constf {value = 0.75} : f64
      %2 = quantum.rotate %1, %0 {axis = z} : qubit
      func.return %2
    }
    ");
}

#[test]
fn three_rotations_fuse_pairwise() {
    let mut ctx = IrContext::new();
    let args = [Type::Qubit, Type::F64, Type::F64, Type::F64];
    let (f, (q1, q2)) = build_func(&mut ctx, "main", &args, |b, args| {
        let q1 = b.rotate(Axis::X, args[1], args[0]);
        let q2 = b.rotate(Axis::X, args[2], q1);
        let q3 = b.rotate(Axis::X, args[3], q2);
        b.ret(&[q3]);
        (q1, q2)
    });
    let intermediates = [ctx.defining_op(q1).unwrap(), ctx.defining_op(q2).unwrap()];

    let report = QuantumHxPass::default().run(&mut ctx, f.op_ref()).unwrap();

    assert_eq!(report.rewrites, 2);
    assert!(intermediates.iter().all(|&op| !ctx.is_live(op)));
    assert_eq!(count_kind(&ctx, f.op_ref(), OpKind::Rotate), 1);
    insta::assert_snapshot!(print_op(&ctx, f.op_ref()), @r"
    func.func @main(%0: qubit, %1: f64, %2: f64, %3: f64) {
      %4 = arith.addf %1, %2 : f64
      %5 = arith.addf %4, %3 : f64
      %6 = quantum.rotate %5, %0 {axis = x} : qubit
      func.return %6
    }
    ");
}

#[test]
fn rotations_across_a_region_boundary_are_kept() {
    let mut ctx = IrContext::new();
    let (f, _) = build_func(&mut ctx, "main", &[Type::Qubit, Type::Qubit, Type::F64], |b, args| {
        let q = b.rotate(Axis::Z, args[2], args[0]);
        let m = b.measure(args[1]);
        let (_, results) = b.if_(m, &[Type::Qubit], |inner| {
            let q = inner.rotate(Axis::Z, args[2], q);
            inner.yield_(&[q]);
        });
        b.ret(&[results[0]]);
    });
    let before = print_op(&ctx, f.op_ref());

    let report = QuantumHxPass::default().run(&mut ctx, f.op_ref()).unwrap();

    assert_eq!(report.rewrites, 0);
    assert_eq!(report.iterations, 1);
    assert_eq!(print_op(&ctx, f.op_ref()), before);
}

#[test]
fn rotations_inside_a_region_fuse_locally() {
    let mut ctx = IrContext::new();
    let (f, _) = build_func(&mut ctx, "main", &[Type::Qubit, Type::F64], |b, args| {
        let m = b.measure(args[0]);
        let q = b.alloc();
        let (_, results) = b.if_(m, &[Type::Qubit], |inner| {
            let q = inner.rotate(Axis::Y, args[1], q);
            let q = inner.rotate(Axis::Y, args[1], q);
            inner.yield_(&[q]);
        });
        b.ret(&[results[0]]);
    });

    QuantumHxPass::default().run(&mut ctx, f.op_ref()).unwrap();

    assert_eq!(count_kind(&ctx, f.op_ref(), OpKind::Rotate), 1);
    assert_eq!(count_kind(&ctx, f.op_ref(), OpKind::AddF), 1);
}

#[test]
fn mixed_circuit_keeps_use_chains_consistent_after_every_rewrite() {
    let mut ctx = IrContext::new();
    let (f, _) = build_func(&mut ctx, "main", &[], |b, _| {
        let q = b.alloc();
        let q = b.h(q);
        let q = b.x(q);
        let q = b.h(q);
        let q = b.h(q);
        let q = b.h(q);
        let a = b.constf(0.5);
        let q = b.rotate(Axis::Z, a, q);
        let q = b.rotate(Axis::Z, a, q);
        let m = b.measure(q);
        b.ret(&[m]);
    });
    let config = DriverConfig::default().with_verify_each_rewrite(true);

    QuantumHxPass::new(config).run(&mut ctx, f.op_ref()).unwrap();

    assert!(validate_all(&ctx, f.op_ref()).is_ok());
    insta::assert_snapshot!(print_op(&ctx, f.op_ref()), @r"
    func.func @main() {
      %0 = quantum.alloc : qubit
      %1 = quantum.z %0 : qubit
      %2 = arith.constf {value = 1.0} : f64
      %3 = quantum.rotate %2, %1 {axis = z} : qubit
      %4 = quantum.measure %3 : i1
      func.return %4
    }
    ");
}

#[test]
fn second_run_changes_nothing() {
    let mut ctx = IrContext::new();
    let (f, _) = build_func(&mut ctx, "main", &[Type::Qubit, Type::F64], |b, args| {
        let q = b.h(args[0]);
        let q = b.h(q);
        let q = b.rotate(Axis::X, args[1], q);
        let q = b.rotate(Axis::X, args[1], q);
        b.ret(&[q]);
    });
    let pass = QuantumHxPass::default();

    pass.run(&mut ctx, f.op_ref()).unwrap();
    let settled = print_op(&ctx, f.op_ref());
    let report = pass.run(&mut ctx, f.op_ref()).unwrap();

    assert_eq!(report.rewrites, 0);
    assert_eq!(report.iterations, 1);
    assert_eq!(print_op(&ctx, f.op_ref()), settled);
}

#[test]
fn mixed_axes_need_the_permissive_policy() {
    let build = |ctx: &mut IrContext| {
        build_func(ctx, "main", &[Type::Qubit, Type::F64], |b, args| {
            let q = b.rotate(Axis::X, args[1], args[0]);
            let q = b.rotate(Axis::Z, args[1], q);
            b.ret(&[q]);
        })
        .0
    };

    let mut ctx = IrContext::new();
    let f = build(&mut ctx);
    QuantumHxPass::default().run(&mut ctx, f.op_ref()).unwrap();
    assert_eq!(count_kind(&ctx, f.op_ref(), OpKind::Rotate), 2);

    let mut ctx = IrContext::new();
    let f = build(&mut ctx);
    QuantumHxPass::default()
        .with_axis_policy(AxisPolicy::Ignore)
        .run(&mut ctx, f.op_ref())
        .unwrap();
    let rotations: Vec<Rotate> = collect_nested_ops(&ctx, f.op_ref())
        .into_iter()
        .filter_map(|op| Rotate::from_op(&ctx, op))
        .collect();
    assert_eq!(rotations.len(), 1);
    assert_eq!(rotations[0].axis(&ctx), Axis::Z);
}

#[test]
fn hitting_a_bound_is_reported_as_non_convergence() {
    let mut ctx = IrContext::new();
    let (f, _) = build_func(&mut ctx, "main", &[Type::Qubit, Type::F64], |b, args| {
        let q = b.rotate(Axis::Z, args[1], args[0]);
        let q = b.rotate(Axis::Z, args[1], q);
        b.ret(&[q]);
    });
    let config = DriverConfig::default().with_max_iterations(1);

    let err = QuantumHxPass::new(config)
        .run(&mut ctx, f.op_ref())
        .unwrap_err();

    assert!(matches!(
        err,
        PassFailure::NonConvergence {
            status: DriverStatus::IterationLimit,
            iterations: 1,
            rewrites: 1,
        }
    ));
    // Partially optimized but well formed.
    assert!(validate_all(&ctx, f.op_ref()).is_ok());
}

#[test]
fn cancellation_is_reported() {
    let mut ctx = IrContext::new();
    let (f, _) = build_func(&mut ctx, "main", &[Type::Qubit], |b, args| {
        let q = b.h(args[0]);
        let q = b.h(q);
        b.ret(&[q]);
    });
    let cancel = CancelFlag::new();
    cancel.cancel();
    let config = DriverConfig::default().with_cancel(cancel);

    let err = QuantumHxPass::new(config)
        .run(&mut ctx, f.op_ref())
        .unwrap_err();

    assert!(matches!(err, PassFailure::Cancelled { rewrites: 0 }));
    assert_eq!(count_kind(&ctx, f.op_ref(), OpKind::Hadamard), 2);
}
