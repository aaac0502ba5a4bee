//! Demo circuits for the quantum-hx optimizer.
//!
//! The IR has no parser, so the command-line front end builds its inputs
//! programmatically from the shapes defined here.

use qir::builder::build_func;
use qir::dialect::DialectOp;
use qir::dialect::func::Func;
use qir::printer::print_op;
use qir::{Axis, IrContext, Type};
use qir_passes::{PassFailure, PassReport, QuantumHxPass};

/// A function together with the context that owns it.
pub struct Circuit {
    pub ctx: IrContext,
    pub func: Func,
}

impl Circuit {
    pub fn print(&self) -> String {
        print_op(&self.ctx, self.func.op_ref())
    }

    pub fn optimize(&mut self, pass: &QuantumHxPass) -> Result<PassReport, PassFailure> {
        pass.run(&mut self.ctx, self.func.op_ref())
    }
}

/// Consecutive rotations on one freshly allocated qubit, then a measurement.
#[derive(Clone, Debug)]
pub struct RotationChain {
    pub axis: Axis,
    pub angles: Vec<f64>,
    /// Cycle the axis between rotations, starting from `axis`.
    pub mixed_axes: bool,
    /// Place the last rotation inside an `scf.if` on a second qubit's
    /// measurement.
    pub cross_region: bool,
}

impl RotationChain {
    fn axis_at(&self, index: usize) -> Axis {
        if !self.mixed_axes {
            return self.axis;
        }
        const CYCLE: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
        let start = CYCLE.iter().position(|&a| a == self.axis).unwrap_or(0);
        CYCLE[(start + index) % CYCLE.len()]
    }

    pub fn build(&self) -> Circuit {
        let mut ctx = IrContext::new();
        let (func, _) = build_func(&mut ctx, "main", &[], |b, _| {
            let mut q = b.alloc();
            let angles: Vec<_> = self.angles.iter().map(|&a| b.constf(a)).collect();
            let split = if self.cross_region {
                angles.len().saturating_sub(1)
            } else {
                angles.len()
            };

            for (i, &angle) in angles[..split].iter().enumerate() {
                q = b.rotate(self.axis_at(i), angle, q);
            }
            if split < angles.len() {
                let flag = b.alloc();
                let cond = b.measure(flag);
                let axis = self.axis_at(split);
                let angle = angles[split];
                let (_, results) = b.if_(cond, &[Type::Qubit], |inner| {
                    let q = inner.rotate(axis, angle, q);
                    inner.yield_(&[q]);
                });
                q = results[0];
            }
            let m = b.measure(q);
            b.ret(&[m]);
        });
        Circuit { ctx, func }
    }
}

/// `h(x(h(h(h(q)))))`: one conjugated X followed by a cancelling pair.
pub fn hadamard_sandwich() -> Circuit {
    let mut ctx = IrContext::new();
    let (func, _) = build_func(&mut ctx, "main", &[], |b, _| {
        let q = b.alloc();
        let q = b.h(q);
        let q = b.h(q);
        let q = b.h(q);
        let q = b.x(q);
        let q = b.h(q);
        let m = b.measure(q);
        b.ret(&[m]);
    });
    Circuit { ctx, func }
}
