//! The `quantum-hx` pass.
//!
//! Runs the Hadamard identities and rotation fusion to a fixpoint over one
//! root operation.

use derive_more::{Display, Error, From};
use qir::rewrite::{
    DriverConfig, DriverStatus, FrozenPatternSet, RewriteError, RewritePatternSet,
    apply_patterns_greedily,
};
use qir::validation;
use qir::{IrContext, OpRef};

use crate::hadamard::{CancelHadamardPair, ConjugateXByHadamard};
use crate::rotation_fusion::{AxisPolicy, FoldRotation};

/// Summary of a successful run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassReport {
    pub iterations: usize,
    pub rewrites: usize,
}

/// Why the pass failed.
#[derive(Debug, Display, Error, From)]
pub enum PassFailure {
    /// A driver bound was hit before reaching a fixpoint. The IR is valid
    /// but not fully optimized.
    #[from(ignore)]
    #[display(
        "quantum-hx did not converge: {status:?} after {iterations} sweep(s) and {rewrites} rewrite(s)"
    )]
    NonConvergence {
        status: DriverStatus,
        iterations: usize,
        rewrites: usize,
    },
    #[from(ignore)]
    #[display("quantum-hx was cancelled after {rewrites} rewrite(s)")]
    Cancelled { rewrites: usize },
    /// A pattern or the driver broke a rewrite contract.
    #[display("quantum-hx aborted: {_0}")]
    ContractViolation(#[error(source)] RewriteError),
}

/// Greedy peephole optimization of quantum circuits.
#[derive(Clone, Debug, Default)]
pub struct QuantumHxPass {
    config: DriverConfig,
    axis_policy: AxisPolicy,
}

impl QuantumHxPass {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            axis_policy: AxisPolicy::default(),
        }
    }

    pub fn with_axis_policy(mut self, axis_policy: AxisPolicy) -> Self {
        self.axis_policy = axis_policy;
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Hadamard identities first, then rotation fusion.
    pub fn patterns(&self) -> FrozenPatternSet {
        RewritePatternSet::new()
            .add(CancelHadamardPair)
            .add(ConjugateXByHadamard)
            .add(FoldRotation::new(self.axis_policy))
            .freeze()
    }

    /// Optimize everything nested under `root`.
    pub fn run(&self, ctx: &mut IrContext, root: OpRef) -> Result<PassReport, PassFailure> {
        let patterns = self.patterns();
        let _span = tracing::debug_span!("quantum-hx", %root).entered();

        let outcome = apply_patterns_greedily(ctx, root, &patterns, &self.config)?;
        match outcome.status {
            DriverStatus::Converged => {
                validation::debug_assert_valid(ctx, root, "quantum-hx");
                tracing::debug!(
                    iterations = outcome.iterations,
                    rewrites = outcome.rewrites,
                    "converged"
                );
                Ok(PassReport {
                    iterations: outcome.iterations,
                    rewrites: outcome.rewrites,
                })
            }
            DriverStatus::IterationLimit | DriverStatus::RewriteLimit => {
                Err(PassFailure::NonConvergence {
                    status: outcome.status,
                    iterations: outcome.iterations,
                    rewrites: outcome.rewrites,
                })
            }
            DriverStatus::Cancelled => Err(PassFailure::Cancelled {
                rewrites: outcome.rewrites,
            }),
        }
    }
}
