//! Peephole rewrite patterns for the quantum dialect.
//!
//! ## Patterns
//!
//! - [`rotation_fusion::FoldRotation`]: two consecutive rotations on the
//!   same qubit become one rotation by the summed angle
//! - [`hadamard::CancelHadamardPair`] and [`hadamard::ConjugateXByHadamard`]:
//!   Hadamard identities
//!
//! ## Pass
//!
//! - [`pipeline::QuantumHxPass`]: all of the above, driven to a fixpoint

pub mod hadamard;
pub mod pipeline;
pub mod rotation_fusion;

pub use hadamard::{CancelHadamardPair, ConjugateXByHadamard};
pub use pipeline::{PassFailure, PassReport, QuantumHxPass};
pub use rotation_fusion::{AxisPolicy, FoldRotation};
