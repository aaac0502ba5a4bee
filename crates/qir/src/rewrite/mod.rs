//! Pattern-driven rewrite infrastructure.
//!
//! In-place mutation through a [`PatternRewriter`], with a greedy worklist
//! driver that reacts to every change the rewriter reports.

pub mod driver;
pub mod error;
pub mod listener;
pub mod pattern;
pub mod pattern_set;
pub mod rewriter;

pub use driver::{
    CancelFlag, DriverConfig, DriverOutcome, DriverStatus, SWEEP_REWRITE_FACTOR,
    apply_patterns_greedily,
};
pub use error::RewriteError;
pub use listener::{NoopListener, RewriteListener};
pub use pattern::{MatchOutcome, PatternBenefit, RewritePattern};
pub use pattern_set::{FrozenPatternSet, RewritePatternSet};
pub use rewriter::{PatternRewriter, RootUpdate};
