//! Arena-based SSA IR for quantum circuits.
//!
//! The IR is stored in an [`IrContext`] built on `cranelift-entity` arenas,
//! with explicit use-chains so that rewrites can mutate in place. Local
//! rewrites are expressed as [`RewritePattern`](rewrite::RewritePattern)s
//! and applied to a fixpoint by
//! [`apply_patterns_greedily`](rewrite::apply_patterns_greedily).

pub mod builder;
pub mod context;
pub mod dialect;
pub mod fold;
pub mod kind;
pub mod printer;
pub mod refs;
pub mod rewrite;
pub mod types;
pub mod validation;
pub mod walk;

pub use context::{
    BlockData, IrContext, OperationData, OperationDataBuilder, RegionData, Use, ValueData,
};
pub use dialect::DialectOp;
pub use kind::OpKind;
pub use refs::{BlockRef, OpRef, PathRef, RegionRef, ValueDef, ValueRef};
pub use types::{Attribute, Axis, Location, PathInterner, Span, Type};
pub use walk::WalkAction;
