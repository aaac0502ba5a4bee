//! Typed wrappers over the closed operation set.
//!
//! Each wrapper is a `Copy` newtype around an [`OpRef`] whose kind has been
//! checked, with accessors for its operands, results and attributes, and a
//! `builder` constructor producing an [`OperationDataBuilder`](crate::OperationDataBuilder).

use crate::context::IrContext;
use crate::kind::OpKind;
use crate::refs::OpRef;

pub mod arith;
pub mod func;
pub mod quantum;
pub mod scf;

/// Trait for typed operation wrappers.
pub trait DialectOp: Sized + Copy {
    const KIND: OpKind;

    /// Wrap without checking the kind.
    fn wrap(op: OpRef) -> Self;

    fn op_ref(&self) -> OpRef;

    fn matches(ctx: &IrContext, op: OpRef) -> bool {
        ctx.is_live(op) && ctx.op_kind(op) == Self::KIND
    }

    fn from_op(ctx: &IrContext, op: OpRef) -> Option<Self> {
        Self::matches(ctx, op).then(|| Self::wrap(op))
    }
}

macro_rules! dialect_op {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name($crate::refs::OpRef);

        impl $crate::dialect::DialectOp for $name {
            const KIND: $crate::kind::OpKind = $crate::kind::OpKind::$kind;

            fn wrap(op: $crate::refs::OpRef) -> Self {
                Self(op)
            }

            fn op_ref(&self) -> $crate::refs::OpRef {
                self.0
            }
        }
    };
}
pub(crate) use dialect_op;
