//! Rewrite pattern trait.
//!
//! No lifetimes needed: patterns receive `OpRef`s, which are `Copy`, and
//! read or mutate the IR only through the [`PatternRewriter`].

use super::error::RewriteError;
use super::rewriter::PatternRewriter;
use crate::kind::OpKind;
use crate::refs::OpRef;

/// Static priority of a pattern among those sharing a root kind.
///
/// Higher benefit is tried first. It only orders candidates; it is not a
/// cost model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatternBenefit(pub u16);

impl PatternBenefit {
    pub const fn new(benefit: u16) -> Self {
        Self(benefit)
    }
}

/// What a pattern did with the operation it was offered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The pattern matched and rewrote the IR.
    Applied,
    /// The pattern does not apply. The IR must be untouched.
    NoMatch,
}

/// A local rewrite rule anchored on one operation kind.
///
/// # Contract
///
/// All checks happen before the first mutation. A pattern that mutates
/// through the rewriter and then returns [`MatchOutcome::NoMatch`] is
/// reported by the driver as [`RewriteError::MutatedWithoutMatch`].
pub trait RewritePattern {
    /// The operation kind this pattern is dispatched on.
    fn root_kind(&self) -> OpKind;

    fn benefit(&self) -> PatternBenefit {
        PatternBenefit(1)
    }

    /// Human-readable name for logs and errors.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Attempt to match `op` and rewrite it.
    fn match_and_rewrite(
        &self,
        op: OpRef,
        rewriter: &mut PatternRewriter<'_>,
    ) -> Result<MatchOutcome, RewriteError>;
}
